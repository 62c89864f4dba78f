//! Account identifiers.

use std::fmt;
use std::str::FromStr;

use crate::base58;
use crate::constant::ACCOUNT_ID_PREFIX;
use crate::error::{Result, XrpError};
use crate::hash::hash160;

/// 20-byte account identifier, RIPEMD160(SHA256(public key)).
///
/// Orders by big-endian byte value, which is the order multi-signers must
/// appear in.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct AccountId([u8; 20]);

impl AccountId {
    pub const LEN: usize = 20;

    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let array: [u8; 20] = bytes.try_into().map_err(|_| {
            XrpError::Format(format!("expected exactly 20 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(array))
    }

    /// Derives the account id owned by a canonical public key.
    pub fn from_public_key(public_key: &[u8]) -> Self {
        Self(hash160(public_key))
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl FromStr for AccountId {
    type Err = XrpError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = base58::decode_versioned(s, ACCOUNT_ID_PREFIX, Self::LEN)?;
        Self::from_slice(&bytes)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&base58::encode_versioned(ACCOUNT_ID_PREFIX, &self.0))
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self)
    }
}

impl AsRef<[u8]> for AccountId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl_serde_via_str!(AccountId);
