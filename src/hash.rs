//! Digest helpers and the fixed-width hash types.

use std::fmt;
use std::str::FromStr;

use ring::digest::{digest, SHA256, SHA512};
use ripemd::{Digest, Ripemd160};

use crate::error::{Result, XrpError};

pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(digest(&SHA256, data).as_ref());
    out
}

/// First 32 bytes of SHA-512, the ledger's 256-bit hash primitive.
pub fn sha512_half(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest(&SHA512, data).as_ref()[..32]);
    out
}

/// RIPEMD160(SHA256(data)).
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let mut hasher = Ripemd160::new();
    hasher.update(sha256(data));
    let mut out = [0u8; 20];
    out.copy_from_slice(hasher.finalize().as_slice());
    out
}

macro_rules! fixed_hash {
    ($(#[$meta:meta])* $name:ident, $len:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name([u8; $len]);

        impl $name {
            pub const LEN: usize = $len;

            pub const fn new(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            pub fn from_slice(bytes: &[u8]) -> Result<Self> {
                let array: [u8; $len] = bytes.try_into().map_err(|_| {
                    XrpError::Format(format!(
                        "{} expects exactly {} bytes, got {}",
                        stringify!($name),
                        $len,
                        bytes.len()
                    ))
                })?;
                Ok(Self(array))
            }

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = XrpError;

            fn from_str(s: &str) -> Result<Self> {
                if s.len() != $len * 2 {
                    return Err(XrpError::Format(format!(
                        "{} expects {} hex characters, got {}",
                        stringify!($name),
                        $len * 2,
                        s.len()
                    )));
                }
                Self::from_slice(&hex::decode(s)?)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode_upper(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl_serde_via_str!($name);
    };
}

fixed_hash!(
    /// 128-bit opaque digest, e.g. an account's `EmailHash`.
    Hash128,
    16
);
fixed_hash!(
    /// 160-bit opaque digest.
    Hash160,
    20
);
fixed_hash!(
    /// 256-bit opaque digest: transaction ids, ledger hashes, object ids.
    Hash256,
    32
);

impl Hash256 {
    /// Half-SHA512 of `data`.
    pub fn digest(data: &[u8]) -> Self {
        Self(sha512_half(data))
    }
}
