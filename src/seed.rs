//! Seeds: 16 bytes of entropy plus the signing scheme they derive keys for.

use std::fmt;
use std::str::FromStr;

use ring::rand::{SecureRandom, SystemRandom};

use crate::base58;
use crate::constant::{ED25519_SEED_PREFIX, SECP256K1_SEED_PREFIX};
use crate::error::{Result, XrpError};
use crate::hash::sha512_half;
use crate::keypair::{self, DerivedKeys, KeyPair};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    Secp256k1,
    Ed25519,
}

impl KeyType {
    fn seed_prefix(self) -> &'static [u8] {
        match self {
            KeyType::Secp256k1 => SECP256K1_SEED_PREFIX,
            KeyType::Ed25519 => ED25519_SEED_PREFIX,
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyType::Secp256k1 => f.write_str("secp256k1"),
            KeyType::Ed25519 => f.write_str("ed25519"),
        }
    }
}

impl FromStr for KeyType {
    type Err = XrpError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "secp256k1" => Ok(KeyType::Secp256k1),
            "ed25519" => Ok(KeyType::Ed25519),
            _ => Err(XrpError::Format(format!("unknown key type '{}'", s))),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Seed {
    entropy: [u8; 16],
    key_type: KeyType,
}

impl Seed {
    pub const ENTROPY_LEN: usize = 16;

    pub fn new(entropy: [u8; 16], key_type: KeyType) -> Self {
        Self { entropy, key_type }
    }

    pub fn from_slice(entropy: &[u8], key_type: KeyType) -> Result<Self> {
        let entropy: [u8; 16] = entropy.try_into().map_err(|_| {
            XrpError::Format(format!("seed expects 16 bytes, got {}", entropy.len()))
        })?;
        Ok(Self::new(entropy, key_type))
    }

    /// Seed whose entropy is the first 16 bytes of SHA-512 over the passphrase.
    pub fn from_passphrase(passphrase: &str, key_type: KeyType) -> Self {
        let mut entropy = [0u8; 16];
        entropy.copy_from_slice(&sha512_half(passphrase.as_bytes())[..16]);
        Self::new(entropy, key_type)
    }

    /// Fresh seed from the operating system's CSPRNG.
    pub fn generate(key_type: KeyType) -> Result<Self> {
        let mut entropy = [0u8; 16];
        SystemRandom::new()
            .fill(&mut entropy)
            .map_err(|_| XrpError::Derivation("system randomness unavailable".to_string()))?;
        Ok(Self::new(entropy, key_type))
    }

    pub fn entropy(&self) -> &[u8; 16] {
        &self.entropy
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    /// Every key pair the seed derives (the root pair as well for secp256k1).
    pub fn key_pairs(&self) -> Result<DerivedKeys> {
        keypair::derive(self)
    }

    /// The pair used for ordinary signing.
    pub fn key_pair(&self) -> Result<KeyPair> {
        Ok(self.key_pairs()?.master)
    }
}

impl FromStr for Seed {
    type Err = XrpError;

    fn from_str(s: &str) -> Result<Self> {
        let decoded = base58::decode_checked(s)?;
        for key_type in [KeyType::Ed25519, KeyType::Secp256k1] {
            let prefix = key_type.seed_prefix();
            if decoded.len() == prefix.len() + Self::ENTROPY_LEN && decoded.starts_with(prefix) {
                return Self::from_slice(&decoded[prefix.len()..], key_type);
            }
        }
        Err(XrpError::Format(
            "text is not an encoded secp256k1 or ed25519 seed".to_string(),
        ))
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&base58::encode_versioned(
            self.key_type.seed_prefix(),
            &self.entropy,
        ))
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Seed")
            .field("key_type", &self.key_type)
            .field("entropy", &"<redacted>")
            .finish()
    }
}

impl_serde_via_str!(Seed);

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn master_passphrase() {
        let seed = Seed::from_passphrase("masterpassphrase", KeyType::Secp256k1);
        assert_eq!(
            hex::encode_upper(seed.entropy()),
            "DEDCE9CE67B451D852FD4E846FCDE31C"
        );
        assert_eq!(seed.to_string(), "snoPBrXtMeMyMHUVTgbuqAfg1SUTb");
    }

    #[rstest]
    #[case("snoPBrXtMeMyMHUVTgbuqAfg1SUTb", KeyType::Secp256k1)]
    #[case("sp5fghtJtpUorTwvof1NpDXAzNwf5", KeyType::Secp256k1)]
    #[case("sEdSKaCy2JT7JaM7v95H9SxkhP9wS2r", KeyType::Ed25519)]
    fn text_round_trip(#[case] text: &str, #[case] key_type: KeyType) {
        let seed: Seed = text.parse().unwrap();
        assert_eq!(seed.key_type(), key_type);
        assert_eq!(seed.to_string(), text);
    }

    #[test]
    fn ed25519_entropy() {
        let seed: Seed = "sEdSKaCy2JT7JaM7v95H9SxkhP9wS2r".parse().unwrap();
        assert_eq!(
            hex::encode_upper(seed.entropy()),
            "0102030405060708090A0B0C0D0E0F10"
        );
    }

    #[rstest]
    #[case("r4nmanwKSE6GpkTCrBjz8uanrGZabbpSfp")]
    #[case("snoPBrXtMeMyMHUVTgbuqAfg1SUTc")]
    #[case("sQJm86")]
    fn not_a_seed(#[case] text: &str) {
        assert!(matches!(text.parse::<Seed>(), Err(XrpError::Format(_))));
    }

    #[test]
    fn debug_hides_entropy() {
        let seed = Seed::from_passphrase("masterpassphrase", KeyType::Secp256k1);
        let debug = format!("{:?}", seed);
        assert!(debug.contains("redacted"));
        assert!(!debug.contains("DEDC") && !debug.contains("dedc"));
        assert!(!debug.contains("snoPB"));
    }

    #[test]
    fn generated_seeds_differ() {
        let a = Seed::generate(KeyType::Ed25519).unwrap();
        let b = Seed::generate(KeyType::Ed25519).unwrap();
        assert_ne!(a.entropy(), b.entropy());
        assert_eq!(a.to_string().parse::<Seed>().unwrap(), a);
    }
}
