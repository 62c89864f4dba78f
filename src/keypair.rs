use std::fmt;

use ring::signature::{self as ring_sig, KeyPair as _};
use secp256k1::{ecdsa, Message, PublicKey, Scalar, SecretKey, SECP256K1};
use tracing::{debug, trace};

use crate::account::AccountId;
use crate::constant::ED25519_PUBKEY_PREFIX;
use crate::error::{Result, XrpError};
use crate::hash::sha512_half;
use crate::seed::{KeyType, Seed};

/// Upper bound of the candidate index tried while searching for a valid scalar.
const MAX_DERIVATION_ATTEMPTS: u32 = u32::MAX;

/// secp256k1 key pair. Signs the half-SHA512 of a message with low-S ECDSA.
#[derive(Clone)]
pub struct Secp256k1KeyPair {
    secret: SecretKey,
    public: PublicKey,
}

/// Ed25519 key pair. Its canonical public key carries a leading 0xED.
#[derive(Clone)]
pub struct Ed25519KeyPair {
    raw_private: [u8; 32],
    raw_public: [u8; 33],
}

#[derive(Clone)]
pub enum KeyPair {
    Secp256k1(Secp256k1KeyPair),
    Ed25519(Ed25519KeyPair),
}

/// Output of key derivation. `root` is only produced for secp256k1 seeds.
#[derive(Clone)]
pub struct DerivedKeys {
    pub root: Option<KeyPair>,
    pub master: KeyPair,
}

impl Secp256k1KeyPair {
    fn from_secret_key(secret: SecretKey) -> Self {
        let public = PublicKey::from_secret_key_global(&secret);
        Self { secret, public }
    }

    fn sign(&self, message: &[u8]) -> Vec<u8> {
        let digest = Message::from_digest(sha512_half(message));
        SECP256K1
            .sign_ecdsa(&digest, &self.secret)
            .serialize_der()
            .to_vec()
    }
}

impl Ed25519KeyPair {
    fn from_raw_private(raw_private: [u8; 32]) -> Result<Self> {
        let key_pair = ring_sig::Ed25519KeyPair::from_seed_unchecked(&raw_private)
            .map_err(|e| XrpError::Derivation(e.to_string()))?;
        let mut raw_public = [0u8; 33];
        raw_public[0] = ED25519_PUBKEY_PREFIX;
        raw_public[1..].copy_from_slice(key_pair.public_key().as_ref());
        Ok(Self {
            raw_private,
            raw_public,
        })
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        let key_pair = ring_sig::Ed25519KeyPair::from_seed_unchecked(&self.raw_private)
            .map_err(|e| XrpError::Signing(e.to_string()))?;
        Ok(key_pair.sign(message).as_ref().to_vec())
    }
}

impl KeyPair {
    /// Master key pair of an encoded seed (`s...` or `sEd...`).
    pub fn from_secret(secret_str: &str) -> Result<Self> {
        let seed: Seed = secret_str.parse()?;
        seed.key_pair()
    }

    pub fn key_type(&self) -> KeyType {
        match self {
            KeyPair::Secp256k1(_) => KeyType::Secp256k1,
            KeyPair::Ed25519(_) => KeyType::Ed25519,
        }
    }

    /// Canonical public key, 33 bytes for both schemes.
    pub fn public_key(&self) -> [u8; 33] {
        match self {
            KeyPair::Secp256k1(pair) => pair.public.serialize(),
            KeyPair::Ed25519(pair) => pair.raw_public,
        }
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode_upper(self.public_key())
    }

    pub fn private_key(&self) -> [u8; 32] {
        match self {
            KeyPair::Secp256k1(pair) => pair.secret.secret_bytes(),
            KeyPair::Ed25519(pair) => pair.raw_private,
        }
    }

    pub fn account_id(&self) -> AccountId {
        AccountId::from_public_key(&self.public_key())
    }

    /// DER signature for secp256k1, raw 64 bytes for Ed25519.
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        match self {
            KeyPair::Secp256k1(pair) => Ok(pair.sign(message)),
            KeyPair::Ed25519(pair) => pair.sign(message),
        }
    }

    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        verify(&self.public_key(), message, signature).unwrap_or(false)
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("key_type", &self.key_type())
            .field("public_key", &self.public_key_hex())
            .finish()
    }
}

/// Checks `signature` over `message` against a canonical public key.
///
/// The scheme is chosen by the key's first byte. A key in neither format is
/// a `Format` error; a signature that does not verify is `Ok(false)`.
///
/// secp256k1 signatures must be low-S. A high-S signature is not
/// normalised first and verifies as `Ok(false)`, as the ledger requires
/// fully canonical signatures.
pub fn verify(public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<bool> {
    match public_key.first() {
        Some(&ED25519_PUBKEY_PREFIX) if public_key.len() == 33 => {
            let key = ring_sig::UnparsedPublicKey::new(&ring_sig::ED25519, &public_key[1..]);
            Ok(key.verify(message, signature).is_ok())
        }
        Some(0x02) | Some(0x03) if public_key.len() == 33 => {
            let key = PublicKey::from_slice(public_key)
                .map_err(|e| XrpError::Format(format!("secp256k1 public key: {}", e)))?;
            let Ok(signature) = ecdsa::Signature::from_der(signature) else {
                return Ok(false);
            };
            let digest = Message::from_digest(sha512_half(message));
            Ok(SECP256K1.verify_ecdsa(&digest, &signature, &key).is_ok())
        }
        _ => Err(XrpError::Format(format!(
            "'{}' is not a canonical public key",
            hex::encode_upper(public_key)
        ))),
    }
}

/// Derives the key pairs of a seed.
pub fn derive(seed: &Seed) -> Result<DerivedKeys> {
    match seed.key_type() {
        KeyType::Ed25519 => {
            let master = Ed25519KeyPair::from_raw_private(sha512_half(seed.entropy()))?;
            debug!("derived ed25519 key pair");
            Ok(DerivedKeys {
                root: None,
                master: KeyPair::Ed25519(master),
            })
        }
        KeyType::Secp256k1 => derive_secp256k1(seed.entropy()),
    }
}

fn derive_secp256k1(entropy: &[u8; 16]) -> Result<DerivedKeys> {
    let (root_secret, root_rejected) = derive_scalar(entropy, None)?;
    let root = Secp256k1KeyPair::from_secret_key(root_secret);

    let (intermediate_secret, intermediate_rejected) =
        derive_scalar(&root.public.serialize(), Some(0))?;
    let intermediate_public = PublicKey::from_secret_key_global(&intermediate_secret);

    let master_secret = root_secret
        .add_tweak(&Scalar::from(intermediate_secret))
        .map_err(|e| XrpError::Derivation(format!("master private key: {}", e)))?;
    let master_public = root
        .public
        .combine(&intermediate_public)
        .map_err(|e| XrpError::Derivation(format!("master public key: {}", e)))?;

    debug!(
        "derived secp256k1 key pair, rejected {} root and {} intermediate candidates",
        root_rejected, intermediate_rejected
    );
    Ok(DerivedKeys {
        root: Some(KeyPair::Secp256k1(root)),
        master: KeyPair::Secp256k1(Secp256k1KeyPair {
            secret: master_secret,
            public: master_public,
        }),
    })
}

/// First half-SHA512 of `input ‖ [family] ‖ index` that is a valid scalar in (0, N).
fn derive_scalar(input: &[u8], family: Option<u32>) -> Result<(SecretKey, u32)> {
    let mut buf = Vec::with_capacity(input.len() + 8);
    for index in 0..=MAX_DERIVATION_ATTEMPTS {
        buf.clear();
        buf.extend_from_slice(input);
        if let Some(family) = family {
            buf.extend_from_slice(&family.to_be_bytes());
        }
        buf.extend_from_slice(&index.to_be_bytes());

        match SecretKey::from_slice(&sha512_half(&buf)) {
            Ok(secret) => return Ok((secret, index)),
            Err(_) => trace!("candidate scalar {} is outside the curve order", index),
        }
    }
    Err(XrpError::Derivation(
        "no valid secp256k1 scalar within the index range".to_string(),
    ))
}
