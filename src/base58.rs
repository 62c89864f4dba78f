//! Base58Check using the ledger's own alphabet.
//!
//! The payload is followed by the first four bytes of SHA256(SHA256(payload))
//! before encoding. Leading zero bytes become leading `r` characters.

use bs58::Alphabet;

use crate::constant::CHECKSUM_LENGTH;
use crate::error::{Result, XrpError};
use crate::hash::sha256;

const ALPHABET: &Alphabet = Alphabet::RIPPLE;

fn calc_checksum(bytes: &[u8]) -> [u8; CHECKSUM_LENGTH] {
    let mut checksum = [0u8; CHECKSUM_LENGTH];
    checksum.copy_from_slice(&sha256(&sha256(bytes))[..CHECKSUM_LENGTH]);
    checksum
}

/// Encodes `payload` followed by its checksum.
pub fn encode(payload: &[u8]) -> String {
    let checked = [payload, &calc_checksum(payload)].concat();
    bs58::encode(checked).with_alphabet(ALPHABET).into_string()
}

/// Encodes `version ‖ payload` followed by its checksum.
pub fn encode_versioned(version: &[u8], payload: &[u8]) -> String {
    encode(&[version, payload].concat())
}

/// Decodes text and verifies the checksum, returning the payload whatever its length.
pub fn decode_checked(text: &str) -> Result<Vec<u8>> {
    let mut decoded = bs58::decode(text).with_alphabet(ALPHABET).into_vec()?;
    if decoded.len() < CHECKSUM_LENGTH {
        return Err(XrpError::Format(format!(
            "'{}' is too short to carry a checksum",
            text
        )));
    }
    let checksum = decoded.split_off(decoded.len() - CHECKSUM_LENGTH);
    if calc_checksum(&decoded)[..] != checksum[..] {
        return Err(XrpError::Format(format!("'{}' has an invalid checksum", text)));
    }
    Ok(decoded)
}

/// Decodes text whose payload (checksum excluded) must be `expected_len` bytes.
pub fn decode(text: &str, expected_len: usize) -> Result<Vec<u8>> {
    let payload = decode_checked(text)?;
    if payload.len() != expected_len {
        return Err(XrpError::Format(format!(
            "'{}' decodes to {} bytes, expected exactly {}",
            text,
            payload.len(),
            expected_len
        )));
    }
    Ok(payload)
}

/// Decodes text carrying `version` followed by `payload_len` bytes and strips the version.
pub fn decode_versioned(text: &str, version: &[u8], payload_len: usize) -> Result<Vec<u8>> {
    let decoded = decode(text, version.len() + payload_len)?;
    if !decoded.starts_with(version) {
        return Err(XrpError::Format(format!(
            "'{}' does not start with version prefix {}",
            text,
            hex::encode_upper(version)
        )));
    }
    Ok(decoded[version.len()..].to_vec())
}
