//! Error types for the XRPL codec

use thiserror::Error;

/// Main error type for the XRPL codec
#[derive(Error, Debug)]
pub enum XrpError {
    /// Malformed Base58, hex or JSON text.
    #[error("Invalid format: {0}")]
    Format(String),

    /// A drop count, issued value, exponent or length outside protocol bounds.
    #[error("Value out of range: {0}")]
    Range(String),

    /// The buffer ends before the value being read does.
    #[error("Truncated data: needed {needed} bytes but only {available} available")]
    TruncatedData { needed: usize, available: usize },

    /// An unexpected field id or type where a fixed schema is expected.
    #[error("Protocol mismatch: {0}")]
    ProtocolMismatch(String),

    #[error("Key derivation failed: {0}")]
    Derivation(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl XrpError {
    /// True when more input could turn this failure into a success.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, XrpError::TruncatedData { .. })
    }
}

impl From<bs58::decode::Error> for XrpError {
    fn from(err: bs58::decode::Error) -> Self {
        XrpError::Format(format!("base58: {}", err))
    }
}

impl From<hex::FromHexError> for XrpError {
    fn from(err: hex::FromHexError) -> Self {
        XrpError::Format(format!("hex: {}", err))
    }
}

impl From<std::num::ParseIntError> for XrpError {
    fn from(err: std::num::ParseIntError) -> Self {
        XrpError::Format(format!("integer: {}", err))
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, XrpError>;
