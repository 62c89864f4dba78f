//! Protocol constants shared across the codec.

/// Version byte of a classic address.
pub const ACCOUNT_ID_PREFIX: &[u8] = &[0x00];
/// Version byte of a secp256k1 family seed (`s...`).
pub const SECP256K1_SEED_PREFIX: &[u8] = &[0x21];
/// Version bytes of an Ed25519 seed (`sEd...`).
pub const ED25519_SEED_PREFIX: &[u8] = &[0x01, 0xE1, 0x4B];
/// First byte of a canonical Ed25519 public key.
pub const ED25519_PUBKEY_PREFIX: u8 = 0xED;

pub const CHECKSUM_LENGTH: usize = 4;

// Hash prefixes, prepended to data before hashing or signing.
pub const TRANSACTION_ID_PREFIX: [u8; 4] = [0x54, 0x58, 0x4E, 0x00]; // TXN\0
pub const TRANSACTION_SIGN_PREFIX: [u8; 4] = [0x53, 0x54, 0x58, 0x00]; // STX\0
pub const TRANSACTION_MULTISIGN_PREFIX: [u8; 4] = [0x53, 0x4D, 0x54, 0x00]; // SMT\0
pub const LEDGER_HEADER_PREFIX: [u8; 4] = [0x4C, 0x57, 0x52, 0x00]; // LWR\0

/// Total XRP in existence, in drops. No XRP amount may exceed it.
pub const MAX_DROPS: u64 = 100_000_000_000_000_000;
pub const DROPS_PER_XRP: u64 = 1_000_000;

/// Largest length a variable-length field can carry.
pub const MAX_VL_LENGTH: usize = 918_744;

/// Seconds between the Unix epoch and the Ripple epoch (2000-01-01T00:00:00Z).
pub const RIPPLE_EPOCH_OFFSET: u64 = 946_684_800;
