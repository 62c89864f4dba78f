//! XRP Ledger codec library
//!
//! Binary (ST) serialization, Base58Check identifiers, key derivation and
//! transaction signing for the XRP Ledger. Everything is offline: producing
//! a signed blob needs no network access.
//!
//! # Example
//!
//! ```rust
//! use xrp_codec::{AccountId, KeyPair, Payment, Transaction, XrpAmount};
//!
//! # fn example() -> xrp_codec::Result<()> {
//! let key_pair = KeyPair::from_secret("snoPBrXtMeMyMHUVTgbuqAfg1SUTb")?;
//! let destination: AccountId = "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh".parse()?;
//!
//! let mut tx = Transaction::new(
//!     key_pair.account_id(),
//!     Payment::new(destination, XrpAmount::from_drops(1_000_000)?.into()),
//! );
//! tx.common.fee = Some(XrpAmount::from_drops(12)?);
//! tx.common.sequence = Some(1);
//!
//! let signed = tx.sign(&key_pair)?;
//! println!("{} {}", signed.hash, signed.blob_hex());
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

#[macro_use]
mod macros;

pub mod constant;
pub mod error;

pub mod account;
pub mod amount;
pub mod base58;
pub mod currency;
pub mod hash;

pub mod keypair;
pub mod seed;

pub mod field;
pub mod st_reader;
pub mod st_writer;

mod encode_tx;
pub mod ledger;
pub mod transaction;
pub mod types;

// Re-export main types for convenience
pub use account::AccountId;
pub use amount::{Amount, IssuedAmount, XrpAmount};
pub use currency::{Currency, CurrencyCode};
pub use error::{Result, XrpError};
pub use field::FieldId;
pub use hash::{Hash128, Hash160, Hash256};
pub use keypair::{DerivedKeys, KeyPair};
pub use ledger::{LedgerHeader, NFToken};
pub use seed::{KeyType, Seed};
pub use st_reader::{StObject, StReader, StValue};
pub use st_writer::StWriter;
pub use transaction::{
    AccountDelete, AccountSet, CommonFields, OfferCancel, OfferCreate, Payment, SetRegularKey,
    SignedTransaction, SignerListSet, Transaction, TransactionKind, TrustSet,
};
pub use types::{Memo, Signer, SignerEntry, TransactionType};
