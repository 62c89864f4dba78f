//! Field identifiers of the ST binary format and their wire headers.

use std::fmt;

use crate::constant::MAX_VL_LENGTH;
use crate::error::{Result, XrpError};

/// Serialized type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum StTypeCode {
    UInt16 = 1,
    UInt32 = 2,
    UInt64 = 3,
    Hash128 = 4,
    Hash256 = 5,
    Amount = 6,
    Blob = 7,
    AccountId = 8,
    Object = 14,
    Array = 15,
    UInt8 = 16,
    Hash160 = 17,
    PathSet = 18,
    Vector256 = 19,
}

impl StTypeCode {
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for StTypeCode {
    type Error = XrpError;

    fn try_from(code: u8) -> Result<Self> {
        Ok(match code {
            1 => StTypeCode::UInt16,
            2 => StTypeCode::UInt32,
            3 => StTypeCode::UInt64,
            4 => StTypeCode::Hash128,
            5 => StTypeCode::Hash256,
            6 => StTypeCode::Amount,
            7 => StTypeCode::Blob,
            8 => StTypeCode::AccountId,
            14 => StTypeCode::Object,
            15 => StTypeCode::Array,
            16 => StTypeCode::UInt8,
            17 => StTypeCode::Hash160,
            18 => StTypeCode::PathSet,
            19 => StTypeCode::Vector256,
            _ => {
                return Err(XrpError::ProtocolMismatch(format!(
                    "unknown type code {}",
                    code
                )))
            }
        })
    }
}

/// `(type code, field code)` pair. Orders the way fields must appear on the wire.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId {
    pub type_code: StTypeCode,
    pub field_code: u8,
}

impl FieldId {
    pub const fn new(type_code: StTypeCode, field_code: u8) -> Self {
        Self {
            type_code,
            field_code,
        }
    }

    pub fn name(&self) -> Option<&'static str> {
        FIELDS
            .iter()
            .find(|(id, _)| id == self)
            .map(|(_, name)| *name)
    }

    pub fn from_name(name: &str) -> Option<FieldId> {
        FIELDS.iter().find(|(_, n)| *n == name).map(|(id, _)| *id)
    }

    /// Length-prefixed on the wire.
    pub fn is_vl_encoded(&self) -> bool {
        matches!(
            self.type_code,
            StTypeCode::Blob | StTypeCode::AccountId | StTypeCode::Vector256
        )
    }

    /// Covered by a signature; everything except the signatures themselves.
    pub fn is_signing_field(&self) -> bool {
        *self != TXN_SIGNATURE && *self != SIGNERS
    }

    /// Wire header, 1 to 3 bytes.
    pub fn header(&self) -> Vec<u8> {
        let type_code = self.type_code.code();
        let field_code = self.field_code;
        let mut result = Vec::with_capacity(3);
        if type_code < 16 && field_code < 16 {
            result.push((type_code << 4) | field_code);
        } else if type_code < 16 {
            result.push(type_code << 4);
            result.push(field_code);
        } else if field_code < 16 {
            result.push(field_code);
            result.push(type_code);
        } else {
            result.push(0x00);
            result.push(type_code);
            result.push(field_code);
        }
        result
    }

    /// Decodes a header from the front of `bytes`, returning the id and bytes consumed.
    pub fn decode_header(bytes: &[u8]) -> Result<(FieldId, usize)> {
        let need = |needed: usize| {
            if bytes.len() < needed {
                Err(XrpError::TruncatedData {
                    needed,
                    available: bytes.len(),
                })
            } else {
                Ok(())
            }
        };
        let extended = |code: u8, what: &str| {
            if code < 16 {
                Err(XrpError::Format(format!(
                    "{} code {} must use the short header form",
                    what, code
                )))
            } else {
                Ok(code)
            }
        };

        need(1)?;
        let high = bytes[0] >> 4;
        let low = bytes[0] & 0x0F;
        let (type_code, field_code, consumed) = match (high, low) {
            (0, 0) => {
                need(3)?;
                (extended(bytes[1], "type")?, extended(bytes[2], "field")?, 3)
            }
            (0, field) => {
                need(2)?;
                (extended(bytes[1], "type")?, field, 2)
            }
            (type_code, 0) => {
                need(2)?;
                (type_code, extended(bytes[1], "field")?, 2)
            }
            (type_code, field) => (type_code, field, 1),
        };
        Ok((
            FieldId::new(StTypeCode::try_from(type_code)?, field_code),
            consumed,
        ))
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{:?}#{}", self.type_code, self.field_code),
        }
    }
}

impl fmt::Debug for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FieldId({}, {}:{})",
            self,
            self.type_code.code(),
            self.field_code
        )
    }
}

macro_rules! fields {
    ($($konst:ident = ($ty:ident, $code:expr, $name:expr);)*) => {
        $(pub const $konst: FieldId = FieldId::new(StTypeCode::$ty, $code);)*

        const FIELDS: &[(FieldId, &str)] = &[$(($konst, $name)),*];
    };
}

fields! {
    TRANSACTION_TYPE = (UInt16, 2, "TransactionType");
    SIGNER_WEIGHT = (UInt16, 3, "SignerWeight");

    NETWORK_ID = (UInt32, 1, "NetworkID");
    FLAGS = (UInt32, 2, "Flags");
    SOURCE_TAG = (UInt32, 3, "SourceTag");
    SEQUENCE = (UInt32, 4, "Sequence");
    EXPIRATION = (UInt32, 10, "Expiration");
    TRANSFER_RATE = (UInt32, 11, "TransferRate");
    DESTINATION_TAG = (UInt32, 14, "DestinationTag");
    QUALITY_IN = (UInt32, 20, "QualityIn");
    QUALITY_OUT = (UInt32, 21, "QualityOut");
    OFFER_SEQUENCE = (UInt32, 25, "OfferSequence");
    LAST_LEDGER_SEQUENCE = (UInt32, 27, "LastLedgerSequence");
    SET_FLAG = (UInt32, 33, "SetFlag");
    CLEAR_FLAG = (UInt32, 34, "ClearFlag");
    SIGNER_QUORUM = (UInt32, 35, "SignerQuorum");

    EMAIL_HASH = (Hash128, 1, "EmailHash");

    ACCOUNT_TXN_ID = (Hash256, 9, "AccountTxnID");
    NFTOKEN_ID = (Hash256, 10, "NFTokenID");
    INVOICE_ID = (Hash256, 17, "InvoiceID");

    AMOUNT = (Amount, 1, "Amount");
    LIMIT_AMOUNT = (Amount, 3, "LimitAmount");
    TAKER_PAYS = (Amount, 4, "TakerPays");
    TAKER_GETS = (Amount, 5, "TakerGets");
    FEE = (Amount, 8, "Fee");
    SEND_MAX = (Amount, 9, "SendMax");
    DELIVER_MIN = (Amount, 10, "DeliverMin");

    MESSAGE_KEY = (Blob, 2, "MessageKey");
    SIGNING_PUB_KEY = (Blob, 3, "SigningPubKey");
    TXN_SIGNATURE = (Blob, 4, "TxnSignature");
    URI = (Blob, 5, "URI");
    DOMAIN = (Blob, 7, "Domain");
    MEMO_TYPE = (Blob, 12, "MemoType");
    MEMO_DATA = (Blob, 13, "MemoData");
    MEMO_FORMAT = (Blob, 14, "MemoFormat");

    ACCOUNT = (AccountId, 1, "Account");
    DESTINATION = (AccountId, 3, "Destination");
    REGULAR_KEY = (AccountId, 8, "RegularKey");

    OBJECT_END = (Object, 1, "ObjectEndMarker");
    MEMO = (Object, 10, "Memo");
    SIGNER_ENTRY = (Object, 11, "SignerEntry");
    NFTOKEN = (Object, 12, "NFToken");
    SIGNER = (Object, 16, "Signer");

    ARRAY_END = (Array, 1, "ArrayEndMarker");
    SIGNERS = (Array, 3, "Signers");
    SIGNER_ENTRIES = (Array, 4, "SignerEntries");
    MEMOS = (Array, 9, "Memos");

    TICK_SIZE = (UInt8, 16, "TickSize");

    AMENDMENTS = (Vector256, 3, "Amendments");
}

/// Length prefix of a variable-length field.
pub fn encode_variable_length(length: usize) -> Result<Vec<u8>> {
    let mut result = Vec::with_capacity(3);
    if length <= 192 {
        result.push(length as u8);
    } else if length <= 12480 {
        let adjusted = length - 193;
        result.push(193 + (adjusted / 256) as u8);
        result.push((adjusted % 256) as u8);
    } else if length <= MAX_VL_LENGTH {
        let adjusted = length - 12481;
        result.push(241 + (adjusted / 65536) as u8);
        result.push(((adjusted / 256) % 256) as u8);
        result.push((adjusted % 256) as u8);
    } else {
        return Err(XrpError::Range(format!(
            "length {} exceeds {} bytes",
            length, MAX_VL_LENGTH
        )));
    }
    Ok(result)
}

/// Decodes a length prefix, returning the length and the prefix size.
pub fn decode_variable_length(bytes: &[u8]) -> Result<(usize, usize)> {
    let need = |needed: usize| {
        if bytes.len() < needed {
            Err(XrpError::TruncatedData {
                needed,
                available: bytes.len(),
            })
        } else {
            Ok(())
        }
    };

    need(1)?;
    let b1 = bytes[0] as usize;
    let (length, consumed) = match b1 {
        0..=192 => (b1, 1),
        193..=240 => {
            need(2)?;
            (193 + (b1 - 193) * 256 + bytes[1] as usize, 2)
        }
        241..=254 => {
            need(3)?;
            let b2 = bytes[1] as usize;
            let b3 = bytes[2] as usize;
            (12481 + (b1 - 241) * 65536 + b2 * 256 + b3, 3)
        }
        _ => {
            return Err(XrpError::Format(
                "0xFF is not a valid length prefix".to_string(),
            ))
        }
    };
    if length > MAX_VL_LENGTH {
        return Err(XrpError::Format(format!(
            "length prefix declares {} bytes, more than {}",
            length, MAX_VL_LENGTH
        )));
    }
    Ok((length, consumed))
}
