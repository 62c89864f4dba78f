//! Transaction type discriminator and the inner objects transactions carry.

use std::fmt;
use std::str::FromStr;

use serde_json::{json, Map, Value};

use crate::account::AccountId;
use crate::amount::Amount;
use crate::error::{Result, XrpError};
use crate::field::{
    FieldId, ACCOUNT, MEMO, MEMO_DATA, MEMO_FORMAT, MEMO_TYPE, SIGNER, SIGNER_ENTRY,
    SIGNER_WEIGHT, SIGNING_PUB_KEY, TXN_SIGNATURE,
};
use crate::st_reader::{required, StObject};
use crate::st_writer::StWriter;

/// Closed set of supported transaction types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionType {
    Payment,
    AccountSet,
    SetRegularKey,
    OfferCreate,
    OfferCancel,
    SignerListSet,
    TrustSet,
    AccountDelete,
}

impl TransactionType {
    pub fn code(self) -> u16 {
        match self {
            TransactionType::Payment => 0,
            TransactionType::AccountSet => 3,
            TransactionType::SetRegularKey => 5,
            TransactionType::OfferCreate => 7,
            TransactionType::OfferCancel => 8,
            TransactionType::SignerListSet => 12,
            TransactionType::TrustSet => 20,
            TransactionType::AccountDelete => 21,
        }
    }

    pub fn from_code(code: u16) -> Result<Self> {
        Ok(match code {
            0 => TransactionType::Payment,
            3 => TransactionType::AccountSet,
            5 => TransactionType::SetRegularKey,
            7 => TransactionType::OfferCreate,
            8 => TransactionType::OfferCancel,
            12 => TransactionType::SignerListSet,
            20 => TransactionType::TrustSet,
            21 => TransactionType::AccountDelete,
            _ => {
                return Err(XrpError::ProtocolMismatch(format!(
                    "unsupported transaction type code {}",
                    code
                )))
            }
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            TransactionType::Payment => "Payment",
            TransactionType::AccountSet => "AccountSet",
            TransactionType::SetRegularKey => "SetRegularKey",
            TransactionType::OfferCreate => "OfferCreate",
            TransactionType::OfferCancel => "OfferCancel",
            TransactionType::SignerListSet => "SignerListSet",
            TransactionType::TrustSet => "TrustSet",
            TransactionType::AccountDelete => "AccountDelete",
        }
    }
}

impl FromStr for TransactionType {
    type Err = XrpError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "Payment" => TransactionType::Payment,
            "AccountSet" => TransactionType::AccountSet,
            "SetRegularKey" => TransactionType::SetRegularKey,
            "OfferCreate" => TransactionType::OfferCreate,
            "OfferCancel" => TransactionType::OfferCancel,
            "SignerListSet" => TransactionType::SignerListSet,
            "TrustSet" => TransactionType::TrustSet,
            "AccountDelete" => TransactionType::AccountDelete,
            _ => {
                return Err(XrpError::ProtocolMismatch(format!(
                    "unsupported TransactionType '{}'",
                    s
                )))
            }
        })
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Typed access to the fields of a rippled-style JSON object.
pub(crate) struct JsonFields<'a> {
    object: &'a Map<String, Value>,
    context: &'a str,
}

impl<'a> JsonFields<'a> {
    pub fn new(value: &'a Value, context: &'a str) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| XrpError::Format(format!("{} must be a JSON object", context)))?;
        Ok(Self { object, context })
    }

    fn invalid(&self, key: &str, expected: &str) -> XrpError {
        XrpError::Format(format!("{}.{} must be {}", self.context, key, expected))
    }

    pub fn require<T>(&self, key: &str, value: Option<T>) -> Result<T> {
        value.ok_or_else(|| {
            XrpError::Format(format!("{} is missing required '{}'", self.context, key))
        })
    }

    pub fn str(&self, key: &str) -> Result<Option<&'a str>> {
        match self.object.get(key) {
            None => Ok(None),
            Some(value) => value
                .as_str()
                .map(Some)
                .ok_or_else(|| self.invalid(key, "a string")),
        }
    }

    pub fn parse<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr<Err = XrpError>,
    {
        self.str(key)?.map(str::parse).transpose()
    }

    pub fn uint(&self, key: &str, max: u64) -> Result<Option<u64>> {
        match self.object.get(key) {
            None => Ok(None),
            Some(value) => value
                .as_u64()
                .filter(|v| *v <= max)
                .map(Some)
                .ok_or_else(|| self.invalid(key, &format!("an integer no larger than {}", max))),
        }
    }

    pub fn u32(&self, key: &str) -> Result<Option<u32>> {
        Ok(self.uint(key, u32::MAX as u64)?.map(|v| v as u32))
    }

    pub fn u16(&self, key: &str) -> Result<Option<u16>> {
        Ok(self.uint(key, u16::MAX as u64)?.map(|v| v as u16))
    }

    pub fn u8(&self, key: &str) -> Result<Option<u8>> {
        Ok(self.uint(key, u8::MAX as u64)?.map(|v| v as u8))
    }

    pub fn hex(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.str(key)?.map(hex::decode).transpose()?)
    }

    pub fn amount(&self, key: &str) -> Result<Option<Amount>> {
        self.object.get(key).map(Amount::from_json).transpose()
    }

    /// Entries of an array of single-key wrapper objects, e.g. `[{"Memo": {...}}]`.
    pub fn wrapped_array(&self, key: &str, wrapper: &str) -> Result<Vec<&'a Value>> {
        let Some(value) = self.object.get(key) else {
            return Ok(Vec::new());
        };
        let entries = value
            .as_array()
            .ok_or_else(|| self.invalid(key, "an array"))?;
        entries
            .iter()
            .map(|entry| {
                entry.get(wrapper).ok_or_else(|| {
                    self.invalid(key, &format!("a list of {{\"{}\": ...}}", wrapper))
                })
            })
            .collect()
    }
}

fn hex_upper(bytes: &[u8]) -> Value {
    Value::String(hex::encode_upper(bytes))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Memo {
    pub memo_type: Option<Vec<u8>>,
    pub memo_data: Option<Vec<u8>>,
    pub memo_format: Option<Vec<u8>>,
}

impl Memo {
    pub fn write(&self, writer: &mut StWriter) -> Result<()> {
        writer.start_object(MEMO)?;
        if let Some(memo_type) = &self.memo_type {
            writer.write_blob(MEMO_TYPE, memo_type)?;
        }
        if let Some(memo_data) = &self.memo_data {
            writer.write_blob(MEMO_DATA, memo_data)?;
        }
        if let Some(memo_format) = &self.memo_format {
            writer.write_blob(MEMO_FORMAT, memo_format)?;
        }
        writer.end_object()
    }

    pub fn from_st(field: FieldId, mut object: StObject) -> Result<Self> {
        expect_wrapper(field, MEMO)?;
        let memo = Self {
            memo_type: object.take_blob(MEMO_TYPE)?,
            memo_data: object.take_blob(MEMO_DATA)?,
            memo_format: object.take_blob(MEMO_FORMAT)?,
        };
        object.finish("Memo")?;
        Ok(memo)
    }

    pub fn to_json(&self) -> Value {
        let mut memo = Map::new();
        if let Some(memo_type) = &self.memo_type {
            memo.insert("MemoType".into(), hex_upper(memo_type));
        }
        if let Some(memo_data) = &self.memo_data {
            memo.insert("MemoData".into(), hex_upper(memo_data));
        }
        if let Some(memo_format) = &self.memo_format {
            memo.insert("MemoFormat".into(), hex_upper(memo_format));
        }
        json!({ "Memo": memo })
    }

    pub fn from_json(value: &Value) -> Result<Self> {
        let fields = JsonFields::new(value, "Memo")?;
        Ok(Self {
            memo_type: fields.hex("MemoType")?,
            memo_data: fields.hex("MemoData")?,
            memo_format: fields.hex("MemoFormat")?,
        })
    }
}

/// One signature of a multi-signed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signer {
    pub account: AccountId,
    pub signing_pub_key: Vec<u8>,
    pub txn_signature: Vec<u8>,
}

impl Signer {
    pub fn write(&self, writer: &mut StWriter) -> Result<()> {
        writer.start_object(SIGNER)?;
        writer.write_blob(SIGNING_PUB_KEY, &self.signing_pub_key)?;
        writer.write_blob(TXN_SIGNATURE, &self.txn_signature)?;
        writer.write_account(ACCOUNT, &self.account)?;
        writer.end_object()
    }

    pub fn from_st(field: FieldId, mut object: StObject) -> Result<Self> {
        expect_wrapper(field, SIGNER)?;
        let signer = Self {
            signing_pub_key: required(object.take_blob(SIGNING_PUB_KEY)?, SIGNING_PUB_KEY)?,
            txn_signature: required(object.take_blob(TXN_SIGNATURE)?, TXN_SIGNATURE)?,
            account: required(object.take_account(ACCOUNT)?, ACCOUNT)?,
        };
        object.finish("Signer")?;
        Ok(signer)
    }

    pub fn to_json(&self) -> Value {
        json!({
            "Signer": {
                "Account": self.account.to_string(),
                "SigningPubKey": hex::encode_upper(&self.signing_pub_key),
                "TxnSignature": hex::encode_upper(&self.txn_signature),
            }
        })
    }

    pub fn from_json(value: &Value) -> Result<Self> {
        let fields = JsonFields::new(value, "Signer")?;
        Ok(Self {
            account: fields.require("Account", fields.parse("Account")?)?,
            signing_pub_key: fields.require("SigningPubKey", fields.hex("SigningPubKey")?)?,
            txn_signature: fields.require("TxnSignature", fields.hex("TxnSignature")?)?,
        })
    }
}

/// Member of a signer list and its weight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerEntry {
    pub account: AccountId,
    pub signer_weight: u16,
}

impl SignerEntry {
    pub fn write(&self, writer: &mut StWriter) -> Result<()> {
        writer.start_object(SIGNER_ENTRY)?;
        writer.write_u16(SIGNER_WEIGHT, self.signer_weight)?;
        writer.write_account(ACCOUNT, &self.account)?;
        writer.end_object()
    }

    pub fn from_st(field: FieldId, mut object: StObject) -> Result<Self> {
        expect_wrapper(field, SIGNER_ENTRY)?;
        let entry = Self {
            signer_weight: required(object.take_u16(SIGNER_WEIGHT)?, SIGNER_WEIGHT)?,
            account: required(object.take_account(ACCOUNT)?, ACCOUNT)?,
        };
        object.finish("SignerEntry")?;
        Ok(entry)
    }

    pub fn to_json(&self) -> Value {
        json!({
            "SignerEntry": {
                "Account": self.account.to_string(),
                "SignerWeight": self.signer_weight,
            }
        })
    }

    pub fn from_json(value: &Value) -> Result<Self> {
        let fields = JsonFields::new(value, "SignerEntry")?;
        Ok(Self {
            account: fields.require("Account", fields.parse("Account")?)?,
            signer_weight: fields.require("SignerWeight", fields.u16("SignerWeight")?)?,
        })
    }
}

fn expect_wrapper(found: FieldId, expected: FieldId) -> Result<()> {
    if found != expected {
        return Err(XrpError::ProtocolMismatch(format!(
            "expected a {} entry, found {}",
            expected, found
        )));
    }
    Ok(())
}
