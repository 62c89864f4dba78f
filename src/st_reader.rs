//! ST deserializer and the generic object model it produces.

use byteorder::{BigEndian, ByteOrder};

use crate::account::AccountId;
use crate::amount::{Amount, IssuedAmount, XrpAmount};
use crate::error::{Result, XrpError};
use crate::field::{decode_variable_length, FieldId, StTypeCode, ARRAY_END, OBJECT_END};
use crate::hash::{Hash128, Hash160, Hash256};
use crate::st_writer::StWriter;

/// Nesting limit for objects and arrays.
const MAX_DEPTH: usize = 16;

/// A decoded field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StValue {
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Hash128(Hash128),
    Hash160(Hash160),
    Hash256(Hash256),
    Amount(Amount),
    Blob(Vec<u8>),
    AccountId(AccountId),
    Vector256(Vec<Hash256>),
    Object(StObject),
    /// Array entries, each a wrapped inner object.
    Array(Vec<(FieldId, StObject)>),
}

impl StValue {
    fn kind(&self) -> &'static str {
        match self {
            StValue::UInt8(_) => "UInt8",
            StValue::UInt16(_) => "UInt16",
            StValue::UInt32(_) => "UInt32",
            StValue::UInt64(_) => "UInt64",
            StValue::Hash128(_) => "Hash128",
            StValue::Hash160(_) => "Hash160",
            StValue::Hash256(_) => "Hash256",
            StValue::Amount(_) => "Amount",
            StValue::Blob(_) => "Blob",
            StValue::AccountId(_) => "AccountID",
            StValue::Vector256(_) => "Vector256",
            StValue::Object(_) => "STObject",
            StValue::Array(_) => "STArray",
        }
    }
}

/// Fields of one object in wire order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StObject {
    fields: Vec<(FieldId, StValue)>,
}

macro_rules! take_typed {
    ($($name:ident => $variant:ident($ty:ty);)*) => {
        $(
            pub fn $name(&mut self, field: FieldId) -> Result<Option<$ty>> {
                match self.take(field) {
                    None => Ok(None),
                    Some(StValue::$variant(value)) => Ok(Some(value)),
                    Some(other) => Err(XrpError::ProtocolMismatch(format!(
                        "{} holds a {} value",
                        field,
                        other.kind()
                    ))),
                }
            }
        )*
    };
}

impl StObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        StReader::new(bytes).read_object()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = StWriter::new();
        writer.write_object_fields(self)?;
        writer.finish()
    }

    /// Appends a field; order is only checked on serialization.
    pub fn push(&mut self, field: FieldId, value: StValue) {
        self.fields.push((field, value));
    }

    pub fn get(&self, field: FieldId) -> Option<&StValue> {
        self.fields
            .iter()
            .find(|(id, _)| *id == field)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, field: FieldId) -> bool {
        self.get(field).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(FieldId, StValue)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn take(&mut self, field: FieldId) -> Option<StValue> {
        let index = self.fields.iter().position(|(id, _)| *id == field)?;
        Some(self.fields.remove(index).1)
    }

    take_typed! {
        take_u8 => UInt8(u8);
        take_u16 => UInt16(u16);
        take_u32 => UInt32(u32);
        take_u64 => UInt64(u64);
        take_hash128 => Hash128(Hash128);
        take_hash160 => Hash160(Hash160);
        take_hash256 => Hash256(Hash256);
        take_amount => Amount(Amount);
        take_blob => Blob(Vec<u8>);
        take_account => AccountId(AccountId);
        take_vector256 => Vector256(Vec<Hash256>);
        take_object => Object(StObject);
        take_array => Array(Vec<(FieldId, StObject)>);
    }

    /// Fails if any field was left untaken.
    pub fn finish(self, context: &str) -> Result<()> {
        match self.fields.first() {
            None => Ok(()),
            Some((field, _)) => Err(XrpError::ProtocolMismatch(format!(
                "unexpected field {} in {}",
                field, context
            ))),
        }
    }
}

/// Turns a missing required field into a `ProtocolMismatch`.
pub fn required<T>(value: Option<T>, field: FieldId) -> Result<T> {
    value.ok_or_else(|| XrpError::ProtocolMismatch(format!("missing required field {}", field)))
}

/// Cursor over ST bytes.
///
/// A failed read leaves the cursor where it was. `try_read_*` turn a short
/// buffer into `Ok(None)` so callers can wait for more input.
#[derive(Debug, Clone)]
pub struct StReader<'a> {
    data: &'a [u8],
    pos: usize,
}

macro_rules! try_read {
    ($($try_name:ident => $name:ident -> $ty:ty;)*) => {
        $(
            pub fn $try_name(&mut self) -> Result<Option<$ty>> {
                match self.$name() {
                    Ok(value) => Ok(Some(value)),
                    Err(XrpError::TruncatedData { .. }) => Ok(None),
                    Err(e) => Err(e),
                }
            }
        )*
    };
}

impl<'a> StReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn atomic<T>(&mut self, read: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let start = self.pos;
        let result = read(self);
        if result.is_err() {
            self.pos = start;
        }
        result
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(XrpError::TruncatedData {
                needed: n,
                available: self.remaining(),
            });
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn peek(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(BigEndian::read_u16(self.take(2)?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(BigEndian::read_u32(self.take(4)?))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(BigEndian::read_u64(self.take(8)?))
    }

    pub fn read_hash128(&mut self) -> Result<Hash128> {
        Hash128::from_slice(self.take(Hash128::LEN)?)
    }

    pub fn read_hash160(&mut self) -> Result<Hash160> {
        Hash160::from_slice(self.take(Hash160::LEN)?)
    }

    pub fn read_hash256(&mut self) -> Result<Hash256> {
        Hash256::from_slice(self.take(Hash256::LEN)?)
    }

    pub fn read_amount(&mut self) -> Result<Amount> {
        self.atomic(|r| {
            let header = BigEndian::read_u64(r.take(8)?);
            if Amount::is_issued_header(header) {
                r.pos -= 8;
                let bytes = r.take(IssuedAmount::LEN)?;
                Ok(Amount::Issued(IssuedAmount::from_bytes(bytes)?))
            } else {
                Ok(Amount::Xrp(XrpAmount::from_u64_bits(header)?))
            }
        })
    }

    pub fn read_variable_length(&mut self) -> Result<usize> {
        let (length, consumed) = decode_variable_length(self.peek())?;
        self.pos += consumed;
        Ok(length)
    }

    pub fn read_blob(&mut self) -> Result<Vec<u8>> {
        self.atomic(|r| {
            let length = r.read_variable_length()?;
            Ok(r.take(length)?.to_vec())
        })
    }

    pub fn read_account(&mut self) -> Result<AccountId> {
        self.atomic(|r| {
            let length = r.read_variable_length()?;
            if length != AccountId::LEN {
                return Err(XrpError::Format(format!(
                    "account field declares {} bytes, expected {}",
                    length,
                    AccountId::LEN
                )));
            }
            AccountId::from_slice(r.take(length)?)
        })
    }

    pub fn read_vector256(&mut self) -> Result<Vec<Hash256>> {
        self.atomic(|r| {
            let length = r.read_variable_length()?;
            if length % Hash256::LEN != 0 {
                return Err(XrpError::Format(format!(
                    "Vector256 length {} is not a multiple of {}",
                    length,
                    Hash256::LEN
                )));
            }
            r.take(length)?
                .chunks_exact(Hash256::LEN)
                .map(Hash256::from_slice)
                .collect()
        })
    }

    pub fn read_field_id(&mut self) -> Result<FieldId> {
        let (field, consumed) = FieldId::decode_header(self.peek())?;
        self.pos += consumed;
        Ok(field)
    }

    try_read! {
        try_read_u8 => read_u8 -> u8;
        try_read_u16 => read_u16 -> u16;
        try_read_u32 => read_u32 -> u32;
        try_read_u64 => read_u64 -> u64;
        try_read_hash128 => read_hash128 -> Hash128;
        try_read_hash160 => read_hash160 -> Hash160;
        try_read_hash256 => read_hash256 -> Hash256;
        try_read_amount => read_amount -> Amount;
        try_read_blob => read_blob -> Vec<u8>;
        try_read_account => read_account -> AccountId;
        try_read_vector256 => read_vector256 -> Vec<Hash256>;
        try_read_field_id => read_field_id -> FieldId;
        try_read_field => read_field -> (FieldId, StValue);
    }

    /// Reads one complete field: header plus value.
    pub fn read_field(&mut self) -> Result<(FieldId, StValue)> {
        self.atomic(|r| r.read_field_at(0))
    }

    fn read_field_at(&mut self, depth: usize) -> Result<(FieldId, StValue)> {
        let field = self.read_field_id()?;
        if field == OBJECT_END || field == ARRAY_END {
            return Err(XrpError::ProtocolMismatch(format!(
                "unexpected {} outside a container",
                field
            )));
        }
        let value = self.read_value(field, depth)?;
        Ok((field, value))
    }

    fn read_value(&mut self, field: FieldId, depth: usize) -> Result<StValue> {
        Ok(match field.type_code {
            StTypeCode::UInt8 => StValue::UInt8(self.read_u8()?),
            StTypeCode::UInt16 => StValue::UInt16(self.read_u16()?),
            StTypeCode::UInt32 => StValue::UInt32(self.read_u32()?),
            StTypeCode::UInt64 => StValue::UInt64(self.read_u64()?),
            StTypeCode::Hash128 => StValue::Hash128(self.read_hash128()?),
            StTypeCode::Hash160 => StValue::Hash160(self.read_hash160()?),
            StTypeCode::Hash256 => StValue::Hash256(self.read_hash256()?),
            StTypeCode::Amount => StValue::Amount(self.read_amount()?),
            StTypeCode::Blob => StValue::Blob(self.read_blob()?),
            StTypeCode::AccountId => StValue::AccountId(self.read_account()?),
            StTypeCode::Vector256 => StValue::Vector256(self.read_vector256()?),
            StTypeCode::Object => StValue::Object(self.read_inner_object(depth + 1)?),
            StTypeCode::Array => StValue::Array(self.read_array(depth + 1)?),
            StTypeCode::PathSet => {
                return Err(XrpError::ProtocolMismatch(format!(
                    "{} is a PathSet, which is not supported",
                    field
                )))
            }
        })
    }

    fn check_depth(depth: usize) -> Result<()> {
        if depth > MAX_DEPTH {
            return Err(XrpError::ProtocolMismatch(format!(
                "containers nested deeper than {}",
                MAX_DEPTH
            )));
        }
        Ok(())
    }

    fn push_ordered(object: &mut StObject, field: FieldId, value: StValue) -> Result<()> {
        if let Some((last, _)) = object.fields.last() {
            if field <= *last {
                return Err(XrpError::ProtocolMismatch(format!(
                    "{} follows {}, fields are not in canonical order",
                    field, last
                )));
            }
        }
        object.push(field, value);
        Ok(())
    }

    fn read_inner_object(&mut self, depth: usize) -> Result<StObject> {
        Self::check_depth(depth)?;
        let mut object = StObject::new();
        loop {
            let field = self.read_field_id()?;
            if field == OBJECT_END {
                return Ok(object);
            }
            if field == ARRAY_END {
                return Err(XrpError::ProtocolMismatch(
                    "array end marker inside an object".to_string(),
                ));
            }
            let value = self.read_value(field, depth)?;
            Self::push_ordered(&mut object, field, value)?;
        }
    }

    fn read_array(&mut self, depth: usize) -> Result<Vec<(FieldId, StObject)>> {
        Self::check_depth(depth)?;
        let mut entries = Vec::new();
        loop {
            let field = self.read_field_id()?;
            if field == ARRAY_END {
                return Ok(entries);
            }
            if field.type_code != StTypeCode::Object || field == OBJECT_END {
                return Err(XrpError::ProtocolMismatch(format!(
                    "array entries must be objects, got {}",
                    field
                )));
            }
            entries.push((field, self.read_inner_object(depth + 1)?));
        }
    }

    /// Reads fields until the end of input as one top-level object.
    pub fn read_object(&mut self) -> Result<StObject> {
        self.atomic(|r| {
            let mut object = StObject::new();
            while !r.is_empty() {
                let (field, value) = r.read_field_at(0)?;
                Self::push_ordered(&mut object, field, value)?;
            }
            Ok(object)
        })
    }
}
