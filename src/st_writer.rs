//! Canonical ST serializer.
//!
//! Fields must be written in ascending `(type code, field code)` order inside
//! every object. Anything else is rejected with `ProtocolMismatch`.

use byteorder::{BigEndian, WriteBytesExt};

use crate::account::AccountId;
use crate::amount::Amount;
use crate::error::{Result, XrpError};
use crate::field::{encode_variable_length, FieldId, StTypeCode, ARRAY_END, OBJECT_END};
use crate::hash::{Hash128, Hash160, Hash256};
use crate::st_reader::{StObject, StValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Object,
    Array,
}

#[derive(Debug)]
struct Frame {
    container: Container,
    field: Option<FieldId>,
    last: Option<FieldId>,
}

#[derive(Debug)]
pub struct StWriter {
    buf: Vec<u8>,
    root: Frame,
    open: Vec<Frame>,
}

impl Default for StWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl StWriter {
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            root: Frame {
                container: Container::Object,
                field: None,
                last: None,
            },
            open: Vec::new(),
        }
    }

    /// Bytes written so far, possibly with containers still open.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    fn current(&mut self) -> &mut Frame {
        self.open.last_mut().unwrap_or(&mut self.root)
    }

    fn begin_field(&mut self, field: FieldId, type_code: StTypeCode) -> Result<()> {
        if field.type_code != type_code {
            return Err(XrpError::ProtocolMismatch(format!(
                "{} is a {:?} field, not {:?}",
                field, field.type_code, type_code
            )));
        }

        let frame = self.current();
        match frame.container {
            Container::Array if type_code != StTypeCode::Object => {
                return Err(XrpError::ProtocolMismatch(format!(
                    "array {} can only hold objects, got {}",
                    frame.field.map(|f| f.to_string()).unwrap_or_default(),
                    field
                )));
            }
            Container::Array => {}
            Container::Object => {
                if let Some(last) = frame.last {
                    if field <= last {
                        return Err(XrpError::ProtocolMismatch(format!(
                            "{} written after {}, fields must be in ascending canonical order",
                            field, last
                        )));
                    }
                }
            }
        }
        frame.last = Some(field);
        self.buf.extend(field.header());
        Ok(())
    }

    pub fn write_u8(&mut self, field: FieldId, value: u8) -> Result<()> {
        self.begin_field(field, StTypeCode::UInt8)?;
        self.buf.write_u8(value)?;
        Ok(())
    }

    pub fn write_u16(&mut self, field: FieldId, value: u16) -> Result<()> {
        self.begin_field(field, StTypeCode::UInt16)?;
        self.buf.write_u16::<BigEndian>(value)?;
        Ok(())
    }

    pub fn write_u32(&mut self, field: FieldId, value: u32) -> Result<()> {
        self.begin_field(field, StTypeCode::UInt32)?;
        self.buf.write_u32::<BigEndian>(value)?;
        Ok(())
    }

    pub fn write_u64(&mut self, field: FieldId, value: u64) -> Result<()> {
        self.begin_field(field, StTypeCode::UInt64)?;
        self.buf.write_u64::<BigEndian>(value)?;
        Ok(())
    }

    pub fn write_hash128(&mut self, field: FieldId, value: &Hash128) -> Result<()> {
        self.begin_field(field, StTypeCode::Hash128)?;
        self.buf.extend_from_slice(value.as_bytes());
        Ok(())
    }

    pub fn write_hash160(&mut self, field: FieldId, value: &Hash160) -> Result<()> {
        self.begin_field(field, StTypeCode::Hash160)?;
        self.buf.extend_from_slice(value.as_bytes());
        Ok(())
    }

    pub fn write_hash256(&mut self, field: FieldId, value: &Hash256) -> Result<()> {
        self.begin_field(field, StTypeCode::Hash256)?;
        self.buf.extend_from_slice(value.as_bytes());
        Ok(())
    }

    pub fn write_amount(&mut self, field: FieldId, value: &Amount) -> Result<()> {
        self.begin_field(field, StTypeCode::Amount)?;
        value.write_to(&mut self.buf)
    }

    pub fn write_blob(&mut self, field: FieldId, value: &[u8]) -> Result<()> {
        // length is checked before the header so a failure leaves no partial field
        let prefix = encode_variable_length(value.len())?;
        self.begin_field(field, StTypeCode::Blob)?;
        self.buf.extend(prefix);
        self.buf.extend_from_slice(value);
        Ok(())
    }

    pub fn write_account(&mut self, field: FieldId, value: &AccountId) -> Result<()> {
        self.begin_field(field, StTypeCode::AccountId)?;
        self.buf.push(AccountId::LEN as u8);
        self.buf.extend_from_slice(value.as_bytes());
        Ok(())
    }

    pub fn write_vector256(&mut self, field: FieldId, values: &[Hash256]) -> Result<()> {
        let prefix = encode_variable_length(values.len() * Hash256::LEN)?;
        self.begin_field(field, StTypeCode::Vector256)?;
        self.buf.extend(prefix);
        for value in values {
            self.buf.extend_from_slice(value.as_bytes());
        }
        Ok(())
    }

    pub fn start_object(&mut self, field: FieldId) -> Result<()> {
        self.begin_field(field, StTypeCode::Object)?;
        self.open.push(Frame {
            container: Container::Object,
            field: Some(field),
            last: None,
        });
        Ok(())
    }

    pub fn end_object(&mut self) -> Result<()> {
        self.close(Container::Object)?;
        self.buf.extend(OBJECT_END.header());
        Ok(())
    }

    pub fn start_array(&mut self, field: FieldId) -> Result<()> {
        self.begin_field(field, StTypeCode::Array)?;
        self.open.push(Frame {
            container: Container::Array,
            field: Some(field),
            last: None,
        });
        Ok(())
    }

    pub fn end_array(&mut self) -> Result<()> {
        self.close(Container::Array)?;
        self.buf.extend(ARRAY_END.header());
        Ok(())
    }

    fn close(&mut self, container: Container) -> Result<()> {
        match self.open.last() {
            Some(frame) if frame.container == container => {
                self.open.pop();
                Ok(())
            }
            Some(frame) => Err(XrpError::ProtocolMismatch(format!(
                "can not close {:?} while {:?} {} is open",
                container,
                frame.container,
                frame.field.map(|f| f.to_string()).unwrap_or_default()
            ))),
            None => Err(XrpError::ProtocolMismatch(format!(
                "no {:?} is open",
                container
            ))),
        }
    }

    /// Writes every field of `object` in its stored order.
    pub fn write_object_fields(&mut self, object: &StObject) -> Result<()> {
        for (field, value) in object.iter() {
            self.write_value(*field, value)?;
        }
        Ok(())
    }

    pub fn write_value(&mut self, field: FieldId, value: &StValue) -> Result<()> {
        match value {
            StValue::UInt8(v) => self.write_u8(field, *v),
            StValue::UInt16(v) => self.write_u16(field, *v),
            StValue::UInt32(v) => self.write_u32(field, *v),
            StValue::UInt64(v) => self.write_u64(field, *v),
            StValue::Hash128(v) => self.write_hash128(field, v),
            StValue::Hash160(v) => self.write_hash160(field, v),
            StValue::Hash256(v) => self.write_hash256(field, v),
            StValue::Amount(v) => self.write_amount(field, v),
            StValue::Blob(v) => self.write_blob(field, v),
            StValue::AccountId(v) => self.write_account(field, v),
            StValue::Vector256(v) => self.write_vector256(field, v),
            StValue::Object(object) => {
                self.start_object(field)?;
                self.write_object_fields(object)?;
                self.end_object()
            }
            StValue::Array(entries) => {
                self.start_array(field)?;
                for (entry_field, object) in entries {
                    self.start_object(*entry_field)?;
                    self.write_object_fields(object)?;
                    self.end_object()?;
                }
                self.end_array()
            }
        }
    }

    /// Returns the serialized bytes. Every object and array must be closed.
    pub fn finish(self) -> Result<Vec<u8>> {
        if let Some(frame) = self.open.last() {
            return Err(XrpError::ProtocolMismatch(format!(
                "{:?} {} was never closed",
                frame.container,
                frame.field.map(|f| f.to_string()).unwrap_or_default()
            )));
        }
        Ok(self.buf)
    }
}
