//! Fixed-schema ledger structures.

use std::io::{Cursor, Read};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::account::AccountId;
use crate::constant::{LEDGER_HEADER_PREFIX, RIPPLE_EPOCH_OFFSET};
use crate::error::{Result, XrpError};
use crate::field::{FieldId, NFTOKEN, NFTOKEN_ID, URI};
use crate::hash::Hash256;
use crate::st_reader::{StObject, StReader, StValue};
use crate::st_writer::StWriter;

/// Seconds since the Ripple epoch to seconds since the Unix epoch.
pub fn ripple_to_unix(ripple_time: u32) -> u64 {
    ripple_time as u64 + RIPPLE_EPOCH_OFFSET
}

/// Seconds since the Unix epoch to seconds since the Ripple epoch.
pub fn unix_to_ripple(unix_time: u64) -> Result<u32> {
    unix_time
        .checked_sub(RIPPLE_EPOCH_OFFSET)
        .and_then(|t| u32::try_from(t).ok())
        .ok_or_else(|| {
            XrpError::Range(format!(
                "unix time {} is outside the Ripple epoch range",
                unix_time
            ))
        })
}

/// Header of a closed ledger, in the order it is hashed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerHeader {
    pub sequence: u32,
    /// XRP in existence, in drops.
    pub total_coins: u64,
    pub parent_hash: Hash256,
    pub transaction_hash: Hash256,
    pub account_hash: Hash256,
    /// Ripple-epoch seconds.
    pub parent_close_time: u32,
    /// Ripple-epoch seconds.
    pub close_time: u32,
    pub close_time_resolution: u8,
    pub close_flags: u8,
}

impl LedgerHeader {
    pub const LEN: usize = 4 + 8 + 3 * Hash256::LEN + 4 + 4 + 1 + 1;

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(Self::LEN);
        out.write_u32::<BigEndian>(self.sequence)?;
        out.write_u64::<BigEndian>(self.total_coins)?;
        out.extend_from_slice(self.parent_hash.as_bytes());
        out.extend_from_slice(self.transaction_hash.as_bytes());
        out.extend_from_slice(self.account_hash.as_bytes());
        out.write_u32::<BigEndian>(self.parent_close_time)?;
        out.write_u32::<BigEndian>(self.close_time)?;
        out.write_u8(self.close_time_resolution)?;
        out.write_u8(self.close_flags)?;
        Ok(out)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != Self::LEN {
            return Err(XrpError::Format(format!(
                "ledger header is {} bytes, got {}",
                Self::LEN,
                bytes.len()
            )));
        }
        let mut cursor = Cursor::new(bytes);
        let sequence = cursor.read_u32::<BigEndian>()?;
        let total_coins = cursor.read_u64::<BigEndian>()?;
        let mut read_hash = || -> Result<Hash256> {
            let mut hash = [0u8; Hash256::LEN];
            cursor.read_exact(&mut hash)?;
            Ok(Hash256::new(hash))
        };
        let parent_hash = read_hash()?;
        let transaction_hash = read_hash()?;
        let account_hash = read_hash()?;
        Ok(Self {
            sequence,
            total_coins,
            parent_hash,
            transaction_hash,
            account_hash,
            parent_close_time: cursor.read_u32::<BigEndian>()?,
            close_time: cursor.read_u32::<BigEndian>()?,
            close_time_resolution: cursor.read_u8()?,
            close_flags: cursor.read_u8()?,
        })
    }

    /// Half-SHA512 of `LWR\0 ‖ header`.
    pub fn hash(&self) -> Result<Hash256> {
        Ok(Hash256::digest(
            &[&LEDGER_HEADER_PREFIX[..], &self.to_bytes()?].concat(),
        ))
    }

    pub fn close_time_unix(&self) -> u64 {
        ripple_to_unix(self.close_time)
    }

    pub fn parent_close_time_unix(&self) -> u64 {
        ripple_to_unix(self.parent_close_time)
    }
}

/// An `NFToken` inner object: `NFTokenID` then `URI`, nothing else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NFToken {
    pub nftoken_id: Hash256,
    pub uri: Vec<u8>,
}

impl NFToken {
    pub fn write(&self, writer: &mut StWriter) -> Result<()> {
        writer.start_object(NFTOKEN)?;
        writer.write_hash256(NFTOKEN_ID, &self.nftoken_id)?;
        writer.write_blob(URI, &self.uri)?;
        writer.end_object()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = StWriter::new();
        self.write(&mut writer)?;
        writer.finish()
    }

    /// Reads one wrapped `NFToken` object, which must span all of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = StReader::new(bytes);
        let (field, value) = reader.read_field()?;
        if !reader.is_empty() {
            return Err(XrpError::ProtocolMismatch(format!(
                "{} trailing bytes after NFToken",
                reader.remaining()
            )));
        }
        match value {
            StValue::Object(object) => Self::from_st(field, object),
            _ => Err(XrpError::ProtocolMismatch(format!(
                "expected NFToken, got {}",
                field
            ))),
        }
    }

    pub fn from_st(field: FieldId, object: StObject) -> Result<Self> {
        if field != NFTOKEN {
            return Err(XrpError::ProtocolMismatch(format!(
                "expected NFToken, got {}",
                field
            )));
        }
        let mut fields = object.iter();
        let token = match (fields.next(), fields.next(), fields.next()) {
            (
                Some((NFTOKEN_ID, StValue::Hash256(id))),
                Some((URI, StValue::Blob(uri))),
                None,
            ) => Self {
                nftoken_id: *id,
                uri: uri.clone(),
            },
            _ => {
                return Err(XrpError::ProtocolMismatch(
                    "NFToken must hold exactly NFTokenID then URI".to_string(),
                ))
            }
        };
        Ok(token)
    }

    pub fn flags(&self) -> u16 {
        u16::from_be_bytes([self.id()[0], self.id()[1]])
    }

    /// In units of 1/100,000.
    pub fn transfer_fee(&self) -> u16 {
        u16::from_be_bytes([self.id()[2], self.id()[3]])
    }

    pub fn issuer(&self) -> AccountId {
        let mut issuer = [0u8; AccountId::LEN];
        issuer.copy_from_slice(&self.id()[4..24]);
        AccountId::new(issuer)
    }

    pub fn sequence(&self) -> u32 {
        self.word(28)
    }

    /// The taxon, with the per-sequence scrambling removed.
    pub fn taxon(&self) -> u32 {
        let mask = 384_160_001u32
            .wrapping_mul(self.sequence())
            .wrapping_add(2459);
        self.word(24) ^ mask
    }

    fn id(&self) -> &[u8; 32] {
        self.nftoken_id.as_bytes()
    }

    fn word(&self, at: usize) -> u32 {
        let id = self.id();
        u32::from_be_bytes([id[at], id[at + 1], id[at + 2], id[at + 3]])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::MEMO;
    use crate::hash::sha512_half;

    fn header() -> LedgerHeader {
        LedgerHeader {
            sequence: 7,
            total_coins: 99_999_999_999_999_997,
            parent_hash: Hash256::new([0x11; 32]),
            transaction_hash: Hash256::new([0x22; 32]),
            account_hash: Hash256::new([0x33; 32]),
            parent_close_time: 10,
            close_time: 20,
            close_time_resolution: 30,
            close_flags: 0,
        }
    }

    #[test]
    fn header_layout_and_hash() {
        let header = header();
        let bytes = header.to_bytes().unwrap();
        assert_eq!(bytes.len(), LedgerHeader::LEN);
        assert_eq!(&bytes[..4], &[0, 0, 0, 7]);
        assert_eq!(&bytes[12..44], &[0x11; 32]);
        assert_eq!(&bytes[108..112], &[0, 0, 0, 10]);
        assert_eq!(bytes[116], 30);

        let mut prefixed = LEDGER_HEADER_PREFIX.to_vec();
        prefixed.extend(&bytes);
        assert_eq!(header.hash().unwrap(), Hash256::new(sha512_half(&prefixed)));
        assert_eq!(LedgerHeader::from_bytes(&bytes).unwrap(), header);
        assert!(LedgerHeader::from_bytes(&bytes[1..]).is_err());
    }

    #[test]
    fn ripple_epoch_conversion() {
        assert_eq!(ripple_to_unix(0), 946_684_800);
        assert_eq!(header().close_time_unix(), 946_684_820);
        assert_eq!(unix_to_ripple(946_684_801).unwrap(), 1);
        assert!(matches!(unix_to_ripple(0), Err(XrpError::Range(_))));
        assert!(unix_to_ripple(946_684_800 + u32::MAX as u64 + 1).is_err());
    }

    fn nftoken_id() -> Hash256 {
        // Flags 8, fee 314, issuer rHb9..., scrambled taxon, sequence 5.
        let mut id = [0u8; 32];
        id[..2].copy_from_slice(&8u16.to_be_bytes());
        id[2..4].copy_from_slice(&314u16.to_be_bytes());
        let issuer = hex::decode("B5F762798A53D543A014CAF8B297CFF8F2F937E8").unwrap();
        id[4..24].copy_from_slice(&issuer);
        let mask = 384_160_001u32.wrapping_mul(5).wrapping_add(2459);
        id[24..28].copy_from_slice(&(42 ^ mask).to_be_bytes());
        id[28..].copy_from_slice(&5u32.to_be_bytes());
        Hash256::new(id)
    }

    #[test]
    fn nftoken_round_trip_and_id_fields() {
        let token = NFToken {
            nftoken_id: nftoken_id(),
            uri: b"ipfs://token".to_vec(),
        };
        let bytes = token.to_bytes().unwrap();
        assert_eq!(bytes[0], 0xEC);
        assert_eq!(bytes[1], 0x5A);
        assert_eq!(*bytes.last().unwrap(), 0xE1);
        assert_eq!(NFToken::from_bytes(&bytes).unwrap(), token);

        assert_eq!(token.flags(), 8);
        assert_eq!(token.transfer_fee(), 314);
        assert_eq!(
            token.issuer().to_string(),
            "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh"
        );
        assert_eq!(token.sequence(), 5);
        assert_eq!(token.taxon(), 42);
    }

    #[test]
    fn nftoken_schema_is_strict() {
        let mut missing_uri = StObject::new();
        missing_uri.push(NFTOKEN_ID, StValue::Hash256(nftoken_id()));
        assert!(matches!(
            NFToken::from_st(NFTOKEN, missing_uri.clone()),
            Err(XrpError::ProtocolMismatch(_))
        ));

        let mut extra = missing_uri.clone();
        extra.push(URI, StValue::Blob(vec![1]));
        extra.push(MEMO, StValue::Object(StObject::new()));
        assert!(NFToken::from_st(NFTOKEN, extra).is_err());

        let mut valid = missing_uri;
        valid.push(URI, StValue::Blob(vec![1]));
        assert!(NFToken::from_st(MEMO, valid.clone()).is_err());
        assert!(NFToken::from_st(NFTOKEN, valid).is_ok());
    }
}
