//! XRP and issued-currency amounts.

use std::fmt;
use std::str::FromStr;

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};
use serde_json::{json, Value};

use crate::account::AccountId;
use crate::constant::{DROPS_PER_XRP, MAX_DROPS};
use crate::currency::{Currency, CurrencyCode};
use crate::error::{Result, XrpError};

const ISSUED_BIT: u64 = 0x8000_0000_0000_0000;
const POSITIVE_BIT: u64 = 0x4000_0000_0000_0000;
const DROPS_MASK: u64 = 0x3FFF_FFFF_FFFF_FFFF;

/// Native XRP, counted in drops.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct XrpAmount(i64);

impl XrpAmount {
    pub const ZERO: XrpAmount = XrpAmount(0);
    /// Encoded length in the binary format.
    pub const LEN: usize = 8;

    pub fn from_drops(drops: i64) -> Result<Self> {
        if drops.unsigned_abs() > MAX_DROPS {
            return Err(XrpError::Range(format!(
                "{} drops exceeds the {} drop limit",
                drops, MAX_DROPS
            )));
        }
        Ok(Self(drops))
    }

    pub fn drops(&self) -> i64 {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn to_u64_bits(&self) -> u64 {
        let magnitude = self.0.unsigned_abs();
        if self.0 >= 0 {
            magnitude | POSITIVE_BIT
        } else {
            magnitude
        }
    }

    pub fn from_u64_bits(bits: u64) -> Result<Self> {
        if bits & ISSUED_BIT != 0 {
            return Err(XrpError::ProtocolMismatch(
                "expected an XRP amount but found an issued amount".to_string(),
            ));
        }
        let magnitude = bits & DROPS_MASK;
        if magnitude > MAX_DROPS {
            return Err(XrpError::Range(format!(
                "{} drops exceeds the {} drop limit",
                magnitude, MAX_DROPS
            )));
        }
        if magnitude == 0 && bits & POSITIVE_BIT == 0 {
            return Err(XrpError::Format(
                "negative zero is not a canonical XRP amount".to_string(),
            ));
        }
        // magnitude <= 10^17 fits an i64
        let drops = magnitude as i64;
        Ok(Self(if bits & POSITIVE_BIT != 0 { drops } else { -drops }))
    }

    pub fn to_bytes(&self) -> [u8; 8] {
        self.to_u64_bits().to_be_bytes()
    }
}

impl FromStr for XrpAmount {
    type Err = XrpError;

    /// Accepts a drop count (`"1000000"`) or XRP text (`"1 XRP"`, `"0.5 XRP"`).
    fn from_str(s: &str) -> Result<Self> {
        let Some(xrp) = s.strip_suffix(" XRP") else {
            return Self::from_drops(s.parse()?);
        };

        let (negative, xrp) = match xrp.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, xrp),
        };
        let (whole, fraction) = xrp.split_once('.').unwrap_or((xrp, ""));
        if fraction.len() > 6 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(XrpError::Format(format!(
                "'{}' is not an XRP value with at most 6 decimals",
                s
            )));
        }
        let whole: u64 = whole.parse()?;
        let fraction: u64 = if fraction.is_empty() {
            0
        } else {
            format!("{:0<6}", fraction).parse()?
        };
        let drops = whole
            .checked_mul(DROPS_PER_XRP)
            .and_then(|d| d.checked_add(fraction))
            .filter(|d| *d <= MAX_DROPS)
            .ok_or_else(|| XrpError::Range(format!("'{}' exceeds the XRP supply", s)))?;
        // bounded by MAX_DROPS above
        let drops = drops as i64;
        Self::from_drops(if negative { -drops } else { drops })
    }
}

impl fmt::Display for XrpAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let magnitude = self.0.unsigned_abs();
        let sign = if self.0 < 0 { "-" } else { "" };
        let whole = magnitude / DROPS_PER_XRP;
        let fraction = magnitude % DROPS_PER_XRP;
        if fraction == 0 {
            write!(f, "{}{} XRP", sign, whole)
        } else {
            let fraction = format!("{:06}", fraction);
            write!(f, "{}{}.{} XRP", sign, whole, fraction.trim_end_matches('0'))
        }
    }
}

impl fmt::Debug for XrpAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "XrpAmount({} drops)", self.0)
    }
}

/// A balance of a currency issued by a specific account.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct IssuedAmount {
    value: Currency,
    currency: CurrencyCode,
    issuer: AccountId,
}

impl IssuedAmount {
    /// Encoded length in the binary format.
    pub const LEN: usize = 48;

    pub fn new(value: Currency, currency: CurrencyCode, issuer: AccountId) -> Result<Self> {
        if currency.is_xrp() {
            return Err(XrpError::Format(
                "XRP can not be used as an issued currency code".to_string(),
            ));
        }
        Ok(Self {
            value,
            currency,
            issuer,
        })
    }

    pub fn value(&self) -> Currency {
        self.value
    }

    pub fn currency(&self) -> CurrencyCode {
        self.currency
    }

    pub fn issuer(&self) -> AccountId {
        self.issuer
    }

    pub fn to_bytes(&self) -> [u8; 48] {
        let mut bytes = [0u8; 48];
        BigEndian::write_u64(&mut bytes[..8], self.value.to_u64_bits());
        bytes[8..28].copy_from_slice(self.currency.as_bytes());
        bytes[28..].copy_from_slice(self.issuer.as_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != Self::LEN {
            return Err(XrpError::Format(format!(
                "issued amount expects {} bytes, got {}",
                Self::LEN,
                bytes.len()
            )));
        }
        let value = Currency::from_u64_bits(BigEndian::read_u64(&bytes[..8]))?;
        let currency = CurrencyCode::from_slice(&bytes[8..28])?;
        let issuer = AccountId::from_slice(&bytes[28..])?;
        Self::new(value, currency, issuer)
    }
}

impl fmt::Display for IssuedAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}({})", self.value, self.currency, self.issuer)
    }
}

impl fmt::Debug for IssuedAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IssuedAmount({})", self)
    }
}

/// Either native XRP or an issued currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Amount {
    Xrp(XrpAmount),
    Issued(IssuedAmount),
}

impl Amount {
    pub fn is_xrp(&self) -> bool {
        matches!(self, Amount::Xrp(_))
    }

    pub fn as_xrp(&self) -> Option<XrpAmount> {
        match self {
            Amount::Xrp(xrp) => Some(*xrp),
            Amount::Issued(_) => None,
        }
    }

    pub fn as_issued(&self) -> Option<&IssuedAmount> {
        match self {
            Amount::Issued(issued) => Some(issued),
            Amount::Xrp(_) => None,
        }
    }

    /// True when the first word of an encoded amount announces the 48-byte form.
    pub fn is_issued_header(first_word: u64) -> bool {
        first_word & ISSUED_BIT != 0
    }

    pub fn write_to(&self, out: &mut Vec<u8>) -> Result<()> {
        match self {
            Amount::Xrp(xrp) => out.write_u64::<BigEndian>(xrp.to_u64_bits())?,
            Amount::Issued(issued) => out.extend_from_slice(&issued.to_bytes()),
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Amount::Xrp(xrp) => xrp.to_bytes().to_vec(),
            Amount::Issued(issued) => issued.to_bytes().to_vec(),
        }
    }

    /// Decodes a complete 8- or 48-byte amount.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 8 {
            return Err(XrpError::TruncatedData {
                needed: 8,
                available: bytes.len(),
            });
        }
        let header = BigEndian::read_u64(&bytes[..8]);
        if Self::is_issued_header(header) {
            Ok(Amount::Issued(IssuedAmount::from_bytes(bytes)?))
        } else if bytes.len() == XrpAmount::LEN {
            Ok(Amount::Xrp(XrpAmount::from_u64_bits(header)?))
        } else {
            Err(XrpError::Format(format!(
                "XRP amount expects 8 bytes, got {}",
                bytes.len()
            )))
        }
    }

    /// rippled JSON form: a drops string, or `{currency, issuer, value}`.
    pub fn to_json(&self) -> Value {
        match self {
            Amount::Xrp(xrp) => Value::String(xrp.drops().to_string()),
            Amount::Issued(issued) => json!({
                "currency": issued.currency.to_string(),
                "issuer": issued.issuer.to_string(),
                "value": issued.value.to_string(),
            }),
        }
    }

    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::String(drops) => Ok(Amount::Xrp(XrpAmount::from_drops(drops.parse()?)?)),
            Value::Number(drops) => {
                let drops = drops.as_i64().ok_or_else(|| {
                    XrpError::Format(format!("{} is not an integral drop count", drops))
                })?;
                Ok(Amount::Xrp(XrpAmount::from_drops(drops)?))
            }
            Value::Object(fields) => {
                let text = |key: &str| {
                    fields.get(key).and_then(Value::as_str).ok_or_else(|| {
                        XrpError::Format(format!("issued amount is missing '{}'", key))
                    })
                };
                let issued = IssuedAmount::new(
                    text("value")?.parse()?,
                    text("currency")?.parse()?,
                    text("issuer")?.parse()?,
                )?;
                Ok(Amount::Issued(issued))
            }
            other => Err(XrpError::Format(format!(
                "amount must be a drops string or an object, got {}",
                other
            ))),
        }
    }
}

impl From<XrpAmount> for Amount {
    fn from(xrp: XrpAmount) -> Self {
        Amount::Xrp(xrp)
    }
}

impl From<IssuedAmount> for Amount {
    fn from(issued: IssuedAmount) -> Self {
        Amount::Issued(issued)
    }
}

impl TryFrom<Amount> for XrpAmount {
    type Error = XrpError;

    fn try_from(amount: Amount) -> Result<Self> {
        amount.as_xrp().ok_or_else(|| {
            XrpError::ProtocolMismatch(format!("{} is not an XRP amount", amount))
        })
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Amount::Xrp(xrp) => xrp.fmt(f),
            Amount::Issued(issued) => issued.fmt(f),
        }
    }
}

impl serde::Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_json().serialize(serializer)
    }
}

impl<'de> serde::Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Amount::from_json(&value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const ISSUER: &str = "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh";

    fn gbp(value: &str) -> IssuedAmount {
        IssuedAmount::new(
            value.parse().unwrap(),
            "GBP".parse().unwrap(),
            ISSUER.parse().unwrap(),
        )
        .unwrap()
    }

    #[rstest]
    #[case(1_000_000, "1 XRP")]
    #[case(1, "0.000001 XRP")]
    #[case(1_500_000, "1.5 XRP")]
    #[case(-2_000_010, "-2.00001 XRP")]
    #[case(0, "0 XRP")]
    fn xrp_display(#[case] drops: i64, #[case] expected: &str) {
        let amount = XrpAmount::from_drops(drops).unwrap();
        assert_eq!(amount.to_string(), expected);
        assert_eq!(expected.parse::<XrpAmount>().unwrap(), amount);
    }

    #[rstest]
    #[case(4_611_686_018_427_387_904)]
    #[case(100_000_000_000_000_001)]
    #[case(-100_000_000_000_000_001)]
    #[case(i64::MIN)]
    fn xrp_over_the_cap_is_a_range_error(#[case] drops: i64) {
        assert!(matches!(
            XrpAmount::from_drops(drops),
            Err(XrpError::Range(_))
        ));
    }

    #[test]
    fn xrp_bit_layout() {
        let amount = XrpAmount::from_drops(1_000_000).unwrap();
        assert_eq!(amount.to_u64_bits(), 0x4000_0000_000F_4240);
        let negative = XrpAmount::from_drops(-1).unwrap();
        assert_eq!(negative.to_u64_bits(), 1);
        assert_eq!(XrpAmount::from_u64_bits(1).unwrap(), negative);
    }

    #[rstest]
    #[case(0)]
    #[case(12)]
    #[case(100_000_000_000_000_000)]
    #[case(-7)]
    fn xrp_bits_round_trip(#[case] drops: i64) {
        let amount = XrpAmount::from_drops(drops).unwrap();
        assert_eq!(XrpAmount::from_u64_bits(amount.to_u64_bits()).unwrap(), amount);
    }

    #[test]
    fn xrp_negative_zero_is_rejected() {
        assert!(matches!(
            Amount::from_bytes(&0u64.to_be_bytes()),
            Err(XrpError::Format(_))
        ));
        let zero = Amount::from_bytes(&POSITIVE_BIT.to_be_bytes()).unwrap();
        assert_eq!(zero, Amount::Xrp(XrpAmount::ZERO));
        assert_eq!(zero.to_bytes(), POSITIVE_BIT.to_be_bytes());
    }

    #[test]
    fn xrp_wire_magnitude_over_the_cap_is_rejected() {
        assert!(matches!(
            XrpAmount::from_u64_bits(0x7FFF_FFFF_FFFF_FFFF),
            Err(XrpError::Range(_))
        ));
    }

    #[rstest]
    #[case("1.0000001 XRP")]
    #[case("one XRP")]
    #[case("1.x XRP")]
    fn malformed_xrp_text(#[case] text: &str) {
        assert!(matches!(text.parse::<XrpAmount>(), Err(XrpError::Format(_))));
    }

    #[test]
    fn issued_amount_rejects_xrp_code() {
        let err = IssuedAmount::new(
            "1".parse().unwrap(),
            CurrencyCode::XRP,
            ISSUER.parse().unwrap(),
        )
        .unwrap_err();
        assert!(matches!(err, XrpError::Format(_)));
    }

    #[test]
    fn issued_wire_code_spelling_xrp_is_rejected() {
        let mut bytes = Amount::from(gbp("1")).to_bytes();
        bytes[20..23].copy_from_slice(b"XRP");
        assert!(matches!(
            Amount::from_bytes(&bytes),
            Err(XrpError::Format(_))
        ));
    }

    #[test]
    fn issued_display() {
        assert_eq!(
            gbp("100").to_string(),
            format!("100 GBP({})", ISSUER)
        );
    }

    #[test]
    fn issued_binary_layout() {
        let amount = Amount::from(gbp("1"));
        let bytes = amount.to_bytes();
        assert_eq!(bytes.len(), 48);
        assert_eq!(hex::encode_upper(&bytes[..8]), "D4838D7EA4C68000");
        assert_eq!(&bytes[20..23], b"GBP");
        assert_eq!(Amount::from_bytes(&bytes).unwrap(), amount);
    }

    #[test]
    fn decode_dispatches_on_the_top_bit() {
        let xrp = Amount::from(XrpAmount::from_drops(12).unwrap());
        assert_eq!(hex::encode_upper(xrp.to_bytes()), "400000000000000C");
        assert_eq!(Amount::from_bytes(&xrp.to_bytes()).unwrap(), xrp);

        let issued = Amount::from(gbp("-0.5"));
        assert!(matches!(
            Amount::from_bytes(&issued.to_bytes()[..8]),
            Err(XrpError::Format(_))
        ));
    }

    #[test]
    fn json_mapping() {
        let xrp = Amount::from_json(&json!("1000")).unwrap();
        assert_eq!(xrp, Amount::Xrp(XrpAmount::from_drops(1000).unwrap()));
        assert_eq!(xrp.to_json(), json!("1000"));
        assert_eq!(Amount::from_json(&json!(25)).unwrap().to_json(), json!("25"));

        let issued_json = json!({"currency": "GBP", "issuer": ISSUER, "value": "12.5"});
        let issued = Amount::from_json(&issued_json).unwrap();
        assert_eq!(issued, Amount::Issued(gbp("12.5")));
        assert_eq!(issued.to_json(), issued_json);

        let through_serde: Amount = serde_json::from_value(issued_json).unwrap();
        assert_eq!(through_serde, issued);
    }

    #[test]
    fn json_mapping_rejects_bad_shapes() {
        assert!(Amount::from_json(&json!(true)).is_err());
        assert!(Amount::from_json(&json!(1.5)).is_err());
        assert!(Amount::from_json(&json!({"currency": "GBP", "value": "1"})).is_err());
        let xrp_issued = json!({"currency": "XRP", "issuer": ISSUER, "value": "1"});
        assert!(Amount::from_json(&xrp_issued).is_err());
    }

    #[test]
    fn issued_amount_never_coerces_to_xrp() {
        assert!(XrpAmount::try_from(Amount::from(gbp("1"))).is_err());
    }
}
