//! Currency codes and the decimal format of issued-currency values.

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, XrpError};

/// 160-bit currency code.
///
/// Standard codes keep three ASCII characters in bytes 12..15 with every
/// other byte zero. Nonstandard codes have a nonzero first byte and are
/// opaque. The all-zero value is XRP.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct CurrencyCode([u8; 20]);

fn is_standard_char(c: u8) -> bool {
    // letters, digits and ? ! @ # $ % ^ & * < > ( ) { } [ ] |
    matches!(c, 33 | 35..=38 | 40..=42 | 48..=57 | 60 | 62..=91 | 93 | 94 | 97..=125)
}

impl CurrencyCode {
    pub const XRP: CurrencyCode = CurrencyCode([0u8; 20]);

    /// Accepts raw bytes as found on the wire.
    pub fn from_bytes(bytes: [u8; 20]) -> Result<Self> {
        if bytes[0] == 0 && bytes != [0u8; 20] {
            let layout_ok = bytes[1..12].iter().all(|b| *b == 0)
                && bytes[15..].iter().all(|b| *b == 0)
                && bytes[12..15].iter().all(|b| is_standard_char(*b));
            if !layout_ok {
                return Err(XrpError::Format(format!(
                    "{} is not a valid standard currency code",
                    hex::encode_upper(bytes)
                )));
            }
            if bytes[12..15] == *b"XRP" {
                return Err(XrpError::Format(
                    "XRP can not be used as a standard currency code".to_string(),
                ));
            }
        }
        Ok(Self(bytes))
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let array: [u8; 20] = bytes.try_into().map_err(|_| {
            XrpError::Format(format!(
                "currency code expects 20 bytes, got {}",
                bytes.len()
            ))
        })?;
        Self::from_bytes(array)
    }

    pub fn is_standard(&self) -> bool {
        self.0[0] == 0
    }

    pub fn is_xrp(&self) -> bool {
        *self == Self::XRP
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl FromStr for CurrencyCode {
    type Err = XrpError;

    fn from_str(code: &str) -> Result<Self> {
        match code.len() {
            3 if code == "XRP" => Ok(Self::XRP),
            3 => {
                let mut bytes = [0u8; 20];
                for (i, c) in code.bytes().enumerate() {
                    if !is_standard_char(c) {
                        return Err(XrpError::Format(format!(
                            "'{}' is not a valid standard currency code character",
                            c as char
                        )));
                    }
                    bytes[12 + i] = c;
                }
                Ok(Self(bytes))
            }
            40 => {
                let mut bytes = [0u8; 20];
                hex::decode_to_slice(code, &mut bytes)?;
                if bytes[0] == 0 {
                    return Err(XrpError::Format(
                        "hex currency code first byte can not be zero".to_string(),
                    ));
                }
                Ok(Self(bytes))
            }
            _ => Err(XrpError::Format(format!(
                "'{}' is neither a 3 character standard code nor a 40 character hex code",
                code
            ))),
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_xrp() {
            f.write_str("XRP")
        } else if self.is_standard() {
            f.write_str(&String::from_utf8_lossy(&self.0[12..15]))
        } else {
            f.write_str(&hex::encode_upper(self.0))
        }
    }
}

impl fmt::Debug for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CurrencyCode({})", self)
    }
}

impl_serde_via_str!(CurrencyCode);

const MIN_MANTISSA: u64 = 1_000_000_000_000_000;
const MAX_MANTISSA: u64 = 9_999_999_999_999_999;
const MIN_EXPONENT: i32 = -96;
const MAX_EXPONENT: i32 = 80;
const EXPONENT_BIAS: i32 = 97;

const NOT_XRP_BIT: u64 = 0x8000_0000_0000_0000;
const POSITIVE_BIT: u64 = 0x4000_0000_0000_0000;
const MANTISSA_MASK: u64 = 0x003F_FFFF_FFFF_FFFF;

/// Decimal value of an issued currency: sign, 16-digit mantissa, exponent.
///
/// Nonzero values are kept normalised so the mantissa lies in
/// `[10^15, 10^16)`, which makes derived equality value equality.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Currency {
    negative: bool,
    mantissa: u64,
    exponent: i32,
}

impl Currency {
    pub const ZERO: Currency = Currency {
        negative: false,
        mantissa: 0,
        exponent: 0,
    };

    /// Builds `±mantissa × 10^exponent`, normalising without losing digits.
    pub fn new(negative: bool, mantissa: u64, exponent: i32) -> Result<Self> {
        if mantissa == 0 {
            return Ok(Self::ZERO);
        }

        let mut mantissa = mantissa;
        let mut exponent = exponent;
        while mantissa < MIN_MANTISSA {
            mantissa *= 10;
            exponent = exponent.saturating_sub(1);
        }
        while mantissa > MAX_MANTISSA {
            if mantissa % 10 != 0 {
                return Err(XrpError::Range(
                    "issued value has more than 16 significant digits".to_string(),
                ));
            }
            mantissa /= 10;
            exponent = exponent.saturating_add(1);
        }

        if !(MIN_EXPONENT..=MAX_EXPONENT).contains(&exponent) {
            return Err(XrpError::Range(format!(
                "issued value exponent {} is outside {}..={}",
                exponent, MIN_EXPONENT, MAX_EXPONENT
            )));
        }

        Ok(Self {
            negative,
            mantissa,
            exponent,
        })
    }

    pub fn is_zero(&self) -> bool {
        self.mantissa == 0
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn mantissa(&self) -> u64 {
        self.mantissa
    }

    pub fn exponent(&self) -> i32 {
        self.exponent
    }

    /// Packs the value into the 64-bit issued-amount header.
    pub fn to_u64_bits(&self) -> u64 {
        if self.is_zero() {
            return NOT_XRP_BIT;
        }
        let mut bits = NOT_XRP_BIT | self.mantissa;
        if !self.negative {
            bits |= POSITIVE_BIT;
        }
        bits | (((self.exponent + EXPONENT_BIAS) as u64) << 54)
    }

    pub fn from_u64_bits(bits: u64) -> Result<Self> {
        if bits & NOT_XRP_BIT == 0 {
            return Err(XrpError::ProtocolMismatch(
                "expected an issued amount but found an XRP amount".to_string(),
            ));
        }
        if bits == NOT_XRP_BIT {
            return Ok(Self::ZERO);
        }

        let mantissa = bits & MANTISSA_MASK;
        let exponent = ((bits >> 54) & 0xFF) as i32 - EXPONENT_BIAS;
        if !(MIN_MANTISSA..=MAX_MANTISSA).contains(&mantissa) {
            return Err(XrpError::Range(format!(
                "issued value mantissa {} is not normalised",
                mantissa
            )));
        }
        Self::new(bits & POSITIVE_BIT == 0, mantissa, exponent)
    }
}

fn push_digit(mantissa: &mut u64, exponent: &mut i32, digit: u8, fractional: bool) -> Result<()> {
    if *mantissa < 1_000_000_000_000_000_000 {
        *mantissa = *mantissa * 10 + u64::from(digit);
        if fractional {
            *exponent = exponent.saturating_sub(1);
        }
    } else if digit == 0 {
        if !fractional {
            *exponent = exponent.saturating_add(1);
        }
    } else {
        return Err(XrpError::Range(
            "issued value has more than 16 significant digits".to_string(),
        ));
    }
    Ok(())
}

impl FromStr for Currency {
    type Err = XrpError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || XrpError::Format(format!("'{}' is not a decimal number", s));

        let (negative, body) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        let (number, mut exponent) = match body.find(['e', 'E']) {
            Some(i) => (
                &body[..i],
                body[i + 1..].parse::<i32>().map_err(|_| invalid())?,
            ),
            None => (body, 0),
        };
        let (int_part, frac_part) = number.split_once('.').unwrap_or((number, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let mut mantissa = 0u64;
        for digit in int_part.bytes() {
            push_digit(&mut mantissa, &mut exponent, digit - b'0', false)?;
        }
        for digit in frac_part.bytes() {
            push_digit(&mut mantissa, &mut exponent, digit - b'0', true)?;
        }
        Self::new(negative, mantissa, exponent)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("0");
        }
        if self.negative {
            f.write_str("-")?;
        }

        if self.exponent != 0 && (self.exponent < -25 || self.exponent > -5) {
            let mut mantissa = self.mantissa;
            let mut exponent = self.exponent;
            while mantissa % 10 == 0 {
                mantissa /= 10;
                exponent += 1;
            }
            return write!(f, "{}e{}", mantissa, exponent);
        }

        // 16 digit mantissa, decimal point `point` digits from the left
        let digits = self.mantissa.to_string();
        let point = 16 + self.exponent;
        let (int_part, frac_part) = if point > 0 {
            let (i, fr) = digits.split_at(point as usize);
            (i.to_string(), fr.to_string())
        } else {
            ("0".to_string(), "0".repeat((-point) as usize) + &digits)
        };
        let frac_part = frac_part.trim_end_matches('0');
        if frac_part.is_empty() {
            f.write_str(&int_part)
        } else {
            write!(f, "{}.{}", int_part, frac_part)
        }
    }
}

impl fmt::Debug for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Currency({})", self)
    }
}

impl_serde_via_str!(Currency);

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn standard_code() {
        let code: CurrencyCode = "GBP".parse().unwrap();
        assert!(code.is_standard());
        assert!(!code.is_xrp());
        assert_eq!(&code.as_bytes()[12..15], b"GBP");
        assert_eq!(code.to_string(), "GBP");
    }

    #[test]
    fn xrp_text_is_the_zero_sentinel() {
        let code: CurrencyCode = "XRP".parse().unwrap();
        assert_eq!(code, CurrencyCode::XRP);
        assert_eq!(code.to_string(), "XRP");
    }

    #[test]
    fn nonstandard_code_round_trips() {
        let text = "0158415500000000C1F76FF6ECB0BAC600000000";
        let code: CurrencyCode = text.parse().unwrap();
        assert!(!code.is_standard());
        assert_eq!(code.to_string(), text);
    }

    #[rstest]
    #[case("0058415500000000C1F76FF6ECB0BAC600000000")]
    #[case("G1")]
    #[case("GBPX")]
    #[case("G B")]
    #[case("ZZ58415500000000C1F76FF6ECB0BAC600000000")]
    fn invalid_codes_are_format_errors(#[case] text: &str) {
        assert!(matches!(
            text.parse::<CurrencyCode>(),
            Err(XrpError::Format(_))
        ));
    }

    #[rstest]
    #[case::usd(b"USD", None, true)]
    #[case::nonzero_padding(b"USD", Some(3), false)]
    #[case::xrp_letters(b"XRP", None, false)]
    fn standard_layout_on_the_wire(
        #[case] letters: &[u8; 3],
        #[case] dirty_byte: Option<usize>,
        #[case] accepted: bool,
    ) {
        let mut bytes = [0u8; 20];
        bytes[12..15].copy_from_slice(letters);
        if let Some(at) = dirty_byte {
            bytes[at] = 1;
        }
        match CurrencyCode::from_bytes(bytes) {
            Ok(code) => {
                assert!(accepted);
                assert_eq!(code.as_bytes(), &bytes);
            }
            Err(e) => {
                assert!(!accepted);
                assert!(matches!(e, XrpError::Format(_)));
            }
        }
    }

    #[rstest]
    #[case("100", 1_000_000_000_000_000, -13)]
    #[case("1", 1_000_000_000_000_000, -15)]
    #[case("0.001", 1_000_000_000_000_000, -18)]
    #[case("-12.5", 1_250_000_000_000_000, -14)]
    #[case("1.5e3", 1_500_000_000_000_000, -12)]
    #[case("9999999999999999", 9_999_999_999_999_999, 0)]
    #[case("12345678901234560000", 1_234_567_890_123_456, 4)]
    fn parse_normalises(#[case] text: &str, #[case] mantissa: u64, #[case] exponent: i32) {
        let value: Currency = text.parse().unwrap();
        assert_eq!(value.mantissa(), mantissa);
        assert_eq!(value.exponent(), exponent);
        assert_eq!(value.is_negative(), text.starts_with('-'));
    }

    #[rstest]
    #[case("100", "100")]
    #[case("0", "0")]
    #[case("0.000", "0")]
    #[case("-12.5", "-12.5")]
    #[case("0.001", "0.001")]
    #[case("1e20", "1e20")]
    #[case("1234e-30", "1234e-30")]
    #[case("123456789.123", "123456789.123")]
    fn display(#[case] text: &str, #[case] expected: &str) {
        let value: Currency = text.parse().unwrap();
        assert_eq!(value.to_string(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("-")]
    #[case("1.2.3")]
    #[case("abc")]
    #[case("1e")]
    fn malformed_text_is_a_format_error(#[case] text: &str) {
        assert!(matches!(text.parse::<Currency>(), Err(XrpError::Format(_))));
    }

    #[rstest]
    #[case("1.2345678901234567")]
    #[case("1e97")]
    #[case("1e-97")]
    fn out_of_range_values_are_rejected(#[case] text: &str) {
        assert!(matches!(text.parse::<Currency>(), Err(XrpError::Range(_))));
    }

    #[test]
    fn zero_has_a_dedicated_encoding() {
        assert_eq!(Currency::ZERO.to_u64_bits(), 0x8000_0000_0000_0000);
        assert_eq!(
            Currency::from_u64_bits(0x8000_0000_0000_0000).unwrap(),
            Currency::ZERO
        );
    }

    #[test]
    fn known_bit_patterns() {
        // 1 = 10^15 × 10^-15, biased exponent 82
        let one: Currency = "1".parse().unwrap();
        assert_eq!(one.to_u64_bits(), 0xD483_8D7E_A4C6_8000);
        let minus_one: Currency = "-1".parse().unwrap();
        assert_eq!(minus_one.to_u64_bits(), 0x9483_8D7E_A4C6_8000);
    }

    #[rstest]
    #[case("100")]
    #[case("-0.000123")]
    #[case("9999999999999999e80")]
    #[case("1e-81")]
    fn bits_round_trip(#[case] text: &str) {
        let value: Currency = text.parse().unwrap();
        assert_eq!(Currency::from_u64_bits(value.to_u64_bits()).unwrap(), value);
    }

    #[test]
    fn xrp_bits_are_not_an_issued_value() {
        assert!(matches!(
            Currency::from_u64_bits(0x4000_0000_0000_0001),
            Err(XrpError::ProtocolMismatch(_))
        ));
    }

    #[test]
    fn unnormalised_mantissa_is_rejected() {
        let bits = 0x8000_0000_0000_0000 | 0x4000_0000_0000_0000 | (82u64 << 54) | 5;
        assert!(matches!(Currency::from_u64_bits(bits), Err(XrpError::Range(_))));
    }
}
