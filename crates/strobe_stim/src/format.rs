//! Numeric record formats for stimulus and expectation files.

use crate::error::StimError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strobe_common::BitVec;

/// The numeric format under which record-file tokens are parsed.
///
/// One token parses under exactly one configured format; hex formats are
/// case-strict so files written by another tool round-trip unambiguously.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumFormat {
    /// Signed decimal (leading `-` allowed, two's complement into the width).
    Dec,
    /// Unsigned decimal.
    Udec,
    /// Hexadecimal, lowercase digits only.
    HexLower,
    /// Hexadecimal, uppercase digits only.
    HexUpper,
    /// Binary.
    Bin,
    /// Octal.
    Oct,
}

impl NumFormat {
    /// Parses one token into a value of the given width.
    ///
    /// Returns `None` for a malformed token. Digits beyond the width are
    /// discarded; narrower tokens are zero-extended (sign-extended for
    /// negative [`Dec`](NumFormat::Dec) values).
    pub fn parse_token(&self, token: &str, width: u32) -> Option<BitVec> {
        if token.is_empty() {
            return None;
        }
        match self {
            NumFormat::Dec => parse_signed_dec(token, width),
            NumFormat::Udec => {
                if !token.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                let value: u64 = token.parse().ok()?;
                Some(BitVec::from_u64(value, width))
            }
            NumFormat::HexLower => parse_radix(token, 4, hex_lower_digit, width),
            NumFormat::HexUpper => parse_radix(token, 4, hex_upper_digit, width),
            NumFormat::Bin => parse_radix(token, 1, bin_digit, width),
            NumFormat::Oct => parse_radix(token, 3, oct_digit, width),
        }
    }

    /// Formats a value under this format for log output.
    ///
    /// Values wider than 64 bits fall back to binary.
    pub fn format_value(&self, value: &BitVec) -> String {
        let Some(raw) = value.to_u64() else {
            return value.to_string();
        };
        match self {
            NumFormat::Dec => {
                let width = value.width();
                if width == 0 || width > 64 {
                    format!("{raw}")
                } else {
                    // Sign-extend the top bit of the declared width.
                    let shift = 64 - width;
                    let signed = ((raw << shift) as i64) >> shift;
                    format!("{signed}")
                }
            }
            NumFormat::Udec => format!("{raw}"),
            NumFormat::HexLower => format!("{raw:x}"),
            NumFormat::HexUpper => format!("{raw:X}"),
            NumFormat::Bin => value.to_string(),
            NumFormat::Oct => format!("{raw:o}"),
        }
    }
}

impl fmt::Display for NumFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NumFormat::Dec => "dec",
            NumFormat::Udec => "udec",
            NumFormat::HexLower => "hex_lower",
            NumFormat::HexUpper => "hex_upper",
            NumFormat::Bin => "bin",
            NumFormat::Oct => "oct",
        };
        write!(f, "{name}")
    }
}

impl FromStr for NumFormat {
    type Err = StimError;

    fn from_str(s: &str) -> Result<Self, StimError> {
        match s {
            "dec" => Ok(NumFormat::Dec),
            "udec" => Ok(NumFormat::Udec),
            "hex_lower" => Ok(NumFormat::HexLower),
            "hex_upper" => Ok(NumFormat::HexUpper),
            "bin" => Ok(NumFormat::Bin),
            "oct" => Ok(NumFormat::Oct),
            other => Err(StimError::UnknownFormat(other.to_string())),
        }
    }
}

fn parse_signed_dec(token: &str, width: u32) -> Option<BitVec> {
    let (negative, digits) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let magnitude: i64 = digits.parse().ok()?;
    let value = if negative { -magnitude } else { magnitude };
    let raw = value as u64;
    if width <= 64 {
        return Some(BitVec::from_u64(raw, width));
    }
    // Sign-extend into the upper words for wide signals.
    let fill = if value < 0 { u64::MAX } else { 0 };
    let mut words = vec![fill; width.div_ceil(64) as usize];
    words[0] = raw;
    Some(BitVec::from_words(&words, width))
}

/// Parses a token digit-by-digit, `bits` bits per digit, LSB last.
///
/// Handles tokens of any length, including values wider than 64 bits.
fn parse_radix(
    token: &str,
    bits: u32,
    digit: impl Fn(char) -> Option<u8>,
    width: u32,
) -> Option<BitVec> {
    let mut v = BitVec::new(width);
    for (i, c) in token.chars().rev().enumerate() {
        let d = digit(c)?;
        for b in 0..bits {
            let index = i as u32 * bits + b;
            if index < width {
                v.set(index, (d >> b) & 1 != 0);
            }
        }
    }
    Some(v)
}

fn hex_lower_digit(c: char) -> Option<u8> {
    match c {
        '0'..='9' => Some(c as u8 - b'0'),
        'a'..='f' => Some(c as u8 - b'a' + 10),
        _ => None,
    }
}

fn hex_upper_digit(c: char) -> Option<u8> {
    match c {
        '0'..='9' => Some(c as u8 - b'0'),
        'A'..='F' => Some(c as u8 - b'A' + 10),
        _ => None,
    }
}

fn bin_digit(c: char) -> Option<u8> {
    match c {
        '0' => Some(0),
        '1' => Some(1),
        _ => None,
    }
}

fn oct_digit(c: char) -> Option<u8> {
    match c {
        '0'..='7' => Some(c as u8 - b'0'),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn udec_parse() {
        let v = NumFormat::Udec.parse_token("42", 8).unwrap();
        assert_eq!(v.to_u64(), Some(42));
    }

    #[test]
    fn udec_rejects_sign_and_junk() {
        assert!(NumFormat::Udec.parse_token("-1", 8).is_none());
        assert!(NumFormat::Udec.parse_token("4x", 8).is_none());
        assert!(NumFormat::Udec.parse_token("", 8).is_none());
    }

    #[test]
    fn dec_positive() {
        let v = NumFormat::Dec.parse_token("5", 8).unwrap();
        assert_eq!(v.to_u64(), Some(5));
    }

    #[test]
    fn dec_negative_twos_complement() {
        let v = NumFormat::Dec.parse_token("-1", 8).unwrap();
        assert_eq!(v.to_u64(), Some(0xFF));
        let v = NumFormat::Dec.parse_token("-2", 4).unwrap();
        assert_eq!(v.to_u64(), Some(0b1110));
    }

    #[test]
    fn dec_negative_wide_sign_extends() {
        let v = NumFormat::Dec.parse_token("-1", 80).unwrap();
        for i in 0..80 {
            assert!(v.get(i), "bit {i} should be set");
        }
    }

    #[test]
    fn hex_lower_strict_case() {
        let v = NumFormat::HexLower.parse_token("ff", 8).unwrap();
        assert_eq!(v.to_u64(), Some(0xFF));
        assert!(NumFormat::HexLower.parse_token("FF", 8).is_none());
    }

    #[test]
    fn hex_upper_strict_case() {
        let v = NumFormat::HexUpper.parse_token("A5", 8).unwrap();
        assert_eq!(v.to_u64(), Some(0xA5));
        assert!(NumFormat::HexUpper.parse_token("a5", 8).is_none());
    }

    #[test]
    fn bin_parse() {
        let v = NumFormat::Bin.parse_token("1010", 4).unwrap();
        assert_eq!(v.to_u64(), Some(0b1010));
        assert!(NumFormat::Bin.parse_token("102", 4).is_none());
    }

    #[test]
    fn oct_parse() {
        let v = NumFormat::Oct.parse_token("17", 8).unwrap();
        assert_eq!(v.to_u64(), Some(0o17));
        assert!(NumFormat::Oct.parse_token("8", 8).is_none());
    }

    #[test]
    fn digits_beyond_width_discarded() {
        let v = NumFormat::HexLower.parse_token("1ff", 8).unwrap();
        assert_eq!(v.to_u64(), Some(0xFF));
    }

    #[test]
    fn wide_hex_token() {
        let v = NumFormat::HexLower
            .parse_token("1ffffffffffffffff", 68)
            .unwrap();
        assert!(v.get(64));
        assert!(v.get(0));
        assert!(v.get(63));
    }

    #[test]
    fn format_values() {
        let v = BitVec::from_u64(0xA5, 8);
        assert_eq!(NumFormat::Udec.format_value(&v), "165");
        assert_eq!(NumFormat::HexLower.format_value(&v), "a5");
        assert_eq!(NumFormat::HexUpper.format_value(&v), "A5");
        assert_eq!(NumFormat::Bin.format_value(&v), "10100101");
        assert_eq!(NumFormat::Oct.format_value(&v), "245");
        assert_eq!(NumFormat::Dec.format_value(&v), "-91");
    }

    #[test]
    fn from_str_roundtrip() {
        for f in [
            NumFormat::Dec,
            NumFormat::Udec,
            NumFormat::HexLower,
            NumFormat::HexUpper,
            NumFormat::Bin,
            NumFormat::Oct,
        ] {
            assert_eq!(f.to_string().parse::<NumFormat>().unwrap(), f);
        }
        assert!("hexish".parse::<NumFormat>().is_err());
    }

    #[test]
    fn serde_snake_case_names() {
        let json = serde_json::to_string(&NumFormat::HexUpper).unwrap();
        assert_eq!(json, "\"hex_upper\"");
        let back: NumFormat = serde_json::from_str("\"bin\"").unwrap();
        assert_eq!(back, NumFormat::Bin);
    }
}
