//! # Fixed-point decimal
//!
//! `Dec` mirrors the Cosmos SDK decimal: an arbitrary-precision integer scaled
//! by `10^18`. Multiplication and division round half-to-even at the 18th
//! fractional digit, truncation drops the fraction toward zero and the text
//! form always carries all 18 fractional digits:
//!
//! ```text
//! "0.1176"  ->  0.117600000000000000
//! "-26.5"   -> -26.500000000000000000
//! ```

use crate::error::{EconomicsError, Result};
use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Number of fractional digits carried by every `Dec`
pub const PRECISION: usize = 18;

const PRECISION_MULTIPLIER: u64 = 1_000_000_000_000_000_000;

fn scale() -> BigInt {
    BigInt::from(PRECISION_MULTIPLIER)
}

/// Fixed-point decimal with 18 fractional digits
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Dec(BigInt);

impl Dec {
    /// Zero
    pub fn zero() -> Self {
        Self(BigInt::zero())
    }

    /// One
    pub fn one() -> Self {
        Self(scale())
    }

    /// Build from a whole number
    pub fn from_int(value: i64) -> Self {
        Self(BigInt::from(value) * scale())
    }

    /// Build from an arbitrary-precision whole number
    pub fn from_integer(value: &BigInt) -> Self {
        Self(value * scale())
    }

    /// Build from the raw scaled representation
    pub fn from_raw(raw: BigInt) -> Self {
        Self(raw)
    }

    /// Raw scaled representation (`value · 10^18`)
    pub fn raw(&self) -> &BigInt {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    pub fn is_positive(&self) -> bool {
        self.0.is_positive()
    }

    pub fn add(&self, other: &Dec) -> Dec {
        Dec(&self.0 + &other.0)
    }

    pub fn sub(&self, other: &Dec) -> Dec {
        Dec(&self.0 - &other.0)
    }

    /// Multiply, rounding half-to-even at the last digit
    pub fn mul(&self, other: &Dec) -> Dec {
        Dec(chop_precision_and_round(&self.0 * &other.0))
    }

    /// Multiply by a whole number (exact)
    pub fn mul_int(&self, factor: &BigInt) -> Dec {
        Dec(&self.0 * factor)
    }

    pub fn mul_int64(&self, factor: i64) -> Dec {
        Dec(&self.0 * BigInt::from(factor))
    }

    /// Divide, rounding half-to-even at the last digit
    pub fn quo(&self, divisor: &Dec) -> Result<Dec> {
        if divisor.is_zero() {
            return Err(EconomicsError::DivisionByZero("decimal quotient"));
        }
        let widened = &self.0 * scale() * scale();
        let quotient = widened / &divisor.0;
        Ok(Dec(chop_precision_and_round(quotient)))
    }

    /// Divide by a whole number, truncating the raw representation
    pub fn quo_int(&self, divisor: &BigInt) -> Result<Dec> {
        if divisor.is_zero() {
            return Err(EconomicsError::DivisionByZero("integer quotient"));
        }
        Ok(Dec(&self.0 / divisor))
    }

    /// Raise to a whole power by repeated squaring, rounding after every product
    pub fn power(&self, exponent: u32) -> Dec {
        if exponent == 0 {
            return Dec::one();
        }

        let mut base = self.clone();
        let mut acc = Dec::one();
        let mut remaining = exponent;
        while remaining > 1 {
            if remaining % 2 != 0 {
                acc = acc.mul(&base);
            }
            remaining /= 2;
            base = base.mul(&base);
        }
        base.mul(&acc)
    }

    /// Whole part, truncated toward zero
    pub fn truncate_int(&self) -> BigInt {
        &self.0 / scale()
    }
}

/// Drop the extra 18 digits left by a product, rounding half-to-even
fn chop_precision_and_round(value: BigInt) -> BigInt {
    if value.is_negative() {
        return -chop_precision_and_round(-value);
    }

    let scale = scale();
    let quotient = &value / &scale;
    let remainder = &value % &scale;
    if remainder.is_zero() {
        return quotient;
    }

    let half = &scale / BigInt::from(2);
    match remainder.cmp(&half) {
        Ordering::Less => quotient,
        Ordering::Greater => quotient + BigInt::one(),
        Ordering::Equal => {
            if (&quotient % BigInt::from(2)).is_zero() {
                quotient
            } else {
                quotient + BigInt::one()
            }
        }
    }
}

/// Parse a base-10 integer string
pub fn parse_int(value: &str) -> Result<BigInt> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EconomicsError::InvalidInteger(value.to_string()));
    }
    BigInt::parse_bytes(trimmed.as_bytes(), 10)
        .ok_or_else(|| EconomicsError::InvalidInteger(value.to_string()))
}

impl FromStr for Dec {
    type Err = EconomicsError;

    fn from_str(value: &str) -> Result<Self> {
        let invalid = || EconomicsError::InvalidDecimal(value.to_string());

        let trimmed = value.trim();
        let (negative, body) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let mut parts = body.split('.');
        let whole = parts.next().unwrap_or_default();
        let fraction = match parts.next() {
            Some("") => return Err(invalid()),
            Some(fraction) => fraction,
            None => "",
        };
        if parts.next().is_some() || whole.is_empty() {
            return Err(invalid());
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if fraction.len() > PRECISION {
            return Err(EconomicsError::TooPrecise {
                value: value.to_string(),
                max: PRECISION,
            });
        }

        let combined = format!("{}{}{}", whole, fraction, "0".repeat(PRECISION - fraction.len()));
        let magnitude = BigInt::parse_bytes(combined.as_bytes(), 10).ok_or_else(invalid)?;

        Ok(Dec(if negative { -magnitude } else { magnitude }))
    }
}

impl fmt::Display for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.abs().to_str_radix(10);
        let padded = if digits.len() <= PRECISION {
            format!("{}{}", "0".repeat(PRECISION + 1 - digits.len()), digits)
        } else {
            digits
        };
        let (whole, fraction) = padded.split_at(padded.len() - PRECISION);

        if self.0.is_negative() {
            write!(f, "-")?;
        }
        write!(f, "{}.{}", whole, fraction)
    }
}

impl Serialize for Dec {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Dec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(value: &str) -> Dec {
        value.parse().unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!(dec("0.1176").to_string(), "0.117600000000000000");
        assert_eq!(dec("26.5").to_string(), "26.500000000000000000");
        assert_eq!(dec("-0.6").to_string(), "-0.600000000000000000");
        assert_eq!(dec("358").to_string(), "358.000000000000000000");
        assert_eq!(Dec::zero().to_string(), "0.000000000000000000");
        assert_eq!(dec("0.000000000000000001").raw(), &BigInt::from(1));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", ".5", "1.", "1.2.3", "abc", "1e5", "--1", "0x10"] {
            assert!(bad.parse::<Dec>().is_err(), "accepted {:?}", bad);
        }

        let err = "0.1234567890123456789".parse::<Dec>().unwrap_err();
        assert!(matches!(err, EconomicsError::TooPrecise { max: 18, .. }));
    }

    #[test]
    fn test_mul_rounds_half_to_even() {
        let tiny = dec("0.000000000000000001");
        let three_tiny = dec("0.000000000000000003");
        let half = dec("0.5");

        // 0.5 ulp rounds down to the even neighbour, 1.5 ulp rounds up to 2
        assert_eq!(tiny.mul(&half), Dec::zero());
        assert_eq!(three_tiny.mul(&half).raw(), &BigInt::from(2));
        assert_eq!(dec("-0.000000000000000003").mul(&half).raw(), &BigInt::from(-2));
    }

    #[test]
    fn test_quo() {
        assert_eq!(Dec::one().quo(&Dec::from_int(3)).unwrap().to_string(), "0.333333333333333333");
        assert_eq!(Dec::from_int(2).quo(&Dec::from_int(3)).unwrap().to_string(), "0.666666666666666667");
        assert!(Dec::one().quo(&Dec::zero()).is_err());
    }

    #[test]
    fn test_quo_int_truncates() {
        let third = Dec::one().quo_int(&BigInt::from(3)).unwrap();
        assert_eq!(third.to_string(), "0.333333333333333333");
        let two_thirds = Dec::from_int(2).quo_int(&BigInt::from(3)).unwrap();
        assert_eq!(two_thirds.to_string(), "0.666666666666666666");
    }

    #[test]
    fn test_power() {
        assert_eq!(dec("1.5").power(0), Dec::one());
        assert_eq!(dec("1.5").power(2), dec("2.25"));
        assert_eq!(dec("1.5").power(3), dec("3.375"));
        assert_eq!(dec("2").power(10), Dec::from_int(1024));
    }

    #[test]
    fn test_truncate_and_min() {
        assert_eq!(dec("12.999").truncate_int(), BigInt::from(12));
        assert_eq!(dec("-12.999").truncate_int(), BigInt::from(-12));
        assert_eq!(dec("3").min(dec("2.5")), dec("2.5"));
        assert!(dec("10.000000000000000001") > Dec::from_int(10));
    }

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int("1942421346").unwrap(), BigInt::from(1_942_421_346u64));
        assert!(parse_int("").is_err());
        assert!(parse_int("12.5").is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&dec("0.02")).unwrap();
        assert_eq!(json, "\"0.020000000000000000\"");

        let back: Dec = serde_json::from_str("\"1000000\"").unwrap();
        assert_eq!(back, Dec::from_int(1_000_000));
        assert!(serde_json::from_str::<Dec>("\"nope\"").is_err());
    }
}
