//! Amount type for monetary values printed with two decimals.
//!
//! This module provides the `Amount` type, which wraps `Decimal`, and the number grammar used
//! for spreadsheet cells that hold text instead of a number, such as `2,5` or `1 234,56 €`.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

/// Represents a euro amount.
///
/// The value is kept exact; rounding to cents only happens when the amount is displayed or
/// serialized. Midpoints round away from zero.
///
/// # Examples
///
/// ```
/// # use fermage::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("1 234,5 €").unwrap();
/// assert_eq!(amount.to_string(), "1234.50");
/// ```
///
/// ```
/// # use fermage::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("527.495").unwrap();
/// assert_eq!(amount.to_string(), "527.50");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Returns the underlying, unrounded, Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Adds two amounts, returning `None` on overflow.
    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_add(rhs.0).map(Amount)
    }
}

/// An error that can occur when parsing strings into `Amount` values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmountError(String);

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a number", self.0)
    }
}

impl std::error::Error for AmountError {}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_number(s)
            .map(Amount)
            .ok_or_else(|| AmountError(s.to_string()))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&fixed2(self.0))
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Amount::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Self) -> Self::Output {
        Amount(self.0 + rhs.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, Add::add)
    }
}

/// Formats `value` with exactly two decimals, rounding midpoints away from zero.
pub fn fixed2(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{rounded:.2}")
}

/// Formats `value` the way it was given, without trailing zeros: `5.50` -> `5.5`.
pub fn as_given(value: Decimal) -> String {
    value.normalize().to_string()
}

/// Parses a number written by hand in a spreadsheet cell.
///
/// Accepts `.` or `,` as the decimal separator, spaces (including non-breaking ones) as thousands
/// separators, and a trailing `€` or `%`. When both `.` and `,` appear, the last one is the decimal
/// separator. Returns `None` for empty or non-numeric text.
pub fn parse_number(s: &str) -> Option<Decimal> {
    let trimmed = s.trim();
    let trimmed = trimmed
        .strip_suffix('€')
        .or_else(|| trimmed.strip_suffix('%'))
        .unwrap_or(trimmed);
    let compact: String = trimmed
        .chars()
        .filter(|c| !matches!(c, ' ' | '\u{a0}' | '\u{202f}'))
        .collect();
    if compact.is_empty() {
        return None;
    }

    let normalized = match (compact.rfind(','), compact.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => compact.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => compact.replace(',', ""),
        (Some(_), None) if compact.matches(',').count() == 1 => compact.replace(',', "."),
        (Some(_), None) => compact.replace(',', ""),
        _ => compact,
    };

    Decimal::from_str(&normalized).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_plain() {
        assert_eq!(parse_number("2.5"), Some(dec("2.5")));
        assert_eq!(parse_number("  10 "), Some(dec("10")));
    }

    #[test]
    fn test_parse_french_decimal_comma() {
        assert_eq!(parse_number("2,5"), Some(dec("2.5")));
        assert_eq!(parse_number("1 234,56"), Some(dec("1234.56")));
        assert_eq!(parse_number("1\u{a0}234,56 €"), Some(dec("1234.56")));
    }

    #[test]
    fn test_parse_both_separators() {
        assert_eq!(parse_number("1.234,56"), Some(dec("1234.56")));
        assert_eq!(parse_number("1,234.56"), Some(dec("1234.56")));
        assert_eq!(parse_number("1,234,567"), Some(dec("1234567")));
    }

    #[test]
    fn test_parse_percent() {
        assert_eq!(parse_number("5,5 %"), Some(dec("5.5")));
    }

    #[test]
    fn test_parse_rejects_text() {
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("   "), None);
        assert_eq!(parse_number("deux"), None);
        assert_eq!(parse_number("2.5ha"), None);
    }

    #[test]
    fn test_fixed2() {
        assert_eq!(fixed2(dec("500")), "500.00");
        assert_eq!(fixed2(dec("527.5")), "527.50");
        assert_eq!(fixed2(dec("0.125")), "0.13");
        assert_eq!(fixed2(dec("-0.125")), "-0.13");
        assert_eq!(fixed2(dec("3.14159")), "3.14");
    }

    #[test]
    fn test_as_given() {
        assert_eq!(as_given(dec("5.50")), "5.5");
        assert_eq!(as_given(dec("1.0")), "1");
        assert_eq!(as_given(dec("1.25")), "1.25");
    }

    #[test]
    fn test_amount_display_and_serde() {
        let amount = Amount::new(dec("527.5"));
        assert_eq!(amount.to_string(), "527.50");
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "\"527.50\"");
        let back: Amount = serde_json::from_str("\"12,5\"").unwrap();
        assert_eq!(back.value(), dec("12.5"));
    }

    #[test]
    fn test_amount_from_str_error() {
        let err = Amount::from_str("n/a").unwrap_err();
        assert_eq!(err.to_string(), "'n/a' is not a number");
    }

    #[test]
    fn test_amount_sum() {
        let total: Amount = [dec("1.10"), dec("2.20"), dec("3.30")]
            .into_iter()
            .map(Amount::from)
            .sum();
        assert_eq!(total.value(), dec("6.60"));
        assert!(!total.is_zero());
    }

    #[test]
    fn test_amount_checked_add() {
        let one = Amount::new(Decimal::ONE);
        assert_eq!(one.checked_add(one), Some(Amount::new(dec("2"))));
        assert_eq!(Amount::new(Decimal::MAX).checked_add(one), None);
    }
}
