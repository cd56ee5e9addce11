//! Decimal price type.
//!
//! Prices travel over the wire as JSON numbers (the backend and the persisted
//! cart both use plain numbers) but are held as [`Decimal`] so sums like
//! `99.99 + 0.01` land exactly on the free-shipping threshold.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Mul};

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A non-currency-tagged amount in the store's single currency (USD).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Wrap a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Build a price from whole cents.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// Build a price from a whole-dollar amount.
    #[must_use]
    pub fn from_dollars(dollars: i64) -> Self {
        Self(Decimal::from(dollars))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Format for display, e.g. `$19.99`.
    #[must_use]
    pub fn display(&self) -> String {
        format!("${:.2}", self.0.round_dp(2))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Mul<u32> for Price {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self::Output {
        Self(self.0 * Decimal::from(rhs))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Accepts both JSON numbers and numeric strings.
        <Decimal as Deserialize>::deserialize(deserializer).map(Self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_from_cents() {
        assert_eq!(Price::from_cents(1999).amount(), Decimal::from_str("19.99").unwrap());
        assert_eq!(Price::from_cents(0), Price::ZERO);
    }

    #[test]
    fn test_display() {
        assert_eq!(Price::from_cents(1250).display(), "$12.50");
        assert_eq!(Price::from_dollars(100).to_string(), "$100.00");
    }

    #[test]
    fn test_line_arithmetic() {
        let unit = Price::from_cents(3333);
        assert_eq!(unit * 3, Price::from_cents(9999));
        let sum: Price = [Price::from_cents(9999), Price::from_cents(1)].into_iter().sum();
        assert_eq!(sum, Price::from_dollars(100));
    }

    #[test]
    fn test_serde_uses_numbers_and_accepts_strings() {
        let price = Price::from_cents(2450);
        assert_eq!(serde_json::to_string(&price).unwrap(), "24.5");

        let from_number: Price = serde_json::from_str("24.5").unwrap();
        let from_string: Price = serde_json::from_str("\"24.50\"").unwrap();
        assert_eq!(from_number, price);
        assert_eq!(from_string, price);
    }

    #[test]
    fn test_deserializes_integer_field_in_record() {
        #[derive(Deserialize)]
        struct Line {
            price: Price,
        }

        let line: Line = serde_json::from_str(r#"{"price": 12}"#).unwrap();
        assert_eq!(line.price, Price::from_cents(1200));
    }
}
