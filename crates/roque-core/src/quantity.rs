//! # Quantity Module
//!
//! Sale line quantities: fixed point with 3 decimals, stored as integer
//! thousandths. `2.5` boxes is `Quantity(2500)`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::money::parse_fixed;

/// A quantity with three decimals, stored in thousandths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Quantity(i64);

impl Quantity {
    /// Thousandths per unit.
    pub const SCALE: i64 = 1000;

    /// Smallest positive quantity (0.001).
    pub const MIN_POSITIVE: Quantity = Quantity(1);

    /// Largest quantity: 12 digits, 3 of them decimals (`999999999.999`).
    pub const MAX: Quantity = Quantity(999_999_999_999);

    #[inline]
    pub const fn from_thousandths(thousandths: i64) -> Self {
        Quantity(thousandths)
    }

    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Quantity(units * Self::SCALE)
    }

    #[inline]
    pub const fn thousandths(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Parses a decimal string, rounding half-even to three decimals.
    ///
    /// ## Example
    /// ```rust
    /// use roque_core::quantity::Quantity;
    ///
    /// assert_eq!(Quantity::parse("2.5").unwrap().thousandths(), 2500);
    /// assert_eq!(Quantity::parse("0.0015").unwrap().thousandths(), 2);
    /// assert!(Quantity::parse("two").is_none());
    /// ```
    pub fn parse(input: &str) -> Option<Quantity> {
        parse_fixed(input, 3).map(Quantity)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:03}", sign, abs / 1000, abs % 1000)
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Quantity(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(Quantity::parse("3"), Some(Quantity::from_units(3)));
        assert_eq!(Quantity::parse("0.001"), Some(Quantity::MIN_POSITIVE));
        assert_eq!(Quantity::parse("1.2345"), Some(Quantity::from_thousandths(1234)));
        assert_eq!(Quantity::parse("1.2355"), Some(Quantity::from_thousandths(1236)));
        assert_eq!(Quantity::parse(""), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Quantity::from_thousandths(2500).to_string(), "2.500");
        assert_eq!(Quantity::from_thousandths(1).to_string(), "0.001");
        assert_eq!(Quantity::from_thousandths(-1500).to_string(), "-1.500");
    }

    #[test]
    fn test_is_positive() {
        assert!(Quantity::MIN_POSITIVE.is_positive());
        assert!(!Quantity::default().is_positive());
        assert!(!Quantity::from_thousandths(-1).is_positive());
    }
}
