//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Spreadsheet cells arrive as floats:                                    │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents (2-decimal fixed point)                    │
//! │    "1,234.50" → 123450 cents                                            │
//! │    Every amount in the system is rounded to the cent ONCE, at the      │
//! │    boundary, using round-half-even.                                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use roque_core::money::Money;
//!
//! let price = Money::from_cents(1099); // 10.99
//! let doubled = price * 2;             // 21.98
//! assert_eq!(doubled.to_string(), "21.98");
//!
//! let parsed = Money::parse_decimal("1234.505").unwrap();
//! assert_eq!(parsed.cents(), 123450); // half-even: ...0.505 → ...0.50
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use crate::quantity::Quantity;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in cents (2-decimal fixed point).
///
/// ## Design Decisions
/// - **i64 (signed)**: A sale total can go negative when the discount exceeds
///   the subtotal; the type does not forbid it, validation does where needed.
/// - **Single field tuple struct**: Zero-cost abstraction over i64
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Spreadsheet cell ──► normalize_amount ──► Product prices               │
/// │                                                                         │
/// │  SaleLine.unit_price × Quantity ──► SaleLine.subtotal (rounded)         │
/// │                                                                         │
/// │  Σ SaleLine.subtotal ──► Sale.subtotal ──► − discount + tax ──► total   │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Largest catalog price: 10 digits, 2 of them decimals (`99999999.99`).
    pub const MAX_PRICE: Money = Money(9_999_999_999);

    /// Largest sale amount (line price, subtotal, discount, tax, total):
    /// 12 digits, 2 of them decimals (`9999999999.99`).
    pub const MAX_AMOUNT: Money = Money(999_999_999_999);

    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from whole units and cents.
    ///
    /// ## Example
    /// ```rust
    /// use roque_core::money::Money;
    ///
    /// assert_eq!(Money::from_major_minor(10, 99).cents(), 1099);
    /// assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    /// ```
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-unit portion (truncated toward zero).
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the cents portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// True when the magnitude is at most `limit`.
    #[inline]
    pub const fn fits_within(&self, limit: Money) -> bool {
        self.0.unsigned_abs() <= limit.0.unsigned_abs()
    }

    #[inline]
    pub const fn checked_add(self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    #[inline]
    pub const fn checked_sub(self, other: Money) -> Option<Money> {
        match self.0.checked_sub(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Parses a plain decimal string into Money.
    ///
    /// Accepts an optional sign, digits with an optional fractional part and
    /// an optional exponent (`"1.5e3"`). Extra fractional digits are rounded
    /// half-even to the cent. Returns `None` for anything else, including
    /// thousands separators: cleaning ragged input is the normalizer's job.
    ///
    /// ## Example
    /// ```rust
    /// use roque_core::money::Money;
    ///
    /// assert_eq!(Money::parse_decimal("10").unwrap().cents(), 1000);
    /// assert_eq!(Money::parse_decimal("-0.125").unwrap().cents(), -12);
    /// assert!(Money::parse_decimal("1,000").is_none());
    /// ```
    pub fn parse_decimal(input: &str) -> Option<Money> {
        parse_fixed(input, 2).map(Money)
    }

    /// Multiplies a unit price by a fractional quantity.
    ///
    /// The exact product has up to five decimals (2 from the price, 3 from
    /// the quantity); it is rounded half-even back to the cent.
    ///
    /// ## Example
    /// ```rust
    /// use roque_core::money::Money;
    /// use roque_core::quantity::Quantity;
    ///
    /// let price = Money::from_cents(1999);              // 19.99
    /// let qty = Quantity::parse("2.5").unwrap();        // 2.500
    /// assert_eq!(price.times_quantity(qty).cents(), 4998); // 49.975 → 49.98
    /// ```
    pub fn times_quantity(&self, quantity: Quantity) -> Money {
        let exact = self.0 as i128 * quantity.thousandths() as i128;
        let cents = div_round_half_even(exact, Quantity::SCALE as i128);
        Money(saturate_i64(cents))
    }
}

// =============================================================================
// Fixed-point parsing helpers
// =============================================================================

/// Largest number of significant digits accepted by [`parse_fixed`].
///
/// Keeps every intermediate value inside i128.
const MAX_DIGITS: usize = 30;

/// Parses a decimal literal into an integer scaled by `10^decimals`,
/// rounding half-even. Shared by [`Money`] and [`Quantity`].
pub(crate) fn parse_fixed(input: &str, decimals: u32) -> Option<i64> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }

    let (negative, rest) = match s.as_bytes()[0] {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };

    let (number, exponent) = match rest.find(['e', 'E']) {
        Some(pos) => {
            let exp: i32 = rest[pos + 1..].parse().ok()?;
            (&rest[..pos], exp)
        }
        None => (rest, 0),
    };

    let (int_part, frac_part) = match number.split_once('.') {
        Some((i, f)) => (i, f),
        None => (number, ""),
    };

    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit()) || !frac_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let digits = format!("{}{}", int_part, frac_part);
    let digits = digits.trim_start_matches('0');
    if digits.len() > MAX_DIGITS {
        return None;
    }
    let mantissa: i128 = if digits.is_empty() { 0 } else { digits.parse().ok()? };

    // value = mantissa × 10^(exponent − frac_len); we want value × 10^decimals
    let shift = decimals as i64 + exponent as i64 - frac_part.len() as i64;
    let scaled = if shift >= 0 {
        if mantissa == 0 {
            0
        } else {
            let factor = 10_i128.checked_pow(u32::try_from(shift).ok()?)?;
            mantissa.checked_mul(factor)?
        }
    } else if -shift > 38 {
        0
    } else {
        div_round_half_even(mantissa, 10_i128.pow((-shift) as u32))
    };

    let signed = if negative { -scaled } else { scaled };
    i64::try_from(signed).ok()
}

/// Integer division rounding to nearest, ties to even. `divisor` must be > 0.
pub(crate) fn div_round_half_even(value: i128, divisor: i128) -> i128 {
    let quotient = value.div_euclid(divisor);
    let remainder = value.rem_euclid(divisor);
    let twice = remainder * 2;

    if twice > divisor || (twice == divisor && quotient % 2 != 0) {
        quotient + 1
    } else {
        quotient
    }
}

fn saturate_i64(value: i128) -> i64 {
    value.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Renders as a plain 2-decimal number (`1234.50`, `-5.50`).
///
/// No currency symbol: the back office works in a single currency and the
/// same text is written to CSV-like reports.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.cents_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(123450).to_string(), "1234.50");
        assert_eq!(Money::from_cents(500).to_string(), "5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::from_cents(-5).to_string(), "-0.05");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);
        assert_eq!((-a).cents(), -1000);

        let total: Money = [a, b, b].iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_checked_arithmetic_and_bounds() {
        let max = Money::from_cents(i64::MAX);
        assert_eq!(max.checked_add(Money::from_cents(1)), None);
        assert_eq!(Money::from_cents(i64::MIN).checked_sub(Money::from_cents(1)), None);
        assert_eq!(
            Money::from_cents(100).checked_sub(Money::from_cents(250)),
            Some(Money::from_cents(-150))
        );

        assert!(Money::parse_decimal("99999999.99").unwrap().fits_within(Money::MAX_PRICE));
        assert!(!Money::parse_decimal("100000000").unwrap().fits_within(Money::MAX_PRICE));
        assert!(Money::from_cents(-999_999_999_999).fits_within(Money::MAX_AMOUNT));
        assert!(!Money::from_cents(i64::MIN).fits_within(Money::MAX_AMOUNT));
    }

    #[test]
    fn test_parse_decimal_plain() {
        assert_eq!(Money::parse_decimal("1234.50"), Some(Money::from_cents(123450)));
        assert_eq!(Money::parse_decimal("10"), Some(Money::from_cents(1000)));
        assert_eq!(Money::parse_decimal(".5"), Some(Money::from_cents(50)));
        assert_eq!(Money::parse_decimal("7."), Some(Money::from_cents(700)));
        assert_eq!(Money::parse_decimal("+3.1"), Some(Money::from_cents(310)));
        assert_eq!(Money::parse_decimal("-0.01"), Some(Money::from_cents(-1)));
        assert_eq!(Money::parse_decimal("1.5e3"), Some(Money::from_cents(150000)));
        assert_eq!(Money::parse_decimal("25E-2"), Some(Money::from_cents(25)));
    }

    #[test]
    fn test_parse_decimal_rounds_half_even() {
        assert_eq!(Money::parse_decimal("0.125").unwrap().cents(), 12);
        assert_eq!(Money::parse_decimal("0.135").unwrap().cents(), 14);
        assert_eq!(Money::parse_decimal("0.1251").unwrap().cents(), 13);
        assert_eq!(Money::parse_decimal("-0.125").unwrap().cents(), -12);
        assert_eq!(Money::parse_decimal("0.30000000000000004").unwrap().cents(), 30);
    }

    #[test]
    fn test_parse_decimal_rejects_garbage() {
        assert_eq!(Money::parse_decimal(""), None);
        assert_eq!(Money::parse_decimal("."), None);
        assert_eq!(Money::parse_decimal("-"), None);
        assert_eq!(Money::parse_decimal("1,000"), None);
        assert_eq!(Money::parse_decimal("12abc"), None);
        assert_eq!(Money::parse_decimal("1.2.3"), None);
        assert_eq!(Money::parse_decimal("1e"), None);
        assert_eq!(Money::parse_decimal("9".repeat(40).as_str()), None);
    }

    #[test]
    fn test_times_quantity_rounding() {
        let price = Money::from_cents(1999);
        assert_eq!(price.times_quantity(Quantity::from_thousandths(2500)).cents(), 4998);
        assert_eq!(price.times_quantity(Quantity::from_thousandths(1000)).cents(), 1999);
        // 0.01 × 0.5 = 0.005 → tie → 0.00 (even)
        assert_eq!(Money::from_cents(1).times_quantity(Quantity::from_thousandths(500)).cents(), 0);
        // 0.03 × 0.5 = 0.015 → tie → 0.02 (even)
        assert_eq!(Money::from_cents(3).times_quantity(Quantity::from_thousandths(500)).cents(), 2);
    }

    #[test]
    fn test_div_round_half_even() {
        assert_eq!(div_round_half_even(5, 10), 0);
        assert_eq!(div_round_half_even(15, 10), 2);
        assert_eq!(div_round_half_even(25, 10), 2);
        assert_eq!(div_round_half_even(26, 10), 3);
        assert_eq!(div_round_half_even(-5, 10), 0);
        assert_eq!(div_round_half_even(-15, 10), -2);
        assert_eq!(div_round_half_even(-16, 10), -2);
    }
}
