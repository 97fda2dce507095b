//! # Value Normalizer
//!
//! Coerces ragged spreadsheet cells into typed domain fields.
//!
//! ## Where Cells Come From
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  .xlsx / .xls / .ods ──► calamine ──┐                                   │
//! │                                      ├──► Cell ──► normalize_amount     │
//! │  .csv ────────────────► csv ────────┘            normalize_integer     │
//! │                                                   normalize_text        │
//! │                                                                         │
//! │  Every normalizer is TOTAL: a bad cell becomes zero / default / "",    │
//! │  it never aborts a bulk import.                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```rust
//! use roque_core::normalize::{normalize_amount, normalize_integer, normalize_text, Cell};
//!
//! assert_eq!(normalize_amount(&Cell::from("1,234.50")).cents(), 123450);
//! assert_eq!(normalize_amount(&Cell::from("n/a")).cents(), 0);
//! assert_eq!(normalize_integer(&Cell::from("12.0"), 0), 12);
//! assert_eq!(normalize_text(&Cell::Float(42.0)), "42");
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::money::Money;

/// Tokens people type into spreadsheets to mean "no value".
const PLACEHOLDERS: [&str; 5] = ["-", "na", "n/a", "none", "nan"];

// =============================================================================
// Cell
// =============================================================================

/// A single spreadsheet cell, independent of the file format it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
}

impl Cell {
    /// True for empty cells and whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// The raw text of a text cell.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => f.write_str(s),
            Cell::Int(i) => write!(f, "{}", i),
            Cell::Float(x) => f.write_str(&format_float(*x)),
            Cell::Bool(b) => write!(f, "{}", b),
            Cell::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<i64> for Cell {
    fn from(i: i64) -> Self {
        Cell::Int(i)
    }
}

impl From<f64> for Cell {
    fn from(x: f64) -> Self {
        Cell::Float(x)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Cell::Empty)
    }
}

/// Integral floats print without a trailing `.0` (spreadsheets store every
/// number as a float, so a code typed as `1001` arrives as `1001.0`).
fn format_float(x: f64) -> String {
    if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e15 {
        format!("{:.0}", x)
    } else {
        x.to_string()
    }
}

// =============================================================================
// Normalizers
// =============================================================================

/// True when `raw` is blank or one of the "no value" tokens
/// (`-`, `na`, `n/a`, `none`, `nan`), ignoring case and surrounding spaces.
pub fn is_placeholder(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty() || PLACEHOLDERS.iter().any(|p| trimmed.eq_ignore_ascii_case(p))
}

/// Coerces a cell into a 2-decimal amount. Never fails.
///
/// ## Rules
/// - Empty, blank and placeholder cells → `0.00`
/// - Thousands separators (`,`), inner whitespace and a `$` sign are removed
/// - The rest must be a signed decimal; extra decimals round half-even
/// - Anything unparsable, or beyond [`Money::MAX_AMOUNT`] → `0.00`
pub fn normalize_amount(cell: &Cell) -> Money {
    let amount = match cell {
        Cell::Int(i) => i.checked_mul(100).map(Money::from_cents).unwrap_or_default(),
        Cell::Float(x) if x.is_finite() => Money::parse_decimal(&x.to_string()).unwrap_or_default(),
        Cell::Text(s) => {
            if is_placeholder(s) {
                return Money::zero();
            }
            let cleaned: String = s
                .chars()
                .filter(|c| *c != ',' && *c != '$' && !c.is_whitespace())
                .collect();
            Money::parse_decimal(&cleaned).unwrap_or_default()
        }
        _ => Money::zero(),
    };
    if amount.fits_within(Money::MAX_AMOUNT) {
        amount
    } else {
        Money::zero()
    }
}

/// Coerces a cell into an integer, falling back to `default`. Never fails.
///
/// ## Rules
/// - Empty, blank and placeholder cells → `default`
/// - Numeric cells and float-looking text (`"12.0"`, `"-3.9"`) truncate toward zero
/// - Otherwise only the digit characters are kept (`"A-12"` → `12`)
/// - No digits at all (or overflow) → `default`
pub fn normalize_integer(cell: &Cell, default: i64) -> i64 {
    match cell {
        Cell::Int(i) => *i,
        Cell::Float(x) if x.is_finite() && x.abs() < 9.2e18 => x.trunc() as i64,
        Cell::Text(s) => {
            if is_placeholder(s) {
                return default;
            }
            let trimmed = s.trim();
            if let Some(value) = truncate_decimal_text(trimmed) {
                return value;
            }
            let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
            if digits.is_empty() {
                return default;
            }
            digits.parse().unwrap_or(default)
        }
        _ => default,
    }
}

/// Parses `[+-]digits[.digits]`, truncating the fraction.
fn truncate_decimal_text(text: &str) -> Option<i64> {
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (int_part, frac_part) = rest.split_once('.').unwrap_or((rest, ""));

    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if int_part.is_empty() || !all_digits(int_part) || !all_digits(frac_part) {
        return None;
    }

    let value: i64 = int_part.parse().ok()?;
    Some(if negative { -value } else { value })
}

/// Coerces a cell into trimmed text. Empty cells become `""`.
pub fn normalize_text(cell: &Cell) -> String {
    match cell {
        Cell::Text(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
