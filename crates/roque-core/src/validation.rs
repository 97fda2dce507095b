//! # Validation Module
//!
//! Input validation for manual entry (CLI forms).
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Manual entry (roque-cli)                                              │
//! │  ├── parse_amount / parse_quantity / parse_date / validate_unit        │
//! │  └── THIS MODULE: *Input::validate before any write                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Spreadsheet import (roque-import)                                     │
//! │  └── NOT validated here: the normalizers default bad cells instead     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Database (SQLite)                                                     │
//! │  ├── UNIQUE (provider_code), UNIQUE (code), UNIQUE (client, folio)     │
//! │  ├── CHECK (prices ≥ 0, quantity > 0)                                  │
//! │  └── Foreign keys (RESTRICT / CASCADE)                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use roque_core::validation::{parse_amount, validate_folio};
//!
//! assert!(validate_folio("K-0070").is_ok());
//! assert_eq!(parse_amount("price", "1,250.5").unwrap().cents(), 125050);
//! ```

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::money::Money;
use crate::quantity::Quantity;
use crate::totals::line_subtotal;
use crate::types::{ClientInput, ProductInput, ReceiptInput, SaleHeaderInput, SaleLineInput, UnitType};
use crate::{
    MAX_FOLIO_LEN, MAX_PHONE_LEN, MAX_PRODUCT_CODE_LEN, MAX_PROVIDER_CODE_LEN, MAX_SEARCH_LEN,
    MAX_TEXT_LEN,
};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

fn check_text(field: &str, value: &str, max: usize, required: bool) -> ValidationResult<()> {
    let value = value.trim();

    if required && value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a product code (natural key).
///
/// ## Example
/// ```rust
/// use roque_core::validation::validate_product_code;
///
/// assert!(validate_product_code("A1").is_ok());
/// assert!(validate_product_code("  ").is_err());
/// ```
pub fn validate_product_code(code: &str) -> ValidationResult<()> {
    check_text("code", code, MAX_PRODUCT_CODE_LEN, true)
}

pub fn validate_description(description: &str) -> ValidationResult<()> {
    check_text("description", description, MAX_TEXT_LEN, true)
}

/// Validates a client provider code (natural key).
pub fn validate_provider_code(provider_code: &str) -> ValidationResult<()> {
    check_text("provider code", provider_code, MAX_PROVIDER_CODE_LEN, true)
}

pub fn validate_display_name(name: &str) -> ValidationResult<()> {
    check_text("display name", name, MAX_TEXT_LEN, true)
}

pub fn validate_folio(folio: &str) -> ValidationResult<()> {
    check_text("folio", folio, MAX_FOLIO_LEN, true)
}

/// Validates a search query.
///
/// ## Rules
/// - Can be empty (the search then returns nothing)
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > MAX_SEARCH_LEN {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: MAX_SEARCH_LEN,
        });
    }

    Ok(query.to_string())
}

/// Parses a unit code (`PAQ`, `PZA`, `box`, `piece`, ...).
pub fn validate_unit(raw: &str) -> ValidationResult<UnitType> {
    UnitType::parse(raw).ok_or_else(|| ValidationError::NotAllowed {
        field: "unit".to_string(),
        allowed: vec![UnitType::Box.code().to_string(), UnitType::Piece.code().to_string()],
    })
}

// =============================================================================
// Numeric Validators
// =============================================================================

fn check_amount(field: &str, amount: Money, max: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    if !amount.fits_within(max) {
        return Err(ValidationError::TooLarge {
            field: field.to_string(),
            max: max.to_string(),
        });
    }

    Ok(())
}

/// Catalog prices may be zero but never negative, and at most
/// [`Money::MAX_PRICE`].
pub fn validate_price(field: &str, price: Money) -> ValidationResult<()> {
    check_amount(field, price, Money::MAX_PRICE)
}

/// Sale amounts (line price, discount, tax): zero or more, at most
/// [`Money::MAX_AMOUNT`].
pub fn validate_amount(field: &str, amount: Money) -> ValidationResult<()> {
    check_amount(field, amount, Money::MAX_AMOUNT)
}

/// Quantities must be at least 0.001.
///
/// ## Example
/// ```rust
/// use roque_core::quantity::Quantity;
/// use roque_core::validation::validate_quantity;
///
/// assert!(validate_quantity(Quantity::from_thousandths(1)).is_ok());
/// assert!(validate_quantity(Quantity::from_thousandths(0)).is_err());
/// ```
pub fn validate_quantity(quantity: Quantity) -> ValidationResult<()> {
    if !quantity.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    if quantity > Quantity::MAX {
        return Err(ValidationError::TooLarge {
            field: "quantity".to_string(),
            max: Quantity::MAX.to_string(),
        });
    }

    Ok(())
}

/// Parses a typed-in amount. Thousands separators are accepted.
pub fn parse_amount(field: &str, raw: &str) -> ValidationResult<Money> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return Ok(Money::zero());
    }
    Money::parse_decimal(&cleaned).ok_or_else(|| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: format!("'{}' is not a decimal number", raw.trim()),
    })
}

pub fn parse_quantity(raw: &str) -> ValidationResult<Quantity> {
    let quantity = Quantity::parse(raw).ok_or_else(|| ValidationError::InvalidFormat {
        field: "quantity".to_string(),
        reason: format!("'{}' is not a decimal number", raw.trim()),
    })?;
    validate_quantity(quantity)?;
    Ok(quantity)
}

/// Parses an ISO date (`2025-11-03`).
pub fn parse_date(field: &str, raw: &str) -> ValidationResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "expected YYYY-MM-DD".to_string(),
    })
}

// =============================================================================
// Collection Validators
// =============================================================================

/// A sale holds each (product, unit) pair at most once.
pub fn validate_sale_lines(lines: &[SaleLineInput]) -> ValidationResult<()> {
    let mut seen = HashSet::new();

    for line in lines {
        line.validate()?;
        if !seen.insert((line.product_id.as_str(), line.unit)) {
            return Err(ValidationError::Duplicate {
                field: "product/unit".to_string(),
                value: format!("{} {}", line.product_id, line.unit),
            });
        }
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id.trim()).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// DTO Validation
// =============================================================================

impl ProductInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_product_code(&self.code)?;
        validate_description(&self.fields.description)?;
        validate_price("purchase price (box)", self.fields.purchase_box)?;
        validate_price("purchase price (piece)", self.fields.purchase_piece)?;
        validate_price("sale price (box)", self.fields.sale_box)?;
        validate_price("sale price (piece)", self.fields.sale_piece)?;
        Ok(())
    }
}

impl ClientInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_provider_code(&self.provider_code)?;
        validate_display_name(&self.fields.display_name)?;
        check_text("contact", &self.fields.contact, MAX_TEXT_LEN, false)?;
        check_text("address", &self.fields.address, MAX_TEXT_LEN, false)?;
        check_text("phone", &self.fields.phone, MAX_PHONE_LEN, false)?;
        check_text("reference", &self.fields.reference, MAX_TEXT_LEN, false)?;
        Ok(())
    }
}

impl ReceiptInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_id("client", &self.client_id)?;
        validate_folio(&self.folio)?;
        Ok(())
    }
}

impl SaleHeaderInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_amount("discount", self.discount)?;
        validate_amount("tax", self.tax)?;
        Ok(())
    }
}

impl SaleLineInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_id("product", &self.product_id)?;
        validate_quantity(self.quantity)?;
        validate_amount("unit price", self.unit_price)?;
        validate_amount("line subtotal", line_subtotal(self.quantity, self.unit_price))?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ClientFields, ProductFields};

    const PRODUCT_ID: &str = "550e8400-e29b-41d4-a716-446655440000";

    fn line(unit: UnitType, qty: i64) -> SaleLineInput {
        SaleLineInput {
            product_id: PRODUCT_ID.to_string(),
            unit,
            quantity: Quantity::from_thousandths(qty),
            unit_price: Money::from_cents(100),
        }
    }

    #[test]
    fn test_validate_codes() {
        assert!(validate_product_code("A1").is_ok());
        assert!(validate_product_code("").is_err());
        assert!(validate_product_code(&"A".repeat(101)).is_err());
        assert!(validate_provider_code("PROV-001").is_ok());
        assert!(validate_provider_code(&"P".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_folio_counts_chars() {
        assert!(validate_folio("K-0070").is_ok());
        assert!(validate_folio("   ").is_err());
        assert!(validate_folio(&"ñ".repeat(50)).is_ok());
        assert!(validate_folio(&"ñ".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_search_query() {
        assert_eq!(validate_search_query("  widget ").unwrap(), "widget");
        assert_eq!(validate_search_query("").unwrap(), "");
        assert!(validate_search_query(&"x".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_unit() {
        assert_eq!(validate_unit("PAQ").unwrap(), UnitType::Box);
        assert_eq!(validate_unit("piece").unwrap(), UnitType::Piece);
        assert!(matches!(validate_unit("kg"), Err(ValidationError::NotAllowed { .. })));
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("price", "1,000.00").unwrap(), Money::from_cents(100000));
        assert_eq!(parse_amount("price", "").unwrap(), Money::zero());
        assert!(parse_amount("price", "ten").is_err());
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("2.5").unwrap(), Quantity::from_thousandths(2500));
        assert!(parse_quantity("0").is_err());
        assert!(parse_quantity("0.0004").is_err());
        assert!(parse_quantity("x").is_err());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("date", "2025-11-03").unwrap(),
            NaiveDate::from_ymd_opt(2025, 11, 3).unwrap()
        );
        assert!(parse_date("date", "03/Nov/25").is_err());
    }

    #[test]
    fn test_validate_sale_lines_rejects_duplicate_pair() {
        assert!(validate_sale_lines(&[line(UnitType::Box, 1000), line(UnitType::Piece, 1000)]).is_ok());

        let err = validate_sale_lines(&[line(UnitType::Box, 1000), line(UnitType::Box, 2000)]);
        assert!(matches!(err, Err(ValidationError::Duplicate { .. })));
    }

    #[test]
    fn test_sale_line_input_validate() {
        assert!(line(UnitType::Piece, 1).validate().is_ok());
        assert!(line(UnitType::Piece, 0).validate().is_err());

        let mut negative = line(UnitType::Piece, 1000);
        negative.unit_price = Money::from_cents(-1);
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_amounts_are_bounded() {
        let huge = parse_amount("price", "92233720368547758.07").unwrap();
        assert!(matches!(validate_price("price", huge), Err(ValidationError::TooLarge { .. })));
        assert!(matches!(validate_amount("tax", huge), Err(ValidationError::TooLarge { .. })));

        assert!(validate_price("price", parse_amount("price", "99,999,999.99").unwrap()).is_ok());
        assert!(validate_price("price", parse_amount("price", "100,000,000").unwrap()).is_err());
        assert!(validate_amount("tax", parse_amount("tax", "9,999,999,999.99").unwrap()).is_ok());

        let header = SaleHeaderInput {
            date: NaiveDate::from_ymd_opt(2025, 11, 3).unwrap(),
            discount: Money::zero(),
            tax: huge,
        };
        assert!(header.validate().is_err());
    }

    #[test]
    fn test_sale_line_subtotal_must_fit() {
        let mut big = line(UnitType::Box, 2000);
        big.unit_price = Money::MAX_AMOUNT;
        assert!(matches!(big.validate(), Err(ValidationError::TooLarge { .. })));

        big.quantity = Quantity::from_thousandths(1000);
        assert!(big.validate().is_ok());

        big.quantity = Quantity::from_thousandths(Quantity::MAX.thousandths() + 1);
        big.unit_price = Money::zero();
        assert!(matches!(big.validate(), Err(ValidationError::TooLarge { .. })));
    }

    #[test]
    fn test_product_input_validate() {
        let mut input = ProductInput {
            code: "A1".into(),
            fields: ProductFields {
                description: "Widget".into(),
                sale_box: Money::from_cents(1000),
                ..Default::default()
            },
        };
        assert!(input.validate().is_ok());

        input.fields.purchase_piece = Money::from_cents(-5);
        assert!(matches!(input.validate(), Err(ValidationError::Negative { .. })));
    }

    #[test]
    fn test_client_input_validate() {
        let mut input = ClientInput {
            provider_code: "P-1".into(),
            fields: ClientFields {
                display_name: "Abarrotes Lupita".into(),
                ..Default::default()
            },
        };
        assert!(input.validate().is_ok());

        input.fields.display_name.clear();
        assert!(matches!(input.validate(), Err(ValidationError::Required { .. })));
    }

    #[test]
    fn test_validate_id() {
        assert!(validate_id("id", PRODUCT_ID).is_ok());
        assert!(validate_id("id", "").is_err());
        assert!(validate_id("id", "not-a-uuid").is_err());
    }
}
