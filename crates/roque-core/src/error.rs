//! # Error Types
//!
//! Domain-specific error types for roque-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  roque-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  roque-db errors                                                       │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  roque-import errors                                                   │
//! │  └── ImportError      - Unreadable workbook, missing sheet, ...        │
//! │                                                                         │
//! │  roque-cli errors                                                      │
//! │  └── ApiError         - What the operator sees                         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError/ImportError → ApiError    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Client not found: {0}")]
    ClientNotFound(String),

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Receipt not found: {0}")]
    ReceiptNotFound(String),

    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    #[error("Sale line not found: {0}")]
    SaleLineNotFound(String),

    /// Evidence image is write-once.
    ///
    /// ## When This Occurs
    /// ```text
    /// receipt attach R-1 scan.jpg   → stored remisiones/2025/11/scan.jpg
    /// receipt attach R-1 other.jpg  → EvidenceAlreadyAttached
    /// ```
    #[error("Receipt {folio} already has evidence attached ({path})")]
    EvidenceAlreadyAttached { folio: String, path: String },

    /// A sale may hold each (product, unit) pair only once.
    #[error("Sale already has a line for product {product_code} in unit {unit}")]
    DuplicateSaleLine { product_code: String, unit: String },

    /// A computed sale amount left the storable range.
    #[error("Sale {field} is out of range (limit {limit})")]
    AmountOutOfRange { field: String, limit: Money },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised by manual entry only. Spreadsheet input never fails validation:
/// the normalizers turn malformed cells into defaults instead.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be zero or greater.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value exceeds the largest storable amount.
    #[error("{field} must be at most {max}")]
    TooLarge { field: String, max: String },

    /// Invalid format (e.g., not a decimal number, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value within one submission.
    #[error("{field} '{value}' appears more than once")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
