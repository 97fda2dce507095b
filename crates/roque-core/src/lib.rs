//! # roque-core: Pure Business Logic for the Roque Back Office
//!
//! This crate holds the domain of a small wholesale back office: clients,
//! products, delivery receipts ("remisiones") and the sales raised from them.
//! Everything here is pure: no database, no files, no logging.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Roque Back-Office Architecture                     │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    roque-cli (commands)                         │   │
//! │  │    product / client / receipt / sale / search / import          │   │
//! │  └───────────────┬───────────────────────────────┬─────────────────┘   │
//! │                  │                               │                      │
//! │                  │               ┌───────────────▼─────────────────┐   │
//! │                  │               │  roque-import (spreadsheets)    │   │
//! │                  │               └───────────────┬─────────────────┘   │
//! │  ┌───────────────▼───────────────────────────────▼─────────────────┐   │
//! │  │                    roque-db (SQLite repositories)               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ roque-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │ normalize │  │  totals   │  │   │
//! │  │   │  Client   │  │   Money   │  │   Cell    │  │ SaleTotals│  │   │
//! │  │   │  Receipt  │  │ Quantity  │  │  amount   │  │ recalc    │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO FILES • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain entities (Client, Product, Receipt, Sale, SaleLine) and input DTOs
//! - [`money`] - Money type with integer arithmetic (2 decimals)
//! - [`quantity`] - Quantity type with integer arithmetic (3 decimals)
//! - [`normalize`] - Spreadsheet cell normalization (amounts, integers, text)
//! - [`totals`] - Sale subtotal / total calculation
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use roque_core::normalize::{normalize_amount, Cell};
//! use roque_core::totals::line_subtotal;
//! use roque_core::{Money, Quantity};
//!
//! // A messy spreadsheet cell becomes an exact amount
//! let price = normalize_amount(&Cell::Text("1,234.50".into()));
//! assert_eq!(price, Money::from_cents(123450));
//!
//! // Line subtotal = round(quantity × price, 2)
//! let qty = Quantity::parse("2").unwrap();
//! assert_eq!(line_subtotal(qty, price).to_string(), "2469.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod normalize;
pub mod quantity;
pub mod totals;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use normalize::Cell;
pub use quantity::Quantity;
pub use totals::SaleTotals;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length of a receipt folio.
pub const MAX_FOLIO_LEN: usize = 50;

/// Maximum length of a client provider code.
pub const MAX_PROVIDER_CODE_LEN: usize = 50;

/// Maximum length of a product code.
pub const MAX_PRODUCT_CODE_LEN: usize = 100;

/// Maximum length of names, descriptions, addresses and other free text.
pub const MAX_TEXT_LEN: usize = 255;

/// Maximum length of a phone field.
pub const MAX_PHONE_LEN: usize = 100;

/// Maximum length of a global search query.
pub const MAX_SEARCH_LEN: usize = 100;
