//! # Domain Types
//!
//! Core domain types used throughout the Roque back office.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐        ┌─────────────────┐                         │
//! │  │     Client      │ 1    * │     Receipt     │                         │
//! │  │  ─────────────  │◄───────│  ─────────────  │                         │
//! │  │  provider_code  │        │  folio          │   (client, folio) unique│
//! │  │  display_name   │        │  date           │                         │
//! │  └─────────────────┘        │  image_path     │                         │
//! │                             └────────┬────────┘                         │
//! │                                      │ 1                                │
//! │                                      │ 0..1                             │
//! │  ┌─────────────────┐        ┌────────▼────────┐                         │
//! │  │     Product     │ 1    * │      Sale       │                         │
//! │  │  ─────────────  │◄──┐    │  ─────────────  │                         │
//! │  │  code           │   │    │  subtotal       │                         │
//! │  │  4 prices       │   │    │  discount / tax │                         │
//! │  └─────────────────┘   │    │  total          │                         │
//! │                        │    └────────┬────────┘                         │
//! │                        │             │ 1 (owns, cascade)               │
//! │                        │             │ *                                │
//! │                        │    ┌────────▼────────┐                         │
//! │                        └────│    SaleLine     │  (sale, product, unit)  │
//! │                             │  unit PAQ|PZA   │  unique                 │
//! │                             └─────────────────┘                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business key: provider code, product code, (client, folio) - what the
//!   spreadsheets and the paper documents use

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::quantity::Quantity;

// =============================================================================
// Client
// =============================================================================

/// A customer store, identified by the provider code the distributor assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    /// Route / list number from the client sheet (0 when unknown).
    pub number: i64,
    /// Natural key.
    pub provider_code: String,
    /// Store name ("comercio").
    pub display_name: String,
    pub contact: String,
    pub address: String,
    pub phone: String,
    pub reference: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Everything about a client except its natural key.
///
/// Used both by manual entry and by the catalog reconciler, which
/// overwrites every field on an existing client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientFields {
    pub number: i64,
    pub display_name: String,
    pub contact: String,
    pub address: String,
    pub phone: String,
    pub reference: String,
}

/// Manual client entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInput {
    pub provider_code: String,
    #[serde(flatten)]
    pub fields: ClientFields,
}

// =============================================================================
// Product
// =============================================================================

/// A catalog product with box ("cjs") and piece ("pzs") prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    /// Natural key.
    pub code: String,
    pub description: String,
    pub purchase_box_cents: i64,
    pub purchase_piece_cents: i64,
    pub sale_box_cents: i64,
    pub sale_piece_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn purchase_box(&self) -> Money {
        Money::from_cents(self.purchase_box_cents)
    }

    #[inline]
    pub fn purchase_piece(&self) -> Money {
        Money::from_cents(self.purchase_piece_cents)
    }

    #[inline]
    pub fn sale_box(&self) -> Money {
        Money::from_cents(self.sale_box_cents)
    }

    #[inline]
    pub fn sale_piece(&self) -> Money {
        Money::from_cents(self.sale_piece_cents)
    }

    /// Default sale price for a line in the given unit.
    pub fn sale_price(&self, unit: UnitType) -> Money {
        match unit {
            UnitType::Box => self.sale_box(),
            UnitType::Piece => self.sale_piece(),
        }
    }
}

/// Everything about a product except its code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFields {
    pub description: String,
    pub purchase_box: Money,
    pub purchase_piece: Money,
    pub sale_box: Money,
    pub sale_piece: Money,
}

/// Manual product entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub code: String,
    #[serde(flatten)]
    pub fields: ProductFields,
}

// =============================================================================
// Receipt
// =============================================================================

/// A paper delivery receipt ("remisión") and its optional scanned evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub id: String,
    pub folio: String,
    pub client_id: String,
    pub date: NaiveDate,
    /// Path of the scanned image, relative to the media root.
    pub image_path: Option<String>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Receipt {
    #[inline]
    pub fn has_evidence(&self) -> bool {
        self.image_path.is_some()
    }
}

/// Receipt row for list screens, joined with its client and sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct ReceiptListing {
    pub id: String,
    pub folio: String,
    pub date: NaiveDate,
    pub client_id: String,
    pub client_provider_code: String,
    pub client_name: String,
    pub has_image: bool,
    pub sale_id: Option<String>,
    pub sale_total_cents: Option<i64>,
}

/// Manual receipt entry / edit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptInput {
    pub client_id: String,
    pub folio: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub notes: String,
}

// =============================================================================
// Unit Type
// =============================================================================

/// How a sale line is counted.
///
/// Stored as the codes printed on the paper receipts: `PAQ` and `PZA`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
pub enum UnitType {
    /// Box / package ("paquete").
    #[serde(rename = "PAQ")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "PAQ"))]
    Box,
    /// Single piece ("pieza").
    #[default]
    #[serde(rename = "PZA")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "PZA"))]
    Piece,
}

impl UnitType {
    /// Storage / display code.
    pub const fn code(&self) -> &'static str {
        match self {
            UnitType::Box => "PAQ",
            UnitType::Piece => "PZA",
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            UnitType::Box => "Paquetes",
            UnitType::Piece => "Piezas",
        }
    }

    /// Accepts the codes plus common spellings, ignoring case.
    pub fn parse(raw: &str) -> Option<UnitType> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "paq" | "box" | "caja" | "cjs" | "paquete" | "paquetes" => Some(UnitType::Box),
            "pza" | "piece" | "pzs" | "pieza" | "piezas" => Some(UnitType::Piece),
            _ => None,
        }
    }
}

impl std::fmt::Display for UnitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

// =============================================================================
// Sale
// =============================================================================

/// The commercial record raised from a receipt (one per receipt at most).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    pub receipt_id: String,
    pub date: NaiveDate,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    #[inline]
    pub fn discount(&self) -> Money {
        Money::from_cents(self.discount_cents)
    }

    #[inline]
    pub fn tax(&self) -> Money {
        Money::from_cents(self.tax_cents)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// Sale row for list screens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct SaleListing {
    pub id: String,
    pub receipt_id: String,
    pub folio: String,
    pub client_id: String,
    pub client_name: String,
    pub date: NaiveDate,
    pub total_cents: i64,
}

/// Sale header edit: date, discount and tax. Subtotal and total are derived.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleHeaderInput {
    pub date: NaiveDate,
    pub discount: Money,
    pub tax: Money,
}

/// Narrows the sale list ("ventas por cliente / producto").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleFilter {
    pub client_id: Option<String>,
    /// Keeps sales with at least one line for this product.
    pub product_id: Option<String>,
}

// =============================================================================
// Sale Line
// =============================================================================

/// A line item in a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct SaleLine {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    pub unit: UnitType,
    /// Quantity in thousandths.
    pub quantity_milli: i64,
    pub unit_price_cents: i64,
    /// round(quantity × unit price, 2), refreshed on every save.
    pub subtotal_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SaleLine {
    #[inline]
    pub fn quantity(&self) -> Quantity {
        Quantity::from_thousandths(self.quantity_milli)
    }

    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

/// Sale line joined with its product, for detail screens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct SaleLineView {
    pub id: String,
    pub product_id: String,
    pub product_code: String,
    pub product_description: String,
    pub unit: UnitType,
    pub quantity_milli: i64,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

/// Add / edit one sale line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleLineInput {
    pub product_id: String,
    pub unit: UnitType,
    pub quantity: Quantity,
    pub unit_price: Money,
}

// =============================================================================
// Search
// =============================================================================

/// Result of the global search box.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    pub query: String,
    pub products: Vec<Product>,
    pub clients: Vec<Client>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.products.is_empty() && self.clients.is_empty()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
