//! # roque-import: Spreadsheet Importers for the Roque Back Office
//!
//! Loads the distributor's spreadsheets and writes them through the
//! roque-db repositories.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Import Data Flow                                 │
//! │                                                                         │
//! │  roque import products|clients|receipts <file>                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  roque-import (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────────┐   ┌──────────────┐   ┌──────────────────┐   │   │
//! │  │   │  workbook    │   │  catalog     │   │  receipts        │   │   │
//! │  │   │              │   │              │   │                  │   │   │
//! │  │   │ calamine/csv │──►│ products     │   │ date header scan │   │   │
//! │  │   │ → Cell grid  │   │ clients      │   │ Remision cells   │   │   │
//! │  │   └──────────────┘   └──────┬───────┘   └────────┬─────────┘   │   │
//! │  │                             │                    │             │   │
//! │  │                             ▼                    ▼             │   │
//! │  │                      ┌─────────────────────────────────┐       │   │
//! │  │                      │  reconcile (upsert by key)      │       │   │
//! │  │                      └─────────────────────────────────┘       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  roque-db repositories, one transaction per import                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use roque_import::{import_receipts, ReceiptSheetLayout, Workbook};
//!
//! let workbook = Workbook::open(Path::new("entregas.xlsx"))?;
//! let summary = import_receipts(&db, &workbook, &ReceiptSheetLayout::default()).await?;
//! println!("{}", summary);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod catalog;
pub mod error;
pub mod receipts;
pub mod reconcile;
pub mod summary;
pub mod workbook;

// =============================================================================
// Re-exports
// =============================================================================

pub use catalog::{import_clients, import_products};
pub use error::{ImportError, ImportResult};
pub use receipts::{import_receipt_sheet, import_receipts, ReceiptSheetLayout};
pub use summary::{CatalogImportSummary, ReceiptImportSummary};
pub use workbook::{Sheet, Workbook};
