//! # Catalog Importers
//!
//! Product and client sheets exported from the distributor's system.
//!
//! ## Sheet Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  row 1   title                                        ← skipped         │
//! │  row 2   column headers                               ← skipped         │
//! │  row 3+  data; rows with every cell blank are ignored                   │
//! │                                                                         │
//! │  PRODUCTS   A: -   B: code   C: description                             │
//! │             D: purchase box  E: purchase piece                          │
//! │             F: sale box      G: sale piece                              │
//! │                                                                         │
//! │  CLIENTS    A: number  B: provider code  C: store name  D: contact      │
//! │             E: address F: phone          G: reference                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each import is one transaction: a database failure half way leaves the
//! catalog exactly as it was.

use roque_core::normalize::{normalize_amount, normalize_integer, normalize_text};
use roque_core::{Cell, ClientFields, Money, ProductFields};
use roque_db::{commit, Database};
use tracing::{info, warn};

use crate::error::ImportResult;
use crate::reconcile::{upsert_client, upsert_product};
use crate::summary::CatalogImportSummary;
use crate::workbook::Sheet;

/// Title and header rows at the top of both catalog sheets.
const HEADER_ROWS: usize = 2;

/// Upserts every product row of `sheet` by code.
pub async fn import_products(db: &Database, sheet: &Sheet) -> ImportResult<CatalogImportSummary> {
    info!(sheet = %sheet.name, rows = sheet.height(), "Importing products");

    let mut summary = CatalogImportSummary::default();
    let mut tx = db.begin().await?;

    for (idx, row) in data_rows(sheet) {
        let line = idx + 1;
        let cell = |col: usize| row.get(col).unwrap_or(&Cell::Empty);

        let fields = ProductFields {
            description: normalize_text(cell(2)),
            purchase_box: price(cell(3), "purchase box", line),
            purchase_piece: price(cell(4), "purchase piece", line),
            sale_box: price(cell(5), "sale box", line),
            sale_piece: price(cell(6), "sale piece", line),
        };

        match upsert_product(&mut tx, cell(1), &fields).await? {
            Some((_, created)) => summary.record(created),
            None => summary.skipped += 1,
        }
    }

    commit(tx).await?;

    info!(%summary, "Product import complete");
    Ok(summary)
}

/// Upserts every client row of `sheet` by provider code.
pub async fn import_clients(db: &Database, sheet: &Sheet) -> ImportResult<CatalogImportSummary> {
    info!(sheet = %sheet.name, rows = sheet.height(), "Importing clients");

    let mut summary = CatalogImportSummary::default();
    let mut tx = db.begin().await?;

    for (_, row) in data_rows(sheet) {
        let cell = |col: usize| row.get(col).unwrap_or(&Cell::Empty);

        let fields = ClientFields {
            number: normalize_integer(cell(0), 0),
            display_name: normalize_text(cell(2)),
            contact: normalize_text(cell(3)),
            address: normalize_text(cell(4)),
            phone: normalize_text(cell(5)),
            reference: normalize_text(cell(6)),
        };

        match upsert_client(&mut tx, cell(1), &fields).await? {
            Some((_, created)) => summary.record(created),
            None => summary.skipped += 1,
        }
    }

    commit(tx).await?;

    info!(%summary, "Client import complete");
    Ok(summary)
}

/// Data rows with their 0-based index, past the headers, minus all-blank rows.
fn data_rows(sheet: &Sheet) -> impl Iterator<Item = (usize, &[Cell])> {
    sheet
        .rows
        .iter()
        .enumerate()
        .skip(HEADER_ROWS)
        .filter(|(_, row)| !row.iter().all(Cell::is_blank))
        .map(|(idx, row)| (idx, row.as_slice()))
}

/// Prices can't go below zero or above [`Money::MAX_PRICE`]; such a cell
/// is stored as 0.00 and reported.
fn price(cell: &Cell, field: &str, line: usize) -> Money {
    let amount = normalize_amount(cell);
    if amount.is_negative() {
        warn!(row = line, field, value = %amount, "Negative price clamped to 0.00");
        return Money::zero();
    }
    if !amount.fits_within(Money::MAX_PRICE) {
        warn!(row = line, field, value = %amount, "Price above 99999999.99 stored as 0.00");
        return Money::zero();
    }
    amount
}

// =============================================================================
// Unit Tests
// =============================================================================
