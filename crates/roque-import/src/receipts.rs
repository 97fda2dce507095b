//! # Receipt Grid Importer
//!
//! Reads the weekly delivery sheet ("REL REM ENTREG1") and turns every
//! receipt cell into a Receipt with an empty Sale ready to be filled in.
//!
//! ## Sheet Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │        C          D             E         F                G            │
//! │  5     CLAVE      COMERCIO      CONTACTO  LUN 03/Nov/25    MAR 04/Nov/25│
//! │  6     PRO0002    Abarrotes L.  Lupe      Remision K-0070               │
//! │  7     PRO0003    Miscelanea    Juan                       Remisión K-71│
//! │  8     (blank → row skipped)                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Algorithm
//! ```text
//! header row ──► {column → date}        (none found → NoDateColumns)
//!      │
//!      ▼
//! for each data row with a client key:
//!     ensure_client(key, name, contact)
//!     for each date column, left to right:
//!         "Remision <folio>" ──► get_or_create Receipt(client, folio, date)
//!                                     │
//!                                     └── created ──► empty Sale (0.00)
//! ```
//!
//! The whole sheet is one transaction; any database error rolls back
//! every receipt, sale and client the run had written.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use roque_core::Cell;
use roque_db::{commit, Database, ReceiptRepository, SaleRepository};
use tracing::{debug, info, warn};

use crate::error::{ImportError, ImportResult};
use crate::reconcile::ensure_client;
use crate::summary::ReceiptImportSummary;
use crate::workbook::{Sheet, Workbook};

/// `DD/Mon/YY` anywhere in a header cell ("LUN  03/Nov/25").
static HEADER_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{2})/([A-Za-z]{3})/(\d{2})").expect("header date pattern"));

/// Receipt marker inside a grid cell ("Remision K-0070").
static RECEIPT_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)remisi[oó]n").expect("receipt marker pattern"));

// =============================================================================
// Layout
// =============================================================================

/// Where things live on the receipt sheet. Rows and columns are 1-based,
/// as printed in the spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptSheetLayout {
    pub sheet_name: String,
    pub header_row: usize,
    pub first_data_row: usize,
    pub key_column: usize,
    pub name_column: usize,
    pub contact_column: usize,
}

impl Default for ReceiptSheetLayout {
    fn default() -> Self {
        ReceiptSheetLayout {
            sheet_name: "REL REM ENTREG1".to_string(),
            header_row: 5,
            first_data_row: 6,
            key_column: 3,
            name_column: 4,
            contact_column: 5,
        }
    }
}

impl ReceiptSheetLayout {
    /// Same layout, different sheet name.
    pub fn with_sheet(mut self, name: impl Into<String>) -> Self {
        self.sheet_name = name.into();
        self
    }
}

// =============================================================================
// Header / cell parsing
// =============================================================================

/// Month abbreviation → month number, Spanish or English, any case.
fn month_number(abbrev: &str) -> Option<u32> {
    let month = match abbrev.to_ascii_lowercase().as_str() {
        "ene" | "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "abr" | "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "ago" | "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dic" | "dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// Parses the first `DD/Mon/YY` token of a header cell. Years are 20YY.
///
/// Returns `None` when there is no token, the month is unknown, or the
/// day does not exist in that month.
pub fn parse_header_date(text: &str) -> Option<NaiveDate> {
    let caps = HEADER_DATE.captures(text)?;
    let day: u32 = caps[1].parse().ok()?;
    let month = month_number(&caps[2])?;
    let year: i32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(2000 + year, month, day)
}

/// Maps each 0-based column of the header row that carries a date token
/// to that date, in column order.
pub fn detect_date_columns(sheet: &Sheet, header_row: usize) -> BTreeMap<usize, NaiveDate> {
    let mut columns = BTreeMap::new();
    let row = sheet.row(header_row.saturating_sub(1));

    for (col, cell) in row.iter().enumerate() {
        let Some(text) = cell.as_text() else {
            continue;
        };
        if !HEADER_DATE.is_match(text) {
            continue;
        }
        match parse_header_date(text) {
            Some(date) => {
                columns.insert(col, date);
            }
            None => warn!(column = col + 1, header = %text, "Unrecognised date in header, column ignored"),
        }
    }

    columns
}

/// The folio of a receipt cell: the text with the marker removed.
///
/// `None` for non-text cells, text without the marker, or a marker with
/// nothing else.
pub fn extract_folio(cell: &Cell) -> Option<String> {
    let text = cell.as_text()?;
    if !RECEIPT_MARKER.is_match(text) {
        return None;
    }
    let folio = RECEIPT_MARKER.replace_all(text, "").trim().to_string();
    if folio.is_empty() {
        None
    } else {
        Some(folio)
    }
}

// =============================================================================
// Import
// =============================================================================

/// Imports the receipt sheet named by `layout` from `workbook`.
pub async fn import_receipts(
    db: &Database,
    workbook: &Workbook,
    layout: &ReceiptSheetLayout,
) -> ImportResult<ReceiptImportSummary> {
    let sheet = workbook.sheet(&layout.sheet_name)?;
    import_receipt_sheet(db, sheet, layout).await
}

/// Imports one receipt sheet. Re-running it on the same data creates
/// nothing new: every receipt is then counted as existing.
pub async fn import_receipt_sheet(
    db: &Database,
    sheet: &Sheet,
    layout: &ReceiptSheetLayout,
) -> ImportResult<ReceiptImportSummary> {
    let date_columns = detect_date_columns(sheet, layout.header_row);
    if date_columns.is_empty() {
        return Err(ImportError::NoDateColumns {
            row: layout.header_row,
        });
    }

    info!(
        sheet = %sheet.name,
        date_columns = date_columns.len(),
        rows = sheet.height(),
        "Importing receipts"
    );

    let mut summary = ReceiptImportSummary {
        date_columns: date_columns.len(),
        ..Default::default()
    };

    let key_col = layout.key_column.saturating_sub(1);
    let name_col = layout.name_column.saturating_sub(1);
    let contact_col = layout.contact_column.saturating_sub(1);

    let mut tx = db.begin().await?;

    for row in layout.first_data_row.saturating_sub(1)..sheet.height() {
        let client = ensure_client(
            &mut tx,
            sheet.cell(row, key_col),
            sheet.cell(row, name_col),
            sheet.cell(row, contact_col),
        )
        .await?;

        let Some((client, client_created)) = client else {
            summary.rows_skipped += 1;
            continue;
        };
        if client_created {
            summary.clients_created += 1;
        }

        for (&col, &date) in &date_columns {
            let Some(folio) = extract_folio(sheet.cell(row, col)) else {
                continue;
            };

            let (receipt, created) = ReceiptRepository::new(&mut tx)
                .get_or_create(&client.id, &folio, date)
                .await?;

            if !created {
                debug!(folio = %folio, client = %client.provider_code, "Receipt already imported");
                summary.receipts_existing += 1;
                continue;
            }
            summary.receipts_created += 1;

            let mut sales = SaleRepository::new(&mut tx);
            if sales.find_by_receipt(&receipt.id).await?.is_none() {
                sales.create_empty_for_receipt(&receipt).await?;
                summary.sales_created += 1;
            }
        }
    }

    commit(tx).await?;

    info!(%summary, "Receipt import complete");
    Ok(summary)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_header_dates_spanish_and_english() {
        assert_eq!(parse_header_date("LUN  03/Nov/25"), Some(date(2025, 11, 3)));
        assert_eq!(parse_header_date("MIE 07/Ene/26"), Some(date(2026, 1, 7)));
        assert_eq!(parse_header_date("FRI 12/dec/25"), Some(date(2025, 12, 12)));
        assert_eq!(parse_header_date("VIE 15/Ago/25"), Some(date(2025, 8, 15)));
        assert_eq!(parse_header_date("CLAVE"), None);
        assert_eq!(parse_header_date("01/Xyz/25"), None);
        assert_eq!(parse_header_date("31/Feb/25"), None);
    }

    #[test]
    fn test_detect_date_columns_in_order() {
        let header = vec![
            Cell::Empty,
            Cell::Empty,
            Cell::from("CLAVE"),
            Cell::from("COMERCIO"),
            Cell::from("CONTACTO"),
            Cell::from("MAR 04/Nov/25"),
            Cell::from("LUN 03/Nov/25"),
            Cell::from("30/Feb/25"),
            Cell::Float(45964.0),
        ];
        let mut rows = vec![Vec::new(); 4];
        rows.push(header);
        let sheet = Sheet::new("S", rows);

        let columns = detect_date_columns(&sheet, 5);
        let found: Vec<(usize, NaiveDate)> = columns.into_iter().collect();
        assert_eq!(found, vec![(5, date(2025, 11, 4)), (6, date(2025, 11, 3))]);
    }

    #[test]
    fn test_extract_folio() {
        assert_eq!(extract_folio(&Cell::from("Remision K-0070")), Some("K-0070".into()));
        assert_eq!(extract_folio(&Cell::from("REMISIÓN  K-71 ")), Some("K-71".into()));
        assert_eq!(extract_folio(&Cell::from("remision")), None);
        assert_eq!(extract_folio(&Cell::from("Entregado")), None);
        assert_eq!(extract_folio(&Cell::Int(70)), None);
        assert_eq!(extract_folio(&Cell::Empty), None);
    }

    #[test]
    fn test_default_layout() {
        let layout = ReceiptSheetLayout::default();
        assert_eq!(layout.sheet_name, "REL REM ENTREG1");
        assert_eq!((layout.header_row, layout.first_data_row), (5, 6));
        assert_eq!(
            (layout.key_column, layout.name_column, layout.contact_column),
            (3, 4, 5)
        );
        assert_eq!(layout.with_sheet("Semana 2").sheet_name, "Semana 2");
    }
}
