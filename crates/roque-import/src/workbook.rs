//! # Workbook Loading
//!
//! Reads any supported spreadsheet into a format-independent grid of
//! [`Cell`]s.
//!
//! ## Formats
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  extension        reader                        sheets                  │
//! │  ─────────────    ───────────────────────────   ─────────────────────   │
//! │  xlsx xlsm xlsb   calamine::open_workbook_auto  all, in file order      │
//! │  xls ods          calamine::open_workbook_auto  all, in file order      │
//! │  csv              csv::ReaderBuilder            one, named after stem   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Addressing
//! calamine ranges start at the first used cell, not at A1. The range start
//! offset is re-applied so that `sheet.cell(row, col)` always means the same
//! cell the user sees in the spreadsheet (0-based: A1 = `(0, 0)`).

use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Reader};
use chrono::{Duration, NaiveDate};
use roque_core::Cell;
use tracing::debug;

use crate::error::{ImportError, ImportResult};

/// One worksheet, addressed from A1.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<Cell>>) -> Self {
        Sheet {
            name: name.into(),
            rows,
        }
    }

    /// The cell at 0-based `(row, col)`; outside the used area this is `Empty`.
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        static EMPTY: Cell = Cell::Empty;
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }

    /// The cells of a 0-based row (empty slice past the end).
    pub fn row(&self, row: usize) -> &[Cell] {
        self.rows.get(row).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }
}

/// All sheets of a spreadsheet file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    /// Opens a spreadsheet from disk, picking the reader by extension.
    pub fn open(path: &Path) -> ImportResult<Self> {
        let ext = extension(path);
        debug!(path = %path.display(), ext = %ext, "Opening workbook");

        if ext == "csv" {
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "Sheet1".to_string());
            let reader = csv::ReaderBuilder::new()
                .has_headers(false)
                .flexible(true)
                .from_path(path)?;
            return Ok(Workbook {
                sheets: vec![read_csv(name, reader)?],
            });
        }

        let mut workbook = open_workbook_auto(path)?;
        let names = workbook.sheet_names().to_vec();
        let mut sheets = Vec::with_capacity(names.len());
        for name in names {
            let range = workbook.worksheet_range(&name)?;
            sheets.push(sheet_from_range(name, &range));
        }

        Ok(Workbook { sheets })
    }

    /// Reads an uploaded file held in memory. `ext` is the original file
    /// extension (`"xlsx"`, `"csv"`, ...); the CSV sheet is named `Sheet1`.
    pub fn from_bytes(bytes: &[u8], ext: &str) -> ImportResult<Self> {
        if ext.eq_ignore_ascii_case("csv") {
            let reader = csv::ReaderBuilder::new()
                .has_headers(false)
                .flexible(true)
                .from_reader(bytes);
            return Ok(Workbook {
                sheets: vec![read_csv("Sheet1".to_string(), reader)?],
            });
        }

        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
        let names = workbook.sheet_names().to_vec();
        let mut sheets = Vec::with_capacity(names.len());
        for name in names {
            let range = workbook.worksheet_range(&name)?;
            sheets.push(sheet_from_range(name, &range));
        }

        Ok(Workbook { sheets })
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    /// Looks a sheet up by exact name.
    ///
    /// ## Returns
    /// * `Err(ImportError::MissingSheet)` - listing the sheets that do exist
    pub fn sheet(&self, name: &str) -> ImportResult<&Sheet> {
        self.sheets
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| ImportError::MissingSheet {
                name: name.to_string(),
                available: self.sheet_names(),
            })
    }

    /// The sheet a spreadsheet opens on: the first one.
    pub fn active(&self) -> ImportResult<&Sheet> {
        self.sheets.first().ok_or(ImportError::EmptyWorkbook)
    }

    /// `sheet(name)` when a name is given, `active()` otherwise.
    pub fn sheet_or_active(&self, name: Option<&str>) -> ImportResult<&Sheet> {
        match name {
            Some(name) => self.sheet(name),
            None => self.active(),
        }
    }
}

// =============================================================================
// Readers
// =============================================================================

fn extension(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default()
}

fn read_csv<R: std::io::Read>(name: String, mut reader: csv::Reader<R>) -> ImportResult<Sheet> {
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text(field.to_string())
                    }
                })
                .collect(),
        );
    }

    debug!(sheet = %name, rows = rows.len(), "CSV sheet loaded");
    Ok(Sheet { name, rows })
}

fn sheet_from_range(name: String, range: &calamine::Range<Data>) -> Sheet {
    // Range start offset (data may not begin at A1)
    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    let (start_row, start_col) = (start_row as usize, start_col as usize);

    let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); start_row];
    for source in range.rows() {
        let mut row = vec![Cell::Empty; start_col];
        row.extend(source.iter().map(cell_from_data));
        rows.push(row);
    }

    debug!(sheet = %name, rows = rows.len(), "Sheet loaded");
    Sheet { name, rows }
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) => Cell::Float(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64())
            .map(Cell::Date)
            .unwrap_or(Cell::Float(dt.as_f64())),
        Data::DateTimeIso(s) => s
            .get(..10)
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .map(Cell::Date)
            .unwrap_or_else(|| Cell::Text(s.clone())),
        Data::DurationIso(s) => Cell::Text(s.clone()),
        // #DIV/0!, #N/A and friends carry no value
        Data::Error(_) => Cell::Empty,
    }
}

/// Excel serial day number (1900 system) to a calendar date.
fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_cell_addressing_outside_used_area() {
        let sheet = Sheet::new("S", vec![vec![Cell::from("a")], vec![]]);
        assert_eq!(sheet.cell(0, 0), &Cell::from("a"));
        assert_eq!(sheet.cell(0, 5), &Cell::Empty);
        assert_eq!(sheet.cell(9, 0), &Cell::Empty);
        assert!(sheet.row(9).is_empty());
    }

    #[test]
    fn test_csv_from_bytes_is_ragged_and_a1_based() {
        let wb = Workbook::from_bytes(b"title\n,A1,Widget\n", "CSV").unwrap();
        let sheet = wb.active().unwrap();
        assert_eq!(sheet.name, "Sheet1");
        assert_eq!(sheet.cell(0, 0), &Cell::from("title"));
        assert_eq!(sheet.cell(1, 0), &Cell::Empty);
        assert_eq!(sheet.cell(1, 1), &Cell::from("A1"));
        assert_eq!(sheet.cell(1, 2), &Cell::from("Widget"));
    }

    #[test]
    fn test_csv_open_names_sheet_after_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("productos.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "a,b").unwrap();
        drop(file);

        let wb = Workbook::open(&path).unwrap();
        assert_eq!(wb.sheet_names(), vec!["productos"]);
        assert!(wb.sheet("productos").is_ok());
    }

    #[test]
    fn test_missing_sheet_and_empty_workbook() {
        let wb = Workbook {
            sheets: vec![Sheet::new("Hoja1", vec![])],
        };
        match wb.sheet("REL REM ENTREG1") {
            Err(ImportError::MissingSheet { available, .. }) => {
                assert_eq!(available, vec!["Hoja1"])
            }
            other => panic!("expected MissingSheet, got {:?}", other),
        }

        assert!(matches!(
            Workbook::default().active(),
            Err(ImportError::EmptyWorkbook)
        ));
    }

    #[test]
    fn test_unreadable_bytes() {
        let err = Workbook::from_bytes(b"definitely not a zip", "xlsx").unwrap_err();
        assert!(matches!(err, ImportError::Workbook(_)));
    }

    #[test]
    fn test_excel_serial_dates() {
        assert_eq!(
            excel_serial_to_date(45964.0),
            NaiveDate::from_ymd_opt(2025, 11, 3)
        );
        assert_eq!(excel_serial_to_date(0.5), None);
    }
}
