//! # Import Error Types
//!
//! Structural failures of an import. Bad individual cells never land here:
//! they are normalised to defaults and the row goes through.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  file won't open / parse         → Workbook                             │
//! │  no sheets at all                → EmptyWorkbook                        │
//! │  named sheet missing             → MissingSheet { name, available }     │
//! │  header row has no date tokens   → NoDateColumns { row }                │
//! │  repository failure              → Db(DbError)  (transaction dropped)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use roque_db::DbError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    /// The file could not be read as a spreadsheet.
    #[error("Cannot read workbook: {0}")]
    Workbook(String),

    #[error("Workbook has no sheets")]
    EmptyWorkbook,

    #[error("Sheet '{name}' not found (available: {})", available.join(", "))]
    MissingSheet { name: String, available: Vec<String> },

    /// `row` is 1-based, as the user sees it in the spreadsheet.
    #[error("No date columns found in header row {row}")]
    NoDateColumns { row: usize },

    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::Workbook(err.to_string())
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::Workbook(err.to_string())
    }
}

impl From<sqlx::Error> for ImportError {
    fn from(err: sqlx::Error) -> Self {
        ImportError::Db(DbError::from(err))
    }
}

pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_sheet_lists_available() {
        let err = ImportError::MissingSheet {
            name: "REL REM ENTREG1".into(),
            available: vec!["Hoja1".into(), "Hoja2".into()],
        };
        assert_eq!(
            err.to_string(),
            "Sheet 'REL REM ENTREG1' not found (available: Hoja1, Hoja2)"
        );
    }

    #[test]
    fn test_no_date_columns_names_row() {
        let err = ImportError::NoDateColumns { row: 5 };
        assert!(err.to_string().contains("row 5"));
    }
}
