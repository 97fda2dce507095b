//! Import outcome counters, shown to the user after each run.

use serde::Serialize;
use std::fmt;

/// Result of a product or client sheet import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogImportSummary {
    pub created: usize,
    pub updated: usize,
    /// Rows without a natural key (all-blank rows are not counted).
    pub skipped: usize,
}

impl CatalogImportSummary {
    pub fn processed(&self) -> usize {
        self.created + self.updated
    }

    pub(crate) fn record(&mut self, created: bool) {
        if created {
            self.created += 1;
        } else {
            self.updated += 1;
        }
    }
}

impl fmt::Display for CatalogImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} skipped",
            self.created, self.updated, self.skipped
        )
    }
}

/// Result of a receipt grid import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptImportSummary {
    pub receipts_created: usize,
    pub receipts_existing: usize,
    pub sales_created: usize,
    pub clients_created: usize,
    pub rows_skipped: usize,
    pub date_columns: usize,
}

impl fmt::Display for ReceiptImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} receipts created, {} already existed, {} sales created, {} rows skipped ({} date columns)",
            self.receipts_created,
            self.receipts_existing,
            self.sales_created,
            self.rows_skipped,
            self.date_columns
        )?;
        if self.clients_created > 0 {
            write!(f, ", {} new clients", self.clients_created)?;
        }
        Ok(())
    }
}
