//! # Import Commands
//!
//! `roque import products|clients|receipts <file> [--sheet NAME]`
//!
//! | Kind     | Sheet used when `--sheet` is absent        |
//! |----------|--------------------------------------------|
//! | products | first sheet                                |
//! | clients  | first sheet                                |
//! | receipts | `receipts.sheet_name` from config          |
//!
//! Each import is one transaction. A structural problem (missing sheet,
//! no date row) is reported before anything is written.

use std::path::Path;

use roque_import::{
    import_clients, import_products, import_receipts, CatalogImportSummary, ReceiptImportSummary,
    Workbook,
};
use tracing::info;

use crate::error::ApiError;
use crate::AppContext;

fn open_workbook(path: &Path) -> Result<Workbook, ApiError> {
    if !path.is_file() {
        return Err(ApiError::validation(format!(
            "File not found: {}",
            path.display()
        )));
    }
    Ok(Workbook::open(path)?)
}

pub async fn import_product_file(
    ctx: &AppContext,
    path: &Path,
    sheet: Option<&str>,
) -> Result<CatalogImportSummary, ApiError> {
    let workbook = open_workbook(path)?;
    let sheet = workbook.sheet_or_active(sheet)?;

    let summary = import_products(&ctx.db, sheet).await?;
    info!(file = %path.display(), %summary, "Products imported");
    Ok(summary)
}

pub async fn import_client_file(
    ctx: &AppContext,
    path: &Path,
    sheet: Option<&str>,
) -> Result<CatalogImportSummary, ApiError> {
    let workbook = open_workbook(path)?;
    let sheet = workbook.sheet_or_active(sheet)?;

    let summary = import_clients(&ctx.db, sheet).await?;
    info!(file = %path.display(), %summary, "Clients imported");
    Ok(summary)
}

/// Imports the delivery grid: receipts, their clients and empty sales.
pub async fn import_receipt_file(
    ctx: &AppContext,
    path: &Path,
    sheet: Option<&str>,
) -> Result<ReceiptImportSummary, ApiError> {
    let workbook = open_workbook(path)?;
    let layout = match sheet {
        Some(name) => ctx.config.receipts.layout().with_sheet(name),
        None => ctx.config.receipts.layout(),
    };

    let summary = import_receipts(&ctx.db, &workbook, &layout).await?;
    info!(file = %path.display(), %summary, "Receipts imported");
    Ok(summary)
}
