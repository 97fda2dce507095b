//! # Receipt Commands
//!
//! Delivery receipts ("remisiones") and their scanned evidence.
//!
//! ## Evidence Storage
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  roque receipt attach <id> ~/scans/k0070.jpg                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  already has evidence? ──yes──► CONFLICT (nothing copied)              │
//! │       │ no                                                              │
//! │       ▼                                                                 │
//! │  copy → <media_root>/remisiones/YYYY/MM/<receipt id>-k0070.jpg         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  receipts.image_path = "remisiones/YYYY/MM/<receipt id>-k0070.jpg"     │
//! │  (write-once: the UPDATE only matches rows without evidence)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::Path;

use chrono::{Datelike, NaiveDate, Utc};
use roque_core::validation::validate_folio;
use roque_core::{Client, CoreError, Receipt, ReceiptInput, ReceiptListing, Sale};
use roque_db::{ClientRepository, ReceiptRepository, SaleRepository};
use serde::Serialize;
use sqlx::SqliteConnection;
use tracing::{info, warn};

use crate::commands::client::resolve_client;
use crate::error::ApiError;
use crate::AppContext;

/// Folder under the media root that holds receipt evidence.
const EVIDENCE_DIR: &str = "remisiones";

/// A receipt with its client and, when raised, its sale.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptDetail {
    pub receipt: Receipt,
    pub client: Client,
    pub sale: Option<Sale>,
}

pub(crate) async fn load_receipt(
    conn: &mut SqliteConnection,
    id: &str,
) -> Result<Receipt, ApiError> {
    ReceiptRepository::new(conn)
        .get_by_id(id.trim())
        .await?
        .ok_or_else(|| CoreError::ReceiptNotFound(id.trim().to_string()).into())
}

/// Receipts newest first, optionally for one client (id or provider code).
pub async fn list_receipts(
    ctx: &AppContext,
    client: Option<&str>,
) -> Result<Vec<ReceiptListing>, ApiError> {
    let mut conn = ctx.db.acquire().await?;
    let client_id = match client {
        Some(reference) => Some(resolve_client(&mut conn, reference).await?.id),
        None => None,
    };
    Ok(ReceiptRepository::new(&mut conn)
        .list(client_id.as_deref())
        .await?)
}

pub async fn get_receipt(ctx: &AppContext, id: &str) -> Result<ReceiptDetail, ApiError> {
    let mut conn = ctx.db.acquire().await?;
    let receipt = load_receipt(&mut conn, id).await?;
    let client = ClientRepository::new(&mut conn)
        .get_by_id(&receipt.client_id)
        .await?
        .ok_or_else(|| ApiError::from(CoreError::ClientNotFound(receipt.client_id.clone())))?;
    let sale = SaleRepository::new(&mut conn)
        .find_by_receipt(&receipt.id)
        .await?;

    Ok(ReceiptDetail {
        receipt,
        client,
        sale,
    })
}

/// Records a receipt by hand.
///
/// ## Errors
/// * `NOT_FOUND` - unknown client
/// * `CONFLICT` - the client already has this folio
pub async fn create_receipt(ctx: &AppContext, input: ReceiptInput) -> Result<Receipt, ApiError> {
    input.validate()?;

    let mut conn = ctx.db.acquire().await?;
    if ClientRepository::new(&mut conn)
        .get_by_id(&input.client_id)
        .await?
        .is_none()
    {
        return Err(CoreError::ClientNotFound(input.client_id.clone()).into());
    }

    let receipt = ReceiptRepository::new(&mut conn).insert(&input).await?;
    info!(folio = %receipt.folio, "Receipt created");
    Ok(receipt)
}

/// Edits folio, date and notes. Evidence is untouched.
pub async fn update_receipt(
    ctx: &AppContext,
    id: &str,
    folio: &str,
    date: NaiveDate,
    notes: &str,
) -> Result<Receipt, ApiError> {
    validate_folio(folio)?;

    let mut conn = ctx.db.acquire().await?;
    let receipt = ReceiptRepository::new(&mut conn)
        .update(id.trim(), folio, date, notes)
        .await?;

    info!(folio = %receipt.folio, "Receipt updated");
    Ok(receipt)
}

/// Copies `source` into the media root and records it as the receipt's
/// evidence. Evidence is write-once.
pub async fn attach_evidence(
    ctx: &AppContext,
    id: &str,
    source: &Path,
) -> Result<Receipt, ApiError> {
    let mut conn = ctx.db.acquire().await?;
    let receipt = load_receipt(&mut conn, id).await?;

    if let Some(path) = &receipt.image_path {
        return Err(CoreError::EvidenceAlreadyAttached {
            folio: receipt.folio.clone(),
            path: path.clone(),
        }
        .into());
    }

    let metadata = tokio::fs::metadata(source)
        .await
        .map_err(|_| ApiError::validation(format!("Evidence file not found: {}", source.display())))?;
    if !metadata.is_file() {
        return Err(ApiError::validation(format!(
            "Evidence must be a file: {}",
            source.display()
        )));
    }
    let file_name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| ApiError::validation("Evidence path has no file name"))?;

    let now = Utc::now();
    let relative = format!(
        "{}/{:04}/{:02}/{}-{}",
        EVIDENCE_DIR,
        now.year(),
        now.month(),
        receipt.id,
        file_name
    );
    let target = ctx.config.media_root.join(&relative);
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::copy(source, &target).await?;

    let attached = match ReceiptRepository::new(&mut conn)
        .attach_image(&receipt.id, &relative)
        .await
    {
        Ok(attached) => attached,
        Err(e) => {
            discard_copy(&target).await;
            return Err(e.into());
        }
    };

    if !attached {
        // another writer got there first; keep theirs
        discard_copy(&target).await;
        let current = load_receipt(&mut conn, &receipt.id).await?;
        return Err(CoreError::EvidenceAlreadyAttached {
            folio: current.folio,
            path: current.image_path.unwrap_or_default(),
        }
        .into());
    }

    info!(folio = %receipt.folio, path = %relative, "Evidence attached");
    load_receipt(&mut conn, &receipt.id).await
}

/// Removes an evidence copy that never got recorded.
async fn discard_copy(target: &Path) {
    if let Err(e) = tokio::fs::remove_file(target).await {
        warn!(path = %target.display(), error = %e, "Could not remove unused evidence copy");
    }
}

/// Deletes a receipt that has no sale (`CONFLICT` otherwise).
pub async fn delete_receipt(ctx: &AppContext, id: &str) -> Result<Receipt, ApiError> {
    let mut conn = ctx.db.acquire().await?;
    let receipt = load_receipt(&mut conn, id).await?;
    ReceiptRepository::new(&mut conn).delete(&receipt.id).await?;

    info!(folio = %receipt.folio, "Receipt deleted");
    Ok(receipt)
}
