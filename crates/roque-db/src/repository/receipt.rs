//! # Receipt Repository
//!
//! Database operations for paper delivery receipts.
//!
//! A receipt is identified by `(client_id, folio)`: two clients may reuse the
//! same folio number, one client may not.

use chrono::{NaiveDate, Utc};
use sqlx::SqliteConnection;
use tracing::debug;

use super::generate_id;
use crate::error::{DbError, DbResult};
use roque_core::{Receipt, ReceiptInput, ReceiptListing};

/// Repository for receipt database operations.
#[derive(Debug)]
pub struct ReceiptRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> ReceiptRepository<'c> {
    /// Creates a new ReceiptRepository over a connection or transaction.
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        ReceiptRepository { conn }
    }

    /// Gets a receipt by its ID.
    pub async fn get_by_id(&mut self, id: &str) -> DbResult<Option<Receipt>> {
        let receipt = sqlx::query_as::<_, Receipt>(
            r#"
            SELECT id, folio, client_id, date, image_path, notes, created_at, updated_at
            FROM receipts
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(receipt)
    }

    /// Gets a receipt by its natural key.
    pub async fn find_by_client_folio(
        &mut self,
        client_id: &str,
        folio: &str,
    ) -> DbResult<Option<Receipt>> {
        let receipt = sqlx::query_as::<_, Receipt>(
            r#"
            SELECT id, folio, client_id, date, image_path, notes, created_at, updated_at
            FROM receipts
            WHERE client_id = ?1 AND folio = ?2
            "#,
        )
        .bind(client_id)
        .bind(folio)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(receipt)
    }

    /// Lists receipts, newest first, with client and sale summary.
    ///
    /// `client_id` narrows the list to one client.
    pub async fn list(&mut self, client_id: Option<&str>) -> DbResult<Vec<ReceiptListing>> {
        let receipts = sqlx::query_as::<_, ReceiptListing>(
            r#"
            SELECT
                r.id,
                r.folio,
                r.date,
                r.client_id,
                c.provider_code AS client_provider_code,
                c.display_name AS client_name,
                (r.image_path IS NOT NULL) AS has_image,
                s.id AS sale_id,
                s.total_cents AS sale_total_cents
            FROM receipts r
            INNER JOIN clients c ON c.id = r.client_id
            LEFT JOIN sales s ON s.receipt_id = r.id
            WHERE (?1 IS NULL OR r.client_id = ?1)
            ORDER BY r.date DESC, r.created_at DESC, r.rowid DESC
            "#,
        )
        .bind(client_id)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(receipts)
    }

    /// Inserts a new receipt without evidence.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - the client already has this folio
    /// * `Err(DbError::ForeignKeyViolation)` - no such client
    pub async fn insert(&mut self, input: &ReceiptInput) -> DbResult<Receipt> {
        let now = Utc::now();
        let receipt = Receipt {
            id: generate_id(),
            folio: input.folio.trim().to_string(),
            client_id: input.client_id.clone(),
            date: input.date,
            image_path: None,
            notes: input.notes.clone(),
            created_at: now,
            updated_at: now,
        };

        debug!(folio = %receipt.folio, client_id = %receipt.client_id, "Inserting receipt");

        sqlx::query(
            r#"
            INSERT INTO receipts (
                id, folio, client_id, date, image_path, notes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, NULL, ?5, ?6, ?7)
            "#,
        )
        .bind(&receipt.id)
        .bind(&receipt.folio)
        .bind(&receipt.client_id)
        .bind(receipt.date)
        .bind(&receipt.notes)
        .bind(receipt.created_at)
        .bind(receipt.updated_at)
        .execute(&mut *self.conn)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: receipt.folio.clone(),
            },
            other => other,
        })?;

        Ok(receipt)
    }

    /// Edits folio, date and notes. The client and the evidence never change here.
    pub async fn update(
        &mut self,
        id: &str,
        folio: &str,
        date: NaiveDate,
        notes: &str,
    ) -> DbResult<Receipt> {
        debug!(id = %id, folio = %folio, "Updating receipt");

        let result = sqlx::query(
            r#"
            UPDATE receipts SET
                folio = ?2,
                date = ?3,
                notes = ?4,
                updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(folio.trim())
        .bind(date)
        .bind(notes)
        .bind(Utc::now())
        .execute(&mut *self.conn)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: folio.trim().to_string(),
            },
            other => other,
        })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Receipt", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Receipt", id))
    }

    /// Stores the evidence path if the receipt has none yet.
    ///
    /// ## Returns
    /// * `Ok(true)` - path stored
    /// * `Ok(false)` - the receipt already had evidence; nothing changed
    pub async fn attach_image(&mut self, id: &str, image_path: &str) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE receipts SET
                image_path = ?2,
                updated_at = ?3
            WHERE id = ?1 AND image_path IS NULL
            "#,
        )
        .bind(id)
        .bind(image_path)
        .bind(Utc::now())
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 1 {
            debug!(id = %id, path = %image_path, "Evidence attached");
            return Ok(true);
        }

        match self.get_by_id(id).await? {
            Some(_) => Ok(false),
            None => Err(DbError::not_found("Receipt", id)),
        }
    }

    /// Returns the receipt for `(client_id, folio)`, creating it with `date`
    /// and empty notes when missing. An existing receipt keeps its date.
    ///
    /// ## Returns
    /// `(receipt, created)`
    pub async fn get_or_create(
        &mut self,
        client_id: &str,
        folio: &str,
        date: NaiveDate,
    ) -> DbResult<(Receipt, bool)> {
        let folio = folio.trim();
        if let Some(existing) = self.find_by_client_folio(client_id, folio).await? {
            return Ok((existing, false));
        }

        let input = ReceiptInput {
            client_id: client_id.to_string(),
            folio: folio.to_string(),
            date,
            notes: String::new(),
        };
        Ok((self.insert(&input).await?, true))
    }

    /// Deletes a receipt that has no sale.
    ///
    /// ## Returns
    /// * `Err(DbError::InUse)` - a sale was raised from this receipt
    /// * `Err(DbError::NotFound)` - no such receipt
    pub async fn delete(&mut self, id: &str) -> DbResult<()> {
        let receipt = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Receipt", id))?;

        let sale_id: Option<String> = sqlx::query_scalar("SELECT id FROM sales WHERE receipt_id = ?1")
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?;

        if let Some(sale_id) = sale_id {
            return Err(DbError::in_use("Receipt", &receipt.folio, format!("sale {}", sale_id)));
        }

        debug!(id = %id, folio = %receipt.folio, "Deleting receipt");

        sqlx::query("DELETE FROM receipts WHERE id = ?1")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;

        Ok(())
    }

    /// Counts receipts.
    pub async fn count(&mut self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM receipts")
            .fetch_one(&mut *self.conn)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
