//! # Sale Repository
//!
//! Database operations for sales and sale lines.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. CREATE EMPTY                                                       │
//! │     └── create_empty_for_receipt() → Sale { all amounts 0.00 }         │
//! │         (receipt import, or "open sale" on an existing receipt)        │
//! │                                                                         │
//! │  2. EDIT (one transaction per logical edit)                            │
//! │     └── insert_line() / update_line() / delete_line() / update_header()│
//! │     └── recalculate()  → subtotal = Σ line subtotals                   │
//! │                          total    = subtotal − discount + tax          │
//! │     └── commit                                                          │
//! │                                                                         │
//! │  3. (OPTIONAL) DELETE                                                  │
//! │     └── delete() → lines go with it (ON DELETE CASCADE)                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;

use super::generate_id;
use crate::error::{DbError, DbResult};
use roque_core::{
    Receipt, Sale, SaleFilter, SaleHeaderInput, SaleLine, SaleLineInput, SaleLineView, SaleListing,
};

/// Repository for sale database operations.
#[derive(Debug)]
pub struct SaleRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> SaleRepository<'c> {
    /// Creates a new SaleRepository over a connection or transaction.
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        SaleRepository { conn }
    }

    // =========================================================================
    // Sales
    // =========================================================================

    /// Gets a sale by ID.
    pub async fn get_by_id(&mut self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            SELECT
                id, receipt_id, date,
                subtotal_cents, discount_cents, tax_cents, total_cents,
                created_at, updated_at
            FROM sales
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(sale)
    }

    /// The sale raised from a receipt, if any.
    pub async fn find_by_receipt(&mut self, receipt_id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            SELECT
                id, receipt_id, date,
                subtotal_cents, discount_cents, tax_cents, total_cents,
                created_at, updated_at
            FROM sales
            WHERE receipt_id = ?1
            "#,
        )
        .bind(receipt_id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(sale)
    }

    /// Creates a sale with no lines and all amounts at zero, dated like the receipt.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - the receipt already has a sale
    pub async fn create_empty_for_receipt(&mut self, receipt: &Receipt) -> DbResult<Sale> {
        let now = Utc::now();
        let sale = Sale {
            id: generate_id(),
            receipt_id: receipt.id.clone(),
            date: receipt.date,
            subtotal_cents: 0,
            discount_cents: 0,
            tax_cents: 0,
            total_cents: 0,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %sale.id, folio = %receipt.folio, "Creating empty sale");

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, receipt_id, date,
                subtotal_cents, discount_cents, tax_cents, total_cents,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, 0, 0, 0, 0, ?4, ?5)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.receipt_id)
        .bind(sale.date)
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .execute(&mut *self.conn)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: receipt.folio.clone(),
            },
            other => other,
        })?;

        Ok(sale)
    }

    /// Lists sales newest first, narrowed by client and/or product.
    pub async fn list(&mut self, filter: &SaleFilter) -> DbResult<Vec<SaleListing>> {
        let sales = sqlx::query_as::<_, SaleListing>(
            r#"
            SELECT
                s.id,
                s.receipt_id,
                r.folio,
                r.client_id,
                c.display_name AS client_name,
                s.date,
                s.total_cents
            FROM sales s
            INNER JOIN receipts r ON r.id = s.receipt_id
            INNER JOIN clients c ON c.id = r.client_id
            WHERE (?1 IS NULL OR r.client_id = ?1)
              AND (?2 IS NULL OR EXISTS (
                    SELECT 1 FROM sale_lines l
                    WHERE l.sale_id = s.id AND l.product_id = ?2
                  ))
            ORDER BY s.date DESC, s.created_at DESC, s.rowid DESC
            "#,
        )
        .bind(filter.client_id.as_deref())
        .bind(filter.product_id.as_deref())
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(sales)
    }

    /// Stores date, discount and tax. Call [`recalculate`](Self::recalculate)
    /// afterwards in the same transaction.
    pub async fn update_header(&mut self, id: &str, header: &SaleHeaderInput) -> DbResult<()> {
        debug!(id = %id, "Updating sale header");

        let result = sqlx::query(
            r#"
            UPDATE sales SET
                date = ?2,
                discount_cents = ?3,
                tax_cents = ?4,
                updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(header.date)
        .bind(header.discount.cents())
        .bind(header.tax.cents())
        .bind(Utc::now())
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", id));
        }

        Ok(())
    }

    /// Persists the derived subtotal and total of `sale`.
    pub async fn save_totals(&mut self, sale: &Sale) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE sales SET
                subtotal_cents = ?2,
                total_cents = ?3,
                updated_at = ?4
            WHERE id = ?1
            "#,
        )
        .bind(&sale.id)
        .bind(sale.subtotal_cents)
        .bind(sale.total_cents)
        .bind(Utc::now())
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", &sale.id));
        }

        Ok(())
    }

    /// Reloads the lines of a sale, recomputes subtotal and total, and stores them.
    ///
    /// Must run in the same transaction as the line or header change it follows.
    pub async fn recalculate(&mut self, sale_id: &str) -> DbResult<Sale> {
        let mut sale = self
            .get_by_id(sale_id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", sale_id))?;

        let lines = self.get_lines(sale_id).await?;
        let total = sale.recalculate(&lines)?;
        self.save_totals(&sale).await?;

        debug!(
            id = %sale_id,
            lines = lines.len(),
            subtotal = %sale.subtotal(),
            total = %total,
            "Sale totals recalculated"
        );

        Ok(sale)
    }

    /// Deletes a sale and, through the cascade, its lines.
    pub async fn delete(&mut self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting sale");

        let result = sqlx::query("DELETE FROM sales WHERE id = ?1")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", id));
        }

        Ok(())
    }

    /// Counts sales.
    pub async fn count(&mut self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&mut *self.conn)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Lines
    // =========================================================================

    /// All lines of a sale in insertion order.
    pub async fn get_lines(&mut self, sale_id: &str) -> DbResult<Vec<SaleLine>> {
        let lines = sqlx::query_as::<_, SaleLine>(
            r#"
            SELECT
                id, sale_id, product_id, unit,
                quantity_milli, unit_price_cents, subtotal_cents,
                created_at, updated_at
            FROM sale_lines
            WHERE sale_id = ?1
            ORDER BY created_at, rowid
            "#,
        )
        .bind(sale_id)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(lines)
    }

    /// Lines of a sale joined with product code and description.
    pub async fn get_line_views(&mut self, sale_id: &str) -> DbResult<Vec<SaleLineView>> {
        let lines = sqlx::query_as::<_, SaleLineView>(
            r#"
            SELECT
                l.id,
                l.product_id,
                p.code AS product_code,
                p.description AS product_description,
                l.unit,
                l.quantity_milli,
                l.unit_price_cents,
                l.subtotal_cents
            FROM sale_lines l
            INNER JOIN products p ON p.id = l.product_id
            WHERE l.sale_id = ?1
            ORDER BY l.created_at, l.rowid
            "#,
        )
        .bind(sale_id)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(lines)
    }

    pub async fn get_line(&mut self, line_id: &str) -> DbResult<Option<SaleLine>> {
        let line = sqlx::query_as::<_, SaleLine>(
            r#"
            SELECT
                id, sale_id, product_id, unit,
                quantity_milli, unit_price_cents, subtotal_cents,
                created_at, updated_at
            FROM sale_lines
            WHERE id = ?1
            "#,
        )
        .bind(line_id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(line)
    }

    /// Adds a line; its subtotal is computed here.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - the sale already has this product in this unit
    /// * `Err(DbError::ForeignKeyViolation)` - unknown sale or product
    pub async fn insert_line(&mut self, sale_id: &str, input: &SaleLineInput) -> DbResult<SaleLine> {
        let now = Utc::now();
        let mut line = SaleLine {
            id: generate_id(),
            sale_id: sale_id.to_string(),
            product_id: input.product_id.clone(),
            unit: input.unit,
            quantity_milli: input.quantity.thousandths(),
            unit_price_cents: input.unit_price.cents(),
            subtotal_cents: 0,
            created_at: now,
            updated_at: now,
        };
        line.refresh_subtotal();

        debug!(
            sale_id = %sale_id,
            product_id = %line.product_id,
            unit = %line.unit,
            subtotal = %line.subtotal(),
            "Inserting sale line"
        );

        sqlx::query(
            r#"
            INSERT INTO sale_lines (
                id, sale_id, product_id, unit,
                quantity_milli, unit_price_cents, subtotal_cents,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&line.id)
        .bind(&line.sale_id)
        .bind(&line.product_id)
        .bind(line.unit)
        .bind(line.quantity_milli)
        .bind(line.unit_price_cents)
        .bind(line.subtotal_cents)
        .bind(line.created_at)
        .bind(line.updated_at)
        .execute(&mut *self.conn)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: format!("{} {}", line.product_id, line.unit),
            },
            other => other,
        })?;

        Ok(line)
    }

    /// Replaces product, unit, quantity and price of a line and refreshes its subtotal.
    pub async fn update_line(&mut self, line_id: &str, input: &SaleLineInput) -> DbResult<SaleLine> {
        let mut line = self
            .get_line(line_id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale line", line_id))?;

        line.product_id = input.product_id.clone();
        line.unit = input.unit;
        line.quantity_milli = input.quantity.thousandths();
        line.unit_price_cents = input.unit_price.cents();
        line.updated_at = Utc::now();
        line.refresh_subtotal();

        debug!(id = %line_id, subtotal = %line.subtotal(), "Updating sale line");

        sqlx::query(
            r#"
            UPDATE sale_lines SET
                product_id = ?2,
                unit = ?3,
                quantity_milli = ?4,
                unit_price_cents = ?5,
                subtotal_cents = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(&line.id)
        .bind(&line.product_id)
        .bind(line.unit)
        .bind(line.quantity_milli)
        .bind(line.unit_price_cents)
        .bind(line.subtotal_cents)
        .bind(line.updated_at)
        .execute(&mut *self.conn)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: format!("{} {}", line.product_id, line.unit),
            },
            other => other,
        })?;

        Ok(line)
    }

    /// Removes a line, returning it (the caller needs its sale id to recalculate).
    pub async fn delete_line(&mut self, line_id: &str) -> DbResult<SaleLine> {
        let line = self
            .get_line(line_id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale line", line_id))?;

        debug!(id = %line_id, sale_id = %line.sale_id, "Deleting sale line");

        sqlx::query("DELETE FROM sale_lines WHERE id = ?1")
            .bind(line_id)
            .execute(&mut *self.conn)
            .await?;

        Ok(line)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
