//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - CRUD keyed by product code
//! - `upsert_by_code` for the catalog importer
//! - Substring search over code and description
//!
//! ## Search
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  User types: "wid"                                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  lowercase(code) or lowercase(description) contains "wid"              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │ A1   | Widget grande                    │ ← MATCH                   │
//! │  │ WID2 | Tornillo                         │ ← MATCH                   │
//! │  │ B7   | Tuerca                           │                           │
//! │  └─────────────────────────────────────────┘                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;

use super::{generate_id, SearchTerm};
use crate::error::{DbError, DbResult};
use roque_core::{Product, ProductFields};

/// Repository for product database operations.
#[derive(Debug)]
pub struct ProductRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> ProductRepository<'c> {
    /// Creates a new ProductRepository over a connection or transaction.
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        ProductRepository { conn }
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&mut self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT
                id, code, description,
                purchase_box_cents, purchase_piece_cents,
                sale_box_cents, sale_piece_cents,
                created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(product)
    }

    /// Gets a product by its code (exact match).
    pub async fn find_by_code(&mut self, code: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT
                id, code, description,
                purchase_box_cents, purchase_piece_cents,
                sale_box_cents, sale_piece_cents,
                created_at, updated_at
            FROM products
            WHERE code = ?1
            "#,
        )
        .bind(code)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(product)
    }

    /// Lists all products ordered by code.
    pub async fn list(&mut self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT
                id, code, description,
                purchase_box_cents, purchase_piece_cents,
                sale_box_cents, sale_piece_cents,
                created_at, updated_at
            FROM products
            ORDER BY code
            "#,
        )
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(products)
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - code already exists
    pub async fn insert(&mut self, code: &str, fields: &ProductFields) -> DbResult<Product> {
        let now = Utc::now();
        let product = Product {
            id: generate_id(),
            code: code.trim().to_string(),
            description: fields.description.clone(),
            purchase_box_cents: fields.purchase_box.cents(),
            purchase_piece_cents: fields.purchase_piece.cents(),
            sale_box_cents: fields.sale_box.cents(),
            sale_piece_cents: fields.sale_piece.cents(),
            created_at: now,
            updated_at: now,
        };

        debug!(code = %product.code, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, code, description,
                purchase_box_cents, purchase_piece_cents,
                sale_box_cents, sale_piece_cents,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&product.id)
        .bind(&product.code)
        .bind(&product.description)
        .bind(product.purchase_box_cents)
        .bind(product.purchase_piece_cents)
        .bind(product.sale_box_cents)
        .bind(product.sale_piece_cents)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *self.conn)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: product.code.clone(),
            },
            other => other,
        })?;

        Ok(product)
    }

    /// Overwrites every field of an existing product, including its code.
    pub async fn update(&mut self, id: &str, code: &str, fields: &ProductFields) -> DbResult<Product> {
        debug!(id = %id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                code = ?2,
                description = ?3,
                purchase_box_cents = ?4,
                purchase_piece_cents = ?5,
                sale_box_cents = ?6,
                sale_piece_cents = ?7,
                updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(code.trim())
        .bind(&fields.description)
        .bind(fields.purchase_box.cents())
        .bind(fields.purchase_piece.cents())
        .bind(fields.sale_box.cents())
        .bind(fields.sale_piece.cents())
        .bind(now)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Creates the product, or overwrites all of its fields when the code
    /// already exists.
    ///
    /// ## Returns
    /// `(product, created)`
    pub async fn upsert_by_code(
        &mut self,
        code: &str,
        fields: &ProductFields,
    ) -> DbResult<(Product, bool)> {
        match self.find_by_code(code.trim()).await? {
            Some(existing) => {
                let updated = self.update(&existing.id, &existing.code, fields).await?;
                Ok((updated, false))
            }
            None => Ok((self.insert(code, fields).await?, true)),
        }
    }

    /// Case-insensitive substring search over code and description.
    /// Returns every match; a blank query returns nothing.
    pub async fn search(&mut self, query: &str) -> DbResult<Vec<Product>> {
        let Some(term) = SearchTerm::new(query) else {
            return Ok(Vec::new());
        };

        debug!(query = %query.trim(), "Searching products");

        let products: Vec<Product> = self
            .list()
            .await?
            .into_iter()
            .filter(|p| term.matches_any(&[p.code.as_str(), p.description.as_str()]))
            .collect();

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Deletes a product that no sale line references.
    ///
    /// ## Returns
    /// * `Err(DbError::InUse)` - sale lines still use this product
    /// * `Err(DbError::NotFound)` - no such product
    pub async fn delete(&mut self, id: &str) -> DbResult<()> {
        let product = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;

        let lines: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sale_lines WHERE product_id = ?1")
            .bind(id)
            .fetch_one(&mut *self.conn)
            .await?;

        if lines > 0 {
            return Err(DbError::in_use(
                "Product",
                &product.code,
                format!("{} sale line(s)", lines),
            ));
        }

        debug!(id = %id, code = %product.code, "Deleting product");

        sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;

        Ok(())
    }

    /// Counts products.
    pub async fn count(&mut self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&mut *self.conn)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use roque_core::Money;

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn widget() -> ProductFields {
        ProductFields {
            description: "Widget".to_string(),
            purchase_box: Money::from_cents(100000),
            purchase_piece: Money::zero(),
            sale_box: Money::from_cents(1000),
            sale_piece: Money::zero(),
        }
    }

    #[tokio::test]
    async fn test_upsert_twice_yields_one_row() {
        let db = db().await;
        let mut conn = db.acquire().await.unwrap();
        let mut repo = ProductRepository::new(&mut conn);

        let (first, created_first) = repo.upsert_by_code("A1", &widget()).await.unwrap();
        let (second, created_second) = repo.upsert_by_code("A1", &widget()).await.unwrap();

        assert_eq!((created_first, created_second), (true, false));
        assert_eq!(first.id, second.id);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_upsert_converges_to_latest_values() {
        let db = db().await;
        let mut conn = db.acquire().await.unwrap();
        let mut repo = ProductRepository::new(&mut conn);

        repo.upsert_by_code("A1", &widget()).await.unwrap();

        let mut changed = widget();
        changed.description = "Widget XL".into();
        changed.sale_piece = Money::from_cents(250);
        let (product, created) = repo.upsert_by_code("A1", &changed).await.unwrap();

        assert!(!created);
        assert_eq!(product.description, "Widget XL");
        assert_eq!(product.sale_piece(), Money::from_cents(250));
        assert_eq!(product.purchase_box(), Money::from_cents(100000));
    }

    #[tokio::test]
    async fn test_negative_price_rejected_by_schema() {
        let db = db().await;
        let mut conn = db.acquire().await.unwrap();
        let mut repo = ProductRepository::new(&mut conn);

        let mut bad = widget();
        bad.sale_box = Money::from_cents(-1);
        let err = repo.insert("NEG", &bad).await.unwrap_err();
        assert!(matches!(err, DbError::QueryFailed(_)));
    }

    #[tokio::test]
    async fn test_search_code_and_description() {
        let db = db().await;
        let mut conn = db.acquire().await.unwrap();
        let mut repo = ProductRepository::new(&mut conn);

        repo.insert("A1", &widget()).await.unwrap();
        let mut screw = widget();
        screw.description = "Tornillo".into();
        repo.insert("WID2", &screw).await.unwrap();
        let mut nut = widget();
        nut.description = "Tuerca".into();
        repo.insert("B7", &nut).await.unwrap();

        let codes: Vec<String> = repo
            .search("wid")
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.code)
            .collect();
        assert_eq!(codes, vec!["A1", "WID2"]);
        assert!(repo.search("").await.unwrap().is_empty());
        assert_eq!(repo.search("tuer").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_search_folds_accented_description() {
        let db = db().await;
        let mut conn = db.acquire().await.unwrap();
        let mut repo = ProductRepository::new(&mut conn);

        let mut chile = widget();
        chile.description = "JALAPEÑO EN LATA".into();
        repo.insert("C1", &chile).await.unwrap();

        assert_eq!(repo.search("jalapeño").await.unwrap().len(), 1);
        assert_eq!(repo.search("Peño en").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_missing_product() {
        let db = db().await;
        let mut conn = db.acquire().await.unwrap();
        let mut repo = ProductRepository::new(&mut conn);

        let err = repo.update("nope", "X", &widget()).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
