//! # Catalog Reconciler
//!
//! Idempotent upserts keyed by natural key: the product code and the
//! client's provider code.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  key cell ──► normalize_text ──► blank? ──yes──► None (row skipped)     │
//! │                                    │                                    │
//! │                                    no                                   │
//! │                                    ▼                                    │
//! │              exists? ──yes──► overwrite every field  → (row, false)     │
//! │                 │                                                       │
//! │                 no ─────────► insert                 → (row, true)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Running the same sheet twice converges to the same rows.

use roque_core::normalize::normalize_text;
use roque_core::{Cell, Client, ClientFields, Product, ProductFields};
use roque_db::{ClientRepository, DbResult, ProductRepository};
use sqlx::SqliteConnection;
use tracing::debug;

/// Creates or overwrites the client whose provider code is `key`.
///
/// ## Returns
/// * `Ok(None)` - blank key, nothing written
/// * `Ok(Some((client, created)))`
pub async fn upsert_client(
    conn: &mut SqliteConnection,
    key: &Cell,
    fields: &ClientFields,
) -> DbResult<Option<(Client, bool)>> {
    let key = normalize_text(key);
    if key.is_empty() {
        return Ok(None);
    }

    let (client, created) = ClientRepository::new(conn)
        .upsert_by_provider(&key, fields)
        .await?;
    debug!(provider = %key, created, "Client reconciled");
    Ok(Some((client, created)))
}

/// Creates or overwrites the product whose code is `code`.
///
/// ## Returns
/// * `Ok(None)` - blank code, nothing written
/// * `Ok(Some((product, created)))`
pub async fn upsert_product(
    conn: &mut SqliteConnection,
    code: &Cell,
    fields: &ProductFields,
) -> DbResult<Option<(Product, bool)>> {
    let code = normalize_text(code);
    if code.is_empty() {
        return Ok(None);
    }

    let (product, created) = ProductRepository::new(conn)
        .upsert_by_code(&code, fields)
        .await?;
    debug!(code = %code, created, "Product reconciled");
    Ok(Some((product, created)))
}

/// Returns the client for `key`, creating it from `name` and `contact`
/// when missing. An existing client is never modified.
pub async fn ensure_client(
    conn: &mut SqliteConnection,
    key: &Cell,
    name: &Cell,
    contact: &Cell,
) -> DbResult<Option<(Client, bool)>> {
    let key = normalize_text(key);
    if key.is_empty() {
        return Ok(None);
    }

    let defaults = ClientFields {
        display_name: normalize_text(name),
        contact: normalize_text(contact),
        ..Default::default()
    };
    let (client, created) = ClientRepository::new(conn)
        .get_or_create_by_provider(&key, &defaults)
        .await?;
    if created {
        debug!(provider = %key, "Client created from receipt sheet");
    }
    Ok(Some((client, created)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use roque_core::Money;
    use roque_db::{Database, DbConfig};

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_upsert_product_twice_one_row() {
        let db = db().await;
        let mut conn = db.acquire().await.unwrap();
        let fields = ProductFields {
            description: "Widget".into(),
            sale_box: Money::from_cents(1000),
            ..Default::default()
        };

        let (_, first) = upsert_product(&mut conn, &Cell::from("A1"), &fields)
            .await
            .unwrap()
            .unwrap();
        let (_, second) = upsert_product(&mut conn, &Cell::from(" A1 "), &fields)
            .await
            .unwrap()
            .unwrap();

        assert_eq!((first, second), (true, false));
        assert_eq!(ProductRepository::new(&mut conn).count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_numeric_code_cell_matches_text_code() {
        let db = db().await;
        let mut conn = db.acquire().await.unwrap();
        let fields = ProductFields::default();

        upsert_product(&mut conn, &Cell::Float(1001.0), &fields)
            .await
            .unwrap();
        let (product, created) = upsert_product(&mut conn, &Cell::from("1001"), &fields)
            .await
            .unwrap()
            .unwrap();

        assert!(!created);
        assert_eq!(product.code, "1001");
    }

    #[tokio::test]
    async fn test_blank_keys_are_skipped() {
        let db = db().await;
        let mut conn = db.acquire().await.unwrap();

        assert!(upsert_product(&mut conn, &Cell::Empty, &ProductFields::default())
            .await
            .unwrap()
            .is_none());
        assert!(upsert_client(&mut conn, &Cell::from("   "), &ClientFields::default())
            .await
            .unwrap()
            .is_none());
        assert!(ensure_client(&mut conn, &Cell::Empty, &Cell::from("x"), &Cell::Empty)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_ensure_client_never_overwrites() {
        let db = db().await;
        let mut conn = db.acquire().await.unwrap();

        let fields = ClientFields {
            display_name: "Abarrotes Lupita".into(),
            phone: "555".into(),
            ..Default::default()
        };
        upsert_client(&mut conn, &Cell::from("P-1"), &fields)
            .await
            .unwrap();

        let (client, created) =
            ensure_client(&mut conn, &Cell::from("P-1"), &Cell::from("Otro"), &Cell::Empty)
                .await
                .unwrap()
                .unwrap();
        assert!(!created);
        assert_eq!(client.display_name, "Abarrotes Lupita");
        assert_eq!(client.phone, "555");
    }
}
