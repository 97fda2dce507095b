//! # Repository Module
//!
//! Explicit data access for every entity.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repositories Borrow a Connection                     │
//! │                                                                         │
//! │  let mut conn = db.acquire().await?;      let mut tx = db.begin().await?;│
//! │  ClientRepository::new(&mut conn)         ClientRepository::new(&mut tx) │
//! │           │                                        │                    │
//! │           └──────────────┬─────────────────────────┘                    │
//! │                          ▼                                              │
//! │              &mut SqliteConnection                                      │
//! │                                                                         │
//! │  The same repository code runs on a pooled connection or inside a      │
//! │  transaction, so an importer can chain Client → Receipt → Sale writes  │
//! │  in one unit of work.                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ClientRepository`](client::ClientRepository) - Clients, keyed by provider code
//! - [`ProductRepository`](product::ProductRepository) - Products, keyed by code
//! - [`ReceiptRepository`](receipt::ReceiptRepository) - Receipts, keyed by (client, folio)
//! - [`SaleRepository`](sale::SaleRepository) - Sales, lines and total recalculation

use uuid::Uuid;

pub mod client;
pub mod product;
pub mod receipt;
pub mod sale;

/// Generates a new surrogate id.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Case-insensitive substring matcher behind the `search` methods.
///
/// Folds case with Unicode lowercasing, so `peña` finds `PEÑA ÁLVAREZ`.
pub(crate) struct SearchTerm(String);

impl SearchTerm {
    /// `None` for a blank query.
    pub(crate) fn new(query: &str) -> Option<Self> {
        let query = query.trim();
        if query.is_empty() {
            None
        } else {
            Some(SearchTerm(query.to_lowercase()))
        }
    }

    pub(crate) fn matches_any(&self, fields: &[&str]) -> bool {
        fields.iter().any(|field| field.to_lowercase().contains(&self.0))
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Shared setup for repository tests.

    use chrono::NaiveDate;
    use roque_core::{Client, ClientFields, Money, Product, ProductFields, Receipt};
    use sqlx::SqliteConnection;

    use super::client::ClientRepository;
    use super::product::ProductRepository;
    use super::receipt::ReceiptRepository;

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub async fn client(conn: &mut SqliteConnection, provider: &str, name: &str) -> Client {
        let fields = ClientFields {
            display_name: name.to_string(),
            ..Default::default()
        };
        ClientRepository::new(conn)
            .upsert_by_provider(provider, &fields)
            .await
            .unwrap()
            .0
    }

    pub async fn product(conn: &mut SqliteConnection, code: &str, sale_piece_cents: i64) -> Product {
        let fields = ProductFields {
            description: format!("Product {code}"),
            sale_piece: Money::from_cents(sale_piece_cents),
            ..Default::default()
        };
        ProductRepository::new(conn)
            .upsert_by_code(code, &fields)
            .await
            .unwrap()
            .0
    }

    pub async fn receipt(conn: &mut SqliteConnection, client_id: &str, folio: &str) -> Receipt {
        ReceiptRepository::new(conn)
            .get_or_create(client_id, folio, date(2025, 11, 3))
            .await
            .unwrap()
            .0
    }
}
