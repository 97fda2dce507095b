//! # Client Repository
//!
//! Database operations for clients.
//!
//! ## Natural Key
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Spreadsheets and paper receipts identify a client by provider code.   │
//! │                                                                         │
//! │  upsert_by_provider("P-017", fields)                                   │
//! │       │                                                                 │
//! │       ├── not found → INSERT              → (client, created = true)   │
//! │       └── found     → UPDATE every field  → (client, created = false)  │
//! │                                                                         │
//! │  get_or_create_by_provider("P-017", defaults)                          │
//! │       │                                                                 │
//! │       ├── not found → INSERT defaults     → (client, true)             │
//! │       └── found     → untouched           → (client, false)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;

use super::{generate_id, SearchTerm};
use crate::error::{DbError, DbResult};
use roque_core::{Client, ClientFields};

/// Repository for client database operations.
#[derive(Debug)]
pub struct ClientRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> ClientRepository<'c> {
    /// Creates a new ClientRepository over a connection or transaction.
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        ClientRepository { conn }
    }

    /// Gets a client by its ID.
    pub async fn get_by_id(&mut self, id: &str) -> DbResult<Option<Client>> {
        let client = sqlx::query_as::<_, Client>(
            r#"
            SELECT
                id, number, provider_code, display_name, contact,
                address, phone, reference, created_at, updated_at
            FROM clients
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(client)
    }

    /// Gets a client by its provider code (exact match).
    pub async fn find_by_provider(&mut self, provider_code: &str) -> DbResult<Option<Client>> {
        let client = sqlx::query_as::<_, Client>(
            r#"
            SELECT
                id, number, provider_code, display_name, contact,
                address, phone, reference, created_at, updated_at
            FROM clients
            WHERE provider_code = ?1
            "#,
        )
        .bind(provider_code)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(client)
    }

    /// Lists all clients ordered by number, then provider code.
    pub async fn list(&mut self) -> DbResult<Vec<Client>> {
        let clients = sqlx::query_as::<_, Client>(
            r#"
            SELECT
                id, number, provider_code, display_name, contact,
                address, phone, reference, created_at, updated_at
            FROM clients
            ORDER BY number, provider_code
            "#,
        )
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(clients)
    }

    /// Inserts a new client.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - provider code already exists
    pub async fn insert(&mut self, provider_code: &str, fields: &ClientFields) -> DbResult<Client> {
        let now = Utc::now();
        let client = Client {
            id: generate_id(),
            number: fields.number,
            provider_code: provider_code.trim().to_string(),
            display_name: fields.display_name.clone(),
            contact: fields.contact.clone(),
            address: fields.address.clone(),
            phone: fields.phone.clone(),
            reference: fields.reference.clone(),
            created_at: now,
            updated_at: now,
        };

        debug!(provider_code = %client.provider_code, "Inserting client");

        sqlx::query(
            r#"
            INSERT INTO clients (
                id, number, provider_code, display_name, contact,
                address, phone, reference, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&client.id)
        .bind(client.number)
        .bind(&client.provider_code)
        .bind(&client.display_name)
        .bind(&client.contact)
        .bind(&client.address)
        .bind(&client.phone)
        .bind(&client.reference)
        .bind(client.created_at)
        .bind(client.updated_at)
        .execute(&mut *self.conn)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: client.provider_code.clone(),
            },
            other => other,
        })?;

        Ok(client)
    }

    /// Overwrites every field of an existing client, including its provider code.
    pub async fn update(
        &mut self,
        id: &str,
        provider_code: &str,
        fields: &ClientFields,
    ) -> DbResult<Client> {
        debug!(id = %id, "Updating client");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE clients SET
                number = ?2,
                provider_code = ?3,
                display_name = ?4,
                contact = ?5,
                address = ?6,
                phone = ?7,
                reference = ?8,
                updated_at = ?9
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(fields.number)
        .bind(provider_code.trim())
        .bind(&fields.display_name)
        .bind(&fields.contact)
        .bind(&fields.address)
        .bind(&fields.phone)
        .bind(&fields.reference)
        .bind(now)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Client", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Client", id))
    }

    /// Creates the client, or overwrites all of its fields when the provider
    /// code already exists.
    ///
    /// ## Returns
    /// `(client, created)`
    pub async fn upsert_by_provider(
        &mut self,
        provider_code: &str,
        fields: &ClientFields,
    ) -> DbResult<(Client, bool)> {
        match self.find_by_provider(provider_code.trim()).await? {
            Some(existing) => {
                let updated = self.update(&existing.id, &existing.provider_code, fields).await?;
                Ok((updated, false))
            }
            None => Ok((self.insert(provider_code, fields).await?, true)),
        }
    }

    /// Returns the existing client untouched, or creates it from `defaults`.
    ///
    /// ## Returns
    /// `(client, created)`
    pub async fn get_or_create_by_provider(
        &mut self,
        provider_code: &str,
        defaults: &ClientFields,
    ) -> DbResult<(Client, bool)> {
        match self.find_by_provider(provider_code.trim()).await? {
            Some(existing) => Ok((existing, false)),
            None => Ok((self.insert(provider_code, defaults).await?, true)),
        }
    }

    /// Case-insensitive substring search over provider code, display name,
    /// contact and address. Returns every match; a blank query returns nothing.
    pub async fn search(&mut self, query: &str) -> DbResult<Vec<Client>> {
        let Some(term) = SearchTerm::new(query) else {
            return Ok(Vec::new());
        };

        debug!(query = %query.trim(), "Searching clients");

        let clients = sqlx::query_as::<_, Client>(
            r#"
            SELECT
                id, number, provider_code, display_name, contact,
                address, phone, reference, created_at, updated_at
            FROM clients
            ORDER BY display_name, provider_code
            "#,
        )
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(clients
            .into_iter()
            .filter(|c| {
                term.matches_any(&[
                    c.provider_code.as_str(),
                    c.display_name.as_str(),
                    c.contact.as_str(),
                    c.address.as_str(),
                ])
            })
            .collect())
    }

    /// Deletes a client that no receipt references.
    ///
    /// ## Returns
    /// * `Err(DbError::InUse)` - receipts still belong to this client
    /// * `Err(DbError::NotFound)` - no such client
    pub async fn delete(&mut self, id: &str) -> DbResult<()> {
        let client = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Client", id))?;

        let receipts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM receipts WHERE client_id = ?1")
            .bind(id)
            .fetch_one(&mut *self.conn)
            .await?;

        if receipts > 0 {
            return Err(DbError::in_use(
                "Client",
                &client.provider_code,
                format!("{} receipt(s)", receipts),
            ));
        }

        debug!(id = %id, provider_code = %client.provider_code, "Deleting client");

        sqlx::query("DELETE FROM clients WHERE id = ?1")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;

        Ok(())
    }

    /// Counts clients.
    pub async fn count(&mut self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM clients")
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
    use crate::repository::fixtures;
    use crate::{Database, DbConfig};

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn fields(name: &str, phone: &str) -> ClientFields {
        ClientFields {
            number: 7,
            display_name: name.to_string(),
            phone: phone.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_upsert_creates_then_overwrites() {
        let db = db().await;
        let mut conn = db.acquire().await.unwrap();
        let mut repo = ClientRepository::new(&mut conn);

        let (first, created) = repo
            .upsert_by_provider(" P-1 ", &fields("Abarrotes", "555"))
            .await
            .unwrap();
        assert!(created);
        assert_eq!(first.provider_code, "P-1");

        let (second, created) = repo
            .upsert_by_provider("P-1", &fields("Abarrotes Lupita", ""))
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(second.id, first.id);
        assert_eq!(second.display_name, "Abarrotes Lupita");
        assert_eq!(second.phone, "");
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_get_or_create_does_not_overwrite() {
        let db = db().await;
        let mut conn = db.acquire().await.unwrap();
        let mut repo = ClientRepository::new(&mut conn);

        repo.upsert_by_provider("P-1", &fields("Original", "555")).await.unwrap();

        let (client, created) = repo
            .get_or_create_by_provider("P-1", &ClientFields::default())
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(client.display_name, "Original");
        assert_eq!(client.phone, "555");

        let (fresh, created) = repo
            .get_or_create_by_provider("P-2", &ClientFields::default())
            .await
            .unwrap();
        assert!(created);
        assert_eq!(fresh.number, 0);
    }

    #[tokio::test]
    async fn test_insert_duplicate_provider() {
        let db = db().await;
        let mut conn = db.acquire().await.unwrap();
        let mut repo = ClientRepository::new(&mut conn);

        repo.insert("P-1", &fields("A", "")).await.unwrap();
        let err = repo.insert("P-1", &fields("B", "")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref value, .. } if value == "P-1"));
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_substring() {
        let db = db().await;
        let mut conn = db.acquire().await.unwrap();
        let mut repo = ClientRepository::new(&mut conn);

        let mut lupita = fields("Abarrotes Lupita", "");
        lupita.address = "Calle Hidalgo 12".into();
        repo.insert("P-1", &lupita).await.unwrap();
        repo.insert("P-2", &fields("Tienda 50% Off", "")).await.unwrap();

        assert_eq!(repo.search("lupita").await.unwrap().len(), 1);
        assert_eq!(repo.search("HIDALGO").await.unwrap().len(), 1);
        assert_eq!(repo.search("p-").await.unwrap().len(), 2);
        assert_eq!(repo.search("50%").await.unwrap().len(), 1);
        assert_eq!(repo.search("0%").await.unwrap().len(), 1);
        assert!(repo.search("   ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_folds_accented_letters() {
        let db = db().await;
        let mut conn = db.acquire().await.unwrap();
        let mut repo = ClientRepository::new(&mut conn);

        repo.insert("P-1", &fields("PEÑA ÁLVAREZ", "")).await.unwrap();
        repo.insert("P-2", &fields("Miscelánea Ñoño", "")).await.unwrap();

        assert_eq!(repo.search("peña").await.unwrap().len(), 1);
        assert_eq!(repo.search("PEÑA").await.unwrap().len(), 1);
        assert_eq!(repo.search("álvarez").await.unwrap().len(), 1);
        assert_eq!(repo.search("ÑOÑO").await.unwrap().len(), 1);
        assert!(repo.search("pena").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_returns_every_match() {
        let db = db().await;
        let mut conn = db.acquire().await.unwrap();
        let mut repo = ClientRepository::new(&mut conn);

        for n in 0..60 {
            repo.insert(&format!("P-{n:03}"), &fields("Abarrotes", "")).await.unwrap();
        }
        assert_eq!(repo.search("abarrotes").await.unwrap().len(), 60);
    }

    #[tokio::test]
    async fn test_delete_blocked_by_receipt() {
        let db = db().await;
        let mut conn = db.acquire().await.unwrap();

        let used = fixtures::client(&mut conn, "P-1", "Used").await;
        let unused = fixtures::client(&mut conn, "P-2", "Unused").await;
        fixtures::receipt(&mut conn, &used.id, "R-1").await;

        let mut repo = ClientRepository::new(&mut conn);
        let err = repo.delete(&used.id).await.unwrap_err();
        assert!(matches!(err, DbError::InUse { .. }));

        repo.delete(&unused.id).await.unwrap();
        assert!(repo.get_by_id(&unused.id).await.unwrap().is_none());
        assert!(matches!(repo.delete(&unused.id).await, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_list_orders_by_number() {
        let db = db().await;
        let mut conn = db.acquire().await.unwrap();
        let mut repo = ClientRepository::new(&mut conn);

        let mut second = fields("B", "");
        second.number = 2;
        let mut first = fields("A", "");
        first.number = 1;
        repo.insert("P-B", &second).await.unwrap();
        repo.insert("P-A", &first).await.unwrap();

        let codes: Vec<String> = repo.list().await.unwrap().into_iter().map(|c| c.provider_code).collect();
        assert_eq!(codes, vec!["P-A", "P-B"]);
    }
}
