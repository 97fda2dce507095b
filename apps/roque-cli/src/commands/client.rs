//! # Client Commands
//!
//! Clients are addressed by id or by provider code.

use roque_core::{Client, ClientInput, CoreError};
use roque_db::ClientRepository;
use sqlx::SqliteConnection;
use tracing::info;

use crate::error::ApiError;
use crate::AppContext;

/// Finds a client by id, falling back to its provider code.
pub(crate) async fn resolve_client(
    conn: &mut SqliteConnection,
    reference: &str,
) -> Result<Client, ApiError> {
    let reference = reference.trim();
    let mut repo = ClientRepository::new(conn);
    if let Some(client) = repo.get_by_id(reference).await? {
        return Ok(client);
    }
    repo.find_by_provider(reference)
        .await?
        .ok_or_else(|| CoreError::ClientNotFound(reference.to_string()).into())
}

pub async fn list_clients(ctx: &AppContext) -> Result<Vec<Client>, ApiError> {
    let mut conn = ctx.db.acquire().await?;
    Ok(ClientRepository::new(&mut conn).list().await?)
}

pub async fn get_client(ctx: &AppContext, reference: &str) -> Result<Client, ApiError> {
    let mut conn = ctx.db.acquire().await?;
    resolve_client(&mut conn, reference).await
}

pub async fn create_client(ctx: &AppContext, input: ClientInput) -> Result<Client, ApiError> {
    input.validate()?;

    let mut conn = ctx.db.acquire().await?;
    let client = ClientRepository::new(&mut conn)
        .insert(&input.provider_code, &input.fields)
        .await?;

    info!(provider = %client.provider_code, "Client created");
    Ok(client)
}

pub async fn update_client(
    ctx: &AppContext,
    reference: &str,
    input: ClientInput,
) -> Result<Client, ApiError> {
    input.validate()?;

    let mut conn = ctx.db.acquire().await?;
    let existing = resolve_client(&mut conn, reference).await?;
    let client = ClientRepository::new(&mut conn)
        .update(&existing.id, &input.provider_code, &input.fields)
        .await?;

    info!(provider = %client.provider_code, "Client updated");
    Ok(client)
}

/// Deletes a client that has no receipts (`CONFLICT` otherwise).
pub async fn delete_client(ctx: &AppContext, reference: &str) -> Result<Client, ApiError> {
    let mut conn = ctx.db.acquire().await?;
    let client = resolve_client(&mut conn, reference).await?;
    ClientRepository::new(&mut conn).delete(&client.id).await?;

    info!(provider = %client.provider_code, "Client deleted");
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::receipt::create_receipt;
    use crate::error::ErrorCode;
    use crate::testing::context;
    use chrono::NaiveDate;
    use roque_core::{ClientFields, ReceiptInput};

    fn input(provider: &str, name: &str) -> ClientInput {
        ClientInput {
            provider_code: provider.to_string(),
            fields: ClientFields {
                display_name: name.to_string(),
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn test_crud_by_provider_code() {
        let (ctx, _dir) = context().await;
        create_client(&ctx, input("PRO0002", "Abarrotes Lupita")).await.unwrap();

        let mut changed = input("PRO0002", "Abarrotes Lupita 2");
        changed.fields.phone = "555".into();
        let updated = update_client(&ctx, "PRO0002", changed).await.unwrap();
        assert_eq!(updated.display_name, "Abarrotes Lupita 2");
        assert_eq!(updated.phone, "555");

        assert_eq!(list_clients(&ctx).await.unwrap().len(), 1);
        delete_client(&ctx, "PRO0002").await.unwrap();
        assert_eq!(
            get_client(&ctx, "PRO0002").await.unwrap_err().code,
            ErrorCode::NotFound
        );
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let (ctx, _dir) = context().await;
        let err = create_client(&ctx, input("PRO0002", "  ")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_delete_with_receipts_is_conflict() {
        let (ctx, _dir) = context().await;
        let client = create_client(&ctx, input("PRO0002", "A")).await.unwrap();
        create_receipt(
            &ctx,
            ReceiptInput {
                client_id: client.id.clone(),
                folio: "K-0070".into(),
                date: NaiveDate::from_ymd_opt(2025, 11, 3).unwrap(),
                notes: String::new(),
            },
        )
        .await
        .unwrap();

        let err = delete_client(&ctx, "PRO0002").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);
    }
}
