//! # Product Commands
//!
//! Manual catalog maintenance. Bulk loads go through `import products`.
//!
//! Products are addressed by id or by code: `roque product show A1`.

use roque_core::{CoreError, Product, ProductInput};
use roque_db::ProductRepository;
use sqlx::SqliteConnection;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::AppContext;

/// Finds a product by id, falling back to its code.
pub(crate) async fn resolve_product(
    conn: &mut SqliteConnection,
    reference: &str,
) -> Result<Product, ApiError> {
    let reference = reference.trim();
    let mut repo = ProductRepository::new(conn);
    if let Some(product) = repo.get_by_id(reference).await? {
        return Ok(product);
    }
    repo.find_by_code(reference)
        .await?
        .ok_or_else(|| CoreError::ProductNotFound(reference.to_string()).into())
}

/// All products ordered by code.
pub async fn list_products(ctx: &AppContext) -> Result<Vec<Product>, ApiError> {
    let mut conn = ctx.db.acquire().await?;
    let products = ProductRepository::new(&mut conn).list().await?;
    debug!(count = products.len(), "list_products command");
    Ok(products)
}

pub async fn get_product(ctx: &AppContext, reference: &str) -> Result<Product, ApiError> {
    let mut conn = ctx.db.acquire().await?;
    resolve_product(&mut conn, reference).await
}

/// Adds a product.
///
/// ## Errors
/// * `VALIDATION_ERROR` - blank code/description, negative price
/// * `CONFLICT` - the code already exists
pub async fn create_product(ctx: &AppContext, input: ProductInput) -> Result<Product, ApiError> {
    input.validate()?;

    let mut conn = ctx.db.acquire().await?;
    let product = ProductRepository::new(&mut conn)
        .insert(&input.code, &input.fields)
        .await?;

    info!(code = %product.code, "Product created");
    Ok(product)
}

/// Replaces every field of a product, code included.
pub async fn update_product(
    ctx: &AppContext,
    reference: &str,
    input: ProductInput,
) -> Result<Product, ApiError> {
    input.validate()?;

    let mut conn = ctx.db.acquire().await?;
    let existing = resolve_product(&mut conn, reference).await?;
    let product = ProductRepository::new(&mut conn)
        .update(&existing.id, &input.code, &input.fields)
        .await?;

    info!(code = %product.code, "Product updated");
    Ok(product)
}

/// Deletes a product no sale line uses (`CONFLICT` otherwise).
pub async fn delete_product(ctx: &AppContext, reference: &str) -> Result<Product, ApiError> {
    let mut conn = ctx.db.acquire().await?;
    let product = resolve_product(&mut conn, reference).await?;
    ProductRepository::new(&mut conn).delete(&product.id).await?;

    info!(code = %product.code, "Product deleted");
    Ok(product)
}
