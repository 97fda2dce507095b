//! # Global Search
//!
//! One query against products (code, description) and clients (provider
//! code, name, contact, address). Matching ignores case, accented capitals
//! included, and every match is returned.

use roque_core::validation::validate_search_query;
use roque_core::SearchResults;
use roque_db::{ClientRepository, ProductRepository};
use tracing::debug;

use crate::error::ApiError;
use crate::AppContext;

/// Runs the search box. A blank query returns empty results.
pub async fn global_search(ctx: &AppContext, query: &str) -> Result<SearchResults, ApiError> {
    let query = validate_search_query(query)?;
    if query.is_empty() {
        return Ok(SearchResults::default());
    }

    let mut conn = ctx.db.acquire().await?;
    let products = ProductRepository::new(&mut conn).search(&query).await?;
    let clients = ClientRepository::new(&mut conn).search(&query).await?;

    debug!(
        query = %query,
        products = products.len(),
        clients = clients.len(),
        "global_search command"
    );

    Ok(SearchResults {
        query,
        products,
        clients,
    })
}
