//! # Sale Commands
//!
//! Sales are raised from receipts and edited line by line.
//!
//! ## Edit Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    ├── check sale / product / line exist                               │
//! │    ├── insert_line | update_line | delete_line | update_header         │
//! │    └── SaleRepository::recalculate(sale_id)                            │
//! │          subtotal = Σ line subtotals, total = subtotal − discount + tax│
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any error before COMMIT drops the transaction: nothing is stored.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use roque_core::{
    Client, CoreError, Money, Quantity, Receipt, Sale, SaleFilter, SaleHeaderInput, SaleLine,
    SaleLineInput, SaleLineView, SaleListing, UnitType,
};
use roque_db::{ClientRepository, ReceiptRepository, SaleRepository};
use serde::Serialize;
use sqlx::SqliteConnection;
use tracing::{debug, info};

use crate::commands::client::resolve_client;
use crate::commands::product::resolve_product;
use crate::commands::receipt::load_receipt;
use crate::error::ApiError;
use crate::AppContext;

// =============================================================================
// Request / Response Types
// =============================================================================

/// A sale with the receipt it came from and its lines.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleDetail {
    pub sale: Sale,
    pub receipt: Receipt,
    pub client: Client,
    pub lines: Vec<SaleLineView>,
}

/// A line as typed by the operator. The product is an id or a code.
#[derive(Debug, Clone)]
pub struct NewSaleLine {
    pub product: String,
    pub unit: UnitType,
    pub quantity: Quantity,
    /// Defaults to the product's sale price for `unit`.
    pub unit_price: Option<Money>,
}

/// Partial line edit; `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct SaleLineChange {
    pub product: Option<String>,
    pub unit: Option<UnitType>,
    pub quantity: Option<Quantity>,
    pub unit_price: Option<Money>,
}

/// Result of a line edit: the line and the recalculated sale.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleLineEdit {
    pub line: SaleLine,
    pub sale: Sale,
}

// =============================================================================
// Helpers
// =============================================================================

async fn load_sale(conn: &mut SqliteConnection, id: &str) -> Result<Sale, ApiError> {
    SaleRepository::new(conn)
        .get_by_id(id.trim())
        .await?
        .ok_or_else(|| CoreError::SaleNotFound(id.trim().to_string()).into())
}

async fn load_line(conn: &mut SqliteConnection, id: &str) -> Result<SaleLine, ApiError> {
    SaleRepository::new(conn)
        .get_line(id.trim())
        .await?
        .ok_or_else(|| CoreError::SaleLineNotFound(id.trim().to_string()).into())
}

/// Rejects a second line for the same (product, unit), ignoring `except`.
async fn ensure_unique_line(
    conn: &mut SqliteConnection,
    sale_id: &str,
    product_id: &str,
    product_code: &str,
    unit: UnitType,
    except: Option<&str>,
) -> Result<(), ApiError> {
    let lines = SaleRepository::new(conn).get_lines(sale_id).await?;
    let taken = lines.iter().any(|line| {
        line.product_id == product_id && line.unit == unit && Some(line.id.as_str()) != except
    });

    if taken {
        return Err(CoreError::DuplicateSaleLine {
            product_code: product_code.to_string(),
            unit: unit.code().to_string(),
        }
        .into());
    }
    Ok(())
}

// =============================================================================
// Queries
// =============================================================================

/// Sales newest first, narrowed by client and/or product (id or code).
pub async fn list_sales(
    ctx: &AppContext,
    client: Option<&str>,
    product: Option<&str>,
) -> Result<Vec<SaleListing>, ApiError> {
    let mut conn = ctx.db.acquire().await?;

    let mut filter = SaleFilter::default();
    if let Some(reference) = client {
        filter.client_id = Some(resolve_client(&mut conn, reference).await?.id);
    }
    if let Some(reference) = product {
        filter.product_id = Some(resolve_product(&mut conn, reference).await?.id);
    }

    let sales = SaleRepository::new(&mut conn).list(&filter).await?;
    debug!(count = sales.len(), filter = ?filter, "list_sales command");
    Ok(sales)
}

pub async fn get_sale(ctx: &AppContext, id: &str) -> Result<SaleDetail, ApiError> {
    let mut conn = ctx.db.acquire().await?;
    let sale = load_sale(&mut conn, id).await?;
    let receipt = load_receipt(&mut conn, &sale.receipt_id).await?;
    let client = ClientRepository::new(&mut conn)
        .get_by_id(&receipt.client_id)
        .await?
        .ok_or_else(|| ApiError::from(CoreError::ClientNotFound(receipt.client_id.clone())))?;
    let lines = SaleRepository::new(&mut conn).get_line_views(&sale.id).await?;

    Ok(SaleDetail {
        sale,
        receipt,
        client,
        lines,
    })
}

// =============================================================================
// Edits
// =============================================================================

/// Returns the receipt's sale, creating an empty one dated like the receipt
/// when there is none.
pub async fn open_sale(ctx: &AppContext, receipt_id: &str) -> Result<Sale, ApiError> {
    let mut tx = ctx.db.begin().await?;
    let receipt = load_receipt(&mut tx, receipt_id).await?;

    if let Some(existing) = SaleRepository::new(&mut tx).find_by_receipt(&receipt.id).await? {
        debug!(folio = %receipt.folio, "Sale already open");
        return Ok(existing);
    }

    let sale = SaleRepository::new(&mut tx)
        .create_empty_for_receipt(&receipt)
        .await?;
    roque_db::commit(tx).await?;

    info!(folio = %receipt.folio, sale_id = %sale.id, "Sale opened");
    Ok(sale)
}

/// Sets date, discount and tax, then recalculates the total.
pub async fn update_sale_header(
    ctx: &AppContext,
    id: &str,
    header: SaleHeaderInput,
) -> Result<Sale, ApiError> {
    header.validate()?;

    let mut tx = ctx.db.begin().await?;
    let sale = load_sale(&mut tx, id).await?;

    let mut repo = SaleRepository::new(&mut tx);
    repo.update_header(&sale.id, &header).await?;
    let sale = repo.recalculate(&sale.id).await?;
    roque_db::commit(tx).await?;

    info!(sale_id = %sale.id, total = %sale.total(), "Sale header updated");
    Ok(sale)
}

/// Adds a line and recalculates the sale.
///
/// ## Errors
/// * `NOT_FOUND` - unknown sale or product
/// * `VALIDATION_ERROR` - quantity below 0.001, negative price
/// * `CONFLICT` - the sale already has this product in this unit
pub async fn add_line(
    ctx: &AppContext,
    sale_id: &str,
    new_line: NewSaleLine,
) -> Result<SaleLineEdit, ApiError> {
    let mut tx = ctx.db.begin().await?;
    let sale = load_sale(&mut tx, sale_id).await?;
    let product = resolve_product(&mut tx, &new_line.product).await?;

    let input = SaleLineInput {
        product_id: product.id.clone(),
        unit: new_line.unit,
        quantity: new_line.quantity,
        unit_price: new_line
            .unit_price
            .unwrap_or_else(|| product.sale_price(new_line.unit)),
    };
    input.validate()?;
    ensure_unique_line(&mut tx, &sale.id, &product.id, &product.code, input.unit, None).await?;

    let mut repo = SaleRepository::new(&mut tx);
    let line = repo.insert_line(&sale.id, &input).await?;
    let sale = repo.recalculate(&sale.id).await?;
    roque_db::commit(tx).await?;

    info!(
        sale_id = %sale.id,
        product = %product.code,
        unit = %line.unit,
        total = %sale.total(),
        "Sale line added"
    );
    Ok(SaleLineEdit { line, sale })
}

/// Changes a line and recalculates its sale.
///
/// Switching product or unit without a price keeps the old price.
pub async fn edit_line(
    ctx: &AppContext,
    line_id: &str,
    change: SaleLineChange,
) -> Result<SaleLineEdit, ApiError> {
    let mut tx = ctx.db.begin().await?;
    let current = load_line(&mut tx, line_id).await?;

    let product = match &change.product {
        Some(reference) => resolve_product(&mut tx, reference).await?,
        None => resolve_product(&mut tx, &current.product_id).await?,
    };

    let input = SaleLineInput {
        product_id: product.id.clone(),
        unit: change.unit.unwrap_or(current.unit),
        quantity: change.quantity.unwrap_or_else(|| current.quantity()),
        unit_price: change.unit_price.unwrap_or_else(|| current.unit_price()),
    };
    input.validate()?;
    ensure_unique_line(
        &mut tx,
        &current.sale_id,
        &product.id,
        &product.code,
        input.unit,
        Some(&current.id),
    )
    .await?;

    let mut repo = SaleRepository::new(&mut tx);
    let line = repo.update_line(&current.id, &input).await?;
    let sale = repo.recalculate(&current.sale_id).await?;
    roque_db::commit(tx).await?;

    info!(sale_id = %sale.id, line_id = %line.id, total = %sale.total(), "Sale line updated");
    Ok(SaleLineEdit { line, sale })
}

/// Removes a line and returns the recalculated sale.
pub async fn remove_line(ctx: &AppContext, line_id: &str) -> Result<Sale, ApiError> {
    let mut tx = ctx.db.begin().await?;
    let line = load_line(&mut tx, line_id).await?;

    let mut repo = SaleRepository::new(&mut tx);
    repo.delete_line(&line.id).await?;
    let sale = repo.recalculate(&line.sale_id).await?;
    roque_db::commit(tx).await?;

    info!(sale_id = %sale.id, line_id = %line.id, total = %sale.total(), "Sale line removed");
    Ok(sale)
}

/// Deletes a sale and its lines. The receipt stays.
pub async fn delete_sale(ctx: &AppContext, id: &str) -> Result<Sale, ApiError> {
    let mut conn = ctx.db.acquire().await?;
    let sale = load_sale(&mut conn, id).await?;
    SaleRepository::new(&mut conn).delete(&sale.id).await?;

    let folio = ReceiptRepository::new(&mut conn)
        .get_by_id(&sale.receipt_id)
        .await?
        .map(|r| r.folio)
        .unwrap_or_default();
    info!(sale_id = %sale.id, folio = %folio, "Sale deleted");
    Ok(sale)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::client::create_client;
    use crate::commands::product::create_product;
    use crate::commands::receipt::create_receipt;
    use crate::error::ErrorCode;
    use crate::testing::context;
    use chrono::NaiveDate;
    use roque_core::{ClientFields, ClientInput, ProductFields, ProductInput, ReceiptInput};

    /// Product A1 (12.50 a piece, 100.00 a box), product B2, one receipt.
    async fn seeded(ctx: &AppContext) -> Receipt {
        for (code, piece, box_) in [("A1", 1250, 10000), ("B2", 500, 4000)] {
            create_product(
                ctx,
                ProductInput {
                    code: code.into(),
                    fields: ProductFields {
                        description: format!("Producto {}", code),
                        sale_piece: Money::from_cents(piece),
                        sale_box: Money::from_cents(box_),
                        ..Default::default()
                    },
                },
            )
            .await
            .unwrap();
        }

        let client = create_client(
            ctx,
            ClientInput {
                provider_code: "PRO0002".into(),
                fields: ClientFields {
                    display_name: "Abarrotes Lupita".into(),
                    ..Default::default()
                },
            },
        )
        .await
        .unwrap();

        create_receipt(
            ctx,
            ReceiptInput {
                client_id: client.id,
                folio: "K-0070".into(),
                date: NaiveDate::from_ymd_opt(2025, 11, 3).unwrap(),
                notes: String::new(),
            },
        )
        .await
        .unwrap()
    }

    fn line(product: &str, unit: UnitType, milli: i64) -> NewSaleLine {
        NewSaleLine {
            product: product.into(),
            unit,
            quantity: Quantity::from_thousandths(milli),
            unit_price: None,
        }
    }

    #[tokio::test]
    async fn test_open_sale_is_idempotent() {
        let (ctx, _dir) = context().await;
        let receipt = seeded(&ctx).await;

        let first = open_sale(&ctx, &receipt.id).await.unwrap();
        let second = open_sale(&ctx, &receipt.id).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.date, receipt.date);
        assert_eq!(first.total(), Money::zero());
    }

    #[tokio::test]
    async fn test_line_edits_keep_totals_in_sync() {
        let (ctx, _dir) = context().await;
        let receipt = seeded(&ctx).await;
        let sale = open_sale(&ctx, &receipt.id).await.unwrap();

        // 2 × 12.50 (piece price by default)
        let piece = add_line(&ctx, &sale.id, line("A1", UnitType::Piece, 2000)).await.unwrap();
        assert_eq!(piece.line.subtotal(), Money::from_cents(2500));

        // 1.5 × 100.00 (box price)
        let boxes = add_line(&ctx, &sale.id, line("A1", UnitType::Box, 1500)).await.unwrap();
        assert_eq!(boxes.sale.subtotal(), Money::from_cents(17500));

        let sale = update_sale_header(
            &ctx,
            &sale.id,
            SaleHeaderInput {
                date: receipt.date,
                discount: Money::from_cents(500),
                tax: Money::from_cents(1000),
            },
        )
        .await
        .unwrap();
        assert_eq!(sale.total(), Money::from_cents(18000));

        let edited = edit_line(
            &ctx,
            &piece.line.id,
            SaleLineChange {
                quantity: Some(Quantity::from_units(4)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(edited.line.subtotal(), Money::from_cents(5000));
        assert_eq!(edited.sale.subtotal(), Money::from_cents(20000));
        assert_eq!(edited.sale.total(), Money::from_cents(20500));

        let sale = remove_line(&ctx, &boxes.line.id).await.unwrap();
        assert_eq!(sale.subtotal(), Money::from_cents(5000));
        assert_eq!(sale.total(), Money::from_cents(5500));

        let detail = get_sale(&ctx, &sale.id).await.unwrap();
        assert_eq!(detail.receipt.folio, "K-0070");
        assert_eq!(detail.lines.len(), 1);
        assert_eq!(detail.lines[0].product_code, "A1");
    }

    #[tokio::test]
    async fn test_explicit_price_overrides_catalog() {
        let (ctx, _dir) = context().await;
        let receipt = seeded(&ctx).await;
        let sale = open_sale(&ctx, &receipt.id).await.unwrap();

        let mut custom = line("B2", UnitType::Piece, 1500);
        custom.unit_price = Some(Money::from_cents(3332));
        let edit = add_line(&ctx, &sale.id, custom).await.unwrap();

        // 1.5 × 33.32 = 49.98
        assert_eq!(edit.sale.total(), Money::from_cents(4998));
    }

    #[tokio::test]
    async fn test_duplicate_product_unit_is_conflict() {
        let (ctx, _dir) = context().await;
        let receipt = seeded(&ctx).await;
        let sale = open_sale(&ctx, &receipt.id).await.unwrap();

        add_line(&ctx, &sale.id, line("A1", UnitType::Piece, 1000)).await.unwrap();
        let other = add_line(&ctx, &sale.id, line("B2", UnitType::Piece, 1000)).await.unwrap();

        let err = add_line(&ctx, &sale.id, line("A1", UnitType::Piece, 3000))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);

        let err = edit_line(
            &ctx,
            &other.line.id,
            SaleLineChange {
                product: Some("A1".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);

        // nothing changed
        let detail = get_sale(&ctx, &sale.id).await.unwrap();
        assert_eq!(detail.lines.len(), 2);
        assert_eq!(detail.sale.subtotal(), Money::from_cents(1750));
    }

    #[tokio::test]
    async fn test_invalid_quantity_rejected() {
        let (ctx, _dir) = context().await;
        let receipt = seeded(&ctx).await;
        let sale = open_sale(&ctx, &receipt.id).await.unwrap();

        let err = add_line(&ctx, &sale.id, line("A1", UnitType::Piece, 0))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = add_line(&ctx, &sale.id, line("ZZ", UnitType::Piece, 1000))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_list_filters_and_delete() {
        let (ctx, _dir) = context().await;
        let receipt = seeded(&ctx).await;
        let sale = open_sale(&ctx, &receipt.id).await.unwrap();
        add_line(&ctx, &sale.id, line("A1", UnitType::Piece, 1000)).await.unwrap();

        assert_eq!(list_sales(&ctx, Some("PRO0002"), None).await.unwrap().len(), 1);
        assert_eq!(list_sales(&ctx, None, Some("A1")).await.unwrap().len(), 1);
        assert!(list_sales(&ctx, None, Some("B2")).await.unwrap().is_empty());

        delete_sale(&ctx, &sale.id).await.unwrap();
        assert!(list_sales(&ctx, None, None).await.unwrap().is_empty());

        // the receipt survives and can be reopened
        let reopened = open_sale(&ctx, &receipt.id).await.unwrap();
        assert_ne!(reopened.id, sale.id);
    }
}
