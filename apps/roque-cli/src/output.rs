//! # Output Rendering
//!
//! Every command result is printed either as plain text lines or, with
//! `--json`, as pretty-printed JSON of the same value.

use std::fmt::Write;

use roque_core::{
    Client, Money, Product, Quantity, Receipt, ReceiptListing, Sale, SaleLineView, SaleListing,
    SearchResults,
};
use roque_import::{CatalogImportSummary, ReceiptImportSummary};
use serde::Serialize;

use crate::commands::receipt::ReceiptDetail;
use crate::commands::sale::{SaleDetail, SaleLineEdit};
use crate::error::ApiError;

/// Plain-text form of a command result.
pub trait Render {
    fn render_text(&self) -> String;
}

/// Renders `value` as text, or as JSON when `json` is set.
pub fn render<T: Serialize + Render>(value: &T, json: bool) -> Result<String, ApiError> {
    if json {
        to_json(value)
    } else {
        Ok(value.render_text())
    }
}

/// Like [`render`], with `action` ("Created", "Deleted", ...) in front of
/// the text form. JSON output is the bare value.
pub fn render_action<T: Serialize + Render>(
    action: &str,
    value: &T,
    json: bool,
) -> Result<String, ApiError> {
    if json {
        to_json(value)
    } else {
        Ok(format!("{}: {}", action, value.render_text()))
    }
}

pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::internal(format!("Could not encode output: {}", e)))
}

fn list<T: Render>(title: &str, empty: &str, items: &[T]) -> String {
    if items.is_empty() {
        return empty.to_string();
    }
    let mut out = format!("{} ({}):", title, items.len());
    for item in items {
        let _ = write!(out, "\n- {}", item.render_text());
    }
    out
}

// =============================================================================
// Entities
// =============================================================================

impl Render for Product {
    fn render_text(&self) -> String {
        format!(
            "{} • {} • purchase {} PAQ / {} PZA • sale {} PAQ / {} PZA",
            self.code,
            self.description,
            self.purchase_box(),
            self.purchase_piece(),
            self.sale_box(),
            self.sale_piece()
        )
    }
}

impl Render for Vec<Product> {
    fn render_text(&self) -> String {
        list("Products", "No products.", self)
    }
}

impl Render for Client {
    fn render_text(&self) -> String {
        let mut out = format!("{} • {}", self.provider_code, self.display_name);
        if !self.contact.is_empty() {
            let _ = write!(out, " • contact {}", self.contact);
        }
        if !self.phone.is_empty() {
            let _ = write!(out, " • tel {}", self.phone);
        }
        out
    }
}

impl Render for Vec<Client> {
    fn render_text(&self) -> String {
        list("Clients", "No clients.", self)
    }
}

impl Render for Receipt {
    fn render_text(&self) -> String {
        let mut out = format!("Receipt {} • {} • id {}", self.folio, self.date, self.id);
        if let Some(path) = &self.image_path {
            let _ = write!(out, " • evidence {}", path);
        }
        out
    }
}

impl Render for ReceiptListing {
    fn render_text(&self) -> String {
        let mut out = format!(
            "{} • {} • {} {}",
            self.date, self.folio, self.client_provider_code, self.client_name
        );
        if let Some(total) = self.sale_total_cents {
            let _ = write!(out, " • total {}", Money::from_cents(total));
        }
        if self.has_image {
            out.push_str(" • evidence");
        }
        let _ = write!(out, " • id {}", self.id);
        out
    }
}

impl Render for Vec<ReceiptListing> {
    fn render_text(&self) -> String {
        list("Receipts", "No receipts.", self)
    }
}

impl Render for ReceiptDetail {
    fn render_text(&self) -> String {
        let mut out = self.receipt.render_text();
        let _ = write!(out, "\nClient: {}", self.client.render_text());
        if !self.receipt.notes.is_empty() {
            let _ = write!(out, "\nNotes: {}", self.receipt.notes);
        }
        match &self.sale {
            Some(sale) => {
                let _ = write!(out, "\nSale: {}", sale.render_text());
            }
            None => out.push_str("\nSale: none"),
        }
        out
    }
}

impl Render for Sale {
    fn render_text(&self) -> String {
        format!(
            "Sale {} • {} • subtotal {} − discount {} + tax {} = total {}",
            self.id,
            self.date,
            self.subtotal(),
            self.discount(),
            self.tax(),
            self.total()
        )
    }
}

impl Render for SaleListing {
    fn render_text(&self) -> String {
        format!(
            "{} • {} • {} • total {} • id {}",
            self.date,
            self.folio,
            self.client_name,
            Money::from_cents(self.total_cents),
            self.id
        )
    }
}

impl Render for Vec<SaleListing> {
    fn render_text(&self) -> String {
        list("Sales", "No sales matched the provided filters.", self)
    }
}

impl Render for SaleLineView {
    fn render_text(&self) -> String {
        format!(
            "{} {} • {} {} × {} = {} • line {}",
            self.product_code,
            self.product_description,
            Quantity::from_thousandths(self.quantity_milli),
            self.unit,
            Money::from_cents(self.unit_price_cents),
            Money::from_cents(self.subtotal_cents),
            self.id
        )
    }
}

impl Render for SaleDetail {
    fn render_text(&self) -> String {
        let mut out = format!(
            "{}\nReceipt {} • {} {}",
            self.sale.render_text(),
            self.receipt.folio,
            self.client.provider_code,
            self.client.display_name
        );
        out.push('\n');
        out.push_str(&list("Lines", "No lines.", &self.lines));
        out
    }
}

impl Render for SaleLineEdit {
    fn render_text(&self) -> String {
        format!(
            "line {} ({} {} × {} = {})\n{}",
            self.line.id,
            self.line.quantity(),
            self.line.unit,
            self.line.unit_price(),
            self.line.subtotal(),
            self.sale.render_text()
        )
    }
}

impl Render for SearchResults {
    fn render_text(&self) -> String {
        if self.is_empty() {
            return format!("Nothing matches '{}'.", self.query);
        }
        format!(
            "{}\n{}",
            list("Products", "No products.", &self.products),
            list("Clients", "No clients.", &self.clients)
        )
    }
}

// =============================================================================
// Import Summaries
// =============================================================================

impl Render for CatalogImportSummary {
    fn render_text(&self) -> String {
        self.to_string()
    }
}

impl Render for ReceiptImportSummary {
    fn render_text(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product() -> Product {
        Product {
            id: "p1".into(),
            code: "A1".into(),
            description: "Widget".into(),
            purchase_box_cents: 100_000,
            purchase_piece_cents: 0,
            sale_box_cents: 1000,
            sale_piece_cents: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_text_and_json() {
        let text = render(&product(), false).unwrap();
        assert_eq!(
            text,
            "A1 • Widget • purchase 1000.00 PAQ / 0.00 PZA • sale 10.00 PAQ / 0.00 PZA"
        );

        let json = render(&product(), true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["code"], "A1");
        assert_eq!(value["saleBoxCents"], 1000);
    }

    #[test]
    fn test_lists() {
        assert_eq!(Vec::<Product>::new().render_text(), "No products.");
        assert!(vec![product()].render_text().starts_with("Products (1):\n- A1"));
    }

    #[test]
    fn test_action_prefix() {
        let summary = CatalogImportSummary {
            created: 1,
            updated: 0,
            skipped: 0,
        };
        assert_eq!(
            render_action("Imported", &summary, false).unwrap(),
            "Imported: 1 created, 0 updated, 0 skipped"
        );
    }
}
