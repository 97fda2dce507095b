//! # Command Line
//!
//! clap definitions and the dispatch from a parsed subcommand to the
//! command functions in [`crate::commands`].
//!
//! ```text
//! roque [--config PATH] [--json] <entity> <action> ...
//!
//!   product  list | show | add | edit | delete
//!   client   list | show | add | edit | delete
//!   receipt  list | show | add | edit | attach | delete
//!   sale     list | show | open | edit | add-line | edit-line | remove-line | delete
//!   search   <query>
//!   import   products | clients | receipts <file> [--sheet NAME]
//! ```
//!
//! Amounts are typed as decimals (`1,250.50`), quantities with up to three
//! decimals, dates as `YYYY-MM-DD` and units as `PAQ`/`PZA`.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand};
use roque_core::validation::{parse_amount, parse_date, parse_quantity, validate_unit};
use roque_core::{
    ClientFields, ClientInput, Money, ProductFields, ProductInput, Quantity, ReceiptInput,
    SaleHeaderInput, UnitType,
};

use crate::commands::sale::{NewSaleLine, SaleLineChange};
use crate::commands::{client, import, product, receipt, sale, search};
use crate::error::ApiError;
use crate::output::{render, render_action};
use crate::AppContext;

// =============================================================================
// Top Level
// =============================================================================

#[derive(Debug, Parser)]
#[command(name = "roque", about = "Back office for delivery receipts and sales", version)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "Config file (defaults to $ROQUE_CONFIG, then the platform config dir)"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON"
    )]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(subcommand, about = "Product catalog")]
    Product(ProductCommands),
    #[command(subcommand, about = "Client stores")]
    Client(ClientCommands),
    #[command(subcommand, about = "Delivery receipts and evidence")]
    Receipt(ReceiptCommands),
    #[command(subcommand, about = "Sales and sale lines")]
    Sale(SaleCommands),
    #[command(about = "Search products and clients")]
    Search(SearchArgs),
    #[command(subcommand, about = "Load spreadsheets")]
    Import(ImportCommands),
}

// =============================================================================
// Value Parsers
// =============================================================================

fn parse_money(raw: &str) -> Result<Money, String> {
    parse_amount("amount", raw).map_err(|e| e.to_string())
}

fn parse_qty(raw: &str) -> Result<Quantity, String> {
    parse_quantity(raw).map_err(|e| e.to_string())
}

fn parse_day(raw: &str) -> Result<NaiveDate, String> {
    parse_date("date", raw).map_err(|e| e.to_string())
}

fn parse_unit(raw: &str) -> Result<UnitType, String> {
    validate_unit(raw).map_err(|e| e.to_string())
}

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Subcommand)]
pub enum ProductCommands {
    List,
    Show(ReferenceArgs),
    Add(AddProductArgs),
    Edit(EditProductArgs),
    Delete(ReferenceArgs),
}

#[derive(Debug, Args)]
pub struct ReferenceArgs {
    #[arg(help = "Id or natural key (product code / provider code)")]
    pub reference: String,
}

#[derive(Debug, Args)]
pub struct AddProductArgs {
    #[arg(help = "Product code")]
    pub code: String,
    #[arg(long)]
    pub description: String,
    #[arg(long, value_parser = parse_money, default_value = "0")]
    pub purchase_box: Money,
    #[arg(long, value_parser = parse_money, default_value = "0")]
    pub purchase_piece: Money,
    #[arg(long, value_parser = parse_money, default_value = "0")]
    pub sale_box: Money,
    #[arg(long, value_parser = parse_money, default_value = "0")]
    pub sale_piece: Money,
}

#[derive(Debug, Args)]
pub struct EditProductArgs {
    pub reference: String,
    #[arg(long, help = "New product code")]
    pub code: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long, value_parser = parse_money)]
    pub purchase_box: Option<Money>,
    #[arg(long, value_parser = parse_money)]
    pub purchase_piece: Option<Money>,
    #[arg(long, value_parser = parse_money)]
    pub sale_box: Option<Money>,
    #[arg(long, value_parser = parse_money)]
    pub sale_piece: Option<Money>,
}

// =============================================================================
// Clients
// =============================================================================

#[derive(Debug, Subcommand)]
pub enum ClientCommands {
    List,
    Show(ReferenceArgs),
    Add(AddClientArgs),
    Edit(EditClientArgs),
    Delete(ReferenceArgs),
}

#[derive(Debug, Args)]
pub struct AddClientArgs {
    #[arg(help = "Provider code")]
    pub provider_code: String,
    #[arg(long, help = "Store name")]
    pub name: String,
    #[arg(long, default_value_t = 0)]
    pub number: i64,
    #[arg(long, default_value = "")]
    pub contact: String,
    #[arg(long, default_value = "")]
    pub address: String,
    #[arg(long, default_value = "")]
    pub phone: String,
    #[arg(long, default_value = "")]
    pub reference: String,
}

#[derive(Debug, Args)]
pub struct EditClientArgs {
    #[arg(help = "Client id or provider code")]
    pub client: String,
    #[arg(long, help = "New provider code")]
    pub provider_code: Option<String>,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub number: Option<i64>,
    #[arg(long)]
    pub contact: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub reference: Option<String>,
}

// =============================================================================
// Receipts
// =============================================================================

#[derive(Debug, Subcommand)]
pub enum ReceiptCommands {
    List(ListReceiptsArgs),
    Show(IdArgs),
    Add(AddReceiptArgs),
    Edit(EditReceiptArgs),
    #[command(about = "Attach the scanned receipt (once)")]
    Attach(AttachArgs),
    Delete(IdArgs),
}

#[derive(Debug, Args)]
pub struct IdArgs {
    pub id: String,
}

#[derive(Debug, Args)]
pub struct ListReceiptsArgs {
    #[arg(long, help = "Client id or provider code")]
    pub client: Option<String>,
}

#[derive(Debug, Args)]
pub struct AddReceiptArgs {
    #[arg(long, help = "Client id or provider code")]
    pub client: String,
    #[arg(long)]
    pub folio: String,
    #[arg(long, value_parser = parse_day)]
    pub date: NaiveDate,
    #[arg(long, default_value = "")]
    pub notes: String,
}

#[derive(Debug, Args)]
pub struct EditReceiptArgs {
    pub id: String,
    #[arg(long)]
    pub folio: Option<String>,
    #[arg(long, value_parser = parse_day)]
    pub date: Option<NaiveDate>,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Debug, Args)]
pub struct AttachArgs {
    pub id: String,
    #[arg(help = "Image file to copy into the media root")]
    pub file: PathBuf,
}

// =============================================================================
// Sales
// =============================================================================

#[derive(Debug, Subcommand)]
pub enum SaleCommands {
    List(ListSalesArgs),
    Show(IdArgs),
    #[command(about = "Open (or create) the sale for a receipt")]
    Open(OpenSaleArgs),
    #[command(about = "Set date, discount and tax")]
    Edit(EditSaleArgs),
    AddLine(AddLineArgs),
    EditLine(EditLineArgs),
    RemoveLine(LineArgs),
    Delete(IdArgs),
}

#[derive(Debug, Args)]
pub struct ListSalesArgs {
    #[arg(long, help = "Client id or provider code")]
    pub client: Option<String>,
    #[arg(long, help = "Product id or code")]
    pub product: Option<String>,
}

#[derive(Debug, Args)]
pub struct OpenSaleArgs {
    #[arg(help = "Receipt id")]
    pub receipt: String,
}

#[derive(Debug, Args)]
pub struct EditSaleArgs {
    pub id: String,
    #[arg(long, value_parser = parse_day)]
    pub date: Option<NaiveDate>,
    #[arg(long, value_parser = parse_money)]
    pub discount: Option<Money>,
    #[arg(long, value_parser = parse_money)]
    pub tax: Option<Money>,
}

#[derive(Debug, Args)]
pub struct AddLineArgs {
    #[arg(help = "Sale id")]
    pub sale: String,
    #[arg(long, help = "Product id or code")]
    pub product: String,
    #[arg(long, value_parser = parse_unit, default_value = "PZA")]
    pub unit: UnitType,
    #[arg(long, value_parser = parse_qty)]
    pub quantity: Quantity,
    #[arg(long, value_parser = parse_money, help = "Defaults to the product's sale price")]
    pub price: Option<Money>,
}

#[derive(Debug, Args)]
pub struct EditLineArgs {
    #[arg(help = "Sale line id")]
    pub line: String,
    #[arg(long)]
    pub product: Option<String>,
    #[arg(long, value_parser = parse_unit)]
    pub unit: Option<UnitType>,
    #[arg(long, value_parser = parse_qty)]
    pub quantity: Option<Quantity>,
    #[arg(long, value_parser = parse_money)]
    pub price: Option<Money>,
}

#[derive(Debug, Args)]
pub struct LineArgs {
    #[arg(help = "Sale line id")]
    pub line: String,
}

// =============================================================================
// Search / Import
// =============================================================================

#[derive(Debug, Args)]
pub struct SearchArgs {
    pub query: String,
}

#[derive(Debug, Subcommand)]
pub enum ImportCommands {
    #[command(about = "Product catalog sheet (upsert by code)")]
    Products(ImportArgs),
    #[command(about = "Client sheet (upsert by provider code)")]
    Clients(ImportArgs),
    #[command(about = "Delivery grid: receipts, clients and empty sales")]
    Receipts(ImportArgs),
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    #[arg(help = ".xlsx, .xls, .ods or .csv file")]
    pub file: PathBuf,
    #[arg(long, help = "Sheet to read")]
    pub sheet: Option<String>,
}

// =============================================================================
// Dispatch
// =============================================================================

/// Runs one parsed command and returns what to print.
pub async fn run(ctx: &AppContext, command: Commands, json: bool) -> Result<String, ApiError> {
    match command {
        Commands::Product(command) => run_product(ctx, command, json).await,
        Commands::Client(command) => run_client(ctx, command, json).await,
        Commands::Receipt(command) => run_receipt(ctx, command, json).await,
        Commands::Sale(command) => run_sale(ctx, command, json).await,
        Commands::Search(args) => render(&search::global_search(ctx, &args.query).await?, json),
        Commands::Import(command) => run_import(ctx, command, json).await,
    }
}

async fn run_product(ctx: &AppContext, command: ProductCommands, json: bool) -> Result<String, ApiError> {
    match command {
        ProductCommands::List => render(&product::list_products(ctx).await?, json),
        ProductCommands::Show(args) => render(&product::get_product(ctx, &args.reference).await?, json),
        ProductCommands::Add(args) => {
            let input = ProductInput {
                code: args.code,
                fields: ProductFields {
                    description: args.description,
                    purchase_box: args.purchase_box,
                    purchase_piece: args.purchase_piece,
                    sale_box: args.sale_box,
                    sale_piece: args.sale_piece,
                },
            };
            render_action("Created", &product::create_product(ctx, input).await?, json)
        }
        ProductCommands::Edit(args) => {
            let current = product::get_product(ctx, &args.reference).await?;
            let input = ProductInput {
                code: args.code.unwrap_or_else(|| current.code.clone()),
                fields: ProductFields {
                    description: args.description.unwrap_or_else(|| current.description.clone()),
                    purchase_box: args.purchase_box.unwrap_or_else(|| current.purchase_box()),
                    purchase_piece: args.purchase_piece.unwrap_or_else(|| current.purchase_piece()),
                    sale_box: args.sale_box.unwrap_or_else(|| current.sale_box()),
                    sale_piece: args.sale_piece.unwrap_or_else(|| current.sale_piece()),
                },
            };
            render_action("Updated", &product::update_product(ctx, &current.id, input).await?, json)
        }
        ProductCommands::Delete(args) => {
            render_action("Deleted", &product::delete_product(ctx, &args.reference).await?, json)
        }
    }
}

async fn run_client(ctx: &AppContext, command: ClientCommands, json: bool) -> Result<String, ApiError> {
    match command {
        ClientCommands::List => render(&client::list_clients(ctx).await?, json),
        ClientCommands::Show(args) => render(&client::get_client(ctx, &args.reference).await?, json),
        ClientCommands::Add(args) => {
            let input = ClientInput {
                provider_code: args.provider_code,
                fields: ClientFields {
                    number: args.number,
                    display_name: args.name,
                    contact: args.contact,
                    address: args.address,
                    phone: args.phone,
                    reference: args.reference,
                },
            };
            render_action("Created", &client::create_client(ctx, input).await?, json)
        }
        ClientCommands::Edit(args) => {
            let current = client::get_client(ctx, &args.client).await?;
            let input = ClientInput {
                provider_code: args.provider_code.unwrap_or_else(|| current.provider_code.clone()),
                fields: ClientFields {
                    number: args.number.unwrap_or(current.number),
                    display_name: args.name.unwrap_or_else(|| current.display_name.clone()),
                    contact: args.contact.unwrap_or_else(|| current.contact.clone()),
                    address: args.address.unwrap_or_else(|| current.address.clone()),
                    phone: args.phone.unwrap_or_else(|| current.phone.clone()),
                    reference: args.reference.unwrap_or_else(|| current.reference.clone()),
                },
            };
            render_action("Updated", &client::update_client(ctx, &current.id, input).await?, json)
        }
        ClientCommands::Delete(args) => {
            render_action("Deleted", &client::delete_client(ctx, &args.reference).await?, json)
        }
    }
}

async fn run_receipt(ctx: &AppContext, command: ReceiptCommands, json: bool) -> Result<String, ApiError> {
    match command {
        ReceiptCommands::List(args) => {
            render(&receipt::list_receipts(ctx, args.client.as_deref()).await?, json)
        }
        ReceiptCommands::Show(args) => render(&receipt::get_receipt(ctx, &args.id).await?, json),
        ReceiptCommands::Add(args) => {
            let owner = client::get_client(ctx, &args.client).await?;
            let input = ReceiptInput {
                client_id: owner.id,
                folio: args.folio,
                date: args.date,
                notes: args.notes,
            };
            render_action("Created", &receipt::create_receipt(ctx, input).await?, json)
        }
        ReceiptCommands::Edit(args) => {
            let current = receipt::get_receipt(ctx, &args.id).await?.receipt;
            let updated = receipt::update_receipt(
                ctx,
                &current.id,
                args.folio.as_deref().unwrap_or(&current.folio),
                args.date.unwrap_or(current.date),
                args.notes.as_deref().unwrap_or(&current.notes),
            )
            .await?;
            render_action("Updated", &updated, json)
        }
        ReceiptCommands::Attach(args) => render_action(
            "Attached",
            &receipt::attach_evidence(ctx, &args.id, &args.file).await?,
            json,
        ),
        ReceiptCommands::Delete(args) => {
            render_action("Deleted", &receipt::delete_receipt(ctx, &args.id).await?, json)
        }
    }
}

async fn run_sale(ctx: &AppContext, command: SaleCommands, json: bool) -> Result<String, ApiError> {
    match command {
        SaleCommands::List(args) => render(
            &sale::list_sales(ctx, args.client.as_deref(), args.product.as_deref()).await?,
            json,
        ),
        SaleCommands::Show(args) => render(&sale::get_sale(ctx, &args.id).await?, json),
        SaleCommands::Open(args) => render(&sale::open_sale(ctx, &args.receipt).await?, json),
        SaleCommands::Edit(args) => {
            let current = sale::get_sale(ctx, &args.id).await?.sale;
            let header = SaleHeaderInput {
                date: args.date.unwrap_or(current.date),
                discount: args.discount.unwrap_or_else(|| current.discount()),
                tax: args.tax.unwrap_or_else(|| current.tax()),
            };
            render_action(
                "Updated",
                &sale::update_sale_header(ctx, &current.id, header).await?,
                json,
            )
        }
        SaleCommands::AddLine(args) => {
            let new_line = NewSaleLine {
                product: args.product,
                unit: args.unit,
                quantity: args.quantity,
                unit_price: args.price,
            };
            render_action("Added", &sale::add_line(ctx, &args.sale, new_line).await?, json)
        }
        SaleCommands::EditLine(args) => {
            let change = SaleLineChange {
                product: args.product,
                unit: args.unit,
                quantity: args.quantity,
                unit_price: args.price,
            };
            render_action("Updated", &sale::edit_line(ctx, &args.line, change).await?, json)
        }
        SaleCommands::RemoveLine(args) => {
            render_action("Removed line", &sale::remove_line(ctx, &args.line).await?, json)
        }
        SaleCommands::Delete(args) => {
            render_action("Deleted", &sale::delete_sale(ctx, &args.id).await?, json)
        }
    }
}

async fn run_import(ctx: &AppContext, command: ImportCommands, json: bool) -> Result<String, ApiError> {
    match command {
        ImportCommands::Products(args) => render_action(
            "Products",
            &import::import_product_file(ctx, &args.file, args.sheet.as_deref()).await?,
            json,
        ),
        ImportCommands::Clients(args) => render_action(
            "Clients",
            &import::import_client_file(ctx, &args.file, args.sheet.as_deref()).await?,
            json,
        ),
        ImportCommands::Receipts(args) => render_action(
            "Receipts",
            &import::import_receipt_file(ctx, &args.file, args.sheet.as_deref()).await?,
            json,
        ),
    }
}
