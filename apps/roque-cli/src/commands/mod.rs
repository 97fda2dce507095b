//! # Commands
//!
//! One async function per operation, each taking `&AppContext` and
//! returning `Result<T, ApiError>`. `cli.rs` maps subcommands onto them.
//!
//! ## Command Structure
//! ```text
//! commands/
//! ├── product.rs   ◄─── list, show, add, edit, delete
//! ├── client.rs    ◄─── list, show, add, edit, delete
//! ├── receipt.rs   ◄─── list, show, add, edit, attach (evidence), delete
//! ├── sale.rs      ◄─── list, show, open, edit, add-line, edit-line, remove-line, delete
//! ├── search.rs    ◄─── global search
//! └── import.rs    ◄─── products, clients, receipts spreadsheets
//! ```

pub mod client;
pub mod import;
pub mod product;
pub mod receipt;
pub mod sale;
pub mod search;
