//! # roque-db: Database Layer for the Roque Back Office
//!
//! SQLite persistence for clients, products, receipts and sales.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Roque Data Flow                                  │
//! │                                                                         │
//! │  roque-cli command / roque-import importer                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     roque-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │    │  (embedded)  │  │   │
//! │  │   │               │    │ ClientRepo     │    │              │  │   │
//! │  │   │ SqlitePool    │    │ ProductRepo    │    │ 001_initial  │  │   │
//! │  │   │ acquire()     │◄───│ ReceiptRepo    │    │ _schema.sql  │  │   │
//! │  │   │ begin()       │    │ SaleRepo       │    │              │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (roque.db)                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool, connections and transactions
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use roque_db::{Database, DbConfig, ProductRepository};
//!
//! let db = Database::new(DbConfig::new("roque.db")).await?;
//!
//! let mut conn = db.acquire().await?;
//! let products = ProductRepository::new(&mut conn).search("widget").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{commit, Database, DbConfig};

// Repository re-exports for convenience
pub use repository::client::ClientRepository;
pub use repository::product::ProductRepository;
pub use repository::receipt::ReceiptRepository;
pub use repository::sale::SaleRepository;
