//! # Roque CLI Library
//!
//! Command functions and the shared context they run in. `main.rs` only
//! parses arguments, builds an [`AppContext`] and prints results.
//!
//! ## Module Organization
//! ```text
//! roque_cli/
//! ├── lib.rs          ◄─── You are here (AppContext, tracing setup)
//! ├── cli.rs          ◄─── clap definitions + dispatch to commands
//! ├── config.rs       ◄─── AppConfig (defaults → file → ROQUE_* env)
//! ├── error.rs        ◄─── ApiError returned by every command
//! ├── output.rs       ◄─── text / --json rendering
//! └── commands/
//!     ├── product.rs  ◄─── Product CRUD
//!     ├── client.rs   ◄─── Client CRUD
//!     ├── receipt.rs  ◄─── Receipts + evidence
//!     ├── sale.rs     ◄─── Sales, lines, recalculation
//!     ├── search.rs   ◄─── Global search
//!     └── import.rs   ◄─── Spreadsheet imports
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Parse arguments (clap)                                              │
//! │  2. Load AppConfig                                                      │
//! │  3. Initialize logging (RUST_LOG, else config.log_filter) → stderr      │
//! │  4. Open database: WAL, foreign keys, pending migrations                │
//! │  5. Run one command → print text or JSON                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use roque_db::{Database, DbConfig, DbResult};

/// Everything a command function needs.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub db: Database,
    pub config: AppConfig,
}

impl AppContext {
    /// Opens (and migrates) the configured database.
    pub async fn open(config: AppConfig) -> DbResult<Self> {
        if let Some(parent) = config.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| roque_db::DbError::ConnectionFailed(e.to_string()))?;
            }
        }

        let db_config = DbConfig::new(&config.database_path).max_connections(config.max_connections);
        let db = Database::new(db_config).await?;
        Ok(AppContext { db, config })
    }

    /// Context over a private in-memory database (tests, dry runs).
    pub async fn in_memory(config: AppConfig) -> DbResult<Self> {
        let db = Database::new(DbConfig::in_memory()).await?;
        Ok(AppContext { db, config })
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// Logs go to stderr so that stdout carries only command output.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=roque=trace` - Show trace for roque crates only
/// - Default: `filter` (from config)
pub fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
pub(crate) mod testing {
    //! Shared setup for command tests.

    use super::*;
    use tempfile::TempDir;

    /// In-memory context whose media root lives in a temp dir.
    pub async fn context() -> (AppContext, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::with_data_dir(dir.path());
        let ctx = AppContext::in_memory(config).await.unwrap();
        (ctx, dir)
    }
}
