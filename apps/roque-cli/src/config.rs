//! # Configuration
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables: `ROQUE_DATABASE_PATH`, `ROQUE_MEDIA_ROOT`,
//!    `ROQUE_LOG_FILTER`, nested keys with `__` (`ROQUE_RECEIPTS__SHEET_NAME`)
//! 2. Config file: `--config <path>` or `$ROQUE_CONFIG` when given;
//!    otherwise `<platform config dir>/roque.toml` overlaid by
//!    `./roque.toml`, both optional
//! 3. Defaults (this file), rooted in the platform data directory
//!
//! ## Example `roque.toml`
//! ```toml
//! database_path = "/srv/roque/roque.db"
//! media_root = "/srv/roque/media"
//! max_connections = 5
//! log_filter = "info,roque=debug,sqlx=warn"
//!
//! [receipts]
//! sheet_name = "REL REM ENTREG1"
//! header_row = 5
//! first_data_row = 6
//! key_column = 3
//! name_column = 4
//! contact_column = 5
//! ```

use std::path::{Path, PathBuf};

use ::config::{Config, Environment, File};
use directories::ProjectDirs;
use roque_import::ReceiptSheetLayout;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default tracing filter when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "info,roque=debug,sqlx=warn";

const CONFIG_FILE_NAME: &str = "roque.toml";

/// Application configuration, read once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// SQLite database file.
    pub database_path: PathBuf,

    /// Root folder for receipt evidence; stored paths are relative to it.
    pub media_root: PathBuf,

    /// Pool size for the database.
    pub max_connections: u32,

    /// tracing-subscriber filter directive.
    pub log_filter: String,

    /// Where `import receipts` looks in the delivery grid.
    pub receipts: ReceiptSheetConfig,
}

/// Receipt grid layout. Rows and columns are 1-based, as a spreadsheet
/// program shows them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptSheetConfig {
    pub sheet_name: String,
    pub header_row: usize,
    pub first_data_row: usize,
    pub key_column: usize,
    pub name_column: usize,
    pub contact_column: usize,
}

impl Default for ReceiptSheetConfig {
    fn default() -> Self {
        ReceiptSheetLayout::default().into()
    }
}

impl From<ReceiptSheetLayout> for ReceiptSheetConfig {
    fn from(layout: ReceiptSheetLayout) -> Self {
        ReceiptSheetConfig {
            sheet_name: layout.sheet_name,
            header_row: layout.header_row,
            first_data_row: layout.first_data_row,
            key_column: layout.key_column,
            name_column: layout.name_column,
            contact_column: layout.contact_column,
        }
    }
}

impl ReceiptSheetConfig {
    pub fn layout(&self) -> ReceiptSheetLayout {
        ReceiptSheetLayout {
            sheet_name: self.sheet_name.clone(),
            header_row: self.header_row,
            first_data_row: self.first_data_row,
            key_column: self.key_column,
            name_column: self.name_column,
            contact_column: self.contact_column,
        }
    }
}

impl AppConfig {
    /// Defaults rooted at `data_dir`.
    pub fn with_data_dir(data_dir: &Path) -> Self {
        AppConfig {
            database_path: data_dir.join("roque.db"),
            media_root: data_dir.join("media"),
            max_connections: 5,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            receipts: ReceiptSheetConfig::default(),
        }
    }

    /// Loads defaults, then the config file, then `ROQUE_*` variables.
    ///
    /// An explicitly named file (flag or `ROQUE_CONFIG`) must exist; the
    /// implicit ones are optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let dirs = ProjectDirs::from("com", "roque", "roque").ok_or(ConfigError::NoHomeDirectory)?;
        let defaults = AppConfig::with_data_dir(dirs.data_dir());

        let explicit = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os("ROQUE_CONFIG").map(PathBuf::from));

        debug!(explicit = ?explicit, "Loading configuration");

        let mut builder = Config::builder()
            .set_default("database_path", defaults.database_path.to_string_lossy().into_owned())?
            .set_default("media_root", defaults.media_root.to_string_lossy().into_owned())?
            .set_default("max_connections", i64::from(defaults.max_connections))?
            .set_default("log_filter", defaults.log_filter)?
            .set_default("receipts.sheet_name", defaults.receipts.sheet_name)?
            .set_default("receipts.header_row", defaults.receipts.header_row as i64)?
            .set_default("receipts.first_data_row", defaults.receipts.first_data_row as i64)?
            .set_default("receipts.key_column", defaults.receipts.key_column as i64)?
            .set_default("receipts.name_column", defaults.receipts.name_column as i64)?
            .set_default("receipts.contact_column", defaults.receipts.contact_column as i64)?;

        builder = match &explicit {
            Some(path) => builder.add_source(File::from(path.as_path()).required(true)),
            None => builder
                .add_source(File::from(dirs.config_dir().join(CONFIG_FILE_NAME)).required(false))
                .add_source(File::from(PathBuf::from(CONFIG_FILE_NAME)).required(false)),
        };

        let config = builder
            .add_source(
                Environment::with_prefix("ROQUE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let app_config: AppConfig = config.try_deserialize()?;
        app_config.validate()?;
        Ok(app_config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue("database_path".to_string()));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue("max_connections".to_string()));
        }

        let receipts = &self.receipts;
        if receipts.sheet_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue("receipts.sheet_name".to_string()));
        }
        if receipts.header_row == 0 || receipts.first_data_row <= receipts.header_row {
            return Err(ConfigError::InvalidValue("receipts.first_data_row".to_string()));
        }
        if [receipts.key_column, receipts.name_column, receipts.contact_column].contains(&0) {
            return Err(ConfigError::InvalidValue("receipts columns".to_string()));
        }
        Ok(())
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine the home directory")]
    NoHomeDirectory,

    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error(transparent)]
    Load(#[from] ::config::ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(dir: &Path, lines: &[&str]) -> PathBuf {
        let path = dir.join("roque.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        path
    }

    #[test]
    fn test_defaults_rooted_in_data_dir() {
        let config = AppConfig::with_data_dir(Path::new("/data"));
        assert_eq!(config.database_path, PathBuf::from("/data/roque.db"));
        assert_eq!(config.media_root, PathBuf::from("/data/media"));
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.receipts.sheet_name, "REL REM ENTREG1");
        assert_eq!(config.receipts.layout(), ReceiptSheetLayout::default());
    }

    #[test]
    fn test_explicit_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            &[
                "media_root = \"/srv/media\"",
                "max_connections = 2",
                "[receipts]",
                "sheet_name = \"ENTREGAS\"",
                "header_row = 3",
                "first_data_row = 4",
            ],
        );

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.media_root, PathBuf::from("/srv/media"));
        assert_eq!(config.max_connections, 2);
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
        assert_eq!(config.receipts.sheet_name, "ENTREGAS");
        assert_eq!(config.receipts.header_row, 3);
        // untouched keys keep their defaults
        assert_eq!(config.receipts.key_column, 3);
    }

    #[test]
    fn test_data_row_must_follow_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), &["[receipts]", "header_row = 6", "first_data_row = 6"]);

        let err = AppConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }
}
