//! # API Error Type
//!
//! Unified error type for every command function.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in roque                                  │
//! │                                                                         │
//! │  Command Function  → Result<T, ApiError>                                │
//! │         │                                                               │
//! │         ├── ValidationError / CoreError::Validation → VALIDATION_ERROR  │
//! │         ├── *NotFound / DbError::NotFound           → NOT_FOUND         │
//! │         ├── DbError::InUse / UniqueViolation / FK   → CONFLICT          │
//! │         ├── EvidenceAlreadyAttached / duplicate line→ CONFLICT          │
//! │         ├── ImportError (sheet, date row, file)     → IMPORT_ERROR      │
//! │         ├── other DbError (logged)                  → DATABASE_ERROR    │
//! │         └── anything else (logged)                  → INTERNAL          │
//! │                                                                         │
//! │  main prints `message` (or the JSON form with --json) and exits 1.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## JSON Form
//! ```json
//! { "code": "IMPORT_ERROR", "message": "Sheet 'REL REM ENTREG1' not found (available: Hoja1)" }
//! ```

use roque_core::{CoreError, ValidationError};
use roque_db::DbError;
use roque_import::ImportError;
use serde::Serialize;

/// Error returned from command functions.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

/// Error codes for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found
    NotFound,

    /// Input validation failed
    ValidationError,

    /// Duplicate key, entity still referenced, evidence already attached
    Conflict,

    /// Spreadsheet could not be imported; nothing was written
    ImportError,

    /// Database operation failed
    DatabaseError,

    /// Internal error
    Internal,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Conflict, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => {
                ApiError::conflict(format!("{} '{}' already exists", field, value))
            }
            DbError::InUse { .. } => ApiError::conflict(err.to_string()),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::conflict("Invalid reference")
            }
            DbError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::Domain(e) => e.into(),
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ClientNotFound(id) => ApiError::not_found("Client", &id),
            CoreError::ProductNotFound(id) => ApiError::not_found("Product", &id),
            CoreError::ReceiptNotFound(id) => ApiError::not_found("Receipt", &id),
            CoreError::SaleNotFound(id) => ApiError::not_found("Sale", &id),
            CoreError::SaleLineNotFound(id) => ApiError::not_found("Sale line", &id),
            CoreError::EvidenceAlreadyAttached { .. } | CoreError::DuplicateSaleLine { .. } => {
                ApiError::conflict(err.to_string())
            }
            CoreError::AmountOutOfRange { .. } => ApiError::validation(err.to_string()),
            CoreError::Validation(e) => e.into(),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

/// Structural import failures name the sheet or row; repository failures
/// keep their database mapping.
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::Db(e) => e.into(),
            other => ApiError::new(ErrorCode::ImportError, other.to_string()),
        }
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        tracing::error!("I/O error: {}", err);
        ApiError::internal(format!("File operation failed: {}", err))
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_use_is_conflict() {
        let err: ApiError = DbError::in_use("Client", "P-1", "2 receipt(s)").into();
        assert_eq!(err.code, ErrorCode::Conflict);
        assert!(err.message.contains("P-1"));
    }

    #[test]
    fn test_out_of_range_total_is_validation() {
        let core = CoreError::AmountOutOfRange {
            field: "total".to_string(),
            limit: roque_core::Money::MAX_AMOUNT,
        };
        let err: ApiError = DbError::from(core).into();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(err.message.contains("total"));
    }

    #[test]
    fn test_import_errors_name_the_problem() {
        let err: ApiError = ImportError::NoDateColumns { row: 5 }.into();
        assert_eq!(err.code, ErrorCode::ImportError);
        assert!(err.message.contains("row 5"));

        let err: ApiError = ImportError::Db(DbError::not_found("Client", "x")).into();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[test]
    fn test_serialized_code() {
        let err = ApiError::new(ErrorCode::ImportError, "boom");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "IMPORT_ERROR");
        assert_eq!(json["message"], "boom");
    }
}
