//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Classifies constraint violations              │
//! │       │                                                                 │
//! │       ├── UniqueViolation intercepted by the engine for                │
//! │       │   idempotent-replay resolution                                 │
//! │       ▼                                                                 │
//! │  BillingError::Server ← everything else, generic to the caller         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Database operation errors.
///
/// These wrap sqlx errors and classify SQLite constraint failures so the
/// engine can tell an idempotency race apart from a broken query.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation. `constraint` is the
    /// `<table>.<column>` list SQLite reports, e.g.
    /// `bills.tenant_id, bills.bill_number`.
    #[error("unique constraint violated on {constraint}")]
    UniqueViolation { constraint: String },

    /// CHECK constraint violation (e.g. a batch quantity below zero).
    #[error("check constraint violated: {message}")]
    CheckViolation { message: String },

    /// Foreign key constraint violation.
    #[error("foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// A write-once trigger aborted the statement.
    #[error("write-once violation: {message}")]
    WriteOnceViolation { message: String },

    /// Database connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// True for unique-constraint violations, the signal the engine turns
    /// into idempotent-replay resolution.
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DbError::UniqueViolation { .. })
    }
}

/// Convert sqlx errors to DbError.
///
/// SQLite reports constraint failures only through its message text:
/// ```text
/// UNIQUE constraint failed: bills.tenant_id, bills.bill_number
/// CHECK constraint failed: quantity >= 0
/// FOREIGN KEY constraint failed
/// ```
/// Trigger aborts arrive as plain database errors carrying the RAISE
/// message, which all our write-once triggers word as "... immutable",
/// "... write-once", or "... frozen".
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message().to_string();

                if let Some(constraint) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    DbError::UniqueViolation {
                        constraint: constraint.to_string(),
                    }
                } else if msg.starts_with("CHECK constraint failed") {
                    DbError::CheckViolation { message: msg }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation { message: msg }
                } else if msg.contains("immutable")
                    || msg.contains("write-once")
                    || msg.contains("frozen")
                    || msg.contains("cannot be deleted")
                {
                    DbError::WriteOnceViolation { message: msg }
                } else {
                    DbError::QueryFailed(msg)
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Storage failures reach billing callers as a generic server error; the
/// engine intercepts the variants it can resolve (unique violations,
/// not-found) before this conversion runs.
impl From<DbError> for rxtill_core::BillingError {
    fn from(err: DbError) -> Self {
        rxtill_core::BillingError::Server(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation_detection() {
        let err = DbError::UniqueViolation {
            constraint: "bills.tenant_id, bills.bill_number".to_string(),
        };
        assert!(err.is_unique_violation());
        assert!(!DbError::PoolExhausted.is_unique_violation());
    }
}
