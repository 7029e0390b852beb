//! # Database Error Types
//!
//! ```text
//! sqlx::Error ─────────────┐
//! MigrateError ────────────┼──► DbError ──► ApiError (catalog server)
//! CoreError (checkout) ────┘                  { "error": "..." } + status
//! ```

use scanpay_core::CoreError;
use sqlx::error::ErrorKind;
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A barcode registered twice.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// A row broke a `CHECK`, `NOT NULL` or foreign key constraint.
    #[error("Constraint violated: {0}")]
    ConstraintViolation(String),

    /// A checkout line was refused (unknown product, pending product or
    /// insufficient stock). The transaction was rolled back.
    #[error(transparent)]
    Rejected(#[from] CoreError),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Every connection stayed busy past the acquire timeout.
    #[error("Catalog database is busy")]
    Busy,

    #[error("Query failed: {0}")]
    QueryFailed(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                match db_err.kind() {
                    // SQLite: "UNIQUE constraint failed: products.barcode"
                    ErrorKind::UniqueViolation => {
                        let field = message
                            .rsplit(": ")
                            .next()
                            .and_then(|column| column.rsplit('.').next())
                            .unwrap_or("value")
                            .to_string();
                        DbError::UniqueViolation {
                            field,
                            value: String::new(),
                        }
                    }
                    ErrorKind::ForeignKeyViolation
                    | ErrorKind::NotNullViolation
                    | ErrorKind::CheckViolation => DbError::ConstraintViolation(message),
                    _ => DbError::QueryFailed(message),
                }
            }
            sqlx::Error::RowNotFound => DbError::not_found("Row", "?"),
            sqlx::Error::PoolTimedOut => DbError::Busy,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),
            other => DbError::QueryFailed(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_is_transparent() {
        let err: DbError = CoreError::ProductNotFound("123".to_string()).into();
        assert_eq!(err.to_string(), "Product not found: 123");
    }

    #[test]
    fn test_helpers() {
        assert_eq!(
            DbError::not_found("Product", 7).to_string(),
            "Product not found: 7"
        );
        assert_eq!(
            DbError::duplicate("barcode", "123").to_string(),
            "Duplicate barcode: '123' already exists"
        );
    }

    #[test]
    fn test_pool_errors() {
        assert!(matches!(DbError::from(sqlx::Error::PoolTimedOut), DbError::Busy));
        assert!(matches!(
            DbError::from(sqlx::Error::PoolClosed),
            DbError::ConnectionFailed(_)
        ));
    }
}
