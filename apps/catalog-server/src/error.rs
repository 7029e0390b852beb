//! Error types for the catalog server.
//!
//! Every failure leaves the server as `{"error": "..."}` with a status code.
//!
//! ```text
//! DbError::UniqueViolation             → 409 Product exists
//! DbError::NotFound                    → 404 Product not found
//! DbError::Rejected(stock / unknown)   → 400 Insufficient stock or invalid product: <barcode>
//! CoreError::Validation                → 400 <field message>
//! JsonRejection                        → 400 <reason>
//! anything else                        → 500 (logged)
//! ```

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use scanpay_core::{CoreError, ErrorBody};
use scanpay_db::DbError;
use thiserror::Error;
use tracing::error;

/// An HTTP error response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{status}: {message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        ApiError {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::UniqueViolation { .. } => Self::new(StatusCode::CONFLICT, "Product exists"),
            DbError::NotFound { entity, .. } => Self::not_found(format!("{} not found", entity)),
            DbError::Rejected(core) => core.into(),
            other => {
                error!(error = %other, "Database error");
                Self::internal(other.to_string())
            }
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(barcode)
            | CoreError::InsufficientStock { barcode, .. } => Self::bad_request(format!(
                "Insufficient stock or invalid product: {}",
                barcode
            )),
            CoreError::Validation(validation) => Self::bad_request(validation.to_string()),
            other => Self::bad_request(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanpay_core::ValidationError;

    #[test]
    fn test_db_error_status() {
        assert_eq!(
            ApiError::from(DbError::duplicate("barcode", "5012345678900")).status,
            StatusCode::CONFLICT
        );

        let missing = ApiError::from(DbError::not_found("Product", 7));
        assert_eq!(missing.status, StatusCode::NOT_FOUND);
        assert_eq!(missing.message, "Product not found");

        assert_eq!(
            ApiError::from(DbError::QueryFailed("disk I/O error".into())).status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_rejected_checkout_names_barcode() {
        let err = ApiError::from(DbError::Rejected(CoreError::InsufficientStock {
            barcode: "5012345678900".to_string(),
            available: 1,
            requested: 3,
        }));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            err.message,
            "Insufficient stock or invalid product: 5012345678900"
        );
    }

    #[test]
    fn test_validation_message_is_unwrapped() {
        let err = ApiError::from(CoreError::from(ValidationError::Required {
            field: "barcode".to_string(),
        }));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "barcode is required");
    }
}
