//! # Error Types
//!
//! Domain-specific error types for scanpay-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  scanpay-core errors (this file)                                       │
//! │  ├── CoreError        - Cart and domain rule violations                │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  scanpay-db         └── DbError        (server storage)                │
//! │  scanpay-client     └── ClientError    (HTTP calls)                    │
//! │  register           └── RegisterError  (status line shown to cashier)  │
//! │  catalog-server     └── ApiError       ({"error": "..."} responses)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Cart already holds the maximum number of distinct lines.
    #[error("Cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// A line quantity would exceed the maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: u32, max: u32 },

    /// Insufficient stock to complete a transaction.
    ///
    /// ## When This Occurs
    /// ```text
    /// POST /api/transaction  { barcode: "501…", quantity: 5 }
    ///      │
    ///      ▼
    /// stock = 3
    ///      │
    ///      ▼
    /// InsufficientStock { barcode: "501…", available: 3, requested: 5 }
    /// ```
    #[error("Insufficient stock for {barcode}: available {available}, requested {requested}")]
    InsufficientStock {
        barcode: String,
        available: i64,
        requested: i64,
    },

    /// Product is not in the catalog (or is still pending curation).
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
