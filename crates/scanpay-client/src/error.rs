//! # Client Error Types

use thiserror::Error;

/// Errors from calls to the catalog server.
///
/// None of these are retried. The register shows them on the status line
/// and waits for the next action.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No base URL: discovery failed at startup or was never configured.
    #[error("Could not locate the catalog server: {0}")]
    ServerDiscoveryFailed(String),

    /// Lookup failed for a reason other than "not found".
    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(String),

    /// The server did not accept the transaction.
    #[error("Checkout failed: {0}")]
    CheckoutFailed(String),

    /// A configured URL could not be parsed or extended.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
