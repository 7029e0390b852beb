//! # Register Error Type
//!
//! Everything that can end a register action.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Register                           │
//! │                                                                         │
//! │  camera::CameraError ──────┐                                           │
//! │  scanpay_client::ClientError ──► RegisterError ──► StatusLine (Error)  │
//! │  scanpay_core::CoreError ──┘                                           │
//! │                                                                         │
//! │  Every error is terminal for the action that raised it. Nothing is     │
//! │  retried; the cashier decides what to do next.                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use scanpay_client::ClientError;
use scanpay_core::CoreError;
use thiserror::Error;

use crate::camera::CameraError;

/// Errors surfaced to the cashier.
#[derive(Debug, Error)]
pub enum RegisterError {
    /// The operator or OS refused access to the capture device.
    #[error("Camera access denied: {0}")]
    CameraAccessDenied(String),

    /// No capture device could be opened.
    #[error("No camera available: {0}")]
    CameraUnavailable(String),

    /// The decoder could not be started on the acquired device.
    #[error("Scanner init error: {0}")]
    DecoderInitFailed(String),

    /// The catalog could not answer a lookup.
    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(String),

    /// The barcode is not in the catalog. Registration has been queued.
    #[error("Unknown product {0}, queued for registration")]
    ProductNotFound(String),

    /// Checkout was requested with nothing in the cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// The server did not accept the checkout. The cart is untouched.
    #[error("Checkout failed: {0}")]
    CheckoutFailed(String),

    /// The catalog server address is unknown.
    #[error("Server discovery failed: {0}")]
    ServerDiscoveryFailed(String),

    /// A cart limit was hit.
    #[error(transparent)]
    Cart(#[from] CoreError),

    /// Configuration could not be loaded, parsed or saved.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The coordinator task is gone.
    #[error("Channel error: {0}")]
    ChannelError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for register operations.
pub type RegisterResult<T> = Result<T, RegisterError>;

impl From<ClientError> for RegisterError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::ServerDiscoveryFailed(reason) => {
                RegisterError::ServerDiscoveryFailed(reason)
            }
            ClientError::CatalogUnavailable(reason) => RegisterError::CatalogUnavailable(reason),
            ClientError::CheckoutFailed(reason) => RegisterError::CheckoutFailed(reason),
            ClientError::InvalidUrl { url, reason } => {
                RegisterError::ServerDiscoveryFailed(format!("invalid URL '{}': {}", url, reason))
            }
        }
    }
}

impl From<CameraError> for RegisterError {
    fn from(err: CameraError) -> Self {
        match err {
            CameraError::AccessDenied(reason) => RegisterError::CameraAccessDenied(reason),
            CameraError::Unavailable(reason) => RegisterError::CameraUnavailable(reason),
            CameraError::DecoderInit(reason) => RegisterError::DecoderInitFailed(reason),
        }
    }
}

impl From<toml::de::Error> for RegisterError {
    fn from(err: toml::de::Error) -> Self {
        RegisterError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for RegisterError {
    fn from(err: toml::ser::Error) -> Self {
        RegisterError::Config(err.to_string())
    }
}
