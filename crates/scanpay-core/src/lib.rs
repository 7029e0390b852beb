//! # scanpay-core: Pure Business Logic for ScanPay
//!
//! Everything the register and the catalog server agree on lives here:
//! money, the wire types of the catalog API, barcode heuristics and the
//! Cart Store. Nothing in this crate performs I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        ScanPay Architecture                             │
//! │                                                                         │
//! │  ┌────────────────────────────┐        ┌─────────────────────────────┐ │
//! │  │   register (scanner app)   │  HTTP  │  catalog-server (axum)      │ │
//! │  │   Camera Session Manager   │───────►│  /api/products/...          │ │
//! │  │   Register coordinator     │        │  /api/transaction           │ │
//! │  └─────────────┬──────────────┘        └──────────────┬──────────────┘ │
//! │                │                                      │                 │
//! │  ┌─────────────▼──────────────────────────────────────▼──────────────┐ │
//! │  │               ★ scanpay-core (THIS CRATE) ★                       │ │
//! │  │                                                                   │ │
//! │  │   ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌──────────────────┐ │ │
//! │  │   │  money   │  │  cart    │  │ barcode  │  │ types/validation │ │ │
//! │  │   │  Money   │  │  Cart    │  │ Format   │  │ LineItem, ...    │ │ │
//! │  │   └──────────┘  └──────────┘  └──────────┘  └──────────────────┘ │ │
//! │  │                                                                   │ │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS              │ │
//! │  └───────────────────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money type with integer arithmetic (decimal only at the edge)
//! - [`types`] - Wire and domain types (LineItem, ProductInfo, receipts)
//! - [`barcode`] - Symbology inference and barcode field heuristics
//! - [`cart`] - The Cart Store
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation rules
//!
//! ## Example Usage
//!
//! ```rust
//! use scanpay_core::{Cart, Money};
//!
//! let mut cart = Cart::new();
//! cart.add_or_increment("5012345678900", "Tea 80 bags", Money::from_cents(349)).unwrap();
//! cart.add_or_increment("5012345678900", "Tea 80 bags", Money::from_cents(349)).unwrap();
//!
//! assert_eq!(cart.len(), 1);
//! assert_eq!(cart.total(), Money::from_cents(698));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod barcode;
pub mod cart;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use barcode::{BarcodeFormat, BarcodeInfo};
pub use cart::{Cart, CartTotals};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart.
///
/// ## Business Reason
/// Prevents runaway carts from a scanner stuck in a loop.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single line.
///
/// ## Business Reason
/// Guards against a held trigger or a repeating line device.
pub const MAX_LINE_QUANTITY: u32 = 999;

/// Maximum accepted barcode length (Code 128 payloads can be long).
pub const MAX_BARCODE_LEN: usize = 64;

/// Stock below this is reported as running low.
pub const LOW_STOCK_THRESHOLD: i64 = 5;
