//! # scanpay-db: Catalog Storage for ScanPay
//!
//! SQLite access for the catalog server: products, checkouts and the
//! per-line transaction ledger.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Catalog Server Data Flow                           │
//! │                                                                         │
//! │  axum handler (POST /api/transaction)                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   scanpay-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌───────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │   │  Migrations   │  │   │
//! │  │   │   (pool.rs)   │    │                │   │  (embedded)   │  │   │
//! │  │   │               │    │ ProductRepo    │   │               │  │   │
//! │  │   │ SqlitePool    │◄───│ LedgerRepo     │   │ 001_catalog   │  │   │
//! │  │   └───────────────┘    └────────────────┘   └───────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   ./scanpay.db (or SCANPAY_DB_PATH)                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! use scanpay_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./catalog.db")).await?;
//! let tea = db.products().get_by_barcode("5012345678900").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig, Location};

pub use repository::ledger::{LedgerRepository, RecordedCheckout};
pub use repository::product::{ProductFilter, ProductRepository};
