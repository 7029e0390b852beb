//! # Repository Module
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  axum handler                                                           │
//! │       │  db.products().get_by_barcode("501…")                           │
//! │       ▼                                                                 │
//! │  ProductRepository                    LedgerRepository                  │
//! │  ├── list(pending_only)               ├── record_checkout(lines)        │
//! │  ├── get_by_id / get_by_barcode       └── list_recent(limit)            │
//! │  ├── insert(draft)                                                      │
//! │  ├── update(id, update)                                                 │
//! │  └── delete(id)                                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (products, checkouts, transactions)                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod ledger;
pub mod product;
