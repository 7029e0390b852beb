//! # scanpay-catalog-server: Catalog HTTP API
//!
//! Owns the product catalog and the checkout ledger, and answers the
//! register's lookup, registration and checkout calls.
//!
//! ## Routes
//! ```text
//! GET    /health                         "OK"
//! GET    /api/server-ip                  { ip }
//! POST   /api/products                   register a product (unknown scans land here)
//! GET    /api/products                   list (?pending=true: awaiting a price)
//! GET    /api/products/barcode/{code}    lookup
//! PUT    /api/products/{id}              curate
//! DELETE /api/products/{id}
//! POST   /api/transaction                checkout → payment QR
//! GET    /api/transactions               ledger, newest first (?limit=n)
//! ```
//!
//! Every error body is `{"error": "..."}`.

pub mod config;
pub mod error;
pub mod qr;
pub mod routes;

use std::net::IpAddr;

use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::Router;
use scanpay_db::Database;

pub use config::{ConfigError, ServerConfig};
pub use error::{ApiError, ApiResult};

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    /// Overrides IP detection for `GET /api/server-ip`.
    pub advertise_ip: Option<IpAddr>,
}

impl AppState {
    pub fn new(db: Database, advertise_ip: Option<IpAddr>) -> Self {
        AppState { db, advertise_ip }
    }
}

/// Builds the catalog router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/server-ip", get(routes::network::server_ip))
        .route(
            "/api/products",
            post(routes::products::create_product).get(routes::products::list_products),
        )
        .route(
            "/api/products/barcode/{barcode}",
            get(routes::products::get_by_barcode),
        )
        .route(
            "/api/products/{id}",
            put(routes::products::update_product).delete(routes::products::delete_product),
        )
        .route(
            "/api/transaction",
            post(routes::transactions::record_transaction),
        )
        .route(
            "/api/transactions",
            get(routes::transactions::list_transactions),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_handler() -> impl IntoResponse {
    "OK"
}
