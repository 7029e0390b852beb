//! # Transaction Endpoints
//!
//! ## Checkout Flow
//! ```text
//! POST /api/transaction { items: [{barcode, quantity, ...}] }
//!      │
//!      ▼
//! CheckoutRequest::normalized()     400 if empty, merges repeated barcodes
//!      │
//!      ▼
//! ledger().record_checkout()        one SQLite transaction:
//!      │                            price, check stock, decrement, ledger rows
//!      ▼                            (400 and nothing written on any refusal)
//! payment QR "Payment: $x|TransactionID:n"
//!      │
//!      ▼
//! 201 { message, total, qr_code, transaction_id }
//! ```
//!
//! Prices sent by the register are ignored; the catalog prices every line.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use scanpay_core::{CheckoutRequest, LedgerEntry, TransactionReceipt};
use serde::Deserialize;
use tracing::{error, info};

use crate::error::{ApiError, ApiResult};
use crate::qr::payment_qr_base64;
use crate::AppState;

/// Ledger rows returned when no `limit` is given.
pub const DEFAULT_HISTORY_LIMIT: u32 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub limit: Option<u32>,
}

pub async fn record_transaction(
    State(state): State<AppState>,
    payload: Result<Json<CheckoutRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TransactionReceipt>)> {
    let Json(request) = payload?;
    let lines = request.normalized()?;
    let recorded = state.db.ledger().record_checkout(&lines).await?;

    let qr_code = payment_qr_base64(recorded.total, recorded.transaction_id).map_err(|e| {
        error!(
            transaction_id = recorded.transaction_id,
            error = %e,
            "Checkout recorded but payment QR failed"
        );
        ApiError::internal(e.to_string())
    })?;

    info!(
        transaction_id = recorded.transaction_id,
        total = %recorded.total,
        lines = recorded.entries.len(),
        "Transaction recorded"
    );

    Ok((
        StatusCode::CREATED,
        Json(TransactionReceipt {
            message: Some("Transaction recorded".to_string()),
            total: recorded.total,
            qr_code,
            transaction_id: Some(recorded.transaction_id),
        }),
    ))
}

pub async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<Vec<LedgerEntry>>> {
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    let entries = state.db.ledger().list_recent(limit).await?;
    Ok(Json(entries))
}

#[cfg(test)]
mod tests {
    use crate::test_support::spawn_app;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use reqwest::StatusCode;
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_checkout_prices_from_catalog() {
        let app = spawn_app().await;
        let tea = app.seed("5012345678900", "Tea 80 bags", 349, 5).await;
        app.seed("036000291452", "Milk 1L", 120, 5).await;

        // The register's price is ignored, repeated barcodes are merged
        let response = app
            .client
            .post(app.url("/api/transaction"))
            .json(&json!({"items": [
                {"barcode": "5012345678900", "name": "Tea", "price": 0.01, "quantity": 1},
                {"barcode": "036000291452", "name": "Milk", "price": 1.2, "quantity": 1},
                {"barcode": "5012345678900", "name": "Tea", "price": 0.01, "quantity": 1}
            ]}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let receipt: Value = response.json().await.unwrap();
        assert_eq!(receipt["message"], "Transaction recorded");
        assert_eq!(receipt["total"], json!(8.18));
        let png = STANDARD
            .decode(receipt["qr_code"].as_str().unwrap())
            .unwrap();
        assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
        assert!(receipt["transaction_id"].is_i64());

        let tea = app.db.products().get_by_id(tea.id).await.unwrap().unwrap();
        assert_eq!(tea.stock, 3);

        let history: Vec<Value> = app
            .client
            .get(app.url("/api/transactions"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
        assert!(history
            .iter()
            .all(|row| row["transaction_id"] == receipt["transaction_id"]));
    }

    #[tokio::test]
    async fn test_insufficient_stock_changes_nothing() {
        let app = spawn_app().await;
        let tea = app.seed("5012345678900", "Tea 80 bags", 349, 5).await;
        let milk = app.seed("036000291452", "Milk 1L", 120, 1).await;

        let response = app
            .client
            .post(app.url("/api/transaction"))
            .json(&json!({"items": [
                {"barcode": "5012345678900", "quantity": 2},
                {"barcode": "036000291452", "quantity": 2}
            ]}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = response.json().await.unwrap();
        assert_eq!(
            body["error"],
            "Insufficient stock or invalid product: 036000291452"
        );

        let products = app.db.products();
        assert_eq!(products.get_by_id(tea.id).await.unwrap().unwrap().stock, 5);
        assert_eq!(products.get_by_id(milk.id).await.unwrap().unwrap().stock, 1);
        assert!(app.db.ledger().list_recent(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_and_empty_checkouts() {
        let app = spawn_app().await;

        let unknown = app
            .client
            .post(app.url("/api/transaction"))
            .json(&json!({"items": [{"barcode": "4006381333931", "quantity": 1}]}))
            .send()
            .await
            .unwrap();
        assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);

        let empty = app
            .client
            .post(app.url("/api/transaction"))
            .json(&json!({"items": []}))
            .send()
            .await
            .unwrap();
        assert_eq!(empty.status(), StatusCode::BAD_REQUEST);

        let missing = app
            .client
            .post(app.url("/api/transaction"))
            .json(&json!({}))
            .send()
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    }
}
