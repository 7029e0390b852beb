//! # Checkout Client
//!
//! Submits a cart to `POST {base}/api/transaction`.
//!
//! There is no idempotency key. If the server commits but the response is
//! lost, the caller sees `CheckoutFailed` and a retry records the sale again.

use std::sync::Arc;

use scanpay_core::{ErrorBody, LineItem, TransactionReceipt, TransactionRequest};
use tracing::{debug, info};

use crate::discovery::BaseUrl;
use crate::error::{ClientError, ClientResult};

/// Client for the transaction endpoint.
#[derive(Debug, Clone)]
pub struct CheckoutClient {
    http: reqwest::Client,
    base: Arc<BaseUrl>,
}

impl CheckoutClient {
    pub fn new(http: reqwest::Client, base: Arc<BaseUrl>) -> Self {
        CheckoutClient { http, base }
    }

    /// Submits the lines. Single attempt.
    ///
    /// ## Errors
    /// - `ServerDiscoveryFailed` without a base URL
    /// - `CheckoutFailed` on transport errors, non-2xx statuses (with the
    ///   server's `error` message when it sent one) and unreadable receipts
    pub async fn submit(&self, items: &[LineItem]) -> ClientResult<TransactionReceipt> {
        let url = self.base.endpoint(&["api", "transaction"])?;
        let request = TransactionRequest {
            items: items.to_vec(),
        };

        debug!(lines = items.len(), url = %url, "Submitting transaction");

        let failed = |reason: String| ClientError::CheckoutFailed(reason);

        let response = self
            .http
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let reason = match serde_json::from_str::<ErrorBody>(&text) {
                Ok(body) => body.error,
                Err(_) => format!("server returned {}", status),
            };
            return Err(failed(reason));
        }

        let receipt: TransactionReceipt = response
            .json()
            .await
            .map_err(|e| failed(format!("unreadable receipt: {}", e)))?;

        info!(
            total = %receipt.total,
            transaction_id = ?receipt.transaction_id,
            "Transaction accepted"
        );
        Ok(receipt)
    }
}
