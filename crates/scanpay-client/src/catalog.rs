//! # Catalog Client
//!
//! Barcode lookup and registration of unknown barcodes.
//!
//! ## Lookup Outcomes
//! ```text
//! GET {base}/api/products/barcode/{code}
//!      │
//!      ├── 2xx + product body ────────────► Lookup::Found(ProductInfo)
//!      ├── 2xx + { "error": … } ──────────► Lookup::NotFound
//!      ├── 404 ───────────────────────────► Lookup::NotFound
//!      └── other status / transport /
//!          unreadable body ───────────────► ClientError::CatalogUnavailable
//! ```
//!
//! `NotFound` is not an error. The caller registers the barcode with
//! [`CatalogClient::register_unknown`], which runs detached; nothing about
//! its outcome ever reaches the caller.

use std::sync::Arc;

use reqwest::StatusCode;
use scanpay_core::{ProductInfo, RegisterProduct};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::discovery::BaseUrl;
use crate::error::{ClientError, ClientResult};

/// Result of a barcode lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Found(ProductInfo),
    NotFound,
}

/// Client for the catalog endpoints.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    base: Arc<BaseUrl>,
}

impl CatalogClient {
    pub fn new(http: reqwest::Client, base: Arc<BaseUrl>) -> Self {
        CatalogClient { http, base }
    }

    /// Looks a barcode up. Single attempt.
    pub async fn lookup(&self, barcode: &str) -> ClientResult<Lookup> {
        let url = self.base.endpoint(&["api", "products", "barcode", barcode])?;
        debug!(barcode, url = %url, "Catalog lookup");

        let unavailable = |reason: String| ClientError::CatalogUnavailable(reason);

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(Lookup::NotFound);
        }
        if !status.is_success() {
            return Err(unavailable(format!("lookup returned {}", status)));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| unavailable(format!("unreadable lookup body: {}", e)))?;

        if body.get("error").is_some() {
            return Ok(Lookup::NotFound);
        }

        serde_json::from_value(body)
            .map(Lookup::Found)
            .map_err(|e| unavailable(format!("unexpected product shape: {}", e)))
    }

    /// Asks the server to create a pending product for `barcode`.
    ///
    /// Returns immediately. The request runs on a detached task that only
    /// logs its outcome; the handle is returned for tests and may be dropped.
    pub fn register_unknown(&self, barcode: &str) -> ClientResult<JoinHandle<()>> {
        let url = self.base.endpoint(&["api", "products"])?;
        let http = self.http.clone();
        let body = RegisterProduct {
            barcode: barcode.to_string(),
        };

        Ok(tokio::spawn(async move {
            match http.post(url).json(&body).send().await {
                Ok(response) => debug!(
                    barcode = %body.barcode,
                    status = %response.status(),
                    "Unknown barcode registration sent"
                ),
                Err(e) => warn!(
                    barcode = %body.barcode,
                    error = %e,
                    "Unknown barcode registration failed"
                ),
            }
        }))
    }
}
