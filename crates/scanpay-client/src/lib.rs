//! # scanpay-client: Catalog HTTP Client
//!
//! The register's only window onto the network.
//!
//! ## Usage
//! ```rust,ignore
//! use scanpay_client::{ApiClient, ClientConfig, Lookup};
//!
//! let api = ApiClient::connect(&ClientConfig::with_origin("https://192.168.1.20:5000")).await;
//! match api.catalog().lookup("5012345678900").await? {
//!     Lookup::Found(info) => println!("{} {}", info.name, info.sell_price),
//!     Lookup::NotFound => { api.catalog().register_unknown("5012345678900")?; }
//! }
//! ```

pub mod catalog;
pub mod checkout;
pub mod config;
pub mod discovery;
pub mod error;

pub use catalog::{CatalogClient, Lookup};
pub use checkout::CheckoutClient;
pub use config::ClientConfig;
pub use discovery::BaseUrl;
pub use error::{ClientError, ClientResult};

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

/// Catalog and checkout clients sharing one HTTP pool and one base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base: Arc<BaseUrl>,
    catalog: CatalogClient,
    checkout: CheckoutClient,
}

impl ApiClient {
    /// Builds the HTTP client and resolves the base URL.
    ///
    /// Never fails. A failed discovery is kept and reported by every later
    /// call as `ServerDiscoveryFailed`.
    pub async fn connect(config: &ClientConfig) -> Self {
        let http = build_http(config);
        let base = discovery::resolve(&http, config).await;
        Self::with_base(http, base)
    }

    /// Wraps an already resolved (or unresolved) base.
    pub fn with_base(http: reqwest::Client, base: BaseUrl) -> Self {
        let base = Arc::new(base);
        ApiClient {
            catalog: CatalogClient::new(http.clone(), base.clone()),
            checkout: CheckoutClient::new(http, base.clone()),
            base,
        }
    }

    pub fn base(&self) -> &BaseUrl {
        &self.base
    }

    pub fn catalog(&self) -> &CatalogClient {
        &self.catalog
    }

    pub fn checkout(&self) -> &CheckoutClient {
        &self.checkout
    }
}

fn build_http(config: &ClientConfig) -> reqwest::Client {
    let mut builder = reqwest::Client::builder().danger_accept_invalid_certs(config.accept_invalid_certs);
    if let Some(secs) = config.request_timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }

    builder.build().unwrap_or_else(|e| {
        warn!(error = %e, "Falling back to default HTTP client");
        reqwest::Client::new()
    })
}
