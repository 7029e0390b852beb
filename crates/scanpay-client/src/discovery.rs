//! # Server Discovery
//!
//! Resolves the catalog server's base URL once, at register startup.
//!
//! ## Resolution Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  server_url set? ──yes──► parse it ───────────────────► Resolved(url)   │
//! │       │ no                                                              │
//! │       ▼                                                                 │
//! │  origin set? ──no───────────────────────────────────► Unresolved        │
//! │       │ yes                                                             │
//! │       ▼                                                                 │
//! │  GET {origin}/api/server-ip ──► { "ip": "192.168.1.20" }                │
//! │       │                                                                 │
//! │       ├── non-2xx / transport / bad body / bad IP ──► Unresolved        │
//! │       ▼                                                                 │
//! │  {scheme}://{ip}:{port} ────────────────────────────► Resolved(url)     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Discovery is attempted once. An `Unresolved` base stays unresolved until
//! the register restarts; every call made through it fails with
//! `ServerDiscoveryFailed`.

use std::net::IpAddr;

use reqwest::Url;
use scanpay_core::ServerIp;
use tracing::{info, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// The catalog server's base address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseUrl {
    Resolved(Url),
    Unresolved { reason: String },
}

impl BaseUrl {
    pub fn is_resolved(&self) -> bool {
        matches!(self, BaseUrl::Resolved(_))
    }

    /// Builds `{base}/{segments...}`. Each segment is percent-encoded, so a
    /// barcode can never alter the path structure.
    ///
    /// ## Example
    /// ```rust
    /// use reqwest::Url;
    /// use scanpay_client::BaseUrl;
    ///
    /// let base = BaseUrl::Resolved(Url::parse("https://10.0.0.5:5000").unwrap());
    /// let url = base.endpoint(&["api", "products", "barcode", "A B"]).unwrap();
    /// assert_eq!(url.as_str(), "https://10.0.0.5:5000/api/products/barcode/A%20B");
    /// ```
    pub fn endpoint(&self, segments: &[&str]) -> ClientResult<Url> {
        let base = match self {
            BaseUrl::Resolved(url) => url,
            BaseUrl::Unresolved { reason } => {
                return Err(ClientError::ServerDiscoveryFailed(reason.clone()))
            }
        };

        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl {
                url: base.to_string(),
                reason: "cannot be a base".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

/// Resolves the base URL according to `config`. Never fails; failures are
/// captured as [`BaseUrl::Unresolved`].
pub async fn resolve(http: &reqwest::Client, config: &ClientConfig) -> BaseUrl {
    if let Some(fixed) = &config.server_url {
        return match parse_url(fixed) {
            Ok(url) => {
                info!(base = %url, "Using configured catalog server");
                BaseUrl::Resolved(url)
            }
            Err(e) => unresolved(e.to_string()),
        };
    }

    let Some(origin) = &config.origin else {
        return unresolved("no origin or server_url configured".to_string());
    };

    match discover(http, origin, &config.scheme, config.port).await {
        Ok(url) => {
            info!(base = %url, "Catalog server discovered");
            BaseUrl::Resolved(url)
        }
        Err(e) => unresolved(e.to_string()),
    }
}

fn unresolved(reason: String) -> BaseUrl {
    warn!(reason = %reason, "Catalog server discovery failed");
    BaseUrl::Unresolved { reason }
}

async fn discover(
    http: &reqwest::Client,
    origin: &str,
    scheme: &str,
    port: u16,
) -> ClientResult<Url> {
    let origin = BaseUrl::Resolved(parse_url(origin)?);
    let url = origin.endpoint(&["api", "server-ip"])?;

    let failed = |reason: String| ClientError::ServerDiscoveryFailed(reason);

    let response = http
        .get(url)
        .send()
        .await
        .map_err(|e| failed(e.to_string()))?;

    if !response.status().is_success() {
        return Err(failed(format!("server-ip returned {}", response.status())));
    }

    let body: ServerIp = response
        .json()
        .await
        .map_err(|e| failed(format!("unreadable server-ip body: {}", e)))?;

    base_from_ip(scheme, &body.ip, port)
}

/// Builds `{scheme}://{ip}:{port}` from a reported IP address.
pub fn base_from_ip(scheme: &str, ip: &str, port: u16) -> ClientResult<Url> {
    let ip: IpAddr = ip
        .trim()
        .parse()
        .map_err(|_| ClientError::ServerDiscoveryFailed(format!("invalid server ip '{}'", ip)))?;

    let host = match ip {
        IpAddr::V4(v4) => v4.to_string(),
        IpAddr::V6(v6) => format!("[{}]", v6),
    };

    parse_url(&format!("{}://{}:{}", scheme, host, port))
}

fn parse_url(raw: &str) -> ClientResult<Url> {
    Url::parse(raw).map_err(|e| ClientError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::serve;
    use axum::routing::get;
    use axum::{Json, Router};

    #[test]
    fn test_base_from_ip() {
        let url = base_from_ip("https", "192.168.1.20", 5000).unwrap();
        assert_eq!(url.as_str(), "https://192.168.1.20:5000/");

        let url = base_from_ip("http", "::1", 8080).unwrap();
        assert_eq!(url.as_str(), "http://[::1]:8080/");

        assert!(matches!(
            base_from_ip("https", "not-an-ip", 5000),
            Err(ClientError::ServerDiscoveryFailed(_))
        ));
    }

    #[test]
    fn test_unresolved_endpoint_fails() {
        let base = BaseUrl::Unresolved {
            reason: "offline".to_string(),
        };
        assert!(matches!(
            base.endpoint(&["api", "transaction"]),
            Err(ClientError::ServerDiscoveryFailed(r)) if r == "offline"
        ));
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let base = BaseUrl::Resolved(Url::parse("https://10.0.0.5:5000/").unwrap());
        let url = base.endpoint(&["api", "products", "barcode", "a?b#c"]).unwrap();
        assert_eq!(url.path(), "/api/products/barcode/a%3Fb%23c");
        assert!(url.query().is_none());
    }

    #[tokio::test]
    async fn test_discovery_from_origin() {
        let app = Router::new().route(
            "/api/server-ip",
            get(|| async { Json(serde_json::json!({"ip": "10.1.2.3"})) }),
        );
        let origin = serve(app).await;

        let config = ClientConfig::with_origin(origin.as_str());
        let base = resolve(&reqwest::Client::new(), &config).await;

        assert_eq!(
            base,
            BaseUrl::Resolved(Url::parse("https://10.1.2.3:5000").unwrap())
        );
    }

    #[tokio::test]
    async fn test_discovery_failure_is_unresolved() {
        let app = Router::new().route(
            "/api/server-ip",
            get(|| async { (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let origin = serve(app).await;

        let base = resolve(&reqwest::Client::new(), &ClientConfig::with_origin(origin.as_str())).await;
        assert!(!base.is_resolved());

        let base = resolve(&reqwest::Client::new(), &ClientConfig::default()).await;
        assert!(!base.is_resolved());
    }

    #[tokio::test]
    async fn test_server_url_skips_discovery() {
        let config = ClientConfig {
            origin: Some("http://127.0.0.1:1".to_string()),
            ..ClientConfig::with_server_url("http://catalog.local:5000")
        };
        let base = resolve(&reqwest::Client::new(), &config).await;
        assert_eq!(
            base,
            BaseUrl::Resolved(Url::parse("http://catalog.local:5000").unwrap())
        );
    }
}
