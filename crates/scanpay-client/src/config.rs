//! # Client Configuration
//!
//! How the register finds and talks to the catalog server. Embedded as the
//! `[server]` section of the register's config file.
//!
//! ```toml
//! [server]
//! origin = "https://192.168.1.20:5000"   # where the scanner page was served
//! # server_url = "https://catalog.local:5000"  # skips discovery when set
//! scheme = "https"
//! port = 5000
//! accept_invalid_certs = true
//! ```

use serde::{Deserialize, Serialize};

/// Catalog server connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Origin queried for `GET /api/server-ip`.
    #[serde(default)]
    pub origin: Option<String>,

    /// Fixed base URL. When set, discovery is skipped.
    #[serde(default)]
    pub server_url: Option<String>,

    /// Scheme of the discovered base URL.
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Port of the discovered base URL.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Accept self-signed certificates (LAN deployments).
    #[serde(default)]
    pub accept_invalid_certs: bool,

    /// Per-request timeout. `None` leaves it to the transport.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_scheme() -> String {
    "https".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            origin: None,
            server_url: None,
            scheme: default_scheme(),
            port: default_port(),
            accept_invalid_certs: false,
            request_timeout_secs: None,
        }
    }
}

impl ClientConfig {
    /// Config pointing straight at a known server.
    pub fn with_server_url(url: impl Into<String>) -> Self {
        ClientConfig {
            server_url: Some(url.into()),
            ..Default::default()
        }
    }

    /// Config that discovers the server through an origin.
    pub fn with_origin(origin: impl Into<String>) -> Self {
        ClientConfig {
            origin: Some(origin.into()),
            ..Default::default()
        }
    }
}
