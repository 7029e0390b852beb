//! Catalog server configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//!
//! | Variable               | Default          |
//! |------------------------|------------------|
//! | `SCANPAY_BIND`         | `0.0.0.0:5000`   |
//! | `SCANPAY_DB_PATH`      | `scanpay.db`     |
//! | `SCANPAY_ADVERTISE_IP` | detected         |

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use thiserror::Error;

pub const DEFAULT_BIND: &str = "0.0.0.0:5000";
pub const DEFAULT_DB_PATH: &str = "scanpay.db";

/// Catalog server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address the HTTP server listens on
    pub bind: SocketAddr,

    /// SQLite database file
    pub database_path: PathBuf,

    /// IP returned by `GET /api/server-ip`; detected from the outbound
    /// interface when unset
    pub advertise_ip: Option<IpAddr>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: SocketAddr::from(([0, 0, 0, 0], 5000)),
            database_path: PathBuf::from(DEFAULT_DB_PATH),
            advertise_ip: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind = lookup("SCANPAY_BIND")
            .unwrap_or_else(|| DEFAULT_BIND.to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("SCANPAY_BIND".to_string()))?;

        let database_path = lookup("SCANPAY_DB_PATH")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));

        let advertise_ip = match lookup("SCANPAY_ADVERTISE_IP") {
            Some(ip) if !ip.trim().is_empty() => Some(
                ip.trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("SCANPAY_ADVERTISE_IP".to_string()))?,
            ),
            _ => None,
        };

        Ok(ServerConfig {
            bind,
            database_path,
            advertise_ip,
        })
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
