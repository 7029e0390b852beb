//! # Register Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. CLI flags (highest priority, applied by main.rs)                   │
//! │     --server-url  --origin  --device                                   │
//! │                                                                         │
//! │  2. Environment Variables                                              │
//! │     SCANPAY_SERVER_URL=https://192.168.1.20:5000                       │
//! │     SCANPAY_SCANNER_DEVICE=/dev/ttyACM0                                │
//! │                                                                         │
//! │  3. TOML Config File                                                   │
//! │     ~/.config/register/register.toml (Linux)                           │
//! │     ~/Library/Application Support/com.scanpay.register/ (macOS)        │
//! │                                                                         │
//! │  4. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [server]
//! origin = "https://192.168.1.20:5000"
//! accept_invalid_certs = true
//!
//! [scanner]
//! device = "/dev/ttyACM0"
//! facing = "environment"
//!
//! [decoder]
//! readers = ["ean_reader", "code_128_reader", "upc_reader"]
//!
//! [display]
//! output_dir = "/var/lib/scanpay/payments"
//! ```

use std::path::PathBuf;

use scanpay_client::ClientConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::camera::{CaptureConstraints, DecoderConfig, FacingMode};
use crate::error::{RegisterError, RegisterResult};

// =============================================================================
// Sections
// =============================================================================

/// The `[scanner]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannerSettings {
    /// Line device to read codes from. Scanning is unavailable without one.
    #[serde(default)]
    pub device: Option<PathBuf>,

    #[serde(default)]
    pub facing: FacingMode,
}

impl ScannerSettings {
    pub fn constraints(&self) -> CaptureConstraints {
        CaptureConstraints {
            facing: self.facing,
        }
    }
}

/// The `[display]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplaySettings {
    /// Where payment QR images are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "scanpay", "register")
        .map(|dirs| dirs.data_dir().join("payments"))
        .unwrap_or_else(|| PathBuf::from("payments"))
}

impl Default for DisplaySettings {
    fn default() -> Self {
        DisplaySettings {
            output_dir: default_output_dir(),
        }
    }
}

// =============================================================================
// Register Configuration
// =============================================================================

/// Complete register configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterConfig {
    #[serde(default)]
    pub server: ClientConfig,

    #[serde(default)]
    pub scanner: ScannerSettings,

    #[serde(default)]
    pub decoder: DecoderConfig,

    #[serde(default)]
    pub display: DisplaySettings,
}

impl RegisterConfig {
    /// Loads configuration from file and environment.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (register.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> RegisterResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading register config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load register config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> RegisterResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| RegisterError::Config("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Register config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> RegisterResult<()> {
        let server = &self.server;

        for url in [&server.origin, &server.server_url].into_iter().flatten() {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(RegisterError::Config(format!(
                    "Server URLs must start with http:// or https://, got: {}",
                    url
                )));
            }
        }

        if server.scheme != "http" && server.scheme != "https" {
            return Err(RegisterError::Config(format!(
                "scheme must be http or https, got: {}",
                server.scheme
            )));
        }

        if server.port == 0 {
            return Err(RegisterError::Config("port must be greater than 0".into()));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("SCANPAY_SERVER_URL") {
            debug!(url = %url, "Overriding server URL from environment");
            self.server.server_url = Some(url);
        }

        if let Ok(origin) = std::env::var("SCANPAY_ORIGIN") {
            debug!(origin = %origin, "Overriding origin from environment");
            self.server.origin = Some(origin);
        }

        if let Ok(value) = std::env::var("SCANPAY_ACCEPT_INVALID_CERTS") {
            match value.to_lowercase().as_str() {
                "1" | "true" | "yes" => self.server.accept_invalid_certs = true,
                "0" | "false" | "no" => self.server.accept_invalid_certs = false,
                _ => warn!(value = %value, "Unknown SCANPAY_ACCEPT_INVALID_CERTS value"),
            }
        }

        if let Ok(device) = std::env::var("SCANPAY_SCANNER_DEVICE") {
            debug!(device = %device, "Overriding scanner device from environment");
            self.scanner.device = Some(PathBuf::from(device));
        }

        if let Ok(dir) = std::env::var("SCANPAY_OUTPUT_DIR") {
            self.display.output_dir = PathBuf::from(dir);
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "scanpay", "register")
            .map(|dirs| dirs.config_dir().join("register.toml"))
    }
}
