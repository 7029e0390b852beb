//! # Register State
//!
//! State owned by the register coordinator task.
//!
//! - [`scan`] - Camera Session Manager (Idle / Scanning)
//! - [`config`] - Register configuration (TOML + environment)

pub mod config;
pub mod scan;

pub use config::{DisplaySettings, RegisterConfig, ScannerSettings};
pub use scan::{ScanSignal, ScanState, SessionManager, StartOutcome};
