//! # Camera Adapters
//!
//! The seam between the register and whatever produces barcodes.
//!
//! ## Two Halves
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  CaptureBackend::acquire(constraints) ──► Handle (the open device)      │
//! │                                              │                          │
//! │                                              ▼                          │
//! │  Decoder::start(&mut handle, config, tx) ──► DecoderSession             │
//! │                                              │                          │
//! │                                 frames ──► decode ──► tx.send(event)    │
//! │                                                                         │
//! │  Release order on stop: DecoderSession::halt(), then drop(handle)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A capture handle is released by dropping it. The session manager in
//! [`crate::state::scan`] makes sure at most one exists at a time.
//!
//! ## Backends
//! - [`line`] - scanner device, serial port or FIFO emitting one code per line

pub mod line;

#[cfg(test)]
pub(crate) mod scripted;

pub use line::{LineDecoder, LineDevice, LineDeviceBackend};

use std::fmt;

use scanpay_core::{BarcodeFormat, DecodeEvent};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

// =============================================================================
// Capture
// =============================================================================

/// Which way the camera should face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacingMode {
    /// Rear camera, pointed at the goods.
    #[default]
    Environment,
    /// Front camera, pointed at the cashier.
    User,
}

/// Constraints passed to [`CaptureBackend::acquire`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CaptureConstraints {
    pub facing: FacingMode,
}

/// Failures while opening a device or starting the decoder.
#[derive(Debug, Clone, Error)]
pub enum CameraError {
    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("no device: {0}")]
    Unavailable(String),

    #[error("decoder init failed: {0}")]
    DecoderInit(String),
}

/// An open capture stream. Dropping it releases the device.
pub trait CaptureHandle: Send + 'static {
    /// Device label for logs.
    fn label(&self) -> &str;
}

/// Opens capture devices.
pub trait CaptureBackend: Send {
    type Handle: CaptureHandle;

    fn acquire(&mut self, constraints: &CaptureConstraints) -> Result<Self::Handle, CameraError>;
}

// =============================================================================
// Decoding
// =============================================================================

/// Turns the frames of an open handle into [`DecodeEvent`]s.
pub trait Decoder<H>: Send {
    /// Starts decoding from `handle`. Events go to `events` until the
    /// returned session is halted.
    fn start(
        &mut self,
        handle: &mut H,
        config: &DecoderConfig,
        events: mpsc::Sender<DecodeEvent>,
    ) -> Result<DecoderSession, CameraError>;
}

/// A running decoder. Halting (or dropping) it stops event delivery.
#[derive(Default)]
pub struct DecoderSession {
    on_halt: Option<Box<dyn FnOnce() + Send>>,
}

impl DecoderSession {
    /// Session whose delivery ends when `on_halt` runs.
    pub fn with_release(on_halt: impl FnOnce() + Send + 'static) -> Self {
        DecoderSession {
            on_halt: Some(Box::new(on_halt)),
        }
    }

    /// Session with nothing to release (events are pushed from elsewhere).
    pub fn detached() -> Self {
        DecoderSession::default()
    }

    /// Runs the release once; later calls do nothing.
    pub fn halt(&mut self) {
        if let Some(release) = self.on_halt.take() {
            release();
        }
    }
}

impl fmt::Debug for DecoderSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoderSession")
            .field("live", &self.on_halt.is_some())
            .finish()
    }
}

impl Drop for DecoderSession {
    fn drop(&mut self) {
        self.halt();
    }
}

/// Symbology readers a decoder may enable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reader {
    #[serde(rename = "ean_reader")]
    Ean,
    #[serde(rename = "ean_8_reader")]
    Ean8,
    #[serde(rename = "upc_reader")]
    Upc,
    #[serde(rename = "upc_e_reader")]
    UpcE,
    #[serde(rename = "code_128_reader")]
    Code128,
}

impl Reader {
    /// Whether this reader produces codes of `format`.
    pub fn accepts(&self, format: BarcodeFormat) -> bool {
        matches!(
            (self, format),
            (Reader::Ean, BarcodeFormat::Ean13)
                | (Reader::Ean8, BarcodeFormat::Ean8)
                | (Reader::Upc, BarcodeFormat::UpcA)
                | (Reader::UpcE, BarcodeFormat::UpcE)
                | (Reader::Code128, BarcodeFormat::Code128)
        )
    }
}

/// Locator patch size. Larger patches find bigger barcodes faster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PatchSize {
    #[serde(rename = "x-small")]
    XSmall,
    #[serde(rename = "small")]
    Small,
    #[default]
    #[serde(rename = "medium")]
    Medium,
    #[serde(rename = "large")]
    Large,
    #[serde(rename = "x-large")]
    XLarge,
}

/// Decoder tuning. The `[decoder]` section of the register config.
///
/// ```toml
/// [decoder]
/// readers = ["ean_reader", "code_128_reader", "upc_reader"]
/// patch_size = "medium"
/// half_sample = true
/// num_workers = 2
/// locate = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderConfig {
    #[serde(default = "default_readers")]
    pub readers: Vec<Reader>,

    #[serde(default)]
    pub patch_size: PatchSize,

    #[serde(default = "default_true")]
    pub half_sample: bool,

    /// Worker threads for frame decoding. Kept low for small devices.
    #[serde(default = "default_num_workers")]
    pub num_workers: usize,

    /// Search the whole frame for a barcode instead of the center strip.
    #[serde(default = "default_true")]
    pub locate: bool,
}

fn default_readers() -> Vec<Reader> {
    vec![Reader::Ean, Reader::Code128, Reader::Upc]
}

fn default_true() -> bool {
    true
}

fn default_num_workers() -> usize {
    2
}

impl Default for DecoderConfig {
    fn default() -> Self {
        DecoderConfig {
            readers: default_readers(),
            patch_size: PatchSize::default(),
            half_sample: true,
            num_workers: default_num_workers(),
            locate: true,
        }
    }
}

impl DecoderConfig {
    /// Whether any enabled reader produces `format`.
    pub fn accepts(&self, format: BarcodeFormat) -> bool {
        self.readers.iter().any(|reader| reader.accepts(format))
    }

    /// Checks that a decoder can be started with this config.
    pub fn check(&self) -> Result<(), CameraError> {
        if self.readers.is_empty() {
            return Err(CameraError::DecoderInit("no readers enabled".to_string()));
        }
        if self.num_workers == 0 {
            return Err(CameraError::DecoderInit(
                "num_workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_readers() {
        let config = DecoderConfig::default();
        assert!(config.accepts(BarcodeFormat::Ean13));
        assert!(config.accepts(BarcodeFormat::UpcA));
        assert!(config.accepts(BarcodeFormat::Code128));
        assert!(!config.accepts(BarcodeFormat::Ean8));
        assert!(!config.accepts(BarcodeFormat::Unknown));
        assert!(config.check().is_ok());
    }

    #[test]
    fn test_decoder_config_toml() {
        let config: DecoderConfig = toml::from_str(
            r#"
            readers = ["ean_8_reader", "upc_e_reader"]
            patch_size = "x-large"
            "#,
        )
        .unwrap();
        assert_eq!(config.readers, vec![Reader::Ean8, Reader::UpcE]);
        assert_eq!(config.patch_size, PatchSize::XLarge);
        assert_eq!(config.num_workers, 2);
        assert!(config.half_sample);
    }

    #[test]
    fn test_check_rejects_unusable_config() {
        let config = DecoderConfig {
            readers: Vec::new(),
            ..Default::default()
        };
        assert!(matches!(config.check(), Err(CameraError::DecoderInit(_))));

        let config = DecoderConfig {
            num_workers: 0,
            ..Default::default()
        };
        assert!(matches!(config.check(), Err(CameraError::DecoderInit(_))));
    }

    #[test]
    fn test_session_releases_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let released = Arc::new(AtomicUsize::new(0));
        let counter = released.clone();
        let mut session = DecoderSession::with_release(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        session.halt();
        session.halt();
        drop(session);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_facing_defaults_to_rear() {
        assert_eq!(CaptureConstraints::default().facing, FacingMode::Environment);
    }
}
