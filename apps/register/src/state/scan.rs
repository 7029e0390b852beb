//! # Camera Session Manager
//!
//! Owns the capture handle and the decoder session, and gates them with a
//! two-state machine.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │           start() ok                                                    │
//! │   ┌──────┐ ─────────────────────────────► ┌──────────┐                  │
//! │   │ Idle │                                │ Scanning │                  │
//! │   └──────┘ ◄───────────────────────────── └──────────┘                  │
//! │      ▲      stop() / decode event /             │                       │
//! │      │      decoder ended                       │ start()               │
//! │      │                                          ▼                       │
//! │   start() failed:                        AlreadyScanning                │
//! │   acquire error or decoder init          (no second handle)             │
//! │   error (handle released)                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every session gets its own event channel. Stopping drops the receiver,
//! so events still in flight from a halted decoder are discarded and can
//! never leak into a later session.

use scanpay_core::DecodeEvent;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::camera::{
    CameraError, CaptureBackend, CaptureConstraints, CaptureHandle, Decoder, DecoderConfig,
    DecoderSession,
};

/// Decode events buffered per session.
const EVENT_BUFFER: usize = 16;

/// Whether the camera is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Scanning,
}

/// Result of [`SessionManager::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyScanning,
}

/// What the live session produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanSignal {
    Decoded(DecodeEvent),
    /// The decoder stopped on its own (device closed or unplugged).
    DecoderEnded,
}

struct ActiveScan<H> {
    // Field order matters: the decoder halts before the handle is released.
    session: DecoderSession,
    handle: H,
    events: mpsc::Receiver<DecodeEvent>,
}

/// Camera session manager.
pub struct SessionManager<B, D>
where
    B: CaptureBackend,
    D: Decoder<B::Handle>,
{
    backend: B,
    decoder: D,
    constraints: CaptureConstraints,
    config: DecoderConfig,
    active: Option<ActiveScan<B::Handle>>,
}

impl<B, D> SessionManager<B, D>
where
    B: CaptureBackend,
    D: Decoder<B::Handle>,
{
    pub fn new(backend: B, decoder: D, constraints: CaptureConstraints, config: DecoderConfig) -> Self {
        SessionManager {
            backend,
            decoder,
            constraints,
            config,
            active: None,
        }
    }

    pub fn state(&self) -> ScanState {
        if self.active.is_some() {
            ScanState::Scanning
        } else {
            ScanState::Idle
        }
    }

    pub fn is_scanning(&self) -> bool {
        self.active.is_some()
    }

    /// Acquires the device and starts the decoder.
    ///
    /// ## Errors
    /// - `AccessDenied` / `Unavailable` from the backend; nothing was acquired
    /// - `DecoderInit`; the handle has already been released
    pub fn start(&mut self) -> Result<StartOutcome, CameraError> {
        if self.active.is_some() {
            debug!("Start requested while scanning; ignoring");
            return Ok(StartOutcome::AlreadyScanning);
        }

        let mut handle = self.backend.acquire(&self.constraints)?;
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);

        let session = match self.decoder.start(&mut handle, &self.config, tx) {
            Ok(session) => session,
            Err(e) => {
                warn!(device = handle.label(), error = %e, "Decoder failed to start; releasing device");
                drop(handle);
                return Err(e);
            }
        };

        info!(device = handle.label(), "Scanning started");
        self.active = Some(ActiveScan {
            session,
            handle,
            events: rx,
        });
        Ok(StartOutcome::Started)
    }

    /// Halts the decoder and releases the device. Returns false when already
    /// idle.
    pub fn stop(&mut self) -> bool {
        let Some(mut active) = self.active.take() else {
            return false;
        };

        active.session.halt();
        info!(device = active.handle.label(), "Scanning stopped");
        drop(active);
        true
    }

    /// Filters a decode event.
    ///
    /// Returns the event to act on, having already stopped the session, or
    /// `None` when the event must be dropped: the session is idle, or the
    /// event's format is not enabled (scanning continues).
    pub fn on_decode(&mut self, event: DecodeEvent) -> Option<DecodeEvent> {
        if self.active.is_none() {
            debug!(code = %event.code, "Decode event while idle; dropped");
            return None;
        }

        if !self.config.accepts(event.format) {
            debug!(code = %event.code, format = %event.format, "Format not enabled; ignored");
            return None;
        }

        self.stop();
        Some(event)
    }

    /// Waits for the live session's next signal. Pending forever while idle.
    pub async fn next_signal(&mut self) -> ScanSignal {
        let Some(active) = self.active.as_mut() else {
            return std::future::pending().await;
        };

        match active.events.recv().await {
            Some(event) => ScanSignal::Decoded(event),
            None => ScanSignal::DecoderEnded,
        }
    }
}

impl<B, D> Drop for SessionManager<B, D>
where
    B: CaptureBackend,
    D: Decoder<B::Handle>,
{
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::scripted::{scripted, Probe, ScriptedBackend, ScriptedDecoder};
    use crate::camera::FacingMode;
    use scanpay_core::BarcodeFormat;

    type Manager = SessionManager<ScriptedBackend, ScriptedDecoder>;

    fn manager() -> (Manager, Probe) {
        let (backend, decoder, probe) = scripted();
        let manager = SessionManager::new(
            backend,
            decoder,
            CaptureConstraints::default(),
            DecoderConfig::default(),
        );
        (manager, probe)
    }

    #[tokio::test]
    async fn test_start_acquires_rear_camera() {
        let (mut scan, probe) = manager();

        assert_eq!(scan.start().unwrap(), StartOutcome::Started);
        assert_eq!(scan.state(), ScanState::Scanning);
        assert_eq!(probe.live_handles(), 1);
        assert_eq!(probe.last_facing(), Some(FacingMode::Environment));
    }

    #[tokio::test]
    async fn test_start_twice_is_noop() {
        let (mut scan, probe) = manager();

        scan.start().unwrap();
        assert_eq!(scan.start().unwrap(), StartOutcome::AlreadyScanning);
        assert_eq!(probe.acquisitions(), 1);
        assert_eq!(probe.live_handles(), 1);
    }

    #[tokio::test]
    async fn test_acquire_failure_stays_idle() {
        let (mut scan, probe) = manager();
        probe.refuse_next(CameraError::AccessDenied("blocked".into()));

        assert!(matches!(scan.start(), Err(CameraError::AccessDenied(_))));
        assert_eq!(scan.state(), ScanState::Idle);
        assert_eq!(probe.live_handles(), 0);

        // The next attempt is unaffected
        assert_eq!(scan.start().unwrap(), StartOutcome::Started);
    }

    #[tokio::test]
    async fn test_decoder_failure_releases_handle() {
        let (mut scan, probe) = manager();
        probe.fail_decoder(true);

        assert!(matches!(scan.start(), Err(CameraError::DecoderInit(_))));
        assert_eq!(scan.state(), ScanState::Idle);
        assert_eq!(probe.acquisitions(), 1);
        assert_eq!(probe.live_handles(), 0);
    }

    #[tokio::test]
    async fn test_stop_releases_and_is_idempotent() {
        let (mut scan, probe) = manager();

        assert!(!scan.stop());
        scan.start().unwrap();
        assert!(scan.stop());
        assert_eq!(probe.live_handles(), 0);
        assert!(!scan.stop());
        assert_eq!(scan.state(), ScanState::Idle);
    }

    #[tokio::test]
    async fn test_decode_stops_before_forwarding() {
        let (mut scan, probe) = manager();
        scan.start().unwrap();

        assert!(probe.emit("5012345678900", BarcodeFormat::Ean13).await);
        let ScanSignal::Decoded(event) = scan.next_signal().await else {
            panic!("expected a decode");
        };

        let forwarded = scan.on_decode(event).unwrap();
        assert_eq!(forwarded.code, "5012345678900");
        assert_eq!(scan.state(), ScanState::Idle);
        assert_eq!(probe.live_handles(), 0);
    }

    #[tokio::test]
    async fn test_stale_events_are_dropped() {
        let (mut scan, probe) = manager();
        scan.start().unwrap();
        scan.stop();

        // The old session's receiver is gone
        assert!(!probe.emit("5012345678900", BarcodeFormat::Ean13).await);

        // An event handed over while idle is dropped as well
        let event = DecodeEvent::new("5012345678900", BarcodeFormat::Ean13);
        assert_eq!(scan.on_decode(event), None);
    }

    #[tokio::test]
    async fn test_disabled_format_keeps_scanning() {
        let (mut scan, probe) = manager();
        scan.start().unwrap();

        let event = DecodeEvent::new("96385074", BarcodeFormat::Ean8);
        assert_eq!(scan.on_decode(event), None);
        assert_eq!(scan.state(), ScanState::Scanning);
        assert_eq!(probe.live_handles(), 1);
    }

    #[tokio::test]
    async fn test_decoder_end_is_signalled() {
        let (mut scan, probe) = manager();
        scan.start().unwrap();
        probe.end_stream();

        assert_eq!(scan.next_signal().await, ScanSignal::DecoderEnded);
    }

    #[tokio::test]
    async fn test_drop_releases_handle() {
        let (mut scan, probe) = manager();
        scan.start().unwrap();
        drop(scan);
        assert_eq!(probe.live_handles(), 0);
    }
}
