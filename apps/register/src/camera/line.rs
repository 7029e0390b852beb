//! # Line Device Backend
//!
//! Hardware scanners (USB serial, HID in keyboard-wedge-to-tty mode) and
//! named pipes all look the same from here: a readable stream that yields
//! one barcode per line.
//!
//! ```text
//! /dev/ttyACM0 ──"5012345678900\n"──► reader task ──► route ──► DecodeEvent {
//!                                                        code: "5012345678900",
//!                                                        format: ean_13 }
//! ```
//!
//! ## One Reader Per Device
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  first start()  ──► open device, spawn reader, route = session 1 tx     │
//! │  halt()         ──► route = None        (reader keeps its read pending) │
//! │  next start()   ──► route = session 2 tx                                │
//! │  line arrives   ──► reader forwards to whatever the route is now        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A blocking read cannot be cancelled, so the reader is never aborted
//! between sessions. Lines read while no session is live are dropped. The
//! reader ends at end of input or on a read error, which closes the live
//! session's channel; the next start opens the device again.
//!
//! The device reports no symbology, so the format is inferred from the code
//! with [`BarcodeFormat::infer`].

use std::fmt;
use std::fs::File;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use scanpay_core::{BarcodeFormat, DecodeEvent};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{
    CameraError, CaptureBackend, CaptureConstraints, CaptureHandle, Decoder, DecoderConfig,
    DecoderSession, FacingMode,
};

type LineStream = Box<dyn AsyncRead + Send + Unpin>;

/// Reader state shared by the backend, its handles and the reader task.
#[derive(Default)]
struct Feed {
    /// Sender of the live session, if any.
    route: Option<mpsc::Sender<DecodeEvent>>,
    reader: Option<JoinHandle<()>>,
    /// Opened by `acquire` but not read yet.
    unread: Option<LineStream>,
}

impl Feed {
    fn is_reading(&self) -> bool {
        self.reader.as_ref().is_some_and(|task| !task.is_finished())
    }
}

type SharedFeed = Arc<Mutex<Feed>>;

fn lock(feed: &SharedFeed) -> MutexGuard<'_, Feed> {
    feed.lock().unwrap_or_else(PoisonError::into_inner)
}

enum Source {
    Unconfigured,
    Path(PathBuf),
    /// A stream handed over once; it cannot be reopened after it ends.
    Stream(String),
}

impl Source {
    fn label(&self) -> String {
        match self {
            Source::Unconfigured => "unconfigured".to_string(),
            Source::Path(path) => path.display().to_string(),
            Source::Stream(label) => label.clone(),
        }
    }
}

/// Opens the configured device and owns its reader.
pub struct LineDeviceBackend {
    source: Source,
    feed: SharedFeed,
}

impl LineDeviceBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        LineDeviceBackend {
            source: Source::Path(path.into()),
            feed: SharedFeed::default(),
        }
    }

    /// Backend over an already open stream, such as a serial port.
    pub fn from_stream(
        label: impl Into<String>,
        stream: impl AsyncRead + Send + Unpin + 'static,
    ) -> Self {
        let feed = Feed {
            unread: Some(Box::new(stream)),
            ..Feed::default()
        };
        LineDeviceBackend {
            source: Source::Stream(label.into()),
            feed: Arc::new(Mutex::new(feed)),
        }
    }

    /// Backend for a register with no scanner configured. Every acquire
    /// fails with `Unavailable`.
    pub fn unconfigured() -> Self {
        LineDeviceBackend {
            source: Source::Unconfigured,
            feed: SharedFeed::default(),
        }
    }

    fn open(&self) -> Result<LineStream, CameraError> {
        match &self.source {
            Source::Unconfigured => Err(CameraError::Unavailable(
                "no scanner device configured".to_string(),
            )),
            Source::Path(path) => {
                let label = path.display().to_string();
                let file = File::open(path).map_err(|e| match e.kind() {
                    ErrorKind::PermissionDenied => CameraError::AccessDenied(label.clone()),
                    ErrorKind::NotFound => CameraError::Unavailable(label.clone()),
                    _ => CameraError::Unavailable(format!("{}: {}", label, e)),
                })?;
                info!(device = %label, "Scanner device opened");
                Ok(Box::new(tokio::fs::File::from_std(file)))
            }
            Source::Stream(label) => Err(CameraError::Unavailable(format!(
                "{}: stream has ended",
                label
            ))),
        }
    }
}

impl fmt::Debug for LineDeviceBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineDeviceBackend")
            .field("device", &self.source.label())
            .finish()
    }
}

impl Drop for LineDeviceBackend {
    fn drop(&mut self) {
        let mut feed = lock(&self.feed);
        feed.route = None;
        if let Some(reader) = feed.reader.take() {
            reader.abort();
        }
    }
}

/// A lease on the device for one scanning session.
pub struct LineDevice {
    label: String,
    feed: SharedFeed,
}

impl fmt::Debug for LineDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineDevice").field("label", &self.label).finish()
    }
}

impl CaptureHandle for LineDevice {
    fn label(&self) -> &str {
        &self.label
    }
}

impl CaptureBackend for LineDeviceBackend {
    type Handle = LineDevice;

    fn acquire(&mut self, constraints: &CaptureConstraints) -> Result<LineDevice, CameraError> {
        if constraints.facing != FacingMode::Environment {
            debug!(facing = ?constraints.facing, "Line devices have no facing; ignoring");
        }

        let needs_open = {
            let feed = lock(&self.feed);
            !feed.is_reading() && feed.unread.is_none()
        };
        if needs_open {
            let stream = self.open()?;
            lock(&self.feed).unread = Some(stream);
        }

        Ok(LineDevice {
            label: self.source.label(),
            feed: self.feed.clone(),
        })
    }
}

/// Routes a device's lines to the live session.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineDecoder;

impl Decoder<LineDevice> for LineDecoder {
    fn start(
        &mut self,
        handle: &mut LineDevice,
        config: &DecoderConfig,
        events: mpsc::Sender<DecodeEvent>,
    ) -> Result<DecoderSession, CameraError> {
        config.check()?;

        let mut feed = lock(&handle.feed);
        if !feed.is_reading() {
            let stream = feed.unread.take().ok_or_else(|| {
                CameraError::DecoderInit(format!("{}: device is not open", handle.label))
            })?;
            feed.reader = Some(tokio::spawn(read_lines(
                handle.label.clone(),
                stream,
                handle.feed.clone(),
            )));
        }
        feed.route = Some(events);
        drop(feed);

        let route = handle.feed.clone();
        Ok(DecoderSession::with_release(move || {
            lock(&route).route = None;
        }))
    }
}

async fn read_lines(label: String, stream: LineStream, feed: SharedFeed) {
    let mut lines = BufReader::new(stream).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let code = line.trim();
                if code.is_empty() {
                    continue;
                }
                let event = DecodeEvent::new(code, BarcodeFormat::infer(code));
                let route = lock(&feed).route.clone();
                match route {
                    Some(tx) => {
                        debug!(device = %label, code = %event.code, format = %event.format, "Line decoded");
                        // A closed receiver means the session just stopped
                        let _ = tx.send(event).await;
                    }
                    None => debug!(device = %label, code = %event.code, "Line read while idle; dropped"),
                }
            }
            Ok(None) => {
                debug!(device = %label, "Scanner device reached end of input");
                break;
            }
            Err(e) => {
                warn!(device = %label, error = %e, "Scanner device read failed");
                break;
            }
        }
    }

    // Closes the live session's channel so it reports the decoder ended
    lock(&feed).route = None;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn test_reads_one_event_per_line() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "5012345678900").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "  SHELF-A12  ").unwrap();
        file.flush().unwrap();

        let mut backend = LineDeviceBackend::new(file.path());
        let mut handle = backend.acquire(&CaptureConstraints::default()).unwrap();
        assert_eq!(handle.label(), file.path().display().to_string());

        let (tx, mut rx) = mpsc::channel(8);
        let _session = LineDecoder
            .start(&mut handle, &DecoderConfig::default(), tx)
            .unwrap();

        assert_eq!(
            rx.recv().await,
            Some(DecodeEvent::new("5012345678900", BarcodeFormat::Ean13))
        );
        assert_eq!(
            rx.recv().await,
            Some(DecodeEvent::new("SHELF-A12", BarcodeFormat::Code128))
        );
        // End of file closes the channel
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_restarted_session_gets_next_line() {
        let (mut scanner, device) = tokio::io::duplex(64);
        let mut backend = LineDeviceBackend::from_stream("test-scanner", device);

        let mut first = backend.acquire(&CaptureConstraints::default()).unwrap();
        let (tx1, mut rx1) = mpsc::channel(8);
        let mut session = LineDecoder
            .start(&mut first, &DecoderConfig::default(), tx1)
            .unwrap();
        tokio::task::yield_now().await;

        // Stop while the reader is waiting on the device
        session.halt();
        drop(session);
        drop(first);
        assert_eq!(rx1.recv().await, None);

        let mut second = backend.acquire(&CaptureConstraints::default()).unwrap();
        let (tx2, mut rx2) = mpsc::channel(8);
        let _session = LineDecoder
            .start(&mut second, &DecoderConfig::default(), tx2)
            .unwrap();

        scanner.write_all(b"5012345678900\n").await.unwrap();

        let event = tokio::time::timeout(Duration::from_secs(2), rx2.recv())
            .await
            .unwrap();
        assert_eq!(
            event,
            Some(DecodeEvent::new("5012345678900", BarcodeFormat::Ean13))
        );
    }

    #[tokio::test]
    async fn test_lines_while_idle_are_dropped() {
        let (mut scanner, device) = tokio::io::duplex(64);
        let mut backend = LineDeviceBackend::from_stream("test-scanner", device);

        let mut handle = backend.acquire(&CaptureConstraints::default()).unwrap();
        let (tx, _rx) = mpsc::channel(8);
        let mut session = LineDecoder
            .start(&mut handle, &DecoderConfig::default(), tx)
            .unwrap();
        session.halt();

        scanner.write_all(b"036000291452\n").await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let (tx, mut rx) = mpsc::channel(8);
        let _session = LineDecoder
            .start(&mut handle, &DecoderConfig::default(), tx)
            .unwrap();
        scanner.write_all(b"5012345678900\n").await.unwrap();

        let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.code, "5012345678900");
    }

    #[tokio::test]
    async fn test_ended_stream_cannot_restart() {
        let (scanner, device) = tokio::io::duplex(64);
        let mut backend = LineDeviceBackend::from_stream("test-scanner", device);

        let mut handle = backend.acquire(&CaptureConstraints::default()).unwrap();
        let (tx, mut rx) = mpsc::channel(8);
        let _session = LineDecoder
            .start(&mut handle, &DecoderConfig::default(), tx)
            .unwrap();

        drop(scanner);
        assert_eq!(rx.recv().await, None);
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(matches!(
            backend.acquire(&CaptureConstraints::default()),
            Err(CameraError::Unavailable(_))
        ));
    }

    #[test]
    fn test_missing_device_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = LineDeviceBackend::new(dir.path().join("ttyACM9"));

        assert!(matches!(
            backend.acquire(&CaptureConstraints::default()),
            Err(CameraError::Unavailable(_))
        ));
    }

    #[test]
    fn test_unconfigured_is_unavailable() {
        assert!(matches!(
            LineDeviceBackend::unconfigured().acquire(&CaptureConstraints::default()),
            Err(CameraError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_no_readers_fails_init() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut handle = LineDeviceBackend::new(file.path())
            .acquire(&CaptureConstraints::default())
            .unwrap();
        let (tx, _rx) = mpsc::channel(1);

        let config = DecoderConfig {
            readers: Vec::new(),
            ..Default::default()
        };
        assert!(matches!(
            LineDecoder.start(&mut handle, &config, tx),
            Err(CameraError::DecoderInit(_))
        ));
    }
}
