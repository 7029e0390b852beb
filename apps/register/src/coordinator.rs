//! # Register Coordinator
//!
//! One task owns the Cart Store and the camera session. Operator commands
//! and decode events both arrive on channels and are handled one at a time,
//! each to completion, network calls included.
//!
//! ## Message Routing
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  RegisterHandle ──mpsc──┐                                               │
//! │  (CLI, tests)           │     ┌───────────────────────────────────┐    │
//! │                         ├────►│  Register::run (tokio::select!)   │    │
//! │  decoder task ──mpsc────┘     │                                   │    │
//! │  (via SessionManager)         │  cart: Cart                       │    │
//! │                               │  scanner: SessionManager          │    │
//! │                               │  status / detection / payment     │    │
//! │                               └─────────────────┬─────────────────┘    │
//! │                                                 │ watch                 │
//! │                                                 ▼                       │
//! │                                       RegisterView ──► display          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use scanpay_client::{ApiClient, BaseUrl};
use scanpay_core::{Cart, DecodeEvent};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, warn};

use crate::camera::{CaptureBackend, Decoder};
use crate::commands::{
    add_scanned, clear_cart, remove_line, CartView, CheckoutCoordinator, PaymentDisplay,
};
use crate::error::{RegisterError, RegisterResult};
use crate::state::{ScanSignal, SessionManager, StartOutcome};

/// Pending operator commands.
const COMMAND_BUFFER: usize = 32;

// =============================================================================
// View Types
// =============================================================================

/// Severity of the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Error,
}

/// The scan-status readout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub text: String,
    pub level: StatusLevel,
}

impl StatusLine {
    pub fn info(text: impl Into<String>) -> Self {
        StatusLine {
            text: text.into(),
            level: StatusLevel::Info,
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        StatusLine {
            text: text.into(),
            level: StatusLevel::Success,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        StatusLine {
            text: text.into(),
            level: StatusLevel::Error,
        }
    }
}

/// Snapshot published after every action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterView {
    pub status: StatusLine,

    /// Last detection (and the error it ran into, if any).
    pub detection: String,

    pub scanning: bool,
    pub cart: CartView,

    /// Set by a successful checkout until the next start, clear or checkout.
    pub payment: Option<PaymentDisplay>,
}

// =============================================================================
// Commands
// =============================================================================

/// Operator commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterCommand {
    Start,
    Stop,
    Checkout,
    Clear,
    Remove(String),
    Show,
    Quit,
}

struct Request {
    command: RegisterCommand,
    reply: oneshot::Sender<RegisterView>,
}

/// Handle for driving the register from other tasks.
#[derive(Clone)]
pub struct RegisterHandle {
    tx: mpsc::Sender<Request>,
    view: watch::Receiver<RegisterView>,
}

impl RegisterHandle {
    /// Sends a command and waits for the view it produced.
    pub async fn send(&self, command: RegisterCommand) -> RegisterResult<RegisterView> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(Request { command, reply })
            .await
            .map_err(|_| RegisterError::ChannelError("Register channel closed".into()))?;
        response
            .await
            .map_err(|_| RegisterError::ChannelError("Register dropped the reply".into()))
    }

    pub async fn start(&self) -> RegisterResult<RegisterView> {
        self.send(RegisterCommand::Start).await
    }

    pub async fn stop(&self) -> RegisterResult<RegisterView> {
        self.send(RegisterCommand::Stop).await
    }

    pub async fn checkout(&self) -> RegisterResult<RegisterView> {
        self.send(RegisterCommand::Checkout).await
    }

    pub async fn clear(&self) -> RegisterResult<RegisterView> {
        self.send(RegisterCommand::Clear).await
    }

    pub async fn remove(&self, barcode: impl Into<String>) -> RegisterResult<RegisterView> {
        self.send(RegisterCommand::Remove(barcode.into())).await
    }

    pub async fn show(&self) -> RegisterResult<RegisterView> {
        self.send(RegisterCommand::Show).await
    }

    pub async fn quit(&self) -> RegisterResult<RegisterView> {
        self.send(RegisterCommand::Quit).await
    }

    /// A receiver that sees every published view.
    pub fn subscribe(&self) -> watch::Receiver<RegisterView> {
        self.view.clone()
    }

    /// The latest published view.
    pub fn view(&self) -> RegisterView {
        self.view.borrow().clone()
    }
}

// =============================================================================
// Register
// =============================================================================

/// The register coordinator.
pub struct Register<B, D>
where
    B: CaptureBackend,
    D: Decoder<B::Handle>,
{
    api: ApiClient,
    scanner: SessionManager<B, D>,
    cart: Cart,
    checkout: CheckoutCoordinator,
    status: StatusLine,
    detection: String,
    payment: Option<PaymentDisplay>,
    commands: mpsc::Receiver<Request>,
    view_tx: watch::Sender<RegisterView>,
}

impl<B, D> Register<B, D>
where
    B: CaptureBackend,
    D: Decoder<B::Handle>,
{
    /// Creates the coordinator and its handle. Nothing runs until
    /// [`Register::run`] is awaited or spawned.
    pub fn new(api: ApiClient, scanner: SessionManager<B, D>) -> (Self, RegisterHandle) {
        let status = match api.base() {
            BaseUrl::Resolved(url) => {
                StatusLine::info(format!("Server detected: {}", url.host_str().unwrap_or("?")))
            }
            BaseUrl::Unresolved { reason } => {
                StatusLine::error(format!("Server discovery failed: {}", reason))
            }
        };

        let cart = Cart::new();
        let initial = RegisterView {
            status: status.clone(),
            detection: String::new(),
            scanning: false,
            cart: CartView::from(&cart),
            payment: None,
        };

        let (tx, commands) = mpsc::channel(COMMAND_BUFFER);
        let (view_tx, view) = watch::channel(initial);

        let register = Register {
            api,
            scanner,
            cart,
            checkout: CheckoutCoordinator::new(),
            status,
            detection: String::new(),
            payment: None,
            commands,
            view_tx,
        };

        (register, RegisterHandle { tx, view })
    }

    /// Runs until `Quit` or until every handle is dropped.
    pub async fn run(mut self) {
        info!("Register started");
        self.publish();

        loop {
            tokio::select! {
                request = self.commands.recv() => {
                    let Some(Request { command, reply }) = request else {
                        debug!("All register handles dropped");
                        break;
                    };

                    let quit = command == RegisterCommand::Quit;
                    self.handle_command(command).await;
                    self.publish();
                    // The sender may have given up waiting
                    let _ = reply.send(self.view());

                    if quit {
                        break;
                    }
                }

                signal = self.scanner.next_signal() => {
                    self.handle_signal(signal).await;
                    self.publish();
                }
            }
        }

        self.scanner.stop();
        info!("Register stopped");
    }

    // =========================================================================
    // Command Handling
    // =========================================================================

    async fn handle_command(&mut self, command: RegisterCommand) {
        debug!(?command, "Register command");

        match command {
            RegisterCommand::Start => self.start_scanning(),
            RegisterCommand::Stop => self.stop_scanning(),
            RegisterCommand::Checkout => self.run_checkout().await,
            RegisterCommand::Clear => {
                clear_cart(&mut self.cart);
                self.checkout.reset();
                self.payment = None;
                self.status = StatusLine::info("Cart cleared");
            }
            RegisterCommand::Remove(barcode) => match remove_line(&mut self.cart, &barcode) {
                Some(line) => self.status = StatusLine::info(format!("Removed {}", line.name)),
                None => self.status = StatusLine::error(format!("{} is not in the cart", barcode)),
            },
            RegisterCommand::Show => {}
            RegisterCommand::Quit => {
                self.scanner.stop();
                self.status = StatusLine::info("Shutting down");
            }
        }
    }

    fn start_scanning(&mut self) {
        self.payment = None;
        self.status = StatusLine::info("Requesting camera...");
        self.publish();

        match self.scanner.start() {
            Ok(StartOutcome::Started) => {
                self.detection = "Scanning for barcodes...".to_string();
                self.status = StatusLine::info("Scanning...");
            }
            Ok(StartOutcome::AlreadyScanning) => {
                self.status = StatusLine::info("Scanning...");
            }
            Err(e) => {
                let err = RegisterError::from(e);
                error!(error = %err, "Could not start scanning");
                self.detection = match &err {
                    RegisterError::DecoderInitFailed(_) => err.to_string(),
                    _ => "Failed to access camera.".to_string(),
                };
                self.status = StatusLine::error(err.to_string());
            }
        }
    }

    fn stop_scanning(&mut self) {
        if self.scanner.stop() {
            if self.detection.is_empty() || self.detection == "Scanning for barcodes..." {
                self.detection = "Scanner stopped.".to_string();
            }
            self.status = StatusLine::info("Stopped - Ready for next scan");
        }
    }

    async fn run_checkout(&mut self) {
        self.payment = None;

        match self.checkout.checkout(&self.api, &mut self.cart).await {
            Ok(payment) => {
                self.status = StatusLine::success("Checkout complete");
                self.payment = Some(payment);
            }
            Err(e) => {
                error!(error = %e, "Checkout failed");
                self.status = StatusLine::error(e.to_string());
            }
        }
    }

    // =========================================================================
    // Scan Handling
    // =========================================================================

    async fn handle_signal(&mut self, signal: ScanSignal) {
        match signal {
            ScanSignal::Decoded(event) => {
                if let Some(event) = self.scanner.on_decode(event) {
                    self.on_detected(event).await;
                }
            }
            ScanSignal::DecoderEnded => {
                warn!("Decoder ended on its own");
                self.scanner.stop();
                self.status = StatusLine::error("Scanner disconnected");
            }
        }
    }

    async fn on_detected(&mut self, event: DecodeEvent) {
        info!(code = %event.code, format = %event.format, "Detected barcode");
        self.detection = format!("Detected: {}", event.code);
        self.status = StatusLine::success("Barcode detected!");
        self.publish();

        match add_scanned(&self.api, &mut self.cart, &event.code).await {
            Ok(_) => {
                self.status = StatusLine::success("Added to cart - Ready for next scan");
            }
            Err(e) => {
                match &e {
                    RegisterError::ProductNotFound(_) => info!(error = %e, "Scan not added"),
                    _ => error!(error = %e, "Scan not added"),
                }
                self.detection.push_str(&format!(" | Error: {}", e));
                self.status = StatusLine::error(e.to_string());
            }
        }
    }

    // =========================================================================
    // View
    // =========================================================================

    fn view(&self) -> RegisterView {
        RegisterView {
            status: self.status.clone(),
            detection: self.detection.clone(),
            scanning: self.scanner.is_scanning(),
            cart: CartView::from(&self.cart),
            payment: self.payment.clone(),
        }
    }

    fn publish(&self) {
        self.view_tx.send_replace(self.view());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::scripted::{scripted, Probe, ScriptedBackend, ScriptedDecoder};
    use crate::camera::{CameraError, CaptureConstraints, DecoderConfig};
    use crate::test_support::{catalog_app, serve_api, CatalogFake, FAKE_QR_PNG};
    use scanpay_core::{BarcodeFormat, Money};
    use std::time::Duration;

    const TEA: &str = "5012345678900";

    async fn spawn_register(fake: CatalogFake) -> (RegisterHandle, Probe) {
        let api = serve_api(catalog_app(fake)).await;
        spawn_with_api(api)
    }

    fn spawn_with_api(api: ApiClient) -> (RegisterHandle, Probe) {
        let (backend, decoder, probe) = scripted();
        let scanner: SessionManager<ScriptedBackend, ScriptedDecoder> = SessionManager::new(
            backend,
            decoder,
            CaptureConstraints::default(),
            DecoderConfig::default(),
        );
        let (register, handle) = Register::new(api, scanner);
        tokio::spawn(register.run());
        (handle, probe)
    }

    /// Waits for a published view matching `done`.
    async fn wait_for(handle: &RegisterHandle, done: impl Fn(&RegisterView) -> bool) -> RegisterView {
        let mut rx = handle.subscribe();
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                {
                    let view = rx.borrow_and_update();
                    if done(&view) {
                        return view.clone();
                    }
                }
                rx.changed().await.unwrap();
            }
        })
        .await
        .expect("view never reached the expected state")
    }

    #[tokio::test]
    async fn test_scan_adds_to_cart_and_stops() {
        let fake = CatalogFake::default().with_product(TEA, "Tea 80 bags", 3.49);
        let (handle, probe) = spawn_register(fake).await;

        let view = handle.start().await.unwrap();
        assert!(view.scanning);
        assert_eq!(view.detection, "Scanning for barcodes...");

        assert!(probe.emit(TEA, BarcodeFormat::Ean13).await);
        let view = wait_for(&handle, |v| v.cart.items.len() == 1).await;

        assert!(!view.scanning);
        assert_eq!(view.detection, format!("Detected: {}", TEA));
        assert_eq!(view.status, StatusLine::success("Added to cart - Ready for next scan"));
        assert_eq!(view.cart.totals.total, Money::from_cents(349));
        assert_eq!(probe.live_handles(), 0);

        // Single-shot: the halted session accepts nothing more
        assert!(!probe.emit(TEA, BarcodeFormat::Ean13).await);

        // Scanning again increments the same line
        handle.start().await.unwrap();
        assert!(probe.emit(TEA, BarcodeFormat::Ean13).await);
        let view = wait_for(&handle, |v| v.cart.totals.total_quantity == 2).await;
        assert_eq!(view.cart.items.len(), 1);
        assert_eq!(view.cart.totals.total, Money::from_cents(698));
    }

    #[tokio::test]
    async fn test_unknown_product_is_error_status() {
        let fake = CatalogFake::default();
        let (handle, probe) = spawn_register(fake.clone()).await;

        handle.start().await.unwrap();
        assert!(probe.emit("4006381333931", BarcodeFormat::Ean13).await);
        let view = wait_for(&handle, |v| v.status.level == StatusLevel::Error).await;

        assert!(view.cart.items.is_empty());
        assert!(view.detection.starts_with("Detected: 4006381333931 | Error: "));
        assert!(fake.wait_for_registration("4006381333931").await);
    }

    #[tokio::test]
    async fn test_camera_denied() {
        let (handle, probe) = spawn_register(CatalogFake::default()).await;
        probe.refuse_next(CameraError::AccessDenied("blocked by policy".into()));

        let view = handle.start().await.unwrap();
        assert!(!view.scanning);
        assert_eq!(view.status.level, StatusLevel::Error);
        assert_eq!(view.detection, "Failed to access camera.");
    }

    #[tokio::test]
    async fn test_start_twice_keeps_one_handle() {
        let (handle, probe) = spawn_register(CatalogFake::default()).await;

        handle.start().await.unwrap();
        let view = handle.start().await.unwrap();
        assert!(view.scanning);
        assert_eq!(probe.acquisitions(), 1);

        let view = handle.stop().await.unwrap();
        assert!(!view.scanning);
        assert_eq!(view.status.text, "Stopped - Ready for next scan");
        assert_eq!(probe.live_handles(), 0);
    }

    #[tokio::test]
    async fn test_checkout_flow() {
        let fake = CatalogFake::default().with_product(TEA, "Tea 80 bags", 3.49);
        let (handle, probe) = spawn_register(fake).await;

        let view = handle.checkout().await.unwrap();
        assert_eq!(view.status, StatusLine::error("Cart is empty"));

        handle.start().await.unwrap();
        probe.emit(TEA, BarcodeFormat::Ean13).await;
        wait_for(&handle, |v| v.cart.items.len() == 1).await;

        let view = handle.checkout().await.unwrap();
        assert_eq!(view.status, StatusLine::success("Checkout complete"));
        assert!(view.cart.items.is_empty());
        let payment = view.payment.unwrap();
        assert_eq!(payment.total, Money::from_cents(349));
        assert_eq!(payment.qr_png_bytes, FAKE_QR_PNG);
    }

    #[tokio::test]
    async fn test_failed_checkout_keeps_cart() {
        let fake = CatalogFake::default()
            .with_product(TEA, "Tea 80 bags", 3.49)
            .rejecting_checkout("Insufficient stock or invalid product: 5012345678900");
        let (handle, probe) = spawn_register(fake).await;

        handle.start().await.unwrap();
        probe.emit(TEA, BarcodeFormat::Ean13).await;
        wait_for(&handle, |v| v.cart.items.len() == 1).await;

        let view = handle.checkout().await.unwrap();
        assert_eq!(view.status.level, StatusLevel::Error);
        assert_eq!(view.cart.items.len(), 1);
        assert!(view.payment.is_none());
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let fake = CatalogFake::default().with_product(TEA, "Tea 80 bags", 3.49);
        let (handle, probe) = spawn_register(fake).await;

        handle.start().await.unwrap();
        probe.emit(TEA, BarcodeFormat::Ean13).await;
        wait_for(&handle, |v| v.cart.items.len() == 1).await;

        let view = handle.remove("0000").await.unwrap();
        assert_eq!(view.status.level, StatusLevel::Error);
        assert_eq!(view.cart.items.len(), 1);

        let view = handle.remove(TEA).await.unwrap();
        assert_eq!(view.status.text, "Removed Tea 80 bags");
        assert!(view.cart.items.is_empty());

        let view = handle.clear().await.unwrap();
        assert_eq!(view.status.text, "Cart cleared");
    }

    #[tokio::test]
    async fn test_discovery_failure_shown_at_startup() {
        let api = ApiClient::with_base(
            reqwest::Client::new(),
            BaseUrl::Unresolved {
                reason: "server-ip returned 500".into(),
            },
        );
        let (handle, probe) = spawn_with_api(api);

        assert_eq!(
            handle.view().status,
            StatusLine::error("Server discovery failed: server-ip returned 500")
        );

        // Scanning still works; adding to the cart does not
        handle.start().await.unwrap();
        probe.emit(TEA, BarcodeFormat::Ean13).await;
        let view = wait_for(&handle, |v| v.detection.contains("| Error:")).await;
        assert!(view.cart.items.is_empty());
        assert!(view.status.text.starts_with("Server discovery failed"));
    }

    #[tokio::test]
    async fn test_quit_closes_handle() {
        let (handle, probe) = spawn_register(CatalogFake::default()).await;
        handle.start().await.unwrap();

        let view = handle.quit().await.unwrap();
        assert!(!view.scanning);
        assert_eq!(probe.live_handles(), 0);

        // The coordinator is gone
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(matches!(
            handle.show().await,
            Err(RegisterError::ChannelError(_))
        ));
    }
}
