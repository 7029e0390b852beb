//! # ScanPay Register Entry Point
//!
//! ## Startup Sequence
//! 1. Initialize tracing (logging to stderr)
//! 2. Load `RegisterConfig` (file, environment), apply CLI flags
//! 3. Resolve the catalog server (discovery runs once)
//! 4. Spawn the register coordinator and the display task
//! 5. Read operator commands from stdin until `quit` or EOF
//!
//! ## Commands
//! ```text
//! start            open the scanner and wait for one barcode
//! stop             close the scanner
//! checkout         submit the cart, show the payment QR
//! clear            empty the cart
//! remove <code>    drop one line from the cart
//! cart             redraw the screen
//! help             list commands
//! quit             exit
//! ```

use std::path::PathBuf;

use clap::Parser;
use scanpay_client::ApiClient;
use scanpay_register::camera::{LineDecoder, LineDeviceBackend};
use scanpay_register::display::{render_view, SavedQr};
use scanpay_register::state::SessionManager;
use scanpay_register::{Register, RegisterCommand, RegisterConfig, RegisterHandle};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Barcode scanner register for a ScanPay catalog server.
#[derive(Debug, Parser)]
#[command(name = "scanpay-register", version, about)]
struct Args {
    /// Config file (defaults to the platform config directory).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Catalog server base URL; skips discovery.
    #[arg(long)]
    server_url: Option<String>,

    /// Origin to ask for the server IP (GET /api/server-ip).
    #[arg(long)]
    origin: Option<String>,

    /// Scanner device emitting one barcode per line.
    #[arg(long)]
    device: Option<PathBuf>,
}

const HELP: &str = "commands: start | stop | checkout | clear | remove <barcode> | cart | help | quit";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let args = Args::parse();

    let mut config = RegisterConfig::load(args.config)?;
    if let Some(url) = args.server_url {
        config.server.server_url = Some(url);
    }
    if let Some(origin) = args.origin {
        config.server.origin = Some(origin);
    }
    if let Some(device) = args.device {
        config.scanner.device = Some(device);
    }
    config.validate()?;

    info!("Starting ScanPay register");

    let api = ApiClient::connect(&config.server).await;
    let backend = match &config.scanner.device {
        Some(path) => LineDeviceBackend::new(path),
        None => {
            warn!("No scanner device configured; start will fail until one is set");
            LineDeviceBackend::unconfigured()
        }
    };
    let scanner = SessionManager::new(
        backend,
        LineDecoder,
        config.scanner.constraints(),
        config.decoder.clone(),
    );

    let (register, handle) = Register::new(api, scanner);
    let coordinator = tokio::spawn(register.run());
    tokio::spawn(render_loop(handle.clone(), config.display.output_dir.clone()));

    println!("{}", HELP);
    read_commands(&handle).await?;

    coordinator.await?;
    info!("Register shut down");
    Ok(())
}

/// Initializes the tracing subscriber.
///
/// Logs go to stderr so they never interleave with the screen on stdout.
/// Default filter: `info,scanpay=debug,sqlx=warn`; override with `RUST_LOG`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,scanpay=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn read_commands(handle: &RegisterHandle) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let mut words = line.split_whitespace();
        let command = match (words.next(), words.next()) {
            (None, _) => continue,
            (Some("start"), None) => RegisterCommand::Start,
            (Some("stop"), None) => RegisterCommand::Stop,
            (Some("checkout"), None) => RegisterCommand::Checkout,
            (Some("clear"), None) => RegisterCommand::Clear,
            (Some("remove"), Some(barcode)) => RegisterCommand::Remove(barcode.to_string()),
            (Some("cart"), None) => RegisterCommand::Show,
            (Some("quit") | Some("exit"), None) => break,
            _ => {
                println!("{}", HELP);
                continue;
            }
        };
        handle.send(command).await?;
    }

    // EOF and `quit` both end up here
    handle.quit().await?;
    Ok(())
}

/// Redraws the screen on every published view and saves payment QRs.
async fn render_loop(handle: RegisterHandle, output_dir: PathBuf) {
    let mut views = handle.subscribe();
    let mut saved = SavedQr::default();

    loop {
        let view = views.borrow_and_update().clone();
        let qr_path = saved.sync(&output_dir, view.payment.as_ref()).await;

        println!("\n{}", render_view(&view, qr_path));

        if views.changed().await.is_err() {
            break;
        }
    }
}
