//! # scanpay-register: Scanner Register
//!
//! The cashier-facing half of ScanPay. A barcode comes in from the scanner,
//! is looked up in the catalog, lands in the cart, and the cart is checked
//! out against the catalog server, which answers with a payment QR.
//!
//! ## Module Organization
//! ```text
//! scanpay_register/
//! ├── camera/          Capture backends and decoders
//! │   └── line.rs      Scanner devices emitting one code per line
//! ├── state/
//! │   ├── scan.rs      Camera Session Manager (Idle / Scanning)
//! │   └── config.rs    RegisterConfig (TOML + SCANPAY_* env)
//! ├── commands/
//! │   ├── scan.rs      lookup + add to cart
//! │   ├── cart.rs      clear / remove / CartView
//! │   └── checkout.rs  Checkout Coordinator
//! ├── coordinator.rs   The single task owning cart and session
//! ├── display.rs       Text renderers
//! └── error.rs         RegisterError
//! ```
//!
//! ## Wiring
//! ```rust,ignore
//! let api = ApiClient::connect(&config.server).await;
//! let scanner = SessionManager::new(
//!     LineDeviceBackend::new("/dev/ttyACM0"),
//!     LineDecoder,
//!     config.scanner.constraints(),
//!     config.decoder.clone(),
//! );
//! let (register, handle) = Register::new(api, scanner);
//! tokio::spawn(register.run());
//!
//! handle.start().await?;
//! ```

pub mod camera;
pub mod commands;
pub mod coordinator;
pub mod display;
pub mod error;
pub mod state;

pub use coordinator::{
    Register, RegisterCommand, RegisterHandle, RegisterView, StatusLevel, StatusLine,
};
pub use error::{RegisterError, RegisterResult};
pub use state::RegisterConfig;
