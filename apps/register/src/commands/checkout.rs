//! # Checkout Coordinator
//!
//! Turns the cart into a recorded transaction and a payment QR.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  cart empty? ──yes──► EmptyCart (no request sent)                       │
//! │       │ no                                                              │
//! │       ▼                                                                 │
//! │  POST /api/transaction { items: [...] }                                 │
//! │       │                                                                 │
//! │       ├── 2xx { qr_code, total } ──► cart.clear() ──► PaymentDisplay    │
//! │       │                                                                 │
//! │       └── anything else ──────────► CheckoutFailed, cart untouched      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Duplicate Sales
//! Requests carry no idempotency key. When the server records the sale but
//! the response never arrives, the cashier sees `CheckoutFailed` and a
//! retry records it a second time. Each retry after a failure is logged at
//! `warn` so duplicates can be reconciled from the logs.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use scanpay_client::ApiClient;
use scanpay_core::{Cart, Money};
use tracing::{info, warn};

use crate::error::{RegisterError, RegisterResult};

/// What the cashier shows the customer after a successful checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentDisplay {
    /// Total as confirmed by the server.
    pub total: Money,

    /// The QR image exactly as received.
    pub qr_image_base64: String,

    /// Decoded PNG bytes. Empty when the server sent something that is not
    /// base64; the sale is recorded either way.
    pub qr_png_bytes: Vec<u8>,

    pub transaction_id: Option<i64>,

    /// Successful checkouts so far in this run, this one included. Tells two
    /// payments apart when the server sends no transaction id.
    pub checkout_number: u64,
}

/// Runs checkouts and remembers whether the previous one failed.
#[derive(Debug, Default)]
pub struct CheckoutCoordinator {
    failed_attempts: u32,
    completed: u64,
}

impl CheckoutCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consecutive failed checkouts of the current cart.
    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    /// Forgets earlier failures. Called when the cart is cleared by hand.
    pub fn reset(&mut self) {
        self.failed_attempts = 0;
    }

    /// Submits the cart.
    ///
    /// ## Errors
    /// - `EmptyCart` without any network call
    /// - `ServerDiscoveryFailed` / `CheckoutFailed` with the cart untouched
    pub async fn checkout(&mut self, api: &ApiClient, cart: &mut Cart) -> RegisterResult<PaymentDisplay> {
        if cart.is_empty() {
            return Err(RegisterError::EmptyCart);
        }

        if self.failed_attempts > 0 {
            warn!(
                previous_failures = self.failed_attempts,
                lines = cart.len(),
                total = %cart.total(),
                "Retrying checkout after a failure; the earlier attempt may already be recorded"
            );
        }

        let receipt = match api.checkout().submit(cart.items()).await {
            Ok(receipt) => receipt,
            Err(e) => {
                self.failed_attempts += 1;
                return Err(e.into());
            }
        };

        self.failed_attempts = 0;
        self.completed += 1;
        cart.clear();

        let qr_png_bytes = STANDARD.decode(receipt.qr_code.as_bytes()).unwrap_or_else(|e| {
            warn!(error = %e, "Payment QR is not valid base64");
            Vec::new()
        });

        info!(
            total = %receipt.total,
            transaction_id = ?receipt.transaction_id,
            "Checkout complete"
        );

        Ok(PaymentDisplay {
            total: receipt.total,
            qr_image_base64: receipt.qr_code,
            qr_png_bytes,
            transaction_id: receipt.transaction_id,
            checkout_number: self.completed,
        })
    }
}
