//! # Text Display
//!
//! Renders a [`RegisterView`] for a terminal.
//!
//! ```text
//! [ok] Added to cart - Ready for next scan
//! Detected: 5012345678900
//!
//! BARCODE         NAME                          PRICE   QTY    SUBTOTAL
//! 5012345678900   Tea 80 bags                   $3.49     2       $6.98
//! 036000291452    Milk 1L                       $1.20     1       $1.20
//!
//! Total: $8.18
//! ```
//!
//! Money is formatted here and nowhere else.

use std::io;
use std::path::{Path, PathBuf};

use scanpay_core::Money;
use tracing::{info, warn};

use crate::commands::{CartView, PaymentDisplay};
use crate::coordinator::{RegisterView, StatusLevel, StatusLine};

const NAME_WIDTH: usize = 28;

pub fn render_status(status: &StatusLine) -> String {
    let marker = match status.level {
        StatusLevel::Info => "--",
        StatusLevel::Success => "ok",
        StatusLevel::Error => "!!",
    };
    format!("[{}] {}", marker, status.text)
}

pub fn render_detection(detection: &str) -> String {
    if detection.is_empty() {
        "No barcode detected yet".to_string()
    } else {
        detection.to_string()
    }
}

pub fn render_total(total: Money) -> String {
    format!("Total: {}", total)
}

/// Cart table with one row per line.
pub fn render_cart(cart: &CartView) -> String {
    if cart.items.is_empty() {
        return "Cart is empty".to_string();
    }

    let mut out = format!(
        "{:<15} {:<width$} {:>9} {:>5} {:>11}\n",
        "BARCODE",
        "NAME",
        "PRICE",
        "QTY",
        "SUBTOTAL",
        width = NAME_WIDTH
    );
    for line in &cart.items {
        out.push_str(&format!(
            "{:<15} {:<width$} {:>9} {:>5} {:>11}\n",
            line.barcode,
            fit(&line.name, NAME_WIDTH),
            line.unit_price.to_string(),
            line.quantity,
            line.subtotal().to_string(),
            width = NAME_WIDTH
        ));
    }
    out
}

/// Payment panel. `qr_path` is where the QR image was saved, if it was.
pub fn render_payment(payment: &PaymentDisplay, qr_path: Option<&Path>) -> String {
    let mut out = String::from("=== Payment ===\n");
    out.push_str(&render_total(payment.total));
    out.push('\n');
    if let Some(id) = payment.transaction_id {
        out.push_str(&format!("Transaction: {}\n", id));
    }
    match qr_path {
        Some(path) => out.push_str(&format!("QR code: {}\n", path.display())),
        None => out.push_str("QR code unavailable\n"),
    }
    out.push_str("Scan with your payment app\n");
    out
}

/// Full screen for one view.
pub fn render_view(view: &RegisterView, qr_path: Option<&Path>) -> String {
    let mut out = String::new();
    out.push_str(&render_status(&view.status));
    out.push('\n');
    out.push_str(&render_detection(&view.detection));
    out.push_str("\n\n");
    out.push_str(&render_cart(&view.cart));
    out.push('\n');
    out.push_str(&render_total(view.cart.totals.total));
    out.push('\n');
    if let Some(payment) = &view.payment {
        out.push('\n');
        out.push_str(&render_payment(payment, qr_path));
    }
    out
}

/// Writes the payment QR PNG into `dir` and returns its path.
pub async fn write_payment_qr(dir: &Path, payment: &PaymentDisplay) -> io::Result<PathBuf> {
    if payment.qr_png_bytes.is_empty() {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "no QR image to write"));
    }

    tokio::fs::create_dir_all(dir).await?;
    let name = match payment.transaction_id {
        Some(id) => format!("payment-{}.png", id),
        None => format!("payment-checkout-{}.png", payment.checkout_number),
    };
    let path = dir.join(name);
    tokio::fs::write(&path, &payment.qr_png_bytes).await?;

    info!(path = %path.display(), "Payment QR written");
    Ok(path)
}

/// Tracks the QR file of the payment on screen, so each checkout's QR is
/// written once.
#[derive(Debug, Default)]
pub struct SavedQr {
    checkout_number: Option<u64>,
    path: Option<PathBuf>,
}

impl SavedQr {
    /// Writes the QR of a payment not seen before. Returns where the current
    /// payment's QR is, if anywhere.
    pub async fn sync(&mut self, dir: &Path, payment: Option<&PaymentDisplay>) -> Option<&Path> {
        match payment {
            Some(payment) if self.checkout_number != Some(payment.checkout_number) => {
                self.checkout_number = Some(payment.checkout_number);
                self.path = match write_payment_qr(dir, payment).await {
                    Ok(path) => Some(path),
                    Err(e) => {
                        warn!(error = %e, "Could not save payment QR");
                        None
                    }
                };
            }
            Some(_) => {}
            None => {
                self.checkout_number = None;
                self.path = None;
            }
        }
        self.path.as_deref()
    }
}

fn fit(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('~');
    cut
}
