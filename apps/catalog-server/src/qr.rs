//! # Payment QR Codes
//!
//! ```text
//! "Payment: $8.18|TransactionID:42"
//!        │ qrcode (smallest version that fits)
//!        ▼
//! module matrix ──► 10 px per module, 5 module quiet zone ──► PNG ──► base64
//! ```

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{GrayImage, ImageFormat, Luma};
use qrcode::{Color, QrCode};
use scanpay_core::Money;
use thiserror::Error;

/// Pixels per module.
pub const BOX_SIZE: u32 = 10;

/// Quiet zone width in modules.
pub const BORDER: u32 = 5;

#[derive(Debug, Error)]
pub enum QrRenderError {
    #[error("QR encoding failed: {0}")]
    Encode(String),

    #[error("PNG encoding failed: {0}")]
    Image(String),
}

/// Text carried by the payment QR.
pub fn payment_payload(total: Money, transaction_id: i64) -> String {
    format!("Payment: {}|TransactionID:{}", total, transaction_id)
}

/// Renders `data` as a black-on-white PNG.
pub fn render_png(data: &str) -> Result<Vec<u8>, QrRenderError> {
    let code = QrCode::new(data.as_bytes()).map_err(|e| QrRenderError::Encode(e.to_string()))?;
    let modules = code.width() as u32;
    let colors = code.to_colors();
    let side = (modules + 2 * BORDER) * BOX_SIZE;

    let image = GrayImage::from_fn(side, side, |x, y| {
        let (mx, my) = (x / BOX_SIZE, y / BOX_SIZE);
        let inside = (BORDER..BORDER + modules).contains(&mx)
            && (BORDER..BORDER + modules).contains(&my);
        let dark = inside
            && colors[((my - BORDER) * modules + (mx - BORDER)) as usize] == Color::Dark;
        if dark {
            Luma([0u8])
        } else {
            Luma([255u8])
        }
    });

    let mut png = Cursor::new(Vec::new());
    image
        .write_to(&mut png, ImageFormat::Png)
        .map_err(|e| QrRenderError::Image(e.to_string()))?;
    Ok(png.into_inner())
}

/// Base64 PNG of the payment QR for a recorded checkout.
pub fn payment_qr_base64(total: Money, transaction_id: i64) -> Result<String, QrRenderError> {
    let png = render_png(&payment_payload(total, transaction_id))?;
    Ok(STANDARD.encode(png))
}
