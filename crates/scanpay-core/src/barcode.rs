//! # Barcode Module
//!
//! Symbology handling shared by the register and the catalog server.
//!
//! ## Symbologies
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Format    Length   Example            Typical source                   │
//! │  ───────   ──────   ─────────────────  ─────────────────────────────    │
//! │  EAN-13    13       5012345678900      Retail goods outside N. America  │
//! │  UPC-A     12       036000291452       Retail goods in N. America       │
//! │  EAN-8      8       96385074           Small packages                   │
//! │  UPC-E      8       01234565           Zero-suppressed UPC-A            │
//! │  Code 128  1..64    SHELF-A12          Shelf labels, internal codes     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A camera decoder reports the format it matched. Line devices (USB/serial
//! scanners) only deliver the code, so the register falls back to
//! [`BarcodeFormat::infer`].

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;

/// Buy price assigned to products registered from an unknown scan.
pub const DEFAULT_BUY_PRICE: Money = Money::from_cents(100);

/// Opening stock assigned to products registered from an unknown scan.
pub const DEFAULT_STOCK: i64 = 10;

// =============================================================================
// Barcode Format
// =============================================================================

/// The symbology a barcode was decoded from.
///
/// Serialized with the decoder's own names (`ean_13`, `code_128`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum BarcodeFormat {
    #[serde(rename = "ean_13")]
    Ean13,
    #[serde(rename = "ean_8")]
    Ean8,
    #[serde(rename = "upc_a")]
    UpcA,
    #[serde(rename = "upc_e")]
    UpcE,
    #[serde(rename = "code_128")]
    Code128,
    #[serde(rename = "unknown")]
    Unknown,
}

impl BarcodeFormat {
    /// Guesses the symbology from the code alone.
    ///
    /// Numeric codes with a valid GTIN check digit map to EAN/UPC by length.
    /// Anything else made of printable ASCII is treated as Code 128.
    ///
    /// ## Example
    /// ```rust
    /// use scanpay_core::BarcodeFormat;
    ///
    /// assert_eq!(BarcodeFormat::infer("5012345678900"), BarcodeFormat::Ean13);
    /// assert_eq!(BarcodeFormat::infer("036000291452"), BarcodeFormat::UpcA);
    /// assert_eq!(BarcodeFormat::infer("SHELF-A12"), BarcodeFormat::Code128);
    /// ```
    pub fn infer(code: &str) -> Self {
        let all_digits = !code.is_empty() && code.bytes().all(|b| b.is_ascii_digit());

        if all_digits && has_valid_check_digit(code) {
            match code.len() {
                13 => return BarcodeFormat::Ean13,
                12 => return BarcodeFormat::UpcA,
                8 => return BarcodeFormat::Ean8,
                _ => {}
            }
        }

        if !code.is_empty() && code.bytes().all(|b| b.is_ascii_graphic()) {
            BarcodeFormat::Code128
        } else {
            BarcodeFormat::Unknown
        }
    }

    /// Returns the decoder's name for this format.
    pub fn as_str(&self) -> &'static str {
        match self {
            BarcodeFormat::Ean13 => "ean_13",
            BarcodeFormat::Ean8 => "ean_8",
            BarcodeFormat::UpcA => "upc_a",
            BarcodeFormat::UpcE => "upc_e",
            BarcodeFormat::Code128 => "code_128",
            BarcodeFormat::Unknown => "unknown",
        }
    }
}

impl fmt::Display for BarcodeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verifies the GTIN (EAN/UPC) modulo-10 check digit.
///
/// Weights alternate 3,1,3,... starting from the digit left of the check
/// digit. Works for GTIN-8, GTIN-12 and GTIN-13.
pub fn has_valid_check_digit(code: &str) -> bool {
    let digits: Vec<u32> = match code.chars().map(|c| c.to_digit(10)).collect() {
        Some(d) => d,
        None => return false,
    };

    let Some((check, body)) = digits.split_last() else {
        return false;
    };

    let sum: u32 = body
        .iter()
        .rev()
        .enumerate()
        .map(|(i, d)| if i % 2 == 0 { d * 3 } else { *d })
        .sum();

    (10 - sum % 10) % 10 == *check
}

// =============================================================================
// Barcode Info (server-side registration defaults)
// =============================================================================

/// Fields derived from a barcode when an unknown product is registered.
///
/// ## Split Rules
/// ```text
/// EAN-13 (13 chars)   501 2345 67890 0
///                     ─┬─ ──┬─ ──┬──
///                   prefix  mfr  product      type "General" if prefix 50x
///
/// UPC-A (12 chars)    0 36000 29145 2
///                     ┬ ──┬── ──┬──
///                prefix  mfr  product         type "General" if prefix 0
///
/// other               first half | second half   type "Unknown"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BarcodeInfo {
    pub product_type: String,
    pub manufacturer_code: String,
    pub product_code: String,
    /// Name shown until the product is curated.
    pub placeholder_name: String,
}

impl BarcodeInfo {
    /// Splits a barcode into its heuristic fields.
    ///
    /// ## Example
    /// ```rust
    /// use scanpay_core::BarcodeInfo;
    ///
    /// let info = BarcodeInfo::parse("5012345678900");
    /// assert_eq!(info.product_type, "General");
    /// assert_eq!(info.manufacturer_code, "2345");
    /// assert_eq!(info.product_code, "67890");
    /// assert_eq!(info.placeholder_name, "Product 67890");
    /// ```
    pub fn parse(barcode: &str) -> Self {
        // Byte slicing below relies on ASCII; validated barcodes always are.
        if !barcode.is_ascii() {
            return Self::fallback(barcode);
        }

        match barcode.len() {
            13 => {
                let prefix = &barcode[..3];
                let product_code = barcode[7..12].to_string();
                BarcodeInfo {
                    product_type: type_for(prefix.starts_with("50")),
                    manufacturer_code: barcode[3..7].to_string(),
                    placeholder_name: format!("Product {}", product_code),
                    product_code,
                }
            }
            12 => {
                let prefix = &barcode[..1];
                let product_code = barcode[6..11].to_string();
                BarcodeInfo {
                    product_type: type_for(prefix == "0"),
                    manufacturer_code: barcode[1..6].to_string(),
                    placeholder_name: format!("Item {}", product_code),
                    product_code,
                }
            }
            _ => Self::fallback(barcode),
        }
    }

    fn fallback(barcode: &str) -> Self {
        let chars: Vec<char> = barcode.chars().collect();
        let half = chars.len() / 2;
        BarcodeInfo {
            product_type: type_for(false),
            manufacturer_code: chars[..half].iter().collect(),
            product_code: chars[half..].iter().collect(),
            placeholder_name: format!("Unknown {}", barcode),
        }
    }
}

fn type_for(general: bool) -> String {
    let name = if general { "General" } else { "Unknown" };
    name.to_string()
}
