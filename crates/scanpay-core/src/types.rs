//! # Domain Types
//!
//! Wire and domain types shared by the register and the catalog server.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Who Uses What                                   │
//! │                                                                         │
//! │  Decoder ──► DecodeEvent { code, format }                               │
//! │                  │                                                      │
//! │                  ▼                                                      │
//! │  GET /api/products/barcode/{code} ──► ProductInfo { name, sell_price }  │
//! │                  │                                                      │
//! │                  ▼                                                      │
//! │  Cart Store ──► LineItem { barcode, name, price, quantity }             │
//! │                  │                                                      │
//! │                  ▼                                                      │
//! │  POST /api/transaction  TransactionRequest { items: [LineItem] }        │
//! │                  │                                                      │
//! │                  ▼                                                      │
//! │  TransactionReceipt { qr_code, total } ──► payment display              │
//! │                                                                         │
//! │  Server side only: Product, NewProduct, ProductUpdate, LedgerEntry      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Money on the Wire
//! Prices travel as decimal numbers (`3.49`) through [`crate::money::decimal`].
//! A sub-cent price such as `0.333` arrives intact; nothing is rounded to
//! cents before it is shown or stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::barcode::{BarcodeFormat, BarcodeInfo, DEFAULT_BUY_PRICE, DEFAULT_STOCK};
use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::validation::{
    validate_barcode, validate_discount_bps, validate_price, validate_product_name,
    validate_quantity, validate_stock,
};

// =============================================================================
// Scanning
// =============================================================================

/// One successful decode reported by a decoder adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DecodeEvent {
    /// The decoded barcode string.
    pub code: String,

    /// The symbology the decoder matched.
    pub format: BarcodeFormat,
}

impl DecodeEvent {
    pub fn new(code: impl Into<String>, format: BarcodeFormat) -> Self {
        DecodeEvent {
            code: code.into(),
            format,
        }
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// One row of the cart.
///
/// ## Invariants
/// - `quantity >= 1`
/// - at most one LineItem per barcode in a cart
///
/// ## Wire Shape
/// ```json
/// { "barcode": "5012345678900", "name": "Tea 80 bags", "price": 3.49, "quantity": 2 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItem {
    pub barcode: String,

    /// Display name as returned by the catalog when first scanned.
    pub name: String,

    /// Unit price captured at first scan.
    #[serde(rename = "price", with = "crate::money::decimal")]
    #[ts(rename = "price", type = "number")]
    pub unit_price: Money,

    pub quantity: u32,
}

impl LineItem {
    /// Creates a new line with quantity 1.
    pub fn new(barcode: impl Into<String>, name: impl Into<String>, unit_price: Money) -> Self {
        LineItem {
            barcode: barcode.into(),
            name: name.into(),
            unit_price,
            quantity: 1,
        }
    }

    /// Line subtotal (unit price × quantity).
    #[inline]
    pub fn subtotal(&self) -> Money {
        self.unit_price * self.quantity
    }
}

// =============================================================================
// Catalog Lookup
// =============================================================================

/// Result of a successful barcode lookup.
///
/// The catalog returns its full product record; the register only needs
/// `name` and `sell_price`. The rest is kept when present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductInfo {
    pub name: String,

    #[serde(with = "crate::money::decimal")]
    #[ts(type = "number")]
    pub sell_price: Money,

    #[serde(default)]
    pub id: Option<i64>,

    #[serde(default)]
    pub barcode: Option<String>,

    #[serde(default)]
    pub stock: Option<i64>,
}

/// Body of `POST /api/products` as sent by the register for an unknown scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RegisterProduct {
    pub barcode: String,
}

/// Body of `GET /api/server-ip`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ServerIp {
    pub ip: String,
}

/// Error body used by every catalog endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ErrorBody {
    pub error: String,
}

// =============================================================================
// Checkout
// =============================================================================

/// Body of `POST /api/transaction`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransactionRequest {
    pub items: Vec<LineItem>,
}

/// Successful response of `POST /api/transaction`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransactionReceipt {
    #[serde(default)]
    pub message: Option<String>,

    /// Amount charged, as computed by the server.
    #[serde(with = "crate::money::decimal")]
    #[ts(type = "number")]
    pub total: Money,

    /// Base64-encoded PNG of the payment QR code.
    pub qr_code: String,

    #[serde(default)]
    pub transaction_id: Option<i64>,
}

// =============================================================================
// Catalog Records (server side)
// =============================================================================

/// A product in the catalog.
///
/// A product whose `sell_price` is zero was registered from an unknown scan
/// and is waiting for a person to name and price it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    pub id: i64,
    pub barcode: String,
    pub product_type: String,
    pub manufacturer_code: String,
    pub product_code: String,
    pub name: String,

    #[serde(with = "crate::money::decimal")]
    #[ts(type = "number")]
    pub buy_price: Money,

    #[serde(with = "crate::money::decimal")]
    #[ts(type = "number")]
    pub sell_price: Money,

    /// Discount in basis points, exposed as a percentage (`"discount": 12.5`).
    #[serde(rename = "discount", with = "percent_bps")]
    #[ts(rename = "discount", type = "number")]
    pub discount_bps: u32,

    pub stock: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// True while the product has no sell price.
    #[inline]
    pub fn is_pending_curation(&self) -> bool {
        self.sell_price.is_zero()
    }

    /// Unit price charged at checkout (sell price less discount).
    #[inline]
    pub fn unit_price(&self) -> Money {
        self.sell_price.apply_percentage_discount(self.discount_bps)
    }

    /// Amount charged for `quantity` units. The discount applies to the
    /// whole line, so no per-unit rounding accumulates.
    pub fn line_total(&self, quantity: u32) -> Money {
        (self.sell_price * quantity).apply_percentage_discount(self.discount_bps)
    }
}

/// Body of `POST /api/products` as accepted by the catalog server.
///
/// Only `barcode` is required. Missing fields are filled from
/// [`crate::BarcodeInfo`]; a missing `sell_price` leaves the product pending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    #[serde(default)]
    pub barcode: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default, with = "crate::money::decimal::option")]
    #[ts(type = "number | null")]
    pub buy_price: Option<Money>,

    #[serde(default, with = "crate::money::decimal::option")]
    #[ts(type = "number | null")]
    pub sell_price: Option<Money>,

    #[serde(default, rename = "discount", with = "percent_bps::option")]
    #[ts(rename = "discount", type = "number | null")]
    pub discount_bps: Option<u32>,

    #[serde(default)]
    pub stock: Option<i64>,
}

/// Body of `PUT /api/products/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductUpdate {
    pub name: String,

    #[serde(with = "crate::money::decimal")]
    #[ts(type = "number")]
    pub buy_price: Money,

    #[serde(with = "crate::money::decimal")]
    #[ts(type = "number")]
    pub sell_price: Money,

    #[serde(default, rename = "discount", with = "percent_bps")]
    #[ts(rename = "discount", type = "number")]
    pub discount_bps: u32,

    pub stock: i64,
}

/// Response of `POST /api/products`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductCreated {
    pub message: String,
    pub barcode: String,
}

/// One row of the transaction ledger (one per product per checkout).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LedgerEntry {
    pub id: i64,
    pub transaction_id: i64,
    pub barcode: String,
    pub name: String,
    pub quantity: u32,

    #[serde(with = "crate::money::decimal")]
    #[ts(type = "number")]
    pub total: Money,

    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
}

/// One checkout line as read by the catalog server.
///
/// The register sends full [`LineItem`]s; the server only trusts the barcode
/// and quantity and prices everything from its own catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutLine {
    pub barcode: String,
    pub quantity: u32,
}

/// Body of `POST /api/transaction` as read by the catalog server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub items: Vec<CheckoutLine>,
}

impl CheckoutRequest {
    /// Validates every line and merges repeated barcodes.
    ///
    /// Order of first appearance is kept. A merged line must still be within
    /// the quantity limit.
    pub fn normalized(&self) -> CoreResult<Vec<CheckoutLine>> {
        if self.items.is_empty() {
            return Err(ValidationError::Required {
                field: "items".to_string(),
            }
            .into());
        }

        let mut merged: Vec<CheckoutLine> = Vec::with_capacity(self.items.len());
        for line in &self.items {
            validate_barcode(&line.barcode)?;
            validate_quantity(line.quantity)?;

            match merged.iter_mut().find(|m| m.barcode == line.barcode) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(line.quantity)
                }
                None => merged.push(line.clone()),
            }
        }

        for line in &merged {
            validate_quantity(line.quantity)?;
        }
        Ok(merged)
    }
}

/// A validated product ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    pub barcode: String,
    pub product_type: String,
    pub manufacturer_code: String,
    pub product_code: String,
    pub name: String,
    pub buy_price: Money,
    pub sell_price: Money,
    pub discount_bps: u32,
    pub stock: i64,
}

impl ProductDraft {
    /// Builds a draft from a registration request.
    ///
    /// ## Defaults
    /// ```text
    /// name        ← BarcodeInfo placeholder ("Product 67890")
    /// buy_price   ← $1.00
    /// sell_price  ← $0.00 (pending curation)
    /// discount    ← 0
    /// stock       ← 10
    /// ```
    pub fn from_registration(request: &NewProduct) -> CoreResult<Self> {
        let barcode = request.barcode.as_deref().unwrap_or("").trim();
        validate_barcode(barcode)?;

        let info = BarcodeInfo::parse(barcode);
        let name = match &request.name {
            Some(name) => {
                validate_product_name(name)?;
                name.trim().to_string()
            }
            None => info.placeholder_name,
        };

        let draft = ProductDraft {
            barcode: barcode.to_string(),
            product_type: info.product_type,
            manufacturer_code: info.manufacturer_code,
            product_code: info.product_code,
            name,
            buy_price: request.buy_price.unwrap_or(DEFAULT_BUY_PRICE),
            sell_price: request.sell_price.unwrap_or_else(Money::zero),
            discount_bps: request.discount_bps.unwrap_or(0),
            stock: request.stock.unwrap_or(DEFAULT_STOCK),
        };

        validate_price("buy_price", draft.buy_price)?;
        validate_price("sell_price", draft.sell_price)?;
        validate_discount_bps(draft.discount_bps)?;
        validate_stock(draft.stock)?;

        Ok(draft)
    }
}

impl ProductUpdate {
    /// Checks the update against the catalog rules.
    pub fn validate(&self) -> CoreResult<()> {
        validate_product_name(&self.name)?;
        validate_price("buy_price", self.buy_price)?;
        validate_price("sell_price", self.sell_price)?;
        validate_discount_bps(self.discount_bps)?;
        validate_stock(self.stock)?;
        Ok(())
    }
}

// =============================================================================
// Percent <-> Basis Points
// =============================================================================

/// Serde adapter exposing basis points as a percentage number.
///
/// `1250` bps ⇄ `12.5`. Incoming values are rounded to the nearest basis point
/// and must lie in 0..=100.
pub mod percent_bps {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub(crate) fn from_percent(pct: f64) -> Option<u32> {
        if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
            return None;
        }
        Some((pct * 100.0).round() as u32)
    }

    pub fn serialize<S: Serializer>(bps: &u32, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(*bps as f64 / 100.0)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        let pct = f64::deserialize(deserializer)?;
        from_percent(pct).ok_or_else(|| D::Error::custom(format!("invalid discount: {}", pct)))
    }

    pub mod option {
        use serde::de::Error;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(bps: &Option<u32>, serializer: S) -> Result<S::Ok, S::Error> {
            match bps {
                Some(b) => serializer.serialize_some(&(*b as f64 / 100.0)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<u32>, D::Error> {
            match Option::<f64>::deserialize(deserializer)? {
                Some(pct) => super::from_percent(pct)
                    .map(Some)
                    .ok_or_else(|| D::Error::custom(format!("invalid discount: {}", pct))),
                None => Ok(None),
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    #[test]
    fn test_line_item_wire_shape() {
        let item = LineItem {
            barcode: "5012345678900".to_string(),
            name: "Tea".to_string(),
            unit_price: Money::from_cents(349),
            quantity: 2,
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"barcode": "5012345678900", "name": "Tea", "price": 3.49, "quantity": 2})
        );
        assert_eq!(item.subtotal().cents(), 698);
    }

    #[test]
    fn test_product_info_ignores_extra_fields() {
        let info: ProductInfo = serde_json::from_str(
            r#"{"id": 4, "barcode": "123", "name": "Milk", "sell_price": 1.2,
                "buy_price": 0.8, "discount": 0, "stock": 7, "product_type": "General"}"#,
        )
        .unwrap();
        assert_eq!(info.name, "Milk");
        assert_eq!(info.sell_price.cents(), 120);
        assert_eq!(info.stock, Some(7));
    }

    #[test]
    fn test_receipt_parses_minimal_body() {
        let receipt: TransactionReceipt =
            serde_json::from_str(r#"{"qr_code": "iVBORw0KGgo=", "total": 12.5}"#).unwrap();
        assert_eq!(receipt.total.cents(), 1250);
        assert!(receipt.message.is_none());
        assert!(receipt.transaction_id.is_none());
    }

    #[test]
    fn test_new_product_only_barcode() {
        let body: NewProduct = serde_json::from_str(r#"{"barcode": "123"}"#).unwrap();
        assert_eq!(body.barcode.as_deref(), Some("123"));
        assert!(body.sell_price.is_none());
        assert!(body.discount_bps.is_none());
    }

    #[test]
    fn test_discount_percent_conversion() {
        let update: ProductUpdate = serde_json::from_str(
            r#"{"name": "Tea", "buy_price": 1, "sell_price": 3.49, "discount": 12.5, "stock": 4}"#,
        )
        .unwrap();
        assert_eq!(update.discount_bps, 1250);

        let bad = serde_json::from_str::<ProductUpdate>(
            r#"{"name": "Tea", "buy_price": 1, "sell_price": 3.49, "discount": 150, "stock": 4}"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_checkout_request_merges_repeats() {
        let request: CheckoutRequest = serde_json::from_str(
            r#"{"items": [
                {"barcode": "A1", "name": "x", "price": 1.0, "quantity": 2},
                {"barcode": "B2", "quantity": 1},
                {"barcode": "A1", "quantity": 3}
            ]}"#,
        )
        .unwrap();

        let lines = request.normalized().unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], CheckoutLine { barcode: "A1".to_string(), quantity: 5 });
        assert_eq!(lines[1].barcode, "B2");
    }

    #[test]
    fn test_checkout_request_rejects_empty_and_zero() {
        assert!(CheckoutRequest::default().normalized().is_err());

        let zero = CheckoutRequest {
            items: vec![CheckoutLine { barcode: "A1".to_string(), quantity: 0 }],
        };
        assert!(zero.normalized().is_err());
    }

    #[test]
    fn test_draft_defaults_from_barcode() {
        let request = NewProduct {
            barcode: Some("5012345678900".to_string()),
            ..Default::default()
        };
        let draft = ProductDraft::from_registration(&request).unwrap();

        assert_eq!(draft.name, "Product 67890");
        assert_eq!(draft.product_type, "General");
        assert_eq!(draft.buy_price.cents(), 100);
        assert!(draft.sell_price.is_zero());
        assert_eq!(draft.stock, 10);
    }

    #[test]
    fn test_draft_rejects_bad_input() {
        assert!(ProductDraft::from_registration(&NewProduct::default()).is_err());

        let negative = NewProduct {
            barcode: Some("123".to_string()),
            stock: Some(-1),
            ..Default::default()
        };
        assert!(ProductDraft::from_registration(&negative).is_err());
    }

    #[test]
    fn test_product_unit_price_and_pending() {
        let now = Utc::now();
        let mut product = Product {
            id: 1,
            barcode: "5012345678900".to_string(),
            product_type: "General".to_string(),
            manufacturer_code: "2345".to_string(),
            product_code: "67890".to_string(),
            name: "Product 67890".to_string(),
            buy_price: Money::from_cents(100),
            sell_price: Money::zero(),
            discount_bps: 1000,
            stock: 10,
            created_at: now,
            updated_at: now,
        };
        assert!(product.is_pending_curation());

        product.sell_price = Money::from_cents(500);
        assert!(!product.is_pending_curation());
        assert_eq!(product.unit_price().cents(), 450);

        // 100 × $0.99 at 15% off: the line is $84.15, not 100 × $0.84
        product.sell_price = Money::from_cents(99);
        product.discount_bps = 1500;
        assert_eq!(product.line_total(100).cents(), 8415);
    }

    #[test]
    fn test_sub_cent_price_is_kept() {
        let info: ProductInfo =
            serde_json::from_str(r#"{"name": "Screw", "sell_price": 0.333}"#).unwrap();
        assert_eq!(info.sell_price.to_decimal(), 0.333);

        let mut item = LineItem::new("SCREW-M4", info.name, info.sell_price);
        item.quantity = 3;
        assert_eq!(item.subtotal().to_string(), "$1.00");

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["price"], 0.333);
    }

    #[test]
    fn test_checkout_request_merged_quantity_limit() {
        let request = CheckoutRequest {
            items: vec![
                CheckoutLine { barcode: "A1".to_string(), quantity: 600 },
                CheckoutLine { barcode: "A1".to_string(), quantity: 600 },
            ],
        };
        assert!(matches!(
            request.normalized(),
            Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));
    }
}
