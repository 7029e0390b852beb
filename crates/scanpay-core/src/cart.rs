//! # Cart Store
//!
//! The register's in-memory cart: an ordered list of [`LineItem`]s keyed by
//! barcode.
//!
//! ## Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Store Operations                                │
//! │                                                                         │
//! │  Trigger                   Call                     State Change        │
//! │  ───────                   ────                     ────────────        │
//! │                                                                         │
//! │  Lookup found ───────────► add_or_increment() ───► push or qty += 1     │
//! │                                                                         │
//! │  "remove <barcode>" ─────► remove() ─────────────► items.remove(i)      │
//! │                                                                         │
//! │  "clear" / checkout OK ──► clear() ──────────────► items.clear()        │
//! │                                                                         │
//! │  Render ─────────────────► items() / total() ────► (read only)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - At most one line per barcode, in first-scan order
//! - Every quantity is in `1..=MAX_LINE_QUANTITY`
//! - No unit price is negative
//! - `total()` is recomputed from the lines on every call, so it always
//!   equals the sum of the line subtotals

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::LineItem;
use crate::validation::validate_price;
use crate::{MAX_CART_LINES, MAX_LINE_QUANTITY};

/// The cart.
///
/// The register owns exactly one; it is never shared between tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    /// Creates an empty cart.
    pub fn new() -> Self {
        Cart { items: Vec::new() }
    }

    /// Adds one unit of a product, or bumps the quantity of its line.
    ///
    /// ## Behavior
    /// - Barcode already in cart: quantity += 1. The name and price captured
    ///   at first scan are kept.
    /// - New barcode: a line with quantity 1 is appended.
    ///
    /// The price and the limits are checked before anything changes, so on
    /// error the cart is untouched. A negative price is refused.
    ///
    /// ## Returns
    /// The lines after the change.
    pub fn add_or_increment(
        &mut self,
        barcode: &str,
        name: &str,
        unit_price: Money,
    ) -> CoreResult<&[LineItem]> {
        validate_price("price", unit_price)?;

        if let Some(item) = self.items.iter_mut().find(|i| i.barcode == barcode) {
            let requested = item.quantity + 1;
            if requested > MAX_LINE_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested,
                    max: MAX_LINE_QUANTITY,
                });
            }
            item.quantity = requested;
            return Ok(&self.items);
        }

        if self.items.len() >= MAX_CART_LINES {
            return Err(CoreError::CartTooLarge { max: MAX_CART_LINES });
        }

        self.items.push(LineItem::new(barcode, name, unit_price));
        Ok(&self.items)
    }

    /// Removes the whole line for a barcode.
    ///
    /// Returns the removed line, or `None` if the barcode was not in the cart.
    pub fn remove(&mut self, barcode: &str) -> Option<LineItem> {
        let index = self.items.iter().position(|i| i.barcode == barcode)?;
        Some(self.items.remove(index))
    }

    /// Empties the cart.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Lines in first-scan order.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Owned copy of the lines (for a checkout request or a view).
    pub fn snapshot(&self) -> Vec<LineItem> {
        self.items.clone()
    }

    pub fn get(&self, barcode: &str) -> Option<&LineItem> {
        self.items.iter().find(|i| i.barcode == barcode)
    }

    /// Number of distinct lines.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of all quantities.
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|i| i.quantity as u64).sum()
    }

    /// Sum of line subtotals.
    pub fn total(&self) -> Money {
        self.items.iter().map(LineItem::subtotal).sum()
    }
}

/// Cart summary for the register view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartTotals {
    pub line_count: usize,
    #[ts(type = "number")]
    pub total_quantity: u64,
    #[serde(with = "crate::money::decimal")]
    #[ts(type = "number")]
    pub total: Money,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        CartTotals {
            line_count: cart.len(),
            total_quantity: cart.total_quantity(),
            total: cart.total(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEA: &str = "5012345678900";
    const MILK: &str = "036000291452";

    #[test]
    fn test_add_new_line() {
        let mut cart = Cart::new();
        let items = cart
            .add_or_increment(TEA, "Tea 80 bags", Money::from_cents(349))
            .unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 1);
        assert_eq!(cart.total().cents(), 349);
    }

    #[test]
    fn test_same_barcode_increments() {
        let mut cart = Cart::new();
        cart.add_or_increment(TEA, "Tea", Money::from_cents(349)).unwrap();
        cart.add_or_increment(MILK, "Milk", Money::from_cents(120)).unwrap();
        let items = cart.add_or_increment(TEA, "Tea", Money::from_cents(349)).unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].barcode, TEA);
        assert_eq!(items[0].quantity, 2);
        assert_eq!(cart.total().cents(), 818);
    }

    #[test]
    fn test_existing_line_keeps_first_price() {
        let mut cart = Cart::new();
        cart.add_or_increment(TEA, "Tea", Money::from_cents(349)).unwrap();
        cart.add_or_increment(TEA, "Tea (renamed)", Money::from_cents(399)).unwrap();

        let line = cart.get(TEA).unwrap();
        assert_eq!(line.name, "Tea");
        assert_eq!(line.unit_price.cents(), 349);
        assert_eq!(line.quantity, 2);
    }

    #[test]
    fn test_quantity_limit_leaves_cart_untouched() {
        let mut cart = Cart::new();
        for _ in 0..MAX_LINE_QUANTITY {
            cart.add_or_increment(TEA, "Tea", Money::from_cents(1)).unwrap();
        }

        let err = cart.add_or_increment(TEA, "Tea", Money::from_cents(1)).unwrap_err();
        assert!(matches!(err, CoreError::QuantityTooLarge { requested: 1000, max: 999 }));
        assert_eq!(cart.get(TEA).unwrap().quantity, MAX_LINE_QUANTITY);
    }

    #[test]
    fn test_negative_price_refused() {
        let mut cart = Cart::new();
        let err = cart
            .add_or_increment(TEA, "Tea", Money::from_decimal(-2.5).unwrap())
            .unwrap_err();

        assert!(matches!(err, CoreError::Validation(_)));
        assert!(cart.is_empty());
        assert!(cart.total().is_zero());
    }

    #[test]
    fn test_sub_cent_total_rounds_once() {
        let mut cart = Cart::new();
        let price = Money::from_decimal(0.333).unwrap();
        for _ in 0..3 {
            cart.add_or_increment("SCREW-M4", "Screw M4", price).unwrap();
        }

        assert_eq!(cart.get("SCREW-M4").unwrap().unit_price.to_string(), "$0.33");
        assert_eq!(cart.total().to_string(), "$1.00");
    }

    #[test]
    fn test_line_limit() {
        let mut cart = Cart::new();
        for i in 0..MAX_CART_LINES {
            cart.add_or_increment(&format!("CODE-{}", i), "Item", Money::from_cents(10))
                .unwrap();
        }

        let err = cart
            .add_or_increment("CODE-NEW", "Item", Money::from_cents(10))
            .unwrap_err();
        assert!(matches!(err, CoreError::CartTooLarge { max: 100 }));
        assert_eq!(cart.len(), MAX_CART_LINES);

        // Existing lines can still be incremented
        cart.add_or_increment("CODE-0", "Item", Money::from_cents(10)).unwrap();
        assert_eq!(cart.get("CODE-0").unwrap().quantity, 2);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cart = Cart::new();
        cart.add_or_increment(TEA, "Tea", Money::from_cents(349)).unwrap();
        cart.add_or_increment(MILK, "Milk", Money::from_cents(120)).unwrap();

        let removed = cart.remove(TEA).unwrap();
        assert_eq!(removed.barcode, TEA);
        assert!(cart.remove(TEA).is_none());
        assert_eq!(cart.total().cents(), 120);

        cart.clear();
        assert!(cart.is_empty());
        assert!(cart.total().is_zero());
    }

    #[test]
    fn test_total_matches_line_subtotals() {
        let mut cart = Cart::new();
        let prices = [349, 120, 5, 9999, 1];
        for (i, cents) in prices.iter().enumerate() {
            for _ in 0..=i {
                cart.add_or_increment(&i.to_string(), "Item", Money::from_cents(*cents))
                    .unwrap();
            }
        }

        let expected: i64 = cart
            .items()
            .iter()
            .map(|i| i.unit_price.cents() * i.quantity as i64)
            .sum();
        assert_eq!(cart.total().cents(), expected);

        let totals = CartTotals::from(&cart);
        assert_eq!(totals.line_count, 5);
        assert_eq!(totals.total_quantity, 15);
        assert_eq!(totals.total, cart.total());
    }
}
