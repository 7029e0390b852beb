//! # Cart Commands
//!
//! Operator actions on the Cart Store that never touch the network.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  ┌──────────┐  scan   ┌──────────┐  checkout ok  ┌──────────────────┐  │
//! │  │  Empty   │────────►│ In Cart  │──────────────►│ Payment display  │  │
//! │  │  Cart    │         │          │               │ (cart emptied)   │  │
//! │  └──────────┘         └──────────┘               └──────────────────┘  │
//! │       ▲                 │      │                                        │
//! │       │          remove │      │ checkout failed                        │
//! │       │                 ▼      ▼ (cart untouched)                       │
//! │       └──────────── clear ─────┘                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use scanpay_core::{Cart, CartTotals, LineItem};
use serde::Serialize;
use tracing::debug;

/// Cart rows and totals, as shown to the cashier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CartView {
    pub items: Vec<LineItem>,
    pub totals: CartTotals,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        CartView {
            items: cart.snapshot(),
            totals: CartTotals::from(cart),
        }
    }
}

/// Empties the cart. Returns the number of lines removed.
pub fn clear_cart(cart: &mut Cart) -> usize {
    let removed = cart.len();
    cart.clear();
    debug!(removed, "Cart cleared");
    removed
}

/// Removes one line. `None` when the barcode is not in the cart.
pub fn remove_line(cart: &mut Cart, barcode: &str) -> Option<LineItem> {
    let removed = cart.remove(barcode);
    if let Some(line) = &removed {
        debug!(barcode, quantity = line.quantity, "Line removed");
    }
    removed
}
