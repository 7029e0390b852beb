//! # Register Commands
//!
//! The actions the coordinator runs on the cashier's behalf.
//!
//! ## Command Categories
//! - [`scan`] - Lookup of a decoded barcode and addition to the cart
//! - [`cart`] - Cart view, clear and remove
//! - [`checkout`] - Transaction submission and payment display

pub mod cart;
pub mod checkout;
pub mod scan;

pub use cart::{clear_cart, remove_line, CartView};
pub use checkout::{CheckoutCoordinator, PaymentDisplay};
pub use scan::add_scanned;
