//! # Scan Command
//!
//! What happens to a barcode once the session manager has let it through.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  "5012345678900"                                                        │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  validate_barcode ──invalid──► Cart(Validation)                         │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  catalog.lookup ──error──► CatalogUnavailable / ServerDiscoveryFailed   │
//! │        │                                                                │
//! │        ├── NotFound ──► register_unknown (detached) ──► ProductNotFound │
//! │        │                                                                │
//! │        ▼ Found { name, sell_price }                                     │
//! │  sell_price < 0 ──────────► CatalogUnavailable                          │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  cart.add_or_increment ──limit──► Cart(CartTooLarge / QuantityTooLarge) │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  Ok(updated line)                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use scanpay_client::{ApiClient, Lookup};
use scanpay_core::validation::validate_barcode;
use scanpay_core::{Cart, CoreError, LineItem};
use tracing::{debug, info, warn};

use crate::error::{RegisterError, RegisterResult};

/// Looks `barcode` up and adds it to the cart.
///
/// Returns the line as it stands after the addition.
pub async fn add_scanned(api: &ApiClient, cart: &mut Cart, barcode: &str) -> RegisterResult<LineItem> {
    validate_barcode(barcode).map_err(CoreError::from)?;

    let info = match api.catalog().lookup(barcode).await? {
        Lookup::Found(info) => info,
        Lookup::NotFound => {
            debug!(barcode, "Barcode not in catalog; queueing registration");
            if let Err(e) = api.catalog().register_unknown(barcode) {
                warn!(barcode, error = %e, "Could not queue registration");
            }
            return Err(RegisterError::ProductNotFound(barcode.to_string()));
        }
    };

    if info.sell_price.is_negative() {
        warn!(barcode, price = %info.sell_price, "Catalog returned a negative price");
        return Err(RegisterError::CatalogUnavailable(format!(
            "invalid price for {}",
            barcode
        )));
    }

    cart.add_or_increment(barcode, &info.name, info.sell_price)?;

    let line = cart
        .get(barcode)
        .cloned()
        .ok_or_else(|| RegisterError::ProductNotFound(barcode.to_string()))?;

    info!(
        barcode,
        name = %line.name,
        quantity = line.quantity,
        price = %line.unit_price,
        "Added to cart"
    );
    Ok(line)
}
