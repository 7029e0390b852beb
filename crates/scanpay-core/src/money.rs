//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Exact Until Rendered
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Money counts millionths of a currency unit (µ)                         │
//! │                                                                         │
//! │  Catalog JSON ── "sell_price": 0.333 ──► from_decimal ──► 333_000µ      │
//! │                                                                         │
//! │  Cart math ───── 333_000µ × 3 ─────────► 999_000µ   (exact integers)    │
//! │                                                                         │
//! │  Display ─────── 999_000µ ─────────────► "$1.00"    (rounds to cents)   │
//! │  SQLite columns  999_000µ ─────────────► 100        (Money::cents)      │
//! │  Outbound JSON ─ 999_000µ ─────────────► 0.999      (Money::to_decimal) │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rounding to cents happens only in `Display` and `cents()`, half to even.
//!
//! ## Usage
//! ```rust
//! use scanpay_core::money::Money;
//!
//! let price = Money::from_cents(1099); // $10.99
//! let doubled = price * 2u32;          // $21.98
//! assert_eq!(doubled.cents(), 2198);
//!
//! // Sub-cent prices stay exact until shown
//! let third = Money::from_decimal(0.333).unwrap();
//! assert_eq!((third * 3u32).to_string(), "$1.00");
//! ```

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul};
use ts_rs::TS;

/// Millionths of a unit per cent.
const MICROS_PER_CENT: i64 = 10_000;

/// Millionths of a unit per unit.
const MICROS_PER_UNIT: f64 = 1_000_000.0;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in millionths of the currency unit.
///
/// Signed so a catalog that sends a negative price can be detected and
/// refused; see [`Money::is_negative`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from whole cents.
    ///
    /// ## Example
    /// ```rust
    /// use scanpay_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // Represents $10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents * MICROS_PER_CENT)
    }

    /// Converts a decimal amount (as found in catalog JSON).
    ///
    /// This is the only place a floating point value becomes money. The
    /// amount is kept to the nearest millionth, which absorbs binary noise
    /// (`0.1 + 0.2`) without touching any real price.
    ///
    /// Returns `None` for NaN, infinities and values outside the i64 range.
    ///
    /// ## Example
    /// ```rust
    /// use scanpay_core::money::Money;
    ///
    /// assert_eq!(Money::from_decimal(3.49), Some(Money::from_cents(349)));
    /// assert_eq!(Money::from_decimal(f64::NAN), None);
    /// ```
    pub fn from_decimal(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }

        let micros = (value * MICROS_PER_UNIT).round();
        if micros >= i64::MAX as f64 || micros <= i64::MIN as f64 {
            return None;
        }

        Some(Money(micros as i64))
    }

    /// Returns the exact amount in major units, for outbound JSON.
    #[inline]
    pub fn to_decimal(&self) -> f64 {
        self.0 as f64 / MICROS_PER_UNIT
    }

    /// Returns the amount rounded half to even to whole cents.
    ///
    /// ```text
    /// 12.5¢ → 12¢   13.5¢ → 14¢   99.9¢ → 100¢   -125.5¢ → -126¢
    /// ```
    pub fn cents(&self) -> i64 {
        let whole = self.0.div_euclid(MICROS_PER_CENT);
        let twice_rest = self.0.rem_euclid(MICROS_PER_CENT) * 2;

        if twice_rest > MICROS_PER_CENT || (twice_rest == MICROS_PER_CENT && whole % 2 != 0) {
            whole + 1
        } else {
            whole
        }
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// True below zero, even by less than half a cent.
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Applies a percentage discount and returns the discounted amount.
    ///
    /// ## Arguments
    /// * `discount_bps` - Discount in basis points (1000 = 10%)
    ///
    /// Exact for any whole-cent amount; finer amounts round half up to the
    /// millionth.
    ///
    /// ## Example
    /// ```rust
    /// use scanpay_core::money::Money;
    ///
    /// let line = Money::from_cents(99) * 100u32;            // 100 × $0.99
    /// let discounted = line.apply_percentage_discount(1500); // 15% off
    /// assert_eq!(discounted.to_string(), "$84.15");
    /// ```
    pub fn apply_percentage_discount(&self, discount_bps: u32) -> Money {
        let discount_amount = (self.0 as i128 * discount_bps as i128 + 5000) / 10000;
        Money(self.0 - discount_amount as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows money rounded to cents: "$10.99" / "-$5.50".
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cents = self.cents();
        let sign = if cents < 0 { "-" } else { "" };
        let cents = cents.unsigned_abs();
        write!(f, "{}${}.{:02}", sign, cents / 100, cents % 100)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Multiplication by a line quantity.
impl Mul<u32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: u32) -> Self {
        Money(self.0 * qty as i64)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Decimal Wire Format
// =============================================================================

/// Serde adapter for fields that travel as decimal numbers (`3.49`).
///
/// ```rust,ignore
/// #[serde(with = "crate::money::decimal")]
/// pub unit_price: Money,
/// ```
pub mod decimal {
    use super::Money;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Money, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.to_decimal())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Money, D::Error> {
        let raw = f64::deserialize(deserializer)?;
        Money::from_decimal(raw)
            .ok_or_else(|| D::Error::custom(format!("invalid monetary amount: {}", raw)))
    }

    /// Same as the parent module, for optional fields.
    pub mod option {
        use super::Money;
        use serde::de::Error;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<Money>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(m) => serializer.serialize_some(&m.to_decimal()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Money>, D::Error> {
            match Option::<f64>::deserialize(deserializer)? {
                Some(raw) => Money::from_decimal(raw)
                    .map(Some)
                    .ok_or_else(|| D::Error::custom(format!("invalid monetary amount: {}", raw))),
                None => Ok(None),
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
