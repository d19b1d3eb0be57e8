//! Catalog price value object.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

/// Number of fractional digits every price is stored with.
pub const PRICE_SCALE: u32 = 2;

/// Errors raised when constructing a [`Price`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    #[error("Price must not be negative, got {0}")]
    Negative(Decimal),
}

/// Non-negative decimal price with a fixed scale of two fractional digits.
///
/// Inputs with more precision are rounded to the nearest cent, matching a
/// `NUMERIC(18, 2)` column.
///
/// On the wire a price is a JSON number (`8.5`). Both numbers and decimal
/// strings (`"8.50"`) are accepted when deserializing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Creates a price, rounding to [`PRICE_SCALE`] digits.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        let mut amount = amount;
        amount.rescale(PRICE_SCALE);
        Ok(Self(amount))
    }

    /// Creates a price from a whole number of cents.
    pub fn from_cents(cents: u32) -> Self {
        Self(Decimal::new(i64::from(cents), PRICE_SCALE))
    }

    /// Returns zero.
    pub fn zero() -> Self {
        Self::from_cents(0)
    }

    /// Returns the decimal amount.
    pub fn amount(&self) -> Decimal {
        self.0
    }
}

impl Default for Price {
    fn default() -> Self {
        Self::zero()
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
