//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are kept as [`Decimal`] so cart totals never accumulate binary
//! floating point error. Rendering always uses two decimal places.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::Quantity;

/// A price in the store currency's standard unit (e.g., dollars, not cents).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// A zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from an amount in cents.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// Get the decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units.
    #[must_use]
    pub fn times(self, quantity: Quantity) -> Self {
        Self(self.0 * Decimal::from(quantity.get()))
    }

    /// Format with exactly two decimals, rounding half away from zero.
    ///
    /// ```
    /// use gemcase_core::Price;
    ///
    /// assert_eq!(Price::from_cents(250_000).to_fixed(), "2500.00");
    /// ```
    #[must_use]
    pub fn to_fixed(&self) -> String {
        let rounded = self
            .0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        format!("{rounded:.2}")
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_fixed())
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_to_fixed_pads_and_rounds() {
        assert_eq!(Price::from_cents(45_000).to_fixed(), "450.00");
        assert_eq!(Price::new(Decimal::new(19_995, 3)).to_fixed(), "20.00");
        assert_eq!(Price::new(Decimal::new(1_2345, 4)).to_fixed(), "1.23");
        assert_eq!(Price::ZERO.to_fixed(), "0.00");
    }

    #[test]
    fn test_times_and_sum() {
        let three = Quantity::new(3).unwrap();
        let total: Price = [
            Price::from_cents(1_999).times(three),
            Price::from_cents(1).times(Quantity::ONE),
        ]
        .into_iter()
        .sum();
        assert_eq!(total.to_fixed(), "59.98");
    }

    #[test]
    fn test_serde_is_transparent_decimal() {
        let price = Price::from_cents(12_050);
        let json = serde_json::to_string(&price).unwrap();
        let back: Price = serde_json::from_str(&json).unwrap();
        assert_eq!(back, price);
    }
}
