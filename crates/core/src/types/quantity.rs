//! Cart line quantity.

use core::fmt;
use core::num::NonZeroU32;

use serde::{Deserialize, Serialize};

/// Number of units of a product in a cart.
///
/// Always at least one: a quantity of zero is represented by the item's
/// absence, so it cannot be constructed or deserialized. Never above
/// [`Quantity::MAX`], so every quantity fits the database column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(NonZeroU32);

impl Quantity {
    /// A single unit.
    pub const ONE: Self = Self(NonZeroU32::MIN);

    /// Largest storable count (`i32::MAX`).
    pub const MAX_COUNT: u32 = i32::MAX.unsigned_abs();

    /// Create a quantity, returning `None` for zero or anything above
    /// [`Self::MAX_COUNT`].
    #[must_use]
    pub const fn new(value: u32) -> Option<Self> {
        if value > Self::MAX_COUNT {
            return None;
        }
        match NonZeroU32::new(value) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Get the raw count.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }

    /// One more unit, saturating at [`Self::MAX_COUNT`].
    #[must_use]
    pub const fn incremented(self) -> Self {
        match Self::new(self.get().saturating_add(1)) {
            Some(next) => next,
            None => self,
        }
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ONE
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for Quantity {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(value)
    }
}

impl From<Quantity> for u32 {
    fn from(quantity: Quantity) -> Self {
        quantity.get()
    }
}

impl TryFrom<i32> for Quantity {
    type Error = i32;

    /// Convert a database integer, rejecting zero and negatives.
    fn try_from(value: i32) -> Result<Self, Self::Error> {
        u32::try_from(value)
            .ok()
            .and_then(Self::new)
            .ok_or(value)
    }
}

impl From<Quantity> for i32 {
    fn from(quantity: Quantity) -> Self {
        // Lossless: construction caps the count at i32::MAX.
        Self::try_from(quantity.get()).unwrap_or(Self::MAX)
    }
}
