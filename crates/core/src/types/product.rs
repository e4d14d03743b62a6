//! Catalog products and the items stored in collections.

use serde::{Deserialize, Serialize};

use crate::{Price, ProductId, Quantity};

/// A catalog product.
///
/// Wishlist entries are products as-is. `category` and `color` exist only in
/// the catalog and the local store; the remote schema does not carry them, so
/// items loaded from it have both set to empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Catalog id, unique within a collection.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Unit price.
    pub price: Price,
    /// Image reference (URL).
    pub image: String,
    /// Marketing description.
    #[serde(default)]
    pub description: String,
    /// Catalog category (e.g., "Ring").
    #[serde(default)]
    pub category: String,
    /// Primary material (e.g., "Gold").
    #[serde(default)]
    pub material: String,
    /// Color variant.
    #[serde(default)]
    pub color: String,
}

/// A product in a cart together with its quantity.
///
/// Serializes flat, i.e. the product fields plus `quantity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// The product.
    #[serde(flatten)]
    pub product: Product,
    /// Number of units, never zero.
    pub quantity: Quantity,
}

impl CartItem {
    /// A new cart line with a single unit.
    #[must_use]
    pub const fn new(product: Product) -> Self {
        Self {
            product,
            quantity: Quantity::ONE,
        }
    }

    /// Line total (unit price x quantity).
    #[must_use]
    pub fn line_price(&self) -> Price {
        self.product.price.times(self.quantity)
    }
}
