//! In-memory collection state.
//!
//! This is what the presentation layer reads. It is not durable by itself;
//! [`CollectionSync`](super::CollectionSync) persists it after each mutation.

use std::collections::HashSet;
use std::fmt;

use gemcase_core::{Price, Product, ProductId, Quantity};

use super::kind::{Cart, Kind};

/// Items of one collection, in insertion order, unique by product id.
pub struct CollectionState<K: Kind> {
    items: Vec<K::Item>,
}

impl<K: Kind> CollectionState<K> {
    /// An empty collection.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build from loaded items, keeping the first entry per product id.
    #[must_use]
    pub fn from_items(items: Vec<K::Item>) -> Self {
        let mut state = Self::new();
        state.replace(items);
        state
    }

    /// Replace the whole collection with a loaded snapshot.
    ///
    /// Duplicate product ids keep their first occurrence.
    pub fn replace(&mut self, items: Vec<K::Item>) {
        let mut seen = HashSet::with_capacity(items.len());
        self.items = items
            .into_iter()
            .filter(|item| seen.insert(K::product_id(item).clone()))
            .collect();
    }

    /// Add a product. Returns whether the collection changed.
    ///
    /// An existing cart line gains one unit; an existing wishlist entry is
    /// left as is.
    pub fn add(&mut self, product: Product) -> bool {
        match self.position(&product.id) {
            Some(index) => self.items.get_mut(index).is_some_and(K::add_again),
            None => {
                self.items.push(K::new_item(product));
                true
            }
        }
    }

    /// Remove a product. Returns whether it was present.
    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| K::product_id(item) != product_id);
        self.items.len() != before
    }

    /// Whether a product is present.
    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.position(product_id).is_some()
    }

    /// Look up an item by product id.
    #[must_use]
    pub fn get(&self, product_id: &ProductId) -> Option<&K::Item> {
        self.items
            .iter()
            .find(|item| K::product_id(item) == product_id)
    }

    /// All items, in insertion order.
    #[must_use]
    pub fn list(&self) -> &[K::Item] {
        &self.items
    }

    /// Owned copy of the items, used as a persistence snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Vec<K::Item> {
        self.items.clone()
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn position(&self, product_id: &ProductId) -> Option<usize> {
        self.items
            .iter()
            .position(|item| K::product_id(item) == product_id)
    }
}

impl CollectionState<Cart> {
    /// Set a line's quantity. Zero removes the line.
    ///
    /// Unknown products and counts above [`Quantity::MAX_COUNT`] are ignored.
    /// Returns whether the cart changed.
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: u32) -> bool {
        if quantity == 0 {
            return self.remove(product_id);
        }
        let Some(quantity) = Quantity::new(quantity) else {
            return false;
        };

        match self
            .items
            .iter_mut()
            .find(|item| &item.product.id == product_id)
        {
            Some(item) if item.quantity != quantity => {
                item.quantity = quantity;
                true
            }
            _ => false,
        }
    }

    /// Sum of price x quantity over all lines.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.items.iter().map(gemcase_core::CartItem::line_price).sum()
    }

    /// Total number of units, for the header badge.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0_u32, |acc, item| acc.saturating_add(item.quantity.get()))
    }
}

impl<K: Kind> Default for CollectionState<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Kind> Clone for CollectionState<K> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
        }
    }
}

impl<K: Kind> fmt::Debug for CollectionState<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionState")
            .field("kind", &K::KIND)
            .field("items", &self.items)
            .finish()
    }
}
