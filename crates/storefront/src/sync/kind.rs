//! Type-level collection kinds.
//!
//! The cart and the wishlist share one implementation. [`Kind`] captures the
//! few places where they differ: what an item is, what a repeated add does,
//! and how an item maps to a remote row.

use std::fmt;

use gemcase_core::{CartItem, CollectionKind, Price, Product, ProductId, Quantity, UserId};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::remote::CollectionRow;

/// A synchronized collection kind.
pub trait Kind: Send + Sync + 'static {
    /// Runtime tag (local key, remote table).
    const KIND: CollectionKind;

    /// Stored item type.
    type Item: Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Build the item stored on first add.
    fn new_item(product: Product) -> Self::Item;

    /// The product an item refers to.
    fn product(item: &Self::Item) -> &Product;

    /// Apply a repeated add to an existing item. Returns whether it changed.
    fn add_again(item: &mut Self::Item) -> bool;

    /// Quantity column value, if this kind has one.
    fn quantity(item: &Self::Item) -> Option<Quantity>;

    /// Project a remote row into an item.
    ///
    /// Returns `None` if the row cannot represent a valid item.
    fn from_row(row: CollectionRow) -> Option<Self::Item>;

    /// Product id of an item.
    fn product_id(item: &Self::Item) -> &ProductId {
        &Self::product(item).id
    }

    /// Row for `item` owned by `owner`.
    fn to_row(owner: UserId, item: &Self::Item) -> CollectionRow {
        let product = Self::product(item);
        CollectionRow {
            owner_id: owner,
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            product_price: product.price.amount(),
            product_image: product.image.clone(),
            product_description: Some(product.description.clone()),
            product_material: Some(product.material.clone()),
            quantity: Self::quantity(item).map(i32::from),
        }
    }
}

/// The shopping cart: items carry a quantity.
#[derive(Debug, Clone, Copy)]
pub enum Cart {}

/// The wishlist: membership only.
#[derive(Debug, Clone, Copy)]
pub enum Wishlist {}

/// Rebuild a product from a row. Category and color are not stored remotely.
fn product_from_row(row: CollectionRow) -> Product {
    Product {
        id: row.product_id,
        name: row.product_name,
        price: Price::new(row.product_price),
        image: row.product_image,
        description: row.product_description.unwrap_or_default(),
        category: String::new(),
        material: row.product_material.unwrap_or_default(),
        color: String::new(),
    }
}

impl Kind for Cart {
    const KIND: CollectionKind = CollectionKind::Cart;
    type Item = CartItem;

    fn new_item(product: Product) -> CartItem {
        CartItem::new(product)
    }

    fn product(item: &CartItem) -> &Product {
        &item.product
    }

    fn add_again(item: &mut CartItem) -> bool {
        let next = item.quantity.incremented();
        let changed = next != item.quantity;
        item.quantity = next;
        changed
    }

    fn quantity(item: &CartItem) -> Option<Quantity> {
        Some(item.quantity)
    }

    fn from_row(row: CollectionRow) -> Option<CartItem> {
        let quantity = Quantity::try_from(row.quantity?).ok()?;
        Some(CartItem {
            product: product_from_row(row),
            quantity,
        })
    }
}

impl Kind for Wishlist {
    const KIND: CollectionKind = CollectionKind::Wishlist;
    type Item = Product;

    fn new_item(product: Product) -> Product {
        product
    }

    fn product(item: &Product) -> &Product {
        item
    }

    fn add_again(_item: &mut Product) -> bool {
        false
    }

    fn quantity(_item: &Product) -> Option<Quantity> {
        None
    }

    fn from_row(row: CollectionRow) -> Option<Product> {
        Some(product_from_row(row))
    }
}
