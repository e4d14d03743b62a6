//! Business logic services for storefront.
//!
//! # Services
//!
//! - `shopper` - Per-request access to a shopper's cart and wishlist
pub mod shopper;

pub use shopper::{ShopperCollections, open_collections, settle};
