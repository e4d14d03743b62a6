//! Core types for Gemcase.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod collection;
pub mod id;
pub mod owner;
pub mod price;
pub mod product;
pub mod quantity;

pub use collection::CollectionKind;
pub use id::*;
pub use owner::Owner;
pub use price::Price;
pub use product::{CartItem, Product};
pub use quantity::Quantity;
