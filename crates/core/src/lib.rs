//! Gemcase Core - Shared types library.
//!
//! This crate provides the domain types used across all Gemcase components:
//! - `storefront` - Public-facing shop with cart and wishlist synchronization
//! - `cli` - Command-line tools for migrations and collection inspection
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, quantities, owners and
//!   the items stored in carts and wishlists

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
