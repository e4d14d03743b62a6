//! Domain models for storefront.
//!
//! Collection items and products live in `gemcase-core`; this module holds
//! the types the storefront keeps in the session.

pub mod session;

pub use session::{CurrentUser, keys as session_keys};
