//! Collection kinds.

use core::fmt;

use serde::{Deserialize, Serialize};

/// The two synchronized collections.
///
/// Each kind has one fixed namespaced key in the local store and one table in
/// the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    /// Items with a quantity.
    Cart,
    /// Presence-only items.
    Wishlist,
}

impl CollectionKind {
    /// Both kinds, in reconciliation order.
    pub const ALL: [Self; 2] = [Self::Cart, Self::Wishlist];

    /// Stable lowercase name, used in logs and the CLI.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cart => "cart",
            Self::Wishlist => "wishlist",
        }
    }

    /// Namespaced key holding this collection in the local store.
    #[must_use]
    pub const fn local_key(self) -> &'static str {
        match self {
            Self::Cart => "jewelry-cart",
            Self::Wishlist => "jewelry-wishlist",
        }
    }

    /// Fully qualified remote table name.
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::Cart => "storefront.cart_items",
            Self::Wishlist => "storefront.wishlist_items",
        }
    }

    /// Whether rows of this kind carry a quantity column.
    #[must_use]
    pub const fn has_quantity(self) -> bool {
        matches!(self, Self::Cart)
    }

    /// Capitalized name for user-facing messages.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Cart => "Cart",
            Self::Wishlist => "Wishlist",
        }
    }

    /// Parse from the lowercase name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cart" => Some(Self::Cart),
            "wishlist" => Some(Self::Wishlist),
            _ => None,
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_and_tables_are_distinct() {
        assert_ne!(
            CollectionKind::Cart.local_key(),
            CollectionKind::Wishlist.local_key()
        );
        assert_ne!(CollectionKind::Cart.table(), CollectionKind::Wishlist.table());
        assert!(CollectionKind::Cart.has_quantity());
        assert!(!CollectionKind::Wishlist.has_quantity());
    }

    #[test]
    fn test_parse_round_trips() {
        for kind in CollectionKind::ALL {
            assert_eq!(CollectionKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(CollectionKind::parse("basket"), None);
    }
}
