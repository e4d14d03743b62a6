//! Remote (owner-scoped) persistence.
//!
//! One table per collection kind, one row per (owner, product). Saves replace
//! the owner's whole row set; migrations upsert item by item.

use std::future::Future;

use gemcase_core::{CollectionKind, ProductId, UserId};
use rust_decimal::Decimal;
use tracing::{debug, instrument, warn};

use super::kind::Kind;
use crate::db::RepositoryError;

/// A row of `storefront.cart_items` or `storefront.wishlist_items`.
///
/// `quantity` is only selected from the cart table.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CollectionRow {
    pub owner_id: UserId,
    pub product_id: ProductId,
    pub product_name: String,
    pub product_price: Decimal,
    pub product_image: String,
    pub product_description: Option<String>,
    pub product_material: Option<String>,
    #[sqlx(default)]
    pub quantity: Option<i32>,
}

/// Row-level access to the durable store.
pub trait RemoteStore: Clone + Send + Sync + 'static {
    /// All rows of `kind` for `owner`.
    fn load_rows(
        &self,
        kind: CollectionKind,
        owner: UserId,
    ) -> impl Future<Output = Result<Vec<CollectionRow>, RepositoryError>> + Send;

    /// Delete every row of `kind` for `owner`, then insert `rows`.
    ///
    /// Not atomic: a concurrent replace for the same owner can interleave.
    fn replace_rows(
        &self,
        kind: CollectionKind,
        owner: UserId,
        rows: Vec<CollectionRow>,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Insert `row`, or overwrite the row with the same (owner, product).
    fn upsert_row(
        &self,
        kind: CollectionKind,
        row: CollectionRow,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

/// Typed collection access over a [`RemoteStore`].
#[derive(Debug, Clone)]
pub struct RemoteCollections<R> {
    store: R,
}

impl<R: RemoteStore> RemoteCollections<R> {
    /// Create an adapter over `store`.
    #[must_use]
    pub const fn new(store: R) -> Self {
        Self { store }
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &R {
        &self.store
    }

    /// Fetch and project every item `owner` has in this collection.
    ///
    /// Rows that cannot form a valid item (a cart row without a positive
    /// quantity) are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails.
    #[instrument(skip(self), fields(kind = K::KIND.as_str()))]
    pub async fn load_for_owner<K: Kind>(
        &self,
        owner: UserId,
    ) -> Result<Vec<K::Item>, RepositoryError> {
        let rows = self.store.load_rows(K::KIND, owner).await?;
        let total = rows.len();
        let items: Vec<K::Item> = rows
            .into_iter()
            .filter_map(|row| {
                let product_id = row.product_id.clone();
                let item = K::from_row(row);
                if item.is_none() {
                    warn!(product_id = %product_id, "Skipping invalid remote row");
                }
                item
            })
            .collect();
        debug!(loaded = items.len(), total, "Loaded collection from remote store");
        Ok(items)
    }

    /// Replace the owner's rows with `items`.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete or the insert fails. A failed insert
    /// leaves the owner's collection empty.
    #[instrument(skip(self, items), fields(kind = K::KIND.as_str(), count = items.len()))]
    pub async fn replace_for_owner<K: Kind>(
        &self,
        owner: UserId,
        items: &[K::Item],
    ) -> Result<(), RepositoryError> {
        let rows = items.iter().map(|item| K::to_row(owner, item)).collect();
        self.store.replace_rows(K::KIND, owner, rows).await?;
        debug!("Replaced remote collection");
        Ok(())
    }

    /// Insert or overwrite one item, keyed on (owner, product).
    ///
    /// # Errors
    ///
    /// Returns an error if the upsert fails.
    pub async fn upsert_item<K: Kind>(
        &self,
        owner: UserId,
        item: &K::Item,
    ) -> Result<(), RepositoryError> {
        self.store.upsert_row(K::KIND, K::to_row(owner, item)).await
    }
}
