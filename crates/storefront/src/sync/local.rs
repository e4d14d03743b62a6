//! Local (device-scoped) persistence.
//!
//! Each collection is stored as one JSON array under a fixed namespaced key
//! (see [`CollectionKind::local_key`]). The store only ever holds anonymous
//! data; it is cleared once a sign-in migration has copied it to the remote
//! store.

use std::future::Future;

use gemcase_core::CollectionKind;
use serde_json::Value;
use tower_sessions::Session;
use tracing::{debug, instrument, warn};

use super::error::LocalStoreError;
use super::kind::Kind;

/// Raw key-value store scoped to one device or browser.
pub trait LocalStore: Clone + Send + Sync + 'static {
    /// Read a key. Missing keys yield `None`.
    fn read(
        &self,
        key: &'static str,
    ) -> impl Future<Output = Result<Option<Value>, LocalStoreError>> + Send;

    /// Write a key, overwriting prior contents.
    fn write(
        &self,
        key: &'static str,
        value: Value,
    ) -> impl Future<Output = Result<(), LocalStoreError>> + Send;

    /// Remove a key entirely.
    fn remove(&self, key: &'static str)
    -> impl Future<Output = Result<(), LocalStoreError>> + Send;
}

/// Local store backed by the shopper's browser session.
///
/// The session is keyed by the session cookie, so it is exactly as
/// device-scoped as browser storage. The session layer persists changes at
/// the end of each request.
#[derive(Debug, Clone)]
pub struct SessionLocalStore {
    session: Session,
}

impl SessionLocalStore {
    /// Wrap a request's session.
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }
}

impl LocalStore for SessionLocalStore {
    async fn read(&self, key: &'static str) -> Result<Option<Value>, LocalStoreError> {
        Ok(self.session.get::<Value>(key).await?)
    }

    async fn write(&self, key: &'static str, value: Value) -> Result<(), LocalStoreError> {
        Ok(self.session.insert(key, value).await?)
    }

    async fn remove(&self, key: &'static str) -> Result<(), LocalStoreError> {
        self.session.remove::<Value>(key).await?;
        Ok(())
    }
}

/// Typed collection access over a [`LocalStore`].
#[derive(Debug, Clone)]
pub struct LocalCollections<S> {
    store: S,
}

impl<S: LocalStore> LocalCollections<S> {
    /// Create an adapter over `store`.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Serialize the full item array under the collection's key.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the store write fails.
    #[instrument(skip(self, items), fields(kind = K::KIND.as_str(), count = items.len()))]
    pub async fn save<K: Kind>(&self, items: &[K::Item]) -> Result<(), LocalStoreError> {
        let value = serde_json::to_value(items).map_err(|source| LocalStoreError::Serialize {
            kind: K::KIND,
            source,
        })?;
        self.store.write(K::KIND.local_key(), value).await?;
        debug!("Saved collection to local store");
        Ok(())
    }

    /// Load a collection, failing on malformed data.
    ///
    /// A missing key is an empty collection.
    ///
    /// # Errors
    ///
    /// Returns `LocalStoreError::Malformed` if the stored value is not a
    /// valid item array, or the store's own error if the read fails.
    pub async fn try_load<K: Kind>(&self) -> Result<Vec<K::Item>, LocalStoreError> {
        let Some(value) = self.store.read(K::KIND.local_key()).await? else {
            return Ok(Vec::new());
        };
        serde_json::from_value(value).map_err(|source| LocalStoreError::Malformed {
            kind: K::KIND,
            source,
        })
    }

    /// Load a collection; missing or malformed data yields an empty one.
    pub async fn load<K: Kind>(&self) -> Vec<K::Item> {
        match self.try_load::<K>().await {
            Ok(items) => items,
            Err(e) => {
                warn!(kind = K::KIND.as_str(), error = %e, "Discarding unreadable local collection");
                Vec::new()
            }
        }
    }

    /// Remove the collection's key.
    ///
    /// # Errors
    ///
    /// Returns an error if the store removal fails.
    pub async fn clear<K: Kind>(&self) -> Result<(), LocalStoreError> {
        self.clear_kind(K::KIND).await
    }

    /// Remove the key for a runtime collection kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the store removal fails.
    pub async fn clear_kind(&self, kind: CollectionKind) -> Result<(), LocalStoreError> {
        self.store.remove(kind.local_key()).await?;
        debug!(kind = kind.as_str(), "Cleared local collection");
        Ok(())
    }

    /// Whether the store holds leftover items for this collection.
    ///
    /// This is a presence check on the raw value, so malformed data counts as
    /// residual and gets cleared by the migration that follows.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub async fn has_residual<K: Kind>(&self) -> Result<bool, LocalStoreError> {
        let value = self.store.read(K::KIND.local_key()).await?;
        Ok(match value {
            None | Some(Value::Null) => false,
            Some(Value::Array(items)) => !items.is_empty(),
            Some(_) => true,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use gemcase_core::{CartItem, Price, Product, ProductId};
    use serde_json::json;
    use tower_sessions::MemoryStore;

    use super::*;
    use crate::sync::kind::{Cart, Wishlist};
    use crate::sync::memory::MemoryLocalStore;

    fn product(id: &str) -> Product {
        Product {
            id: ProductId::parse(id).unwrap(),
            name: "Pearl Pendant Necklace".to_owned(),
            price: Price::from_cents(45_000),
            image: "https://images.example.com/pearl.jpg".to_owned(),
            description: "Freshwater pearl pendant".to_owned(),
            category: "Necklace".to_owned(),
            material: "Gold".to_owned(),
            color: "White".to_owned(),
        }
    }

    #[tokio::test]
    async fn test_save_then_load_keeps_local_only_fields() {
        let local = LocalCollections::new(MemoryLocalStore::new());
        let items = vec![CartItem::new(product("2"))];
        local.save::<Cart>(&items).await.unwrap();

        let loaded = local.try_load::<Cart>().await.unwrap();
        assert_eq!(loaded, items);
        assert_eq!(loaded[0].product.color, "White");
        assert!(local.store().contains_key("jewelry-cart"));
        assert!(!local.store().contains_key("jewelry-wishlist"));
    }

    #[tokio::test]
    async fn test_missing_key_is_empty() {
        let local = LocalCollections::new(MemoryLocalStore::new());
        assert!(local.try_load::<Wishlist>().await.unwrap().is_empty());
        assert!(!local.has_residual::<Wishlist>().await.unwrap());
    }

    #[tokio::test]
    async fn test_malformed_data_fails_soft() {
        let store = MemoryLocalStore::new();
        store.insert_raw("jewelry-cart", json!({ "not": "an array" }));
        let local = LocalCollections::new(store);

        assert!(matches!(
            local.try_load::<Cart>().await,
            Err(LocalStoreError::Malformed { kind: CollectionKind::Cart, .. })
        ));
        assert!(local.load::<Cart>().await.is_empty());
        assert!(local.has_residual::<Cart>().await.unwrap());
    }

    #[tokio::test]
    async fn test_zero_quantity_is_malformed() {
        let store = MemoryLocalStore::new();
        store.insert_raw(
            "jewelry-cart",
            json!([{ "id": "1", "name": "Ring", "price": "10", "image": "x", "quantity": 0 }]),
        );
        let local = LocalCollections::new(store);
        assert!(local.try_load::<Cart>().await.is_err());
    }

    #[tokio::test]
    async fn test_clear_removes_key() {
        let local = LocalCollections::new(MemoryLocalStore::new());
        local.save::<Wishlist>(&[product("1")]).await.unwrap();
        assert!(local.has_residual::<Wishlist>().await.unwrap());

        local.clear::<Wishlist>().await.unwrap();
        assert!(!local.store().contains_key("jewelry-wishlist"));
        assert!(!local.has_residual::<Wishlist>().await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_array_is_not_residual() {
        let local = LocalCollections::new(MemoryLocalStore::new());
        local.save::<Cart>(&[]).await.unwrap();
        assert!(!local.has_residual::<Cart>().await.unwrap());
    }

    #[tokio::test]
    async fn test_session_store_round_trip() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let local = LocalCollections::new(SessionLocalStore::new(session.clone()));

        local.save::<Wishlist>(&[product("8")]).await.unwrap();
        let raw: Option<Value> = session.get("jewelry-wishlist").await.unwrap();
        assert!(raw.is_some());

        assert_eq!(local.load::<Wishlist>().await.len(), 1);
        local.clear::<Wishlist>().await.unwrap();
        assert!(local.load::<Wishlist>().await.is_empty());
    }
}
