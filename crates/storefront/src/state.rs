//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::catalog::Catalog;
use crate::config::StorefrontConfig;
use crate::db::CollectionRepository;
use crate::sync::RemoteStore;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
///
/// Generic over the remote collection store so the router can run against
/// an in-memory store in tests.
pub struct AppState<R = CollectionRepository> {
    inner: Arc<AppStateInner<R>>,
}

struct AppStateInner<R> {
    config: StorefrontConfig,
    pool: PgPool,
    catalog: Catalog,
    collections: R,
}

impl AppState {
    /// Create the production state, with collections stored in `pool`.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` connection pool
    /// * `catalog` - Product catalog
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool, catalog: Catalog) -> Self {
        let collections = CollectionRepository::new(pool.clone());
        Self::with_collections(config, pool, catalog, collections)
    }
}

impl<R: RemoteStore> AppState<R> {
    /// Create a state with an explicit remote collection store.
    #[must_use]
    pub fn with_collections(
        config: StorefrontConfig,
        pool: PgPool,
        catalog: Catalog,
        collections: R,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                catalog,
                collections,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the product catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// Get a handle to the remote collection store.
    #[must_use]
    pub fn collections(&self) -> R {
        self.inner.collections.clone()
    }
}

impl<R> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
