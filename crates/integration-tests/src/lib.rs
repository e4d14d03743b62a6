//! Integration tests for Gemcase.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process tests (no external services)
//! cargo test -p gemcase-integration-tests
//!
//! # Postgres-backed tests
//! STOREFRONT_DATABASE_URL=postgres://localhost/gemcase_test \
//!     cargo test -p gemcase-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `collection_sync` - Synchronizer behaviour through the public service API
//! - `storefront_api` - HTTP API against a server bound to a local port
//!
//! The identity provider is external, so test servers mount two extra routes
//! that stand in for it: `POST /test/identity/{id}` signs a user in and
//! `DELETE /test/identity` signs them out.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::Path;
use std::time::Duration;

use axum::{
    Router,
    extract::Path as UrlPath,
    http::StatusCode,
    routing::{delete, post},
};
use gemcase_core::UserId;
use gemcase_storefront::catalog::Catalog;
use gemcase_storefront::config::StorefrontConfig;
use gemcase_storefront::db::{self, CollectionRepository};
use gemcase_storefront::middleware::{
    clear_current_user, create_session_layer, session_layer, set_current_user,
};
use gemcase_storefront::models::CurrentUser;
use gemcase_storefront::routes;
use gemcase_storefront::state::AppState;
use gemcase_storefront::sync::{MemoryRemoteStore, RemoteStore};
use gemcase_storefront::with_layers;
use reqwest::{Client, Response};
use secrecy::SecretString;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_sessions::{MemoryStore, Session, SessionManagerLayer, SessionStore};
use uuid::Uuid;

/// Placeholder URL for in-memory servers. The pool never connects.
const LAZY_DATABASE_URL: &str = "postgres://localhost/gemcase_unused";

/// Configuration pointing at `database_url`, with defaults for everything else.
///
/// # Panics
///
/// Panics if the configuration is rejected.
#[must_use]
pub fn test_config(database_url: &str) -> StorefrontConfig {
    StorefrontConfig::from_vars(|key| match key {
        "STOREFRONT_DATABASE_URL" => Some(database_url.to_owned()),
        "STOREFRONT_BASE_URL" => Some("http://localhost:3000".to_owned()),
        _ => None,
    })
    .expect("test configuration is valid")
}

/// The catalog shipped with the storefront.
///
/// # Panics
///
/// Panics if the bundled catalog cannot be loaded.
#[must_use]
pub fn bundled_catalog() -> Catalog {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../storefront/content/products.json");
    Catalog::load(&path).expect("bundled catalog loads")
}

async fn sign_in(session: Session, UrlPath(id): UrlPath<Uuid>) -> StatusCode {
    let user = CurrentUser {
        id: UserId::new(id),
    };
    match set_current_user(&session, &user).await {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn sign_out(session: Session) -> StatusCode {
    match clear_current_user(&session).await {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn identity_routes<R: RemoteStore>() -> Router<AppState<R>> {
    Router::new()
        .route("/test/identity/{id}", post(sign_in))
        .route("/test/identity", delete(sign_out))
}

/// A storefront served on an ephemeral local port.
pub struct TestServer<R> {
    pub base_url: String,
    /// The remote store behind the server, for direct assertions.
    pub remote: R,
}

impl TestServer<MemoryRemoteStore> {
    /// Serve the storefront with in-memory sessions and collections.
    ///
    /// # Panics
    ///
    /// Panics if the server cannot bind.
    pub async fn in_memory() -> Self {
        let remote = MemoryRemoteStore::new();
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_secs(1))
            .connect_lazy(LAZY_DATABASE_URL)
            .expect("lazy pool");
        let state = AppState::with_collections(
            test_config(LAZY_DATABASE_URL),
            pool,
            bundled_catalog(),
            remote.clone(),
        );
        Self::serve(state, session_layer(MemoryStore::default(), false), remote).await
    }
}

impl TestServer<CollectionRepository> {
    /// Serve the storefront against the database in `STOREFRONT_DATABASE_URL`
    /// (or `DATABASE_URL`), after running migrations.
    ///
    /// # Panics
    ///
    /// Panics if the database is unreachable or migrations fail.
    pub async fn postgres() -> Self {
        let url = std::env::var("STOREFRONT_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .expect("STOREFRONT_DATABASE_URL must be set");
        let pool = db::create_pool(&SecretString::from(url.clone()))
            .await
            .expect("Failed to connect to database");
        sqlx::migrate!("../storefront/migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        let config = test_config(&url);
        let sessions = create_session_layer(&pool, &config);
        let state = AppState::new(config, pool.clone(), bundled_catalog());
        Self::serve(state, sessions, CollectionRepository::new(pool)).await
    }
}

impl<R: RemoteStore> TestServer<R> {
    async fn serve<S: SessionStore + Clone>(
        state: AppState<R>,
        sessions: SessionManagerLayer<S>,
        remote: R,
    ) -> Self {
        let app = with_layers(
            routes::routes::<R>().merge(identity_routes()),
            state,
            sessions,
        );

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("listener address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("test server");
        });

        Self {
            base_url: format!("http://{addr}"),
            remote,
        }
    }

    /// A new shopper with an empty cookie jar.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn shopper(&self) -> Shopper {
        Shopper {
            client: Client::builder()
                .cookie_store(true)
                .build()
                .expect("Failed to create HTTP client"),
            base_url: self.base_url.clone(),
        }
    }
}

/// One browser: a client that keeps its session cookie between requests.
pub struct Shopper {
    client: Client,
    base_url: String,
}

impl Shopper {
    /// Send a request and return the raw response.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn send(&self, method: reqwest::Method, path: &str, body: Option<&Value>) -> Response {
        let mut request = self
            .client
            .request(method, format!("{}{path}", self.base_url));
        if let Some(body) = body {
            request = request.json(body);
        }
        request.send().await.expect("request sent")
    }

    /// `GET` a JSON endpoint, expecting 200.
    ///
    /// # Panics
    ///
    /// Panics on a non-200 status or a non-JSON body.
    pub async fn get(&self, path: &str) -> Value {
        Self::ok_json(self.send(reqwest::Method::GET, path, None).await).await
    }

    /// `POST` JSON to an endpoint, expecting 200.
    ///
    /// # Panics
    ///
    /// Panics on a non-200 status or a non-JSON body.
    pub async fn post(&self, path: &str, body: &Value) -> Value {
        Self::ok_json(self.send(reqwest::Method::POST, path, Some(body)).await).await
    }

    /// Have the identity provider report `id` as signed in.
    ///
    /// # Panics
    ///
    /// Panics if the identity route fails.
    pub async fn sign_in(&self, id: Uuid) {
        let response = self
            .send(reqwest::Method::POST, &format!("/test/identity/{id}"), None)
            .await;
        assert_eq!(response.status(), reqwest::StatusCode::NO_CONTENT);
    }

    /// Have the identity provider report nobody signed in.
    ///
    /// # Panics
    ///
    /// Panics if the identity route fails.
    pub async fn sign_out(&self) {
        let response = self
            .send(reqwest::Method::DELETE, "/test/identity", None)
            .await;
        assert_eq!(response.status(), reqwest::StatusCode::NO_CONTENT);
    }

    async fn ok_json(response: Response) -> Value {
        let status = response.status();
        let url = response.url().clone();
        assert_eq!(status, reqwest::StatusCode::OK, "{url}");
        response.json().await.expect("JSON body")
    }
}

/// Product ids of a view's `items`, in order.
///
/// # Panics
///
/// Panics if `view` has no `items` array.
#[must_use]
pub fn item_ids(view: &Value) -> Vec<String> {
    view["items"]
        .as_array()
        .expect("items array")
        .iter()
        .filter_map(|item| item["id"].as_str().map(str::to_owned))
        .collect()
}
