//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                       - Liveness check
//! GET  /health/ready                 - Readiness check (database)
//!
//! # Cart
//! GET  /cart                         - Cart contents, total and notices
//! POST /cart/add                     - Add a catalog product
//! POST /cart/update                  - Set a line's quantity (0 removes)
//! POST /cart/remove                  - Remove a line
//! GET  /cart/count                   - Cart count badge
//!
//! # Wishlist
//! GET  /wishlist                     - Wishlist contents and notices
//! POST /wishlist/add                 - Add a catalog product
//! POST /wishlist/remove              - Remove a product
//! GET  /wishlist/contains/{id}       - Membership check
//!
//! # Checkout
//! POST /checkout                     - Not implemented (501)
//! ```
//!
//! All bodies are JSON.

pub mod cart;
pub mod checkout;
pub mod wishlist;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use gemcase_core::{Product, ProductId};
use tower_sessions::Session;

use crate::error::{AppError, Result};
use crate::models::CurrentUser;
use crate::services::{ShopperCollections, open_collections};
use crate::state::AppState;
use crate::sync::RemoteStore;

/// Create the cart routes router.
pub fn cart_routes<R: RemoteStore>() -> Router<AppState<R>> {
    Router::new()
        .route("/", get(cart::show::<R>))
        .route("/add", post(cart::add::<R>))
        .route("/update", post(cart::update::<R>))
        .route("/remove", post(cart::remove::<R>))
        .route("/count", get(cart::count::<R>))
}

/// Create the wishlist routes router.
pub fn wishlist_routes<R: RemoteStore>() -> Router<AppState<R>> {
    Router::new()
        .route("/", get(wishlist::show::<R>))
        .route("/add", post(wishlist::add::<R>))
        .route("/remove", post(wishlist::remove::<R>))
        .route("/contains/{product_id}", get(wishlist::contains::<R>))
}

/// Create all routes for the storefront.
pub fn routes<R: RemoteStore>() -> Router<AppState<R>> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness::<R>))
        .nest("/cart", cart_routes())
        .nest("/wishlist", wishlist_routes())
        .route("/checkout", post(checkout::checkout))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies database connectivity before returning OK.
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness<R: RemoteStore>(State(state): State<AppState<R>>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

async fn open<R: RemoteStore>(
    state: &AppState<R>,
    session: &Session,
    user: Option<CurrentUser>,
) -> Result<ShopperCollections<R>> {
    let identity = user.map(|u| u.id);
    Ok(open_collections(session, state.collections(), identity).await?)
}

fn catalog_product<R: RemoteStore>(state: &AppState<R>, id: &ProductId) -> Result<Product> {
    state
        .catalog()
        .get(id)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}
