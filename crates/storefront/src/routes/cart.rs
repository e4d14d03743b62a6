//! Cart route handlers.
//!
//! Every handler opens the shopper's collections, which reconciles them with
//! the current identity first. Mutations wait for their write so that a
//! failed save shows up in the same response's notices.

use axum::{Json, extract::State};
use gemcase_core::{CartItem, ProductId, Quantity};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use super::{catalog_product, open};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::OptionalAuth;
use crate::services::{ShopperCollections, settle};
use crate::state::AppState;
use crate::sync::{Notice, RemoteStore};

/// Cart display data.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub total_price: String,
    pub item_count: u32,
    pub notices: Vec<Notice>,
}

impl CartView {
    fn from_collections<R: RemoteStore>(collections: &ShopperCollections<R>) -> Self {
        let cart = collections.cart();
        Self {
            items: cart.snapshot(),
            total_price: cart.total_price().to_fixed(),
            item_count: cart.item_count(),
            notices: collections.take_notices(),
        }
    }
}

/// Cart badge count.
#[derive(Debug, Serialize)]
pub struct CartCount {
    pub count: u32,
    pub notices: Vec<Notice>,
}

/// Request naming a product.
#[derive(Debug, Deserialize)]
pub struct ProductRequest {
    pub product_id: ProductId,
}

/// Request setting a cart line's quantity.
#[derive(Debug, Deserialize)]
pub struct QuantityRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Display the cart.
#[instrument(skip_all)]
pub async fn show<R: RemoteStore>(
    State(state): State<AppState<R>>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<Json<CartView>> {
    let collections = open(&state, &session, user).await?;
    Ok(Json(CartView::from_collections(&collections)))
}

/// Add a catalog product to the cart.
#[instrument(skip_all, fields(product_id = %request.product_id))]
pub async fn add<R: RemoteStore>(
    State(state): State<AppState<R>>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Json(request): Json<ProductRequest>,
) -> Result<Json<CartView>> {
    let product = catalog_product(&state, &request.product_id)?;
    let mut collections = open(&state, &session, user).await?;

    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("product_id", request.product_id.as_str())]),
    );
    settle(collections.add_to_cart(product)).await;

    Ok(Json(CartView::from_collections(&collections)))
}

/// Set a cart line's quantity. Zero removes the line.
///
/// Counts the account store cannot hold are rejected rather than clamped.
#[instrument(skip_all, fields(product_id = %request.product_id, quantity = request.quantity))]
pub async fn update<R: RemoteStore>(
    State(state): State<AppState<R>>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Json(request): Json<QuantityRequest>,
) -> Result<Json<CartView>> {
    if request.quantity > Quantity::MAX_COUNT {
        return Err(AppError::BadRequest(format!(
            "quantity must be at most {}",
            Quantity::MAX_COUNT
        )));
    }
    let mut collections = open(&state, &session, user).await?;
    settle(collections.set_cart_quantity(&request.product_id, request.quantity)).await;
    Ok(Json(CartView::from_collections(&collections)))
}

/// Remove a product from the cart.
#[instrument(skip_all, fields(product_id = %request.product_id))]
pub async fn remove<R: RemoteStore>(
    State(state): State<AppState<R>>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Json(request): Json<ProductRequest>,
) -> Result<Json<CartView>> {
    let mut collections = open(&state, &session, user).await?;
    settle(collections.remove_from_cart(&request.product_id)).await;
    Ok(Json(CartView::from_collections(&collections)))
}

/// Get the cart badge count.
#[instrument(skip_all)]
pub async fn count<R: RemoteStore>(
    State(state): State<AppState<R>>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<Json<CartCount>> {
    let collections = open(&state, &session, user).await?;
    Ok(Json(CartCount {
        count: collections.cart().item_count(),
        notices: collections.take_notices(),
    }))
}
