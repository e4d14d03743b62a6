//! Wishlist route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use gemcase_core::{Product, ProductId};
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use super::cart::ProductRequest;
use super::{catalog_product, open};
use crate::error::{Result, add_breadcrumb};
use crate::middleware::OptionalAuth;
use crate::services::{ShopperCollections, settle};
use crate::state::AppState;
use crate::sync::{Notice, RemoteStore};

/// Wishlist display data.
#[derive(Debug, Serialize)]
pub struct WishlistView {
    pub items: Vec<Product>,
    pub notices: Vec<Notice>,
}

impl WishlistView {
    fn from_collections<R: RemoteStore>(collections: &ShopperCollections<R>) -> Self {
        Self {
            items: collections.wishlist().snapshot(),
            notices: collections.take_notices(),
        }
    }
}

/// Whether a product is on the wishlist.
#[derive(Debug, Serialize)]
pub struct WishlistMembership {
    pub product_id: ProductId,
    pub contains: bool,
    pub notices: Vec<Notice>,
}

/// Display the wishlist.
#[instrument(skip_all)]
pub async fn show<R: RemoteStore>(
    State(state): State<AppState<R>>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<Json<WishlistView>> {
    let collections = open(&state, &session, user).await?;
    Ok(Json(WishlistView::from_collections(&collections)))
}

/// Add a catalog product to the wishlist.
#[instrument(skip_all, fields(product_id = %request.product_id))]
pub async fn add<R: RemoteStore>(
    State(state): State<AppState<R>>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Json(request): Json<ProductRequest>,
) -> Result<Json<WishlistView>> {
    let product = catalog_product(&state, &request.product_id)?;
    let mut collections = open(&state, &session, user).await?;

    add_breadcrumb(
        "wishlist",
        "Added to wishlist",
        Some(&[("product_id", request.product_id.as_str())]),
    );
    settle(collections.add_to_wishlist(product)).await;

    Ok(Json(WishlistView::from_collections(&collections)))
}

/// Remove a product from the wishlist.
#[instrument(skip_all, fields(product_id = %request.product_id))]
pub async fn remove<R: RemoteStore>(
    State(state): State<AppState<R>>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Json(request): Json<ProductRequest>,
) -> Result<Json<WishlistView>> {
    let mut collections = open(&state, &session, user).await?;
    settle(collections.remove_from_wishlist(&request.product_id)).await;
    Ok(Json(WishlistView::from_collections(&collections)))
}

/// Check whether a product is on the wishlist.
#[instrument(skip_all, fields(product_id = %product_id))]
pub async fn contains<R: RemoteStore>(
    State(state): State<AppState<R>>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Path(product_id): Path<ProductId>,
) -> Result<Json<WishlistMembership>> {
    let collections = open(&state, &session, user).await?;
    let contains = collections.is_in_wishlist(&product_id);
    Ok(Json(WishlistMembership {
        product_id,
        contains,
        notices: collections.take_notices(),
    }))
}
