//! Gemcase storefront library.
//!
//! Cart and wishlist synchronization for a jewelry storefront: anonymous
//! shoppers keep their collections in the session, signed-in shoppers in
//! `PostgreSQL`, and the [`sync`] module reconciles the two on sign-in and
//! sign-out. The HTTP surface lives in [`routes`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod sync;

use axum::Router;
use tower_http::trace::TraceLayer;
use tower_sessions::{SessionManagerLayer, SessionStore};

use crate::state::AppState;
use crate::sync::RemoteStore;

/// Build the full storefront application.
pub fn app<R, S>(state: AppState<R>, sessions: SessionManagerLayer<S>) -> Router
where
    R: RemoteStore,
    S: SessionStore + Clone,
{
    with_layers(routes::routes(), state, sessions)
}

/// Wrap `router` in the storefront middleware stack and attach `state`.
///
/// Layers run outermost first: Sentry, tracing, request id, session.
pub fn with_layers<R, S>(
    router: Router<AppState<R>>,
    state: AppState<R>,
    sessions: SessionManagerLayer<S>,
) -> Router
where
    R: RemoteStore,
    S: SessionStore + Clone,
{
    router
        .layer(sessions)
        .layer(axum::middleware::from_fn(
            middleware::request_id_middleware,
        ))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            },
        ))
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
