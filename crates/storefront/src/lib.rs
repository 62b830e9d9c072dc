//! Bazaar storefront library.
//!
//! A JSON storefront whose cart and wishlist follow the shopper across the
//! guest/account boundary. The router is built here so that the binary and
//! the integration tests serve the same application.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
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
use axum::body::Body;
use axum::http::Request;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the storefront application.
///
/// Layers, innermost first: session, request ID, tracing. Sentry layers are
/// added by the binary.
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.pool(), state.config());
    let rate_limited = state.config().rate_limit;

    Router::new()
        .merge(routes::routes(rate_limited))
        .layer(session_layer)
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                        tracing::info_span!(
                            "request",
                            method = %request.method(),
                            uri = %request.uri(),
                            request_id = tracing::field::Empty,
                        )
                    }),
                )
                .layer(axum::middleware::from_fn(middleware::request_id_middleware)),
        )
        .with_state(state)
}
