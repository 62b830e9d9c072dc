//! HTTP route handlers for storefront.
//!
//! Every body is JSON. Cart and wishlist responses carry the Merged View and
//! a `synced` flag that is `false` when a remote write or reload failed.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check
//!
//! # Products
//! GET  /products               - Product listing (?search=&category=)
//! GET  /products/categories    - Distinct categories
//! GET  /products/{id}          - Product detail
//!
//! # Cart
//! GET  /cart                   - Cart lines, subtotal and item count
//! POST /cart/add               - Add one unit
//! POST /cart/update            - Set a quantity (<= 0 removes)
//! POST /cart/remove            - Remove a line
//! POST /cart/clear             - Empty the cart
//! GET  /cart/count             - Item count badge
//!
//! # Wishlist
//! GET  /wishlist               - Wishlist products
//! POST /wishlist/add           - Add a product
//! POST /wishlist/remove        - Remove a product
//! GET  /wishlist/{id}          - Membership check
//!
//! # Checkout
//! POST /checkout               - Place an order (requires auth)
//!
//! # Auth
//! POST /auth/login             - Login, merging guest cart and wishlist
//! POST /auth/logout            - Logout
//! GET  /auth/me                - Current user (requires auth)
//!
//! # Account (requires auth)
//! GET  /account                - Profile overview
//! GET  /account/orders         - Order history
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod health;
pub mod products;
pub mod wishlist;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Create the auth routes router.
///
/// With `rate_limited`, login attempts are throttled per client IP.
pub fn auth_routes(rate_limited: bool) -> Router<AppState> {
    let mut login = Router::new().route("/login", post(auth::login));
    if rate_limited {
        match auth_rate_limiter() {
            Some(limiter) => login = login.layer(limiter),
            None => tracing::warn!("Login rate limiter misconfigured; serving without it"),
        }
    }

    login
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/categories", get(products::categories))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::show))
        .route("/add", post(wishlist::add))
        .route("/remove", post(wishlist::remove))
        .route("/{id}", get(wishlist::contains))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::index))
        .route("/orders", get(account::orders))
}

/// Create all routes for the storefront.
pub fn routes(rate_limited: bool) -> Router<AppState> {
    Router::new()
        // Health checks
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        // Product routes
        .nest("/products", product_routes())
        // Cart routes
        .nest("/cart", cart_routes())
        // Wishlist routes
        .nest("/wishlist", wishlist_routes())
        // Checkout
        .route("/checkout", post(checkout::place_order))
        // Account routes
        .nest("/account", account_routes())
        // Auth routes
        .nest("/auth", auth_routes(rate_limited))
}
