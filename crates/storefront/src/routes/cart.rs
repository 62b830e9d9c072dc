//! Cart route handlers.
//!
//! Guests' carts live in the session; signed-in carts are mirrored to the
//! backend `cart` table. A failed mirror does not fail the request: the
//! response reports `synced: false` instead.

use axum::{Json, extract::State};
use bazaar_core::ProductId;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::products::find_product;
use crate::error::Result;
use crate::models::CartLine;
use crate::services::Shopper;
use crate::state::AppState;

/// Cart line display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartItemView {
    pub id: ProductId,
    pub title: String,
    pub image: Option<String>,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
}

impl From<&CartLine> for CartItemView {
    fn from(line: &CartLine) -> Self {
        Self {
            id: line.id,
            title: line.title.clone(),
            image: line.image.clone(),
            quantity: line.quantity.get(),
            price: line.price.to_string(),
            line_price: line.line_total().to_string(),
        }
    }
}

/// Cart display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u64,
    pub synced: bool,
}

impl From<&Shopper> for CartView {
    fn from(shopper: &Shopper) -> Self {
        let cart = shopper.cart();
        Self {
            items: cart.entries().iter().map(CartItemView::from).collect(),
            subtotal: cart.total_price().to_string(),
            item_count: cart.total_items(),
            synced: shopper.synced(),
        }
    }
}

/// Cart count badge data.
#[derive(Debug, Serialize)]
pub struct CartCount {
    pub count: u64,
}

/// Body naming a product.
#[derive(Debug, Deserialize)]
pub struct ProductRequest {
    pub product_id: ProductId,
}

/// Body for a quantity change.
#[derive(Debug, Deserialize)]
pub struct UpdateCartRequest {
    pub product_id: ProductId,
    pub quantity: i64,
}

fn respond(shopper: &Shopper) -> Json<CartView> {
    Json(CartView::from(shopper))
}

/// Show the cart.
#[instrument(skip(shopper))]
pub async fn show(shopper: Shopper) -> Json<CartView> {
    respond(&shopper)
}

/// Add one unit of a product.
#[instrument(skip(state, shopper))]
pub async fn add(
    State(state): State<AppState>,
    mut shopper: Shopper,
    Json(body): Json<ProductRequest>,
) -> Result<Json<CartView>> {
    let product = find_product(&state, body.product_id).await?;
    let outcome = shopper.cart_mut().add_entry(&product).await;
    shopper.record(outcome);
    Ok(respond(&shopper))
}

/// Set a line's quantity. Zero or less removes the line.
#[instrument(skip(shopper))]
pub async fn update(mut shopper: Shopper, Json(body): Json<UpdateCartRequest>) -> Json<CartView> {
    let outcome = shopper
        .cart_mut()
        .update_quantity(body.product_id, body.quantity)
        .await;
    shopper.record(outcome);
    respond(&shopper)
}

/// Remove a line.
#[instrument(skip(shopper))]
pub async fn remove(mut shopper: Shopper, Json(body): Json<ProductRequest>) -> Json<CartView> {
    let outcome = shopper.cart_mut().remove_entry(body.product_id).await;
    shopper.record(outcome);
    respond(&shopper)
}

/// Empty the cart. Remote rows are left alone.
#[instrument(skip(shopper))]
pub async fn clear(mut shopper: Shopper) -> Json<CartView> {
    let outcome = shopper.cart_mut().clear().await;
    shopper.record(outcome);
    respond(&shopper)
}

/// Total units in the cart.
#[instrument(skip(shopper))]
pub async fn count(shopper: Shopper) -> Json<CartCount> {
    let count = shopper.cart().total_items();
    Json(CartCount { count })
}
