//! Checkout route handler.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use crate::backend::Order;
use crate::error::{Result, add_breadcrumb};
use crate::services::Shopper;
use crate::services::checkout::{CheckoutError, CheckoutService};
use crate::state::AppState;

/// Place an order for the signed-in user's cart.
///
/// On success the cart is empty. If the order is rejected the cart is left
/// as it was.
#[instrument(skip(state, shopper))]
pub async fn place_order(
    State(state): State<AppState>,
    mut shopper: Shopper,
) -> Result<(StatusCode, Json<Order>)> {
    let user = shopper
        .user()
        .map(|u| u.name.clone())
        .ok_or(CheckoutError::NotAuthenticated)?;

    let order = CheckoutService::new(state.remote().as_ref())
        .place_order(&user, shopper.cart_mut())
        .await?;

    let order_id = order.id.to_string();
    add_breadcrumb("checkout", "Order placed", Some(&[("order_id", order_id.as_str())]));

    Ok((StatusCode::CREATED, Json(order)))
}
