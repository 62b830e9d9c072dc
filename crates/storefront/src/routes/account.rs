//! Account route handlers. All require a signed-in user.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use crate::backend::{Order, Product};
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::CurrentUser;
use crate::services::Shopper;
use crate::services::checkout::CheckoutService;
use crate::state::AppState;

/// Account overview data.
#[derive(Debug, Serialize)]
pub struct AccountView {
    pub user: CurrentUser,
    pub wishlist: Vec<Product>,
    pub order_count: usize,
}

/// Account overview.
#[instrument(skip_all, fields(user = %user.name))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    shopper: Shopper,
) -> Result<Json<AccountView>> {
    let orders = CheckoutService::new(state.remote().as_ref())
        .order_history(&user.name)
        .await?;

    let view = AccountView {
        wishlist: shopper.wishlist().entries().to_vec(),
        order_count: orders.len(),
        user,
    };
    Ok(Json(view))
}

/// Order history, newest first.
#[instrument(skip_all, fields(user = %user.name))]
pub async fn orders(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    let orders = CheckoutService::new(state.remote().as_ref())
        .order_history(&user.name)
        .await?;
    Ok(Json(orders))
}
