//! Wishlist route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use bazaar_core::ProductId;
use serde::Serialize;
use tracing::instrument;

use super::cart::ProductRequest;
use super::products::find_product;
use crate::backend::Product;
use crate::error::Result;
use crate::services::Shopper;
use crate::state::AppState;

/// Wishlist display data.
#[derive(Debug, Clone, Serialize)]
pub struct WishlistView {
    pub items: Vec<Product>,
    pub synced: bool,
}

/// Membership check result.
#[derive(Debug, Serialize)]
pub struct Membership {
    pub product_id: ProductId,
    pub member: bool,
}

fn respond(shopper: &Shopper) -> Json<WishlistView> {
    Json(WishlistView {
        items: shopper.wishlist().entries().to_vec(),
        synced: shopper.synced(),
    })
}

/// Show the wishlist.
#[instrument(skip(shopper))]
pub async fn show(shopper: Shopper) -> Json<WishlistView> {
    respond(&shopper)
}

/// Add a product. Adding a member again changes nothing.
#[instrument(skip(state, shopper))]
pub async fn add(
    State(state): State<AppState>,
    mut shopper: Shopper,
    Json(body): Json<ProductRequest>,
) -> Result<Json<WishlistView>> {
    let product = find_product(&state, body.product_id).await?;
    let outcome = shopper.wishlist_mut().add_entry(&product).await;
    shopper.record(outcome);
    Ok(respond(&shopper))
}

/// Remove a product.
#[instrument(skip(shopper))]
pub async fn remove(mut shopper: Shopper, Json(body): Json<ProductRequest>) -> Json<WishlistView> {
    let outcome = shopper.wishlist_mut().remove_entry(body.product_id).await;
    shopper.record(outcome);
    respond(&shopper)
}

/// Whether a product is on the wishlist.
#[instrument(skip(shopper))]
pub async fn contains(shopper: Shopper, Path(id): Path<ProductId>) -> Json<Membership> {
    let member = shopper.wishlist().is_member(id);
    Json(Membership {
        product_id: id,
        member,
    })
}
