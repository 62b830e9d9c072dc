//! Product route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use bazaar_core::ProductId;
use tracing::instrument;

use crate::backend::Product;
use crate::error::{AppError, Result};
use crate::services::catalog::{CatalogService, ProductQuery};
use crate::state::AppState;

/// List products, optionally filtered by title search and category.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<Product>>> {
    let products = CatalogService::new(state.remote().as_ref())
        .list(&query)
        .await?;
    Ok(Json(products))
}

/// Distinct product categories, sorted.
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<String>>> {
    let categories = CatalogService::new(state.remote().as_ref())
        .categories()
        .await?;
    Ok(Json(categories))
}

/// A single product.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    find_product(&state, id).await.map(Json)
}

/// Look up a product for a cart or wishlist mutation.
pub(crate) async fn find_product(state: &AppState, id: ProductId) -> Result<Product> {
    CatalogService::new(state.remote().as_ref())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}
