//! Hosted data API access.
//!
//! # Architecture
//!
//! - The hosted backend is the source of truth for products, orders, users and
//!   the per-user `cart` / `wishlist` rows
//! - [`RemoteStore`] is the seam the synchronization core consumes; it is
//!   injected as `Arc<dyn RemoteStore>` so tests and demo mode can swap in
//!   [`InMemoryBackend`]
//! - [`BackendClient`] speaks the PostgREST dialect (`/rest/v1/<table>`,
//!   `eq.` / `in.(…)` filters) over `reqwest` and caches products in `moka`
//!
//! # Example
//!
//! ```rust,ignore
//! use bazaar_storefront::backend::{BackendClient, RemoteStore, Table};
//!
//! let client = BackendClient::new(&config.backend)?;
//!
//! let rows = client.get_rows(Table::Cart, &user_name).await?;
//! let ids: Vec<_> = rows.iter().map(|r| r.product_id).collect();
//! let products = client.get_products_by_ids(&ids).await?;
//! ```

mod cache;
mod client;
pub mod memory;
pub mod types;

pub use client::BackendClient;
pub use memory::{InMemoryBackend, RemoteCall};
pub use types::*;

use async_trait::async_trait;
use bazaar_core::{ProductId, Quantity, UserName};
use secrecy::SecretString;
use thiserror::Error;

/// Errors that can occur when talking to the hosted data API.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("backend returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The addressed row or record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The backend could not serve the request.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Per-user tables keyed by `(user_name, product_id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    /// Cart rows, with a quantity.
    Cart,
    /// Wishlist rows, membership only.
    Wishlist,
}

impl Table {
    /// The table name in the REST API path.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Cart => "cart",
            Self::Wishlist => "wishlist",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Operations the storefront needs from the hosted data API.
///
/// Every method is a single independent request: there are no transactions
/// and no version checks, so the last write to a row wins.
#[async_trait]
pub trait RemoteStore: Send + Sync + 'static {
    /// All rows in `table` belonging to `user`.
    async fn get_rows(&self, table: Table, user: &UserName) -> Result<Vec<RemoteRow>, BackendError>;

    /// Insert a row.
    async fn insert_row(&self, table: Table, row: &RemoteRow) -> Result<RemoteRow, BackendError>;

    /// Set the quantity of an existing row.
    ///
    /// Returns `BackendError::NotFound` if no row matched.
    async fn update_row_quantity(
        &self,
        table: Table,
        user: &UserName,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<RemoteRow, BackendError>;

    /// Delete the row for `(user, product_id)`. Deleting a missing row is not an error.
    async fn delete_row(
        &self,
        table: Table,
        user: &UserName,
        product_id: ProductId,
    ) -> Result<(), BackendError>;

    /// Delete every row in `table` belonging to `user`.
    async fn delete_rows_for_user(&self, table: Table, user: &UserName) -> Result<(), BackendError>;

    /// Products with the given ids. Unknown ids are omitted.
    async fn get_products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, BackendError>;

    /// The whole catalog.
    async fn get_all_products(&self) -> Result<Vec<Product>, BackendError>;

    /// Products in one category.
    async fn get_products_by_category(&self, category: &str) -> Result<Vec<Product>, BackendError>;

    /// A single product.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, BackendError>;

    /// Persist an order.
    async fn create_order(&self, order: &NewOrder) -> Result<Order, BackendError>;

    /// Orders placed by `user`.
    async fn get_orders_by_user(&self, user: &UserName) -> Result<Vec<Order>, BackendError>;

    /// Look up a user by name and password. `None` means the pair did not match.
    async fn find_user(
        &self,
        name: &UserName,
        password: &SecretString,
    ) -> Result<Option<User>, BackendError>;
}
