//! REST client for the hosted data API.
//!
//! Uses `reqwest` against a PostgREST-style endpoint (`/rest/v1/<table>`).
//! Catalog reads are cached using `moka`; per-user rows and orders never are.

use std::sync::Arc;

use async_trait::async_trait;
use bazaar_core::{ProductId, Quantity, UserName};
use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::cache::{CacheKey, CacheValue};
use super::types::{NewOrder, Order, Product, QuantityPatch, RemoteRow, User};
use super::{BackendError, RemoteStore, Table};
use crate::config::BackendConfig;

/// Maximum number of response body characters kept in logs and errors.
const BODY_SNIPPET_CHARS: usize = 500;

/// Client for the hosted data API.
///
/// Cheap to clone; all clones share one connection pool and one catalog cache.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    rest_base: String,
    api_key: SecretString,
    cache: Cache<CacheKey, CacheValue>,
}

impl BackendClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Http` if the HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.product_cache_ttl)
            .build();

        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        let rest_base = format!("{}/rest/v1", config.url.as_str().trim_end_matches('/'));

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                rest_base,
                api_key: config.api_key.clone(),
                cache,
            }),
        })
    }

    /// Start a request against a table with the auth headers attached.
    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        let key = self.inner.api_key.expose_secret();
        self.inner
            .client
            .request(method, format!("{}/{table}", self.inner.rest_base))
            .header("apikey", key)
            .bearer_auth(key)
            .header("Accept", "application/json")
    }

    /// Send a request and decode the JSON body.
    async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, BackendError> {
        let text = self.send(builder).await?;
        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %snippet(&text),
                "Failed to parse backend response"
            );
            BackendError::Parse(e)
        })
    }

    /// Send a request and return the raw body of a successful response.
    async fn send(&self, builder: RequestBuilder) -> Result<String, BackendError> {
        let response = builder.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(BackendError::RateLimited(retry_after));
        }

        let text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %snippet(&text),
                "Backend returned non-success status"
            );
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: snippet(&text),
            });
        }

        Ok(text)
    }

    /// Fetch a product list, going through the catalog cache.
    async fn cached_products(
        &self,
        key: CacheKey,
        builder: RequestBuilder,
    ) -> Result<Vec<Product>, BackendError> {
        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&key).await {
            debug!(?key, "Cache hit for products");
            return Ok(products.as_ref().clone());
        }

        let products: Vec<Product> = self.fetch(builder).await?;
        self.remember_products(&products).await;
        self.inner
            .cache
            .insert(key, CacheValue::Products(Arc::new(products.clone())))
            .await;

        Ok(products)
    }

    /// Cache each product individually for id lookups.
    async fn remember_products(&self, products: &[Product]) {
        for product in products {
            self.inner
                .cache
                .insert(
                    CacheKey::Product(product.id),
                    CacheValue::Product(Box::new(product.clone())),
                )
                .await;
        }
    }
}

#[async_trait]
impl RemoteStore for BackendClient {
    #[instrument(skip(self), fields(table = %table, user = %user))]
    async fn get_rows(&self, table: Table, user: &UserName) -> Result<Vec<RemoteRow>, BackendError> {
        let builder = self
            .request(Method::GET, table.name())
            .query(&[("user_name", eq(user)), ("select", "*".to_string())]);
        self.fetch(builder).await
    }

    #[instrument(skip(self, row), fields(table = %table, user = %row.user_name, product_id = %row.product_id))]
    async fn insert_row(&self, table: Table, row: &RemoteRow) -> Result<RemoteRow, BackendError> {
        let builder = self
            .request(Method::POST, table.name())
            .header("Prefer", "return=representation")
            .json(row);
        let mut rows: Vec<RemoteRow> = self.fetch(builder).await?;
        rows.pop()
            .ok_or_else(|| BackendError::NotFound(format!("inserted {table} row was not returned")))
    }

    #[instrument(skip(self), fields(table = %table, user = %user))]
    async fn update_row_quantity(
        &self,
        table: Table,
        user: &UserName,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<RemoteRow, BackendError> {
        let builder = self
            .request(Method::PATCH, table.name())
            .header("Prefer", "return=representation")
            .query(&[("user_name", eq(user)), ("product_id", eq(product_id))])
            .json(&QuantityPatch { quantity });
        let mut rows: Vec<RemoteRow> = self.fetch(builder).await?;
        rows.pop().ok_or_else(|| {
            BackendError::NotFound(format!("{table} row for {user}/{product_id}"))
        })
    }

    #[instrument(skip(self), fields(table = %table, user = %user))]
    async fn delete_row(
        &self,
        table: Table,
        user: &UserName,
        product_id: ProductId,
    ) -> Result<(), BackendError> {
        let builder = self
            .request(Method::DELETE, table.name())
            .query(&[("user_name", eq(user)), ("product_id", eq(product_id))]);
        self.send(builder).await.map(|_| ())
    }

    #[instrument(skip(self), fields(table = %table, user = %user))]
    async fn delete_rows_for_user(&self, table: Table, user: &UserName) -> Result<(), BackendError> {
        let builder = self
            .request(Method::DELETE, table.name())
            .query(&[("user_name", eq(user))]);
        self.send(builder).await.map(|_| ())
    }

    #[instrument(skip(self), fields(count = ids.len()))]
    async fn get_products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, BackendError> {
        let mut found = Vec::with_capacity(ids.len());
        let mut missing = Vec::new();

        for id in ids {
            match self.inner.cache.get(&CacheKey::Product(*id)).await {
                Some(CacheValue::Product(product)) => found.push(*product),
                _ => missing.push(*id),
            }
        }

        if !missing.is_empty() {
            let list = missing
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",");
            let builder = self
                .request(Method::GET, "products")
                .query(&[("id", format!("in.({list})")), ("select", "*".to_string())]);
            let fetched: Vec<Product> = self.fetch(builder).await?;
            self.remember_products(&fetched).await;
            found.extend(fetched);
        }

        Ok(found)
    }

    #[instrument(skip(self))]
    async fn get_all_products(&self) -> Result<Vec<Product>, BackendError> {
        let builder = self
            .request(Method::GET, "products")
            .query(&[("select", "*")]);
        self.cached_products(CacheKey::AllProducts, builder).await
    }

    #[instrument(skip(self))]
    async fn get_products_by_category(&self, category: &str) -> Result<Vec<Product>, BackendError> {
        let builder = self
            .request(Method::GET, "products")
            .query(&[("category", eq(category)), ("select", "*".to_string())]);
        self.cached_products(CacheKey::Category(category.to_string()), builder)
            .await
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, BackendError> {
        Ok(self.get_products_by_ids(&[id]).await?.into_iter().next())
    }

    #[instrument(skip(self, order), fields(user = %order.user_name, lines = order.items.len()))]
    async fn create_order(&self, order: &NewOrder) -> Result<Order, BackendError> {
        let builder = self
            .request(Method::POST, "orders")
            .header("Prefer", "return=representation")
            .json(order);
        let mut orders: Vec<Order> = self.fetch(builder).await?;
        orders
            .pop()
            .ok_or_else(|| BackendError::NotFound("created order was not returned".to_string()))
    }

    #[instrument(skip(self), fields(user = %user))]
    async fn get_orders_by_user(&self, user: &UserName) -> Result<Vec<Order>, BackendError> {
        let builder = self.request(Method::GET, "orders").query(&[
            ("user_name", eq(user)),
            ("select", "*".to_string()),
            ("order", "created_at.desc".to_string()),
        ]);
        self.fetch(builder).await
    }

    #[instrument(skip(self, password), fields(user = %name))]
    async fn find_user(
        &self,
        name: &UserName,
        password: &SecretString,
    ) -> Result<Option<User>, BackendError> {
        let builder = self.request(Method::GET, "users").query(&[
            ("select", "*".to_string()),
            ("limit", "1".to_string()),
            ("name", eq(name)),
            ("pass", eq(password.expose_secret())),
        ]);
        let users: Vec<User> = self.fetch(builder).await?;
        Ok(users.into_iter().next())
    }
}

/// PostgREST equality filter value.
fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

fn snippet(text: &str) -> String {
    text.chars().take(BODY_SNIPPET_CHARS).collect()
}
