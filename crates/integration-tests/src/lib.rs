//! Integration test harness for the Bazaar storefront.
//!
//! Requests are served in-process through `tower::ServiceExt::oneshot`
//! against the real router, backed by [`InMemoryBackend::demo`] and in-memory
//! sessions. [`TestClient`] carries the session cookie between requests the
//! way a browser would.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bazaar-integration-tests
//! ```

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header, request};
use bazaar_core::UserName;
use bazaar_storefront::backend::InMemoryBackend;
use bazaar_storefront::config::StorefrontConfig;
use bazaar_storefront::state::AppState;
use serde_json::Value;
use tower::ServiceExt;

/// Name of the storefront session cookie.
const SESSION_COOKIE: &str = "bazaar_session";

/// Password of the seeded `demo` user.
pub const DEMO_PASSWORD: &str = "demo1234";

/// The seeded `demo` user's name.
///
/// # Panics
///
/// Never; the name is valid.
#[must_use]
pub fn demo_user() -> UserName {
    UserName::parse("demo").expect("valid user name")
}

/// One visitor talking to a storefront instance.
pub struct TestClient {
    router: Router,
    cookie: Option<String>,
}

/// A response, with the body decoded as JSON when possible.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestClient {
    /// A storefront over `backend` with the default test configuration.
    #[must_use]
    pub fn new(backend: &InMemoryBackend) -> Self {
        Self::with_config(backend, StorefrontConfig::in_memory())
    }

    /// A storefront over `backend` with `config`.
    #[must_use]
    pub fn with_config(backend: &InMemoryBackend, config: StorefrontConfig) -> Self {
        let state = AppState::new(config, Arc::new(backend.clone()), None);
        Self {
            router: bazaar_storefront::app(state),
            cookie: None,
        }
    }

    /// A second visitor on the same storefront, with no cookie.
    #[must_use]
    pub fn new_visitor(&self) -> Self {
        Self {
            router: self.router.clone(),
            cookie: None,
        }
    }

    /// `GET path`.
    pub async fn get(&mut self, path: &str) -> TestResponse {
        self.send(Method::GET, path, None).await
    }

    /// `POST path` with a JSON body.
    pub async fn post(&mut self, path: &str, body: Value) -> TestResponse {
        self.send(Method::POST, path, Some(body)).await
    }

    /// Sign in as `demo`.
    ///
    /// # Panics
    ///
    /// Panics if the login is rejected.
    pub async fn login_demo(&mut self) -> TestResponse {
        let response = self
            .post(
                "/auth/login",
                serde_json::json!({ "username": "demo", "password": DEMO_PASSWORD }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "login failed: {:?}", response.body);
        response
    }

    /// Send a request.
    pub async fn send(&mut self, method: Method, path: &str, body: Option<Value>) -> TestResponse {
        self.send_with(Request::builder().method(method).uri(path), body)
            .await
    }

    /// Send a prepared request, adding the session cookie and remembering
    /// any new one set by the response.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the router fails.
    pub async fn send_with(&mut self, mut builder: request::Builder, body: Option<Value>) -> TestResponse {
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("valid request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        if let Some(cookie) = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| v.split(';').next())
            .find(|pair| pair.starts_with(SESSION_COOKIE))
        {
            // An empty value is the server deleting the session
            let deleted = cookie.split_once('=').is_none_or(|(_, value)| value.is_empty());
            self.cookie = (!deleted).then(|| cookie.to_string());
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

impl TestResponse {
    /// `(product id, quantity)` for each cart line in a cart response.
    #[must_use]
    pub fn cart_lines(&self) -> Vec<(i64, u64)> {
        self.body["items"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| Some((item["id"].as_i64()?, item["quantity"].as_u64()?)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Product ids in a wishlist response.
    #[must_use]
    pub fn wishlist_ids(&self) -> Vec<i64> {
        self.body["items"]
            .as_array()
            .map(|items| items.iter().filter_map(|item| item["id"].as_i64()).collect())
            .unwrap_or_default()
    }
}
