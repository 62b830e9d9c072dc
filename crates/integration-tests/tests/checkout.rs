//! Checkout and account pages.

use axum::http::StatusCode;
use bazaar_integration_tests::{TestClient, demo_user};
use bazaar_storefront::backend::{InMemoryBackend, Table};
use serde_json::json;

#[tokio::test]
async fn test_guest_cannot_check_out() {
    let backend = InMemoryBackend::demo();
    let mut client = TestClient::new(&backend);
    client.post("/cart/add", json!({ "product_id": 1 })).await;

    let response = client.post("/checkout", json!({})).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(backend.orders().is_empty());
}

#[tokio::test]
async fn test_empty_cart_is_rejected() {
    let backend = InMemoryBackend::demo();
    let mut client = TestClient::new(&backend);
    client.login_demo().await;

    let response = client.post("/checkout", json!({})).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_checkout_creates_order_and_empties_cart() {
    let backend = InMemoryBackend::demo();
    let mut client = TestClient::new(&backend);

    client.post("/cart/add", json!({ "product_id": 1 })).await;
    client.post("/cart/add", json!({ "product_id": 1 })).await;
    client.login_demo().await;
    client.post("/cart/add", json!({ "product_id": 6 })).await;

    let order = client.post("/checkout", json!({})).await;
    assert_eq!(order.status, StatusCode::CREATED);
    assert_eq!(order.body["user_name"], "demo");
    assert_eq!(order.body["status"], "completed");
    assert_eq!(order.body["items"].as_array().map(Vec::len), Some(2));

    assert!(client.get("/cart").await.cart_lines().is_empty());
    assert!(backend.rows(Table::Cart, &demo_user()).is_empty());

    let orders = client.get("/account/orders").await;
    assert_eq!(orders.status, StatusCode::OK);
    assert_eq!(orders.body.as_array().map(Vec::len), Some(1));

    let account = client.get("/account").await;
    assert_eq!(account.body["order_count"], 1);
    assert_eq!(account.body["user"]["email"], "demo@bazaar.test");
}

#[tokio::test]
async fn test_checkout_orders_what_the_remote_cart_holds() {
    let backend = InMemoryBackend::demo();
    let mut phone = TestClient::new(&backend);
    phone.login_demo().await;
    assert!(phone.get("/cart").await.cart_lines().is_empty());

    let mut laptop = phone.new_visitor();
    laptop.login_demo().await;
    laptop.post("/cart/add", json!({ "product_id": 2 })).await;

    assert_eq!(phone.get("/cart").await.cart_lines(), vec![(2, 1)]);
    let cart = phone.post("/cart/add", json!({ "product_id": 2 })).await;
    assert_eq!(cart.cart_lines(), vec![(2, 2)]);

    let order = phone.post("/checkout", json!({})).await;
    assert_eq!(order.status, StatusCode::CREATED);
    assert_eq!(order.body["items"][0]["id"], 2);
    assert_eq!(order.body["items"][0]["quantity"], 2);
    assert!(backend.rows(Table::Cart, &demo_user()).is_empty());

    assert!(laptop.get("/cart").await.cart_lines().is_empty());
}

#[tokio::test]
async fn test_failed_order_keeps_cart() {
    let backend = InMemoryBackend::demo();
    let mut client = TestClient::new(&backend);
    client.login_demo().await;
    client.post("/cart/add", json!({ "product_id": 4 })).await;

    backend.fail_orders(true);
    let response = client.post("/checkout", json!({})).await;
    assert_eq!(response.status, StatusCode::BAD_GATEWAY);

    backend.fail_orders(false);
    assert_eq!(client.get("/cart").await.cart_lines(), vec![(4, 1)]);
    assert_eq!(backend.rows(Table::Cart, &demo_user()).len(), 1);
}

#[tokio::test]
async fn test_account_requires_sign_in() {
    let backend = InMemoryBackend::demo();
    let mut client = TestClient::new(&backend);

    assert_eq!(client.get("/account").await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        client.get("/account/orders").await.status,
        StatusCode::UNAUTHORIZED
    );
}
