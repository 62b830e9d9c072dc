//! A guest's cart and wishlist carried across login and logout.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use bazaar_core::{ProductId, Quantity};
use bazaar_integration_tests::{TestClient, demo_user};
use bazaar_storefront::backend::{InMemoryBackend, RemoteRow, Table};
use serde_json::json;

#[tokio::test]
async fn test_guest_cart_persists_in_session() {
    let backend = InMemoryBackend::demo();
    let mut client = TestClient::new(&backend);

    client.post("/cart/add", json!({ "product_id": 1 })).await;
    client.post("/cart/add", json!({ "product_id": 1 })).await;
    let cart = client.post("/cart/add", json!({ "product_id": 4 })).await;

    assert_eq!(cart.status, StatusCode::OK);
    assert_eq!(cart.cart_lines(), vec![(1, 2), (4, 1)]);
    assert_eq!(cart.body["subtotal"], "$48.00");
    assert_eq!(cart.body["synced"], true);

    let count = client.get("/cart/count").await;
    assert_eq!(count.body["count"], 3);

    // Nothing reaches the backend while browsing as a guest
    assert!(backend.rows(Table::Cart, &demo_user()).is_empty());

    // Another visitor has their own cart
    let mut other = client.new_visitor();
    assert!(other.get("/cart").await.cart_lines().is_empty());
}

#[tokio::test]
async fn test_login_merges_guest_cart_into_account() {
    let backend = InMemoryBackend::demo().with_row(
        Table::Cart,
        RemoteRow::cart(demo_user(), ProductId::new(1), Quantity::new(3).unwrap()),
    );
    let mut client = TestClient::new(&backend);

    client.post("/cart/add", json!({ "product_id": 1 })).await;
    client.post("/cart/add", json!({ "product_id": 2 })).await;

    let login = client.login_demo().await;
    assert_eq!(login.body["user"]["name"], "demo");
    assert_eq!(login.body["merge"]["cart"]["updated"], 1);
    assert_eq!(login.body["merge"]["cart"]["inserted"], 1);
    assert_eq!(login.body["synced"], true);

    // Quantities add up across guest and account
    let cart = client.get("/cart").await;
    assert_eq!(cart.cart_lines(), vec![(1, 4), (2, 1)]);

    let rows = backend.rows(Table::Cart, &demo_user());
    assert_eq!(rows.len(), 2);
    assert!(
        rows.iter()
            .any(|r| r.product_id == ProductId::new(1) && r.quantity_or_one().get() == 4)
    );
}

#[tokio::test]
async fn test_login_does_not_duplicate_wishlist_entries() {
    let backend = InMemoryBackend::demo().with_row(
        Table::Wishlist,
        RemoteRow::wishlist(demo_user(), ProductId::new(3)),
    );
    let mut client = TestClient::new(&backend);

    client.post("/wishlist/add", json!({ "product_id": 3 })).await;
    client.post("/wishlist/add", json!({ "product_id": 5 })).await;

    let login = client.login_demo().await;
    assert_eq!(login.body["merge"]["wishlist"]["skipped"], 1);
    assert_eq!(login.body["merge"]["wishlist"]["inserted"], 1);

    let wishlist = client.get("/wishlist").await;
    assert_eq!(wishlist.wishlist_ids(), vec![3, 5]);
    assert_eq!(backend.rows(Table::Wishlist, &demo_user()).len(), 2);

    let member = client.get("/wishlist/5").await;
    assert_eq!(member.body["member"], true);
}

#[tokio::test]
async fn test_signed_in_changes_are_mirrored() {
    let backend = InMemoryBackend::demo();
    let mut client = TestClient::new(&backend);
    client.login_demo().await;

    client.post("/cart/add", json!({ "product_id": 6 })).await;
    let cart = client
        .post("/cart/update", json!({ "product_id": 6, "quantity": 5 }))
        .await;
    assert_eq!(cart.cart_lines(), vec![(6, 5)]);

    let rows = backend.rows(Table::Cart, &demo_user());
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].quantity_or_one().get(), 5);

    let cart = client
        .post("/cart/update", json!({ "product_id": 6, "quantity": 0 }))
        .await;
    assert!(cart.cart_lines().is_empty());
    assert!(backend.rows(Table::Cart, &demo_user()).is_empty());
}

#[tokio::test]
async fn test_logout_starts_an_empty_guest() {
    let backend = InMemoryBackend::demo();
    let mut client = TestClient::new(&backend);

    client.post("/cart/add", json!({ "product_id": 2 })).await;
    client.login_demo().await;
    client.post("/wishlist/add", json!({ "product_id": 7 })).await;

    let logout = client.post("/auth/logout", json!({})).await;
    assert_eq!(logout.status, StatusCode::NO_CONTENT);

    assert!(client.get("/cart").await.cart_lines().is_empty());
    assert!(client.get("/wishlist").await.wishlist_ids().is_empty());
    assert_eq!(client.get("/auth/me").await.status, StatusCode::UNAUTHORIZED);

    // The account keeps its rows for the next login
    assert_eq!(backend.rows(Table::Cart, &demo_user()).len(), 1);
    assert_eq!(backend.rows(Table::Wishlist, &demo_user()).len(), 1);

    client.login_demo().await;
    assert_eq!(client.get("/cart").await.cart_lines(), vec![(2, 1)]);
}

#[tokio::test]
async fn test_wrong_password_keeps_guest_state() {
    let backend = InMemoryBackend::demo();
    let mut client = TestClient::new(&backend);
    client.post("/cart/add", json!({ "product_id": 1 })).await;

    let login = client
        .post("/auth/login", json!({ "username": "demo", "password": "nope" }))
        .await;
    assert_eq!(login.status, StatusCode::UNAUTHORIZED);

    assert_eq!(client.get("/cart").await.cart_lines(), vec![(1, 1)]);
    assert!(backend.rows(Table::Cart, &demo_user()).is_empty());
}

#[tokio::test]
async fn test_remote_failure_is_reported_not_fatal() {
    let backend = InMemoryBackend::demo();
    let mut client = TestClient::new(&backend);
    client.login_demo().await;

    backend.fail_product(ProductId::new(2));
    let cart = client.post("/cart/add", json!({ "product_id": 2 })).await;

    assert_eq!(cart.status, StatusCode::OK);
    assert_eq!(cart.body["synced"], false);
    assert_eq!(cart.cart_lines(), vec![(2, 1)]);
    assert!(backend.rows(Table::Cart, &demo_user()).is_empty());
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let backend = InMemoryBackend::demo();
    let mut client = TestClient::new(&backend);

    let response = client.post("/cart/add", json!({ "product_id": 999 })).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(client.get("/cart").await.cart_lines().is_empty());
}
