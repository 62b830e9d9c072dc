//! Catalog browsing and health checks.

use axum::http::{Request, StatusCode};
use bazaar_integration_tests::TestClient;
use bazaar_storefront::backend::InMemoryBackend;

#[tokio::test]
async fn test_health_endpoints() {
    let mut client = TestClient::new(&InMemoryBackend::demo());

    let health = client.get("/health").await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.body, "ok");

    assert_eq!(client.get("/health/ready").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_product_search_and_categories() {
    let mut client = TestClient::new(&InMemoryBackend::demo());

    let products = client.get("/products?search=pen").await;
    let titles: Vec<_> = products
        .body
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|p| p["title"].as_str())
        .collect();
    assert_eq!(titles, vec!["Brass Pen"]);

    let kitchen = client.get("/products?category=kitchen").await;
    assert_eq!(kitchen.body.as_array().map(Vec::len), Some(3));

    let categories = client.get("/products/categories").await;
    assert_eq!(
        categories.body,
        serde_json::json!(["bags", "kitchen", "stationery"])
    );
}

#[tokio::test]
async fn test_product_detail() {
    let mut client = TestClient::new(&InMemoryBackend::demo());

    let product = client.get("/products/5").await;
    assert_eq!(product.status, StatusCode::OK);
    assert_eq!(product.body["title"], "Waxed Daypack");

    assert_eq!(client.get("/products/404").await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_request_id_is_generated_or_echoed() {
    let mut client = TestClient::new(&InMemoryBackend::demo());

    let response = client.get("/health").await;
    let generated = response
        .headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert_eq!(generated.len(), 36);

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "edge-42");
    let response = client.send_with(request, None).await;
    assert_eq!(
        response.headers.get("x-request-id").and_then(|v| v.to_str().ok()),
        Some("edge-42")
    );
}
