//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use catalog_store::{
    CatalogItem, CatalogItemId, CatalogStoreExt, InMemoryCatalogStore, InMemoryStoreConfig, Price,
};
use coordinator::{CoordinatorConfig, InMemoryInventoryNotifier, NotifyFailure};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

struct TestApp {
    app: axum::Router,
    store: InMemoryCatalogStore,
    inventory: InMemoryInventoryNotifier,
    shutdown: CancellationToken,
}

fn setup() -> TestApp {
    let store = InMemoryCatalogStore::seeded(InMemoryStoreConfig::default());
    let inventory = InMemoryInventoryNotifier::new();
    let shutdown = CancellationToken::new();
    let state = api::create_state(
        store.clone(),
        Arc::new(inventory.clone()),
        CoordinatorConfig::default(),
        shutdown.clone(),
    );
    let app = api::create_app(state, get_metrics_handle());

    TestApp {
        app,
        store,
        inventory,
        shutdown,
    }
}

async fn send(app: &axum::Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn mug_body() -> serde_json::Value {
    serde_json::json!({
        "name": "Mug",
        "description": "Ceramic mug",
        "price": 8.5,
        "catalog_brand_id": 2,
        "catalog_type_id": 1
    })
}

fn update_body(id: i32, price: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "name": "Roslyn Red Sheet",
        "description": "Roslyn Red Sheet",
        "price": price,
        "catalog_brand_id": 5,
        "catalog_type_id": 3,
        "quantity": 2
    })
}

#[tokio::test]
async fn test_health_check() {
    let t = setup();

    let response = send(&t.app, empty_request("GET", "/health")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["items"], 12);
}

#[tokio::test]
async fn test_get_item() {
    let t = setup();

    let response = send(&t.app, empty_request("GET", "/api/catalog/item/2")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let item: CatalogItem = serde_json::from_value(body_json(response).await).unwrap();
    assert_eq!(item.name, ".NET Black & White Mug");
    assert_eq!(item.price, Price::from_cents(850));
}

#[tokio::test]
async fn test_get_missing_item_is_404() {
    let t = setup();

    let response = send(&t.app, empty_request("GET", "/api/catalog/item/999")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert!(json["error"].as_str().is_some());
}

#[tokio::test]
async fn test_list_brands_and_types() {
    let t = setup();

    let response = send(&t.app, empty_request("GET", "/api/catalog/brand")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let brands = body_json(response).await;
    assert_eq!(brands.as_array().unwrap().len(), 5);
    assert_eq!(brands[0]["brand"], "Azure");

    let response = send(&t.app, empty_request("GET", "/api/catalog/type")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let types = body_json(response).await;
    assert_eq!(types.as_array().unwrap().len(), 4);
    assert_eq!(types[0]["type"], "Mug");
}

#[tokio::test]
async fn test_get_brand_and_type_by_id() {
    let t = setup();

    let response = send(&t.app, empty_request("GET", "/api/catalog/brand/2")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let brand = body_json(response).await;
    assert_eq!(brand["id"], 2);
    assert_eq!(brand["brand"], ".NET");

    let response = send(&t.app, empty_request("GET", "/api/catalog/type/1")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let catalog_type = body_json(response).await;
    assert_eq!(catalog_type["id"], 1);
    assert_eq!(catalog_type["type"], "Mug");
}

#[tokio::test]
async fn test_missing_brand_and_type_are_404() {
    let t = setup();

    let response = send(&t.app, empty_request("GET", "/api/catalog/brand/42")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Catalog brand not found: 42");

    let response = send(&t.app, empty_request("GET", "/api/catalog/type/42")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_item() {
    let t = setup();

    let response = send(&t.app, json_request("POST", "/api/catalog/item", mug_body())).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["price"], 8.5);
    let item: CatalogItem = serde_json::from_value(json).unwrap();
    assert_eq!(item.id, CatalogItemId::new(13));
    assert_eq!(item.price, Price::from_cents(850));
    assert!(t.store.item_exists(item.id).await.unwrap());
    assert_eq!(t.inventory.stock_for(item.id), Some(5));
}

#[tokio::test]
async fn test_create_with_failing_inventory_is_502() {
    let t = setup();
    t.inventory
        .fail_with(NotifyFailure::Transport("connection refused".to_string()));

    let response = send(&t.app, json_request("POST", "/api/catalog/item", mug_body())).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(!t.store.item_exists(CatalogItemId::new(13)).await.unwrap());
    assert_eq!(t.store.open_sessions(), 0);
}

#[tokio::test]
async fn test_create_with_unknown_brand_is_400() {
    let t = setup();
    let mut body = mug_body();
    body["catalog_brand_id"] = serde_json::json!(42);

    let response = send(&t.app, json_request("POST", "/api/catalog/item", body)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(t.inventory.received().is_empty());
}

#[tokio::test]
async fn test_update_item() {
    let t = setup();

    let response = send(
        &t.app,
        json_request("PUT", "/api/catalog/item/5", update_body(5, "99.99")),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let item = t
        .store
        .items()
        .await
        .into_iter()
        .find(|item| item.id == CatalogItemId::new(5))
        .unwrap();
    assert_eq!(item.price, Price::from_cents(9999));
    assert_eq!(t.inventory.stock_for(item.id), Some(2));
}

#[tokio::test]
async fn test_update_with_mismatched_id_is_400() {
    let t = setup();

    let response = send(
        &t.app,
        json_request("PUT", "/api/catalog/item/5", update_body(6, "99.99")),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Id in route and body must match");
    assert!(t.inventory.received().is_empty());
}

#[tokio::test]
async fn test_update_with_failing_inventory_keeps_price() {
    let t = setup();
    t.inventory
        .fail_with(NotifyFailure::Rejected("status 500".to_string()));

    let response = send(
        &t.app,
        json_request("PUT", "/api/catalog/item/5", update_body(5, "99.99")),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let response = send(&t.app, empty_request("GET", "/api/catalog/item/5")).await;
    let item: CatalogItem = serde_json::from_value(body_json(response).await).unwrap();
    assert_eq!(item.price, Price::from_cents(850));
}

#[tokio::test]
async fn test_update_missing_item_is_404() {
    let t = setup();

    let response = send(
        &t.app,
        json_request("PUT", "/api/catalog/item/999", update_body(999, "1.00")),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_item() {
    let t = setup();

    let response = send(&t.app, empty_request("DELETE", "/api/catalog/item/7")).await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(!t.store.item_exists(CatalogItemId::new(7)).await.unwrap());
}

#[tokio::test]
async fn test_delete_with_failing_inventory_is_still_204() {
    let t = setup();
    t.inventory.fail_with(NotifyFailure::Timeout);

    let response = send(&t.app, empty_request("DELETE", "/api/catalog/item/7")).await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(!t.store.item_exists(CatalogItemId::new(7)).await.unwrap());
}

#[tokio::test]
async fn test_delete_missing_item_is_404() {
    let t = setup();

    let response = send(&t.app, empty_request("DELETE", "/api/catalog/item/999")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_writes_after_shutdown_are_503() {
    let t = setup();
    t.shutdown.cancel();

    let response = send(&t.app, json_request("POST", "/api/catalog/item", mug_body())).await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(t.store.sessions_opened(), 0);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let t = setup();

    send(&t.app, json_request("POST", "/api/catalog/item", mug_body())).await;
    let response = send(&t.app, empty_request("GET", "/metrics")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("catalog_writes_total"));
}
