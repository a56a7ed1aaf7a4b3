#![allow(dead_code, missing_docs, clippy::expect_used)]
use std::net::TcpListener;
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::Path;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{any, get};
use serde_json::{Value, json};
use tracing::info;

use bea_api_client::Dispatcher;
use bea_api_client::test_backend::TestBackend;

/// A small storefront backend answering the shapes the dispatcher must handle.
#[derive(Debug)]
pub struct StoreBackend;

impl TestBackend for StoreBackend {
    async fn launch(&self, listener: TcpListener) {
        listener.set_nonblocking(true).expect("set non-blocking");
        let listener = tokio::net::TcpListener::from_std(listener).expect("valid listener");
        info!(?listener, "launching store backend");
        axum::serve(listener, router())
            .await
            .expect("store backend served");
    }

    async fn is_healthy(&self, dispatcher: &Dispatcher) -> Option<bool> {
        Some(dispatcher.dispatch("/health", None).await.is_ok())
    }
}

pub fn router() -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/products/1", get(product))
        .route("/products/404", get(product_not_found))
        .route("/products/slow/{millis}", get(slow_product))
        .route("/boom", get(boom))
        .route("/broken", get(broken))
        .route("/empty-error", get(empty_error))
        .route("/out-of-stock", get(out_of_stock))
        .route("/vendor", get(vendor))
        .route("/echo", any(echo))
}

async fn health() -> &'static str {
    "ok"
}

async fn product() -> Json<Value> {
    Json(json!({ "id": 1 }))
}

async fn product_not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" })))
}

async fn slow_product(Path(millis): Path<u64>) -> Json<Value> {
    tokio::time::sleep(Duration::from_millis(millis)).await;
    Json(json!({ "id": millis }))
}

async fn boom() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, "internal failure")
}

async fn broken() -> impl IntoResponse {
    ([(CONTENT_TYPE, "application/json")], "{not json")
}

async fn empty_error() -> impl IntoResponse {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": "" })))
}

async fn out_of_stock() -> impl IntoResponse {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({ "error": { "code": "OUT_OF_STOCK", "sku": "TSHIRT-M" } })),
    )
}

async fn vendor() -> impl IntoResponse {
    (
        [(CONTENT_TYPE, "application/vnd.api+json")],
        r#"{"data":[]}"#,
    )
}

async fn echo(method: Method, headers: HeaderMap, body: String) -> Json<Value> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string)
    };
    Json(json!({
        "method": method.as_str(),
        "content_type": header("content-type"),
        "cart_id": header("x-cart-id"),
        "body": body,
    }))
}
