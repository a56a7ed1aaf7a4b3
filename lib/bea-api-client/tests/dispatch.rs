use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Context;
use http::Method;
use rstest::rstest;
use serde::Deserialize;
use serde_json::json;

use bea_api_client::test_backend::TestClient;
use bea_api_client::{
    DispatchError, Dispatcher, ErrorKind, Payload, Rejection, RequestOptions, handler,
};

mod common;
use self::common::*;

#[derive(Debug, Deserialize, PartialEq)]
struct Product {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct Echo {
    method: String,
    content_type: Option<String>,
    cart_id: Option<String>,
    body: String,
}

#[rstest]
#[tokio::test]
async fn should_resolve_with_parsed_json(
    #[future] backend: TestClient<StoreBackend>,
) -> anyhow::Result<()> {
    let backend = backend.await;

    let payload = backend.dispatch("/products/1", None).await?;

    assert_eq!(payload, Payload::Json(json!({ "id": 1 })));
    let product = payload.as_json::<Product>()?;
    assert_eq!(product, Product { id: 1 });

    Ok(())
}

#[rstest]
#[tokio::test]
async fn should_resolve_with_text_when_not_json(
    #[future] backend: TestClient<StoreBackend>,
) -> anyhow::Result<()> {
    let backend = backend.await;

    let payload = backend.dispatch("/health", None).await?;

    assert_eq!(payload.as_text(), Some("ok"));

    Ok(())
}

#[rstest]
#[tokio::test]
async fn should_parse_json_suffixed_media_types(
    #[future] backend: TestClient<StoreBackend>,
) -> anyhow::Result<()> {
    let backend = backend.await;

    let payload = backend.dispatch("/vendor", None).await?;

    assert_eq!(payload, Payload::Json(json!({ "data": [] })));

    Ok(())
}

#[rstest]
#[tokio::test]
async fn should_reject_with_error_field(#[future] backend: TestClient<StoreBackend>) {
    let backend = backend.await;

    let error = backend
        .dispatch("/products/404", None)
        .await
        .expect_err("should reject");

    assert_eq!(error.rejection(), Rejection::Value(json!("not found")));
    assert_eq!(error.kind(), ErrorKind::Application);
    assert_eq!(error.status(), Some(404));
    match error {
        DispatchError::Rejected { body, .. } => {
            assert_eq!(body, Payload::Json(json!({ "error": "not found" })));
        }
        other => panic!("Expected Rejected, got: {other:?}"),
    }
}

#[rstest]
#[case::text_body("/boom", 500)]
#[case::falsy_error_field("/empty-error", 400)]
#[case::unknown_route("/unknown", 404)]
#[tokio::test]
async fn should_reject_with_status_without_usable_error_field(
    #[future] backend: TestClient<StoreBackend>,
    #[case] relative_path: &str,
    #[case] status: u16,
) {
    let backend = backend.await;

    let error = backend
        .dispatch(relative_path, None)
        .await
        .expect_err("should reject");

    assert_eq!(error.rejection(), Rejection::Status(status));
    assert_eq!(error.status(), Some(status));
}

#[rstest]
#[tokio::test]
async fn should_reject_with_structured_error_field(
    #[future] backend: TestClient<StoreBackend>,
) {
    let backend = backend.await;

    let error = backend
        .dispatch("/out-of-stock", None)
        .await
        .expect_err("should reject");

    assert_eq!(
        error.rejection(),
        Rejection::Value(json!({ "code": "OUT_OF_STOCK", "sku": "TSHIRT-M" }))
    );
    insta::assert_snapshot!(
        error,
        @r#"Request rejected with status 422: {"code":"OUT_OF_STOCK","sku":"TSHIRT-M"}"#
    );
}

#[rstest]
#[tokio::test]
async fn should_reject_with_parse_error_on_malformed_json(
    #[future] backend: TestClient<StoreBackend>,
) {
    let backend = backend.await;

    let error = backend
        .dispatch("/broken", None)
        .await
        .expect_err("should reject");

    assert_eq!(error.kind(), ErrorKind::BodyRead);
    assert!(matches!(
        error,
        DispatchError::InvalidJson { status: 200, .. }
    ));
}

#[tokio::test]
async fn should_reject_with_transport_error_on_refused_connection() -> anyhow::Result<()> {
    init_tracing();
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let local_addr = listener.local_addr()?;
    drop(listener);

    let dispatcher = Dispatcher::builder()
        .with_base_address(format!("http://{local_addr}"))
        .build()?;

    let error = dispatcher
        .dispatch("/products/1", None)
        .await
        .expect_err("should reject");

    assert_eq!(error.kind(), ErrorKind::Transport);
    assert_eq!(error.status(), None);
    assert!(matches!(error, DispatchError::Transport(_)));

    Ok(())
}

#[rstest]
#[tokio::test]
async fn should_forward_method_headers_and_json_body(
    #[future] backend: TestClient<StoreBackend>,
) -> anyhow::Result<()> {
    let backend = backend.await;

    let payload = backend
        .post("/echo")
        .with_header("x-cart-id", "c-42")?
        .json(&json!({ "sku": "TSHIRT-M" }))?
        .await?;

    let echo = payload.as_json::<Echo>()?;
    assert_eq!(echo.method, "POST");
    assert_eq!(echo.content_type.as_deref(), Some("application/json"));
    assert_eq!(echo.cart_id.as_deref(), Some("c-42"));
    assert_eq!(echo.body, r#"{"sku":"TSHIRT-M"}"#);

    Ok(())
}

#[rstest]
#[tokio::test]
async fn should_send_form_body(#[future] backend: TestClient<StoreBackend>) -> anyhow::Result<()> {
    let backend = backend.await;

    let payload = backend
        .put("/echo")
        .form(&[("sku", "TSHIRT-M"), ("quantity", "2")])?
        .await?;

    let echo = payload.as_json::<Echo>()?;
    assert_eq!(echo.method, "PUT");
    assert_eq!(
        echo.content_type.as_deref(),
        Some("application/x-www-form-urlencoded")
    );
    assert_eq!(echo.body, "sku=TSHIRT-M&quantity=2");

    Ok(())
}

#[rstest]
#[tokio::test]
async fn should_keep_explicit_content_type(
    #[future] backend: TestClient<StoreBackend>,
) -> anyhow::Result<()> {
    let backend = backend.await;

    let options = RequestOptions::new()
        .with_method(Method::PATCH)
        .with_header("content-type", "application/merge-patch+json")?
        .with_json(&json!({ "quantity": 3 }))?;
    let payload = backend.dispatch("/echo", Some(options)).await?;

    let echo = payload.as_json::<Echo>()?;
    assert_eq!(echo.method, "PATCH");
    assert_eq!(
        echo.content_type.as_deref(),
        Some("application/merge-patch+json")
    );

    Ok(())
}

#[rstest]
#[tokio::test]
async fn should_default_to_get_without_body(
    #[future] backend: TestClient<StoreBackend>,
) -> anyhow::Result<()> {
    let backend = backend.await;

    let payload = backend.dispatch("/echo?page=2", None).await?;

    let echo = payload.as_json::<Echo>()?;
    assert_eq!(echo.method, "GET");
    assert_eq!(echo.content_type, None);
    assert_eq!(echo.cart_id, None);
    assert_eq!(echo.body, "");

    Ok(())
}

#[rstest]
#[tokio::test]
async fn should_call_error_handler_once_per_failure(
    #[future] backend: TestClient<StoreBackend>,
) -> anyhow::Result<()> {
    let backend = backend.await;
    let failures = Arc::new(AtomicUsize::new(0));

    let dispatcher = Dispatcher::builder()
        .with_base_address(backend.base_address())
        .with_error_handler({
            let failures = Arc::clone(&failures);
            move |error: DispatchError| {
                failures.fetch_add(1, Ordering::SeqCst);
                Err::<Payload, _>(error)
            }
        })
        .build()?;

    dispatcher.dispatch("/products/1", None).await?;
    assert_eq!(failures.load(Ordering::SeqCst), 0);

    let error = dispatcher
        .dispatch("/products/404", None)
        .await
        .expect_err("should reject");
    assert_eq!(error.rejection(), Rejection::Value(json!("not found")));
    assert_eq!(failures.load(Ordering::SeqCst), 1);

    Ok(())
}

#[rstest]
#[tokio::test]
async fn should_settle_with_error_handler_recovery(
    #[future] backend: TestClient<StoreBackend>,
) -> anyhow::Result<()> {
    let backend = backend.await;

    let dispatcher = Dispatcher::builder()
        .with_base_address(backend.base_address())
        .with_error_handler(|error: DispatchError| match error.rejection() {
            Rejection::Status(status) => Ok(Payload::Json(json!({ "fallback": status }))),
            _ => Err(error),
        })
        .build()?;

    let payload = dispatcher.dispatch("/boom", None).await?;
    assert_eq!(payload, Payload::Json(json!({ "fallback": 500 })));

    let error = dispatcher
        .dispatch("/products/404", None)
        .await
        .expect_err("should still reject");
    assert_eq!(error.rejection(), Rejection::Value(json!("not found")));

    Ok(())
}

#[rstest]
#[tokio::test]
async fn should_hand_every_response_to_success_handler(
    #[future] backend: TestClient<StoreBackend>,
) -> anyhow::Result<()> {
    let backend = backend.await;

    let dispatcher = Dispatcher::builder()
        .with_base_address(backend.base_address())
        .with_success_handler(|response: reqwest::Response| async move {
            let status = response.status().as_u16();
            let body = handler::read_payload(response).await?;
            Ok::<_, DispatchError>(Payload::Json(
                json!({ "status": status, "body": body.into_value() }),
            ))
        })
        .build()?;

    let payload = dispatcher.dispatch("/products/404", None).await?;

    assert_eq!(
        payload,
        Payload::Json(json!({ "status": 404, "body": { "error": "not found" } }))
    );

    Ok(())
}

#[rstest]
#[tokio::test]
async fn should_route_success_handler_rejection_to_error_handler(
    #[future] backend: TestClient<StoreBackend>,
) -> anyhow::Result<()> {
    let backend = backend.await;
    let failures = Arc::new(AtomicUsize::new(0));

    let dispatcher = Dispatcher::builder()
        .with_base_address(backend.base_address())
        .with_success_handler(|_response: reqwest::Response| async {
            Err::<Payload, _>(DispatchError::handler("maintenance mode"))
        })
        .with_error_handler({
            let failures = Arc::clone(&failures);
            move |error: DispatchError| {
                failures.fetch_add(1, Ordering::SeqCst);
                Err::<Payload, _>(error)
            }
        })
        .build()?;

    let error = dispatcher
        .dispatch("/products/1", None)
        .await
        .expect_err("should reject");

    assert_eq!(
        error.rejection(),
        Rejection::Error("maintenance mode".to_string())
    );
    assert_eq!(failures.load(Ordering::SeqCst), 1);

    Ok(())
}

#[rstest]
#[tokio::test]
async fn should_dispatch_concurrently(
    #[future] backend: TestClient<StoreBackend>,
) -> anyhow::Result<()> {
    let backend = backend.await;

    let (slow, fast, missing) = tokio::join!(
        backend.dispatch("/products/slow/200", None),
        backend.dispatch("/products/slow/10", None),
        backend.dispatch("/products/404", None),
    );

    assert_eq!(slow?, Payload::Json(json!({ "id": 200 })));
    assert_eq!(fast?, Payload::Json(json!({ "id": 10 })));
    assert_eq!(
        missing.expect_err("should reject").rejection(),
        Rejection::Value(json!("not found"))
    );

    Ok(())
}

#[rstest]
#[tokio::test]
async fn should_give_same_outcome_for_same_configuration(
    #[future] backend: TestClient<StoreBackend>,
) -> anyhow::Result<()> {
    let backend = backend.await;

    let other = Dispatcher::builder()
        .with_base_address(backend.base_address())
        .build()
        .context("should build a second dispatcher")?;

    for relative_path in ["/products/1", "/health", "/products/404", "/boom"] {
        let first = backend.dispatch(relative_path, None).await;
        let second = other.dispatch(relative_path, None).await;

        match (first, second) {
            (Ok(first), Ok(second)) => assert_eq!(first, second),
            (Err(first), Err(second)) => assert_eq!(first.rejection(), second.rejection()),
            (first, second) => panic!("Outcomes differ: {first:?} vs {second:?}"),
        }
    }

    Ok(())
}

#[tokio::test]
async fn should_attempt_https_connections() -> anyhow::Result<()> {
    init_tracing();
    let dispatcher = Dispatcher::builder()
        .with_base_address("https://127.0.0.1:1")
        .build()?;

    let error = dispatcher
        .dispatch("/products/1", None)
        .await
        .expect_err("nothing listens on port 1");

    let DispatchError::Transport(transport) = &error else {
        panic!("Expected Transport, got: {error:?}");
    };
    assert!(transport.is_connect());
    assert!(!format!("{transport:?}").contains("scheme is not http"));

    Ok(())
}

#[rstest]
#[tokio::test]
async fn should_dispatch_through_custom_http_client(
    #[future] backend: TestClient<StoreBackend>,
) -> anyhow::Result<()> {
    let backend = backend.await;

    let mut default_headers = http::HeaderMap::new();
    default_headers.insert("x-cart-id", http::HeaderValue::from_static("from-client"));
    let http = reqwest::Client::builder()
        .default_headers(default_headers)
        .build()?;

    let dispatcher = Dispatcher::builder()
        .with_base_address(backend.base_address())
        .with_http_client(http)
        .build()?;

    let echo = dispatcher.dispatch("/echo", None).await?.as_json::<Echo>()?;
    assert_eq!(echo.cart_id.as_deref(), Some("from-client"));

    let options = RequestOptions::new().with_header("x-cart-id", "c-42")?;
    let echo = dispatcher
        .dispatch("/echo", Some(options))
        .await?
        .as_json::<Echo>()?;
    assert_eq!(echo.cart_id.as_deref(), Some("c-42"));

    Ok(())
}

#[rstest]
#[tokio::test]
async fn should_send_typed_headers(
    #[future] backend: TestClient<StoreBackend>,
) -> anyhow::Result<()> {
    let backend = backend.await;

    let options = RequestOptions::new()
        .with_method(Method::POST)
        .with_typed_header(headers::ContentType::text())
        .with_json(&json!({ "sku": "TSHIRT-M" }))?;
    let echo = backend
        .dispatch("/echo", Some(options))
        .await?
        .as_json::<Echo>()?;

    assert_eq!(echo.content_type.as_deref(), Some("text/plain"));
    assert_eq!(echo.body, r#"{"sku":"TSHIRT-M"}"#);

    Ok(())
}
