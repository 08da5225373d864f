use axum::{
    body::Body,
    extract::Extension,
    http::{Request, StatusCode},
    response::Json,
    routing::get,
    Router,
};
use serde_json::json;
use tower::util::ServiceExt; // for `oneshot`

use api_ingress::request_id::XRequestId;
use api_ingress::{ApiIngress, ApiIngressConfig};

#[tokio::test]
async fn generates_request_id_when_missing() {
    let app = test_app(ApiIngressConfig::default());

    let response = app
        .oneshot(Request::builder().uri("/test").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let request_id = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    assert!(request_id.is_some(), "x-request-id should be generated");

    // handlers see the same id that is echoed back
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["request_id"].as_str(), request_id.as_deref());
}

#[tokio::test]
async fn preserves_incoming_request_id() {
    let app = test_app(ApiIngressConfig::default());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/test")
                .header("x-request-id", "abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let request_id = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok());
    assert_eq!(request_id, Some("abc-123"));
}

#[tokio::test]
async fn health_and_openapi_are_served() {
    let app = test_app(ApiIngressConfig::default());

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "healthy");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["info"]["title"], "Userhub API");
}

#[tokio::test]
async fn docs_can_be_disabled() {
    let app = test_app(ApiIngressConfig {
        enable_docs: false,
        ..ApiIngressConfig::default()
    });

    let response = app
        .oneshot(
            Request::builder()
                .uri("/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn oversized_bodies_are_rejected() {
    let app = test_app(ApiIngressConfig {
        body_limit_bytes: 8,
        ..ApiIngressConfig::default()
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/echo")
                .body(Body::from("this body is longer than eight bytes"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn slow_requests_hit_the_configured_timeout() {
    let app = test_app(ApiIngressConfig {
        request_timeout_secs: Some(1),
        ..ApiIngressConfig::default()
    });

    let response = app
        .oneshot(Request::builder().uri("/slow").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
}

#[tokio::test]
async fn zero_timeout_lets_slow_requests_finish() {
    let app = test_app(ApiIngressConfig {
        request_timeout_secs: Some(0),
        ..ApiIngressConfig::default()
    });

    let response = app
        .oneshot(Request::builder().uri("/slow").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn serve_stops_on_cancel() {
    let ingress = ApiIngress::new(ApiIngressConfig::default());
    let router = ingress.build_router(Router::new()).unwrap();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let cancel = tokio_util::sync::CancellationToken::new();

    let server = tokio::spawn(ApiIngress::serve_on(listener, router, cancel.clone()));
    cancel.cancel();

    let result = tokio::time::timeout(std::time::Duration::from_secs(5), server)
        .await
        .expect("server should stop after cancellation")
        .unwrap();
    assert!(result.is_ok());
}

// Test app with the full ingress stack around a few test routes
fn test_app(config: ApiIngressConfig) -> Router {
    let routes = Router::new()
        .route("/test", get(success_handler))
        .route("/slow", get(slow_handler))
        .route("/echo", axum::routing::post(echo_handler));

    ApiIngress::new(config).build_router(routes).unwrap()
}

async fn success_handler(
    Extension(XRequestId(request_id)): Extension<XRequestId>,
) -> Json<serde_json::Value> {
    Json(json!({"status": "ok", "request_id": request_id}))
}

async fn slow_handler() -> &'static str {
    tokio::time::sleep(std::time::Duration::from_millis(1500)).await;
    "done"
}

async fn echo_handler(body: String) -> String {
    body
}
