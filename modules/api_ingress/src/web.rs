use axum::{http::header, response::IntoResponse, Json};
use serde_json::{json, Value};

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Serve a pre-rendered OpenAPI document.
pub fn openapi_response(doc: &Value) -> impl IntoResponse {
    ([(header::CACHE_CONTROL, "no-store")], Json(doc.clone()))
}
