use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

pub const HEALTH_ENDPOINT: &str = "/health";

pub async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok", "version": env!("CARGO_PKG_VERSION")}))
}
