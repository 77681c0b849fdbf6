use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use serde_json::Value;

use crate::server::state::ServerState;

pub const WEBHOOK_ENDPOINT: &str = "/webhook";

/// Alert-manager webhook. The body is kept raw so credentials are checked
/// before anything tries to parse it.
pub async fn webhook(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    let body = Value::String(String::from_utf8_lossy(&body).into_owned());

    state.handler().handle_webhook(authorization, &body).await
}
