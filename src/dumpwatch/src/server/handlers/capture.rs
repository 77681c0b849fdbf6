use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::Value;

use crate::server::state::ServerState;

pub const CAPTURE_ENDPOINT: &str = "/capture";

pub async fn capture(
    State(state): State<ServerState>,
    Json(request): Json<Value>,
) -> impl IntoResponse {
    state.handler().handle_direct(&request).await
}
