use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::Value;

use crate::server::state::ServerState;

pub const EVENTS_ENDPOINT: &str = "/events";

/// Raw invocation events of any shape, classified server-side.
pub async fn events(
    State(state): State<ServerState>,
    Json(event): Json<Value>,
) -> impl IntoResponse {
    state.handler().handle_event(event).await
}
