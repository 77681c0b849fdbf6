use axum::Router;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use super::routes::ROUTES;
use super::state::ServerState;
use crate::pipeline::TriggerHandler;

pub fn get_app(handler: Arc<TriggerHandler>, cancellation_token: CancellationToken) -> Router {
    let state = ServerState::new(handler, cancellation_token);

    let mut router = Router::new();
    for (path, method_router) in ROUTES.iter() {
        router = router.route(path, method_router.clone());
    }
    router.layer(TraceLayer::new_for_http()).with_state(state)
}
