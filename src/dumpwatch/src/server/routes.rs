use axum::routing::{get, post, MethodRouter};
use std::sync::LazyLock;

use super::handlers::capture::{capture, CAPTURE_ENDPOINT};
use super::handlers::events::{events, EVENTS_ENDPOINT};
use super::handlers::health::{health, HEALTH_ENDPOINT};
use super::handlers::webhook::{webhook, WEBHOOK_ENDPOINT};
use super::state::ServerState;

pub(super) static ROUTES: LazyLock<Vec<(&'static str, MethodRouter<ServerState>)>> =
    LazyLock::new(|| {
        vec![
            (WEBHOOK_ENDPOINT, post(webhook)),
            (CAPTURE_ENDPOINT, post(capture)),
            (EVENTS_ENDPOINT, post(events)),
            (HEALTH_ENDPOINT, get(health)),
        ]
    });
