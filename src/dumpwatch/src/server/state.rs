use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::pipeline::TriggerHandler;

#[derive(Clone)]
pub struct ServerState {
    handler: Arc<TriggerHandler>,
    pub cancellation_token: CancellationToken,
}

impl ServerState {
    pub fn new(handler: Arc<TriggerHandler>, cancellation_token: CancellationToken) -> Self {
        Self {
            handler,
            cancellation_token,
        }
    }

    pub fn handler(&self) -> &TriggerHandler {
        &self.handler
    }
}
