mod auth;
mod dispatch;
mod notify;
mod orchestrator;
mod summary;

pub use auth::{BasicAuthGate, WebhookCredentialSource, WebhookCredentials};
pub use dispatch::{TriggerHandler, TriggerResponse};
pub use notify::{notification_for, Notifier};
pub use orchestrator::PipelineOrchestrator;
pub use summary::{BatchStatus, BatchSummary, ItemFailure, ItemResult};
