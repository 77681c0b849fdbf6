use http::StatusCode;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::auth::BasicAuthGate;
use super::orchestrator::PipelineOrchestrator;
use crate::alerts::{
    parse_direct, parse_pubsub_message, parse_webhook_body, AlertNormalizer, SingleAlertOutcome,
    TriggerEvent,
};
use crate::error::DumpwatchError;

/// Status, extra headers and JSON body for one handled trigger.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerResponse {
    #[serde(with = "status_code")]
    pub status_code: StatusCode,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<(String, String)>,
    pub body: Value,
}

mod status_code {
    use http::StatusCode;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(status: &StatusCode, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u16(status.as_u16())
    }
}

impl TriggerResponse {
    pub fn new(status_code: StatusCode, body: Value) -> Self {
        Self {
            status_code,
            headers: Vec::new(),
            body,
        }
    }

    fn unauthorized() -> Self {
        Self {
            status_code: StatusCode::UNAUTHORIZED,
            headers: vec![("WWW-Authenticate".to_string(), "Basic".to_string())],
            body: json!({"error": "Authentication failed"}),
        }
    }

    fn error(status_code: StatusCode, message: impl Into<String>) -> Self {
        Self::new(status_code, json!({"error": message.into()}))
    }

    fn message(status_code: StatusCode, message: &str) -> Self {
        Self::new(status_code, json!({"message": message}))
    }
}

fn to_value<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| json!({"error": e.to_string()}))
}

/// Entry point for all three trigger shapes.
pub struct TriggerHandler {
    orchestrator: Arc<PipelineOrchestrator>,
    normalizer: AlertNormalizer,
    auth: BasicAuthGate,
}

impl TriggerHandler {
    pub fn new(orchestrator: Arc<PipelineOrchestrator>, auth: BasicAuthGate) -> Self {
        Self {
            orchestrator,
            normalizer: AlertNormalizer::new(),
            auth,
        }
    }

    pub fn orchestrator(&self) -> &PipelineOrchestrator {
        &self.orchestrator
    }

    /// Classifies a raw event and hands it to the matching path.
    pub async fn handle_event(&self, event: Value) -> TriggerResponse {
        match TriggerEvent::classify(event) {
            Ok(TriggerEvent::Webhook { headers, body }) => {
                let authorization = TriggerEvent::header(&headers, "authorization");
                self.handle_webhook(authorization, &body).await
            }
            Ok(TriggerEvent::PubSub { message }) => self.handle_pubsub(&message).await,
            Ok(TriggerEvent::Direct(event)) => self.handle_direct(&event).await,
            Err(e) => {
                error!("Unexpected error: {}", e);
                TriggerResponse::error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        }
    }

    /// Credentials are checked before the body is looked at.
    pub async fn handle_webhook(&self, authorization: Option<&str>, body: &Value) -> TriggerResponse {
        if self.auth.verify(authorization).await.is_err() {
            warn!("Authentication failed");
            return TriggerResponse::unauthorized();
        }

        let payload = match parse_webhook_body(body) {
            Ok(payload) => payload,
            Err(e) => {
                error!("Error processing webhook: {}", e);
                return TriggerResponse::error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Error processing webhook: {e}"),
                );
            }
        };
        if payload.alerts.is_empty() {
            return TriggerResponse::message(StatusCode::OK, "No alerts in webhook payload");
        }

        let requests = self.normalizer.normalize_webhook(&payload);
        info!(
            "Webhook carried {} alerts, {} capture requests",
            payload.alerts.len(),
            requests.len()
        );
        let summary = self.orchestrator.run_batch(&requests).await;
        TriggerResponse::new(StatusCode::OK, to_value(&summary))
    }

    pub async fn handle_pubsub(&self, message: &str) -> TriggerResponse {
        let payload = match parse_pubsub_message(message) {
            Ok(payload) => payload,
            Err(e) => {
                error!("Could not parse notification message: {}", e);
                return TriggerResponse::error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
            }
        };

        let request = match self.normalizer.normalize_single(&payload) {
            SingleAlertOutcome::NoFiringAlerts => {
                info!("No firing alerts to process");
                return TriggerResponse::message(StatusCode::NO_CONTENT, "No active alerts");
            }
            SingleAlertOutcome::Invalid(e) => {
                warn!("First firing alert is not usable: {}", e);
                return TriggerResponse::new(
                    StatusCode::OK,
                    json!({"message": "no valid items", "error": e.to_string()}),
                );
            }
            SingleAlertOutcome::Request(request) => request,
        };

        match self.orchestrator.process(&request).await {
            Ok(result) => TriggerResponse::new(StatusCode::OK, to_value(&result)),
            Err(e) => {
                error!("Failed to process notification alert: {}", e);
                TriggerResponse::new(
                    StatusCode::OK,
                    json!({"message": "no valid items", "error": e.to_string()}),
                )
            }
        }
    }

    pub async fn handle_direct(&self, event: &Value) -> TriggerResponse {
        let request = match parse_direct(event)
            .and_then(|invocation| self.normalizer.normalize_direct(&invocation))
        {
            Ok(request) => request,
            Err(e) => {
                warn!("Event doesn't match expected formats: {}", e);
                return TriggerResponse::error(
                    StatusCode::BAD_REQUEST,
                    "Invalid event format or missing required parameters",
                );
            }
        };

        match self.orchestrator.process(&request).await {
            Ok(result) => TriggerResponse::new(StatusCode::OK, to_value(&result)),
            Err(e) => failure_response(&e),
        }
    }
}

fn failure_response(e: &DumpwatchError) -> TriggerResponse {
    TriggerResponse::new(
        e.status_code(),
        json!({"error": {"code": e.error_code(), "message": e.to_string()}}),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::orchestrator::tests::{orchestrator, MemoryObjects};
    use crate::pipeline::{WebhookCredentialSource, WebhookCredentials};
    use async_trait::async_trait;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;

    struct Fixed;

    #[async_trait]
    impl WebhookCredentialSource for Fixed {
        async fn webhook_credentials(&self) -> anyhow::Result<WebhookCredentials> {
            Ok(WebhookCredentials {
                username: "u".into(),
                password: "p".into(),
            })
        }
    }

    fn handler(objects: Arc<MemoryObjects>) -> TriggerHandler {
        TriggerHandler::new(
            Arc::new(orchestrator(objects, None)),
            BasicAuthGate::new(Arc::new(Fixed)),
        )
    }

    fn auth() -> String {
        format!("Basic {}", STANDARD.encode("u:p"))
    }

    #[tokio::test]
    async fn test_webhook_event_needs_auth_before_parsing() {
        let response = handler(Arc::new(MemoryObjects::default()))
            .handle_event(json!({"headers": {}, "body": "{not json"}))
            .await;
        assert_eq!(response.status_code, StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers,
            vec![("WWW-Authenticate".to_string(), "Basic".to_string())]
        );
    }

    #[tokio::test]
    async fn test_webhook_event_with_empty_alerts() {
        let response = handler(Arc::new(MemoryObjects::default()))
            .handle_event(json!({"headers": {"Authorization": auth()}, "body": "{\"alerts\": []}"}))
            .await;
        assert_eq!(response.status_code, StatusCode::OK);
        assert_eq!(response.body["message"], "No alerts in webhook payload");
    }

    #[tokio::test]
    async fn test_unparseable_webhook_body_is_500() {
        let response = handler(Arc::new(MemoryObjects::default()))
            .handle_event(json!({"headers": {"authorization": auth()}, "body": "{not json"}))
            .await;
        assert_eq!(response.status_code, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_pubsub_processes_first_firing_alert_only() {
        let objects = Arc::new(MemoryObjects::default());
        let message = json!({"alerts": [
            {"status": "resolved", "labels": {"cluster_type": "eks", "cluster": "c", "task_pod_id": "old"}},
            {"status": "firing", "labels": {"cluster_type": "eks", "cluster": "c", "task_pod_id": "api-1"}},
            {"status": "firing", "labels": {"cluster_type": "eks", "cluster": "c", "task_pod_id": "api-2"}}
        ]})
        .to_string();

        let response = handler(objects.clone())
            .handle_event(json!({"Records": [{"Sns": {"Message": message}}]}))
            .await;

        assert_eq!(response.status_code, StatusCode::OK);
        assert_eq!(response.body["taskPodId"], "api-1");
        assert_eq!(objects.keys.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_pubsub_without_firing_alerts_is_204() {
        let message = json!({"alerts": [{"status": "resolved"}]}).to_string();
        let response = handler(Arc::new(MemoryObjects::default()))
            .handle_event(json!({"Records": [{"Sns": {"Message": message}}]}))
            .await;
        assert_eq!(response.status_code, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_pubsub_invalid_alert_is_no_valid_items() {
        let message = json!({"alerts": [{"status": "firing", "labels": {"cluster": "c"}}]}).to_string();
        let response = handler(Arc::new(MemoryObjects::default()))
            .handle_event(json!({"Records": [{"Sns": {"Message": message}}]}))
            .await;
        assert_eq!(response.status_code, StatusCode::OK);
        assert_eq!(response.body["message"], "no valid items");
    }

    #[tokio::test]
    async fn test_direct_invocation_paths() {
        let handler = handler(Arc::new(MemoryObjects::default()));

        let ok = handler
            .handle_event(json!({"cluster_type": "eks", "cluster": "c", "task_pod_id": "api-1"}))
            .await;
        assert_eq!(ok.status_code, StatusCode::OK);
        assert_eq!(ok.body["cluster"], "c");

        let invalid = handler
            .handle_event(json!({"cluster_type": "eks", "cluster": "[no value]"}))
            .await;
        assert_eq!(invalid.status_code, StatusCode::BAD_REQUEST);

        let failed = handler
            .handle_event(json!({"cluster_type": "eks", "cluster": "c", "task_pod_id": "broken-3"}))
            .await;
        assert_eq!(failed.status_code, StatusCode::BAD_GATEWAY);
        assert_eq!(failed.body["error"]["code"], "CAPTURE_FAILED");
    }

    #[tokio::test]
    async fn test_non_object_event_is_500() {
        let response = handler(Arc::new(MemoryObjects::default()))
            .handle_event(json!("ping"))
            .await;
        assert_eq!(response.status_code, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
