use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Alert-manager notification body, shared by the webhook and pub/sub shapes.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AlertPayload {
    #[serde(default)]
    pub alerts: Vec<Alert>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Alert {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    /// Free-text rendering of the evaluated metrics, e.g.
    /// `[ var='A' labels={cluster=prod, pod=api-1} value=3 ]`
    #[serde(default, rename = "valueString")]
    pub value_string: Option<String>,
}

impl Alert {
    pub fn is_firing(&self) -> bool {
        self.status == "firing"
    }
}

/// Flat request used by direct invocations and the operator CLI.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DirectInvocation {
    pub cluster_type: Option<String>,
    pub cluster: Option<String>,
    pub task_pod_id: Option<String>,
    pub container_name: Option<String>,
    pub namespace: Option<String>,
    pub container_ip: Option<String>,
    /// `thread` (default) or `heap`
    pub dump_kind: Option<String>,
    #[serde(default, rename = "valueString")]
    pub value_string: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_payload_tolerates_missing_fields() {
        let payload: AlertPayload = serde_json::from_str(
            r#"{"receiver":"dumpwatch","alerts":[{"status":"firing"},{"labels":{"cluster":"c"}}]}"#,
        )
        .unwrap();
        assert_eq!(payload.alerts.len(), 2);
        assert!(payload.alerts[0].is_firing());
        assert!(!payload.alerts[1].is_firing());
        assert!(payload.alerts[0].labels.is_empty());
    }
}
