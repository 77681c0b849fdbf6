use serde::{Deserialize, Serialize};

use crate::error::DumpwatchError;
use crate::storage::StoredArtifacts;
use crate::types::{ArtifactLocator, CaptureRequest, DumpKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemResult {
    pub message: String,
    pub task_pod_id: String,
    pub cluster: String,
    pub thread_dump_url: String,
    /// Absent for heap dumps, which are stored but not analyzed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_url: Option<String>,
    #[serde(default)]
    pub dump_kind: DumpKind,
}

impl ItemResult {
    pub fn new(request: &CaptureRequest, stored: &StoredArtifacts) -> Self {
        Self {
            message: "Thread dump handled from alert".to_string(),
            task_pod_id: request.target_id.clone(),
            cluster: request.cluster_id.clone(),
            thread_dump_url: stored.dump.uri.clone(),
            analysis_url: Some(stored.analysis.uri.clone()),
            dump_kind: DumpKind::Thread,
        }
    }

    pub fn heap(request: &CaptureRequest, stored: &ArtifactLocator) -> Self {
        Self {
            message: "Heap dump handled from alert".to_string(),
            task_pod_id: request.target_id.clone(),
            cluster: request.cluster_id.clone(),
            thread_dump_url: stored.uri.clone(),
            analysis_url: None,
            dump_kind: DumpKind::Heap,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemFailure {
    pub task_pod_id: String,
    pub cluster: String,
    pub code: String,
    pub error: String,
}

impl ItemFailure {
    pub fn new(request: &CaptureRequest, error: &DumpwatchError) -> Self {
        Self {
            task_pod_id: request.target_id.clone(),
            cluster: request.cluster_id.clone(),
            code: error.error_code().to_string(),
            error: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchStatus {
    Success,
    PartialSuccess,
    NoValidItems,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub status: BatchStatus,
    pub message: String,
    pub results: Vec<ItemResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ItemFailure>,
}

impl BatchSummary {
    pub fn from_outcomes(results: Vec<ItemResult>, failures: Vec<ItemFailure>) -> Self {
        let (status, message) = match (results.len(), failures.len()) {
            (0, _) => (BatchStatus::NoValidItems, "No valid alerts to process".to_string()),
            (n, 0) => (BatchStatus::Success, format!("Processed {n} alerts")),
            (n, _) => (BatchStatus::PartialSuccess, format!("Processed {n} alerts")),
        };
        Self {
            status,
            message,
            results,
            failures,
        }
    }
}
