use std::collections::HashMap;

use crate::constants::{DEFAULT_NAMESPACE, NO_VALUE_SENTINEL};
use crate::error::{DumpwatchError, Result};
use crate::types::{CaptureRequest, DumpKind, RuntimeKind};

/// Empty, whitespace or the alerting system's `[no value]` placeholder.
pub fn is_missing(value: Option<&str>) -> bool {
    match value {
        None => true,
        Some(v) => {
            let v = v.trim();
            v.is_empty() || v == NO_VALUE_SENTINEL
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    let v = value.as_deref();
    if is_missing(v) {
        None
    } else {
        v.map(str::trim)
    }
}

/// Target fields as found on an alert, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSet {
    pub cluster_type: Option<String>,
    pub cluster: Option<String>,
    pub task_pod_id: Option<String>,
    pub container_name: Option<String>,
    pub namespace: Option<String>,
    pub network_address: Option<String>,
    pub dump_kind: Option<String>,
}

impl LabelSet {
    /// Structured alert labels. The network address comes from `instance`.
    pub fn from_labels(labels: &HashMap<String, String>) -> Self {
        let get = |key: &str| labels.get(key).cloned();
        Self {
            cluster_type: get("cluster_type"),
            cluster: get("cluster"),
            task_pod_id: get("task_pod_id"),
            container_name: get("container_name"),
            namespace: get("namespace"),
            network_address: get("instance"),
            dump_kind: get("dump_kind"),
        }
    }

    /// True when any field the free-text fallback could supply is unusable.
    pub fn needs_fallback(&self) -> bool {
        [
            &self.cluster_type,
            &self.cluster,
            &self.task_pod_id,
            &self.container_name,
        ]
        .into_iter()
        .any(|v| present(v).is_none())
    }

    /// Copies fields from `other` only where this set has none.
    pub fn fill_missing(&mut self, other: &LabelSet) {
        fn fill(slot: &mut Option<String>, from: &Option<String>) {
            if present(slot).is_none() {
                if let Some(v) = present(from) {
                    *slot = Some(v.to_string());
                }
            }
        }
        fill(&mut self.cluster_type, &other.cluster_type);
        fill(&mut self.cluster, &other.cluster);
        fill(&mut self.task_pod_id, &other.task_pod_id);
        fill(&mut self.container_name, &other.container_name);
        fill(&mut self.namespace, &other.namespace);
        fill(&mut self.network_address, &other.network_address);
        fill(&mut self.dump_kind, &other.dump_kind);
    }

    pub fn missing_required(&self) -> Vec<&'static str> {
        [
            ("cluster_type", &self.cluster_type),
            ("cluster", &self.cluster),
            ("task_pod_id", &self.task_pod_id),
        ]
        .into_iter()
        .filter(|(_, v)| present(v).is_none())
        .map(|(name, _)| name)
        .collect()
    }

    pub fn into_request(self) -> Result<CaptureRequest> {
        let missing = self.missing_required();
        if !missing.is_empty() {
            return Err(DumpwatchError::Validation(format!(
                "missing or invalid labels: {} (cluster_type={:?}, cluster={:?}, task_pod_id={:?})",
                missing.join(", "),
                self.cluster_type,
                self.cluster,
                self.task_pod_id
            )));
        }

        let kind: RuntimeKind = present(&self.cluster_type).unwrap_or_default().parse()?;
        let cluster = present(&self.cluster).unwrap_or_default().to_string();
        let target = present(&self.task_pod_id).unwrap_or_default().to_string();
        let container = present(&self.container_name).map(str::to_string);
        let dump_kind = match present(&self.dump_kind) {
            Some(raw) => raw.parse()?,
            None => DumpKind::Thread,
        };
        if dump_kind == DumpKind::Heap && kind == RuntimeKind::HttpIntrospection {
            return Err(DumpwatchError::Validation(format!(
                "heap dumps need an exec target, {target} is on cluster_type={}",
                present(&self.cluster_type).unwrap_or_default()
            )));
        }

        let request = match kind {
            RuntimeKind::Exec => {
                let namespace = present(&self.namespace).unwrap_or(DEFAULT_NAMESPACE);
                CaptureRequest::exec(cluster, target, container, namespace)
            }
            RuntimeKind::HttpIntrospection => CaptureRequest::http_introspection(
                cluster,
                target,
                container,
                present(&self.network_address).map(str::to_string),
            ),
        };
        Ok(request.with_dump_kind(dump_kind))
    }
}
