use std::collections::HashSet;
use tracing::{info, warn};

use super::labels::LabelSet;
use super::payload::{Alert, AlertPayload, DirectInvocation};
use super::value_string::{extract_first, extract_label_blocks};
use crate::error::{DumpwatchError, Result};
use crate::types::CaptureRequest;

/// What the single-result (pub/sub) path made of a payload.
#[derive(Debug)]
pub enum SingleAlertOutcome {
    NoFiringAlerts,
    Invalid(DumpwatchError),
    Request(CaptureRequest),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fallback {
    EveryBlock,
    FirstBlock,
}

/// Maps trigger payloads to capture requests. Stateless, so normalizing
/// the same payload twice gives the same requests.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlertNormalizer;

impl AlertNormalizer {
    pub fn new() -> Self {
        Self
    }

    fn candidates(&self, base: LabelSet, text: Option<&str>, mode: Fallback) -> Vec<LabelSet> {
        if !base.needs_fallback() {
            return vec![base];
        }
        let Some(text) = text else {
            return vec![base];
        };

        info!("Some labels are missing or invalid, extracting from valueString");
        let extracted = match mode {
            Fallback::EveryBlock => extract_label_blocks(text),
            Fallback::FirstBlock => extract_first(text).into_iter().collect(),
        };
        if extracted.is_empty() {
            warn!("Could not find a labels block in valueString");
            return vec![base];
        }

        extracted
            .iter()
            .map(|block| {
                let mut labels = base.clone();
                labels.fill_missing(block);
                labels
            })
            .collect()
    }

    fn requests_for(&self, alert: &Alert, mode: Fallback) -> Vec<Result<CaptureRequest>> {
        let base = LabelSet::from_labels(&alert.labels);
        self.candidates(base, alert.value_string.as_deref(), mode)
            .into_iter()
            .map(LabelSet::into_request)
            .collect()
    }

    /// Batch path: every firing alert, every label block of its value string.
    /// Invalid candidates are dropped with a log line; duplicates collapse
    /// to their first occurrence.
    pub fn normalize_webhook(&self, payload: &AlertPayload) -> Vec<CaptureRequest> {
        let mut seen = HashSet::new();
        let mut requests = Vec::new();

        for alert in &payload.alerts {
            if !alert.is_firing() {
                info!("Skipping alert with status '{}'", alert.status);
                continue;
            }
            for candidate in self.requests_for(alert, Fallback::EveryBlock) {
                match candidate {
                    Ok(request) if seen.insert(request.clone()) => requests.push(request),
                    Ok(request) => info!(target_id = %request.target_id, "Dropping duplicate capture request"),
                    Err(e) => warn!("Dropping alert: {}", e),
                }
            }
        }
        requests
    }

    /// Single-result path: only the first firing alert, only the first label
    /// block. Later firing alerts in the same payload are ignored.
    pub fn normalize_single(&self, payload: &AlertPayload) -> SingleAlertOutcome {
        let mut firing = payload.alerts.iter().filter(|a| a.is_firing());
        let Some(alert) = firing.next() else {
            return SingleAlertOutcome::NoFiringAlerts;
        };
        let ignored = firing.count();
        if ignored > 0 {
            warn!(
                "Notification carries {} more firing alerts; only the first is processed",
                ignored
            );
        }

        match self.requests_for(alert, Fallback::FirstBlock).into_iter().next() {
            Some(Ok(request)) => SingleAlertOutcome::Request(request),
            Some(Err(e)) => SingleAlertOutcome::Invalid(e),
            None => SingleAlertOutcome::NoFiringAlerts,
        }
    }

    pub fn normalize_direct(&self, invocation: &DirectInvocation) -> Result<CaptureRequest> {
        let base = LabelSet {
            cluster_type: invocation.cluster_type.clone(),
            cluster: invocation.cluster.clone(),
            task_pod_id: invocation.task_pod_id.clone(),
            container_name: invocation.container_name.clone(),
            namespace: invocation.namespace.clone(),
            network_address: invocation.container_ip.clone(),
            dump_kind: invocation.dump_kind.clone(),
        };
        self.candidates(base, invocation.value_string.as_deref(), Fallback::FirstBlock)
            .into_iter()
            .next()
            .ok_or_else(|| DumpwatchError::Validation("no capture target".to_string()))?
            .into_request()
    }
}
