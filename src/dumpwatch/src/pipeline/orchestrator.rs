use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::notify::{notification_for, Notifier};
use super::summary::{BatchSummary, ItemFailure, ItemResult};
use crate::analysis::AnalysisInvoker;
use crate::capture::DumpCapturer;
use crate::error::Result;
use crate::storage::ArtifactStore;
use crate::types::{CaptureRequest, DiagnosticArtifact, DumpKind};

/// Capture, analyze, store and announce, one request at a time.
pub struct PipelineOrchestrator {
    capturer: Arc<dyn DumpCapturer>,
    analyzer: AnalysisInvoker,
    store: ArtifactStore,
    notifier: Option<Arc<dyn Notifier>>,
}

impl PipelineOrchestrator {
    pub fn new(
        capturer: Arc<dyn DumpCapturer>,
        analyzer: AnalysisInvoker,
        store: ArtifactStore,
        notifier: Option<Arc<dyn Notifier>>,
    ) -> Self {
        Self {
            capturer,
            analyzer,
            store,
            notifier,
        }
    }

    pub async fn process(&self, request: &CaptureRequest) -> Result<ItemResult> {
        let dump = self.capturer.capture(request).await?;
        if request.dump_kind == DumpKind::Heap {
            let stored = self.store.store_heap_dump(&request.target_id, &dump).await?;
            let result = ItemResult::heap(request, &stored);
            info!(
                cluster = %result.cluster,
                target = %result.task_pod_id,
                dump = %result.thread_dump_url,
                "Heap dump handled"
            );
            self.notify(&result, "").await;
            return Ok(result);
        }

        let analysis = DiagnosticArtifact::analysis(self.analyzer.analyze(&dump.content()).await);
        let stored = self.store.store(&request.target_id, &dump, &analysis).await?;
        let result = ItemResult::new(request, &stored);

        info!(
            cluster = %result.cluster,
            target = %result.task_pod_id,
            dump = %result.thread_dump_url,
            "Thread dump handled"
        );
        self.notify(&result, &analysis.content()).await;
        Ok(result)
    }

    async fn notify(&self, result: &ItemResult, analysis: &str) {
        let Some(notifier) = &self.notifier else {
            return;
        };
        let (subject, message) = match notification_for(result, analysis, Utc::now()) {
            Ok(note) => note,
            Err(e) => {
                warn!("Could not render notification: {}", e);
                return;
            }
        };
        if let Err(e) = notifier.publish(&subject, &message).await {
            warn!("Failed to publish notification for {}: {:#}", result.task_pod_id, e);
        }
    }

    /// Runs every request; one failing item never stops its siblings.
    pub async fn run_batch(&self, requests: &[CaptureRequest]) -> BatchSummary {
        let mut results = Vec::new();
        let mut failures = Vec::new();

        for request in requests {
            match self.process(request).await {
                Ok(result) => results.push(result),
                Err(e) => {
                    error!(
                        cluster = %request.cluster_id,
                        target = %request.target_id,
                        "Failed to process capture request: {}",
                        e
                    );
                    failures.push(ItemFailure::new(request, &e));
                }
            }
        }

        BatchSummary::from_outcomes(results, failures)
    }
}
