//! Getting a thread dump out of a running workload.
//!
//! The two runtimes are reached in structurally different ways, so each has
//! its own strategy; [`ClusterExecClient`] picks one from the request's
//! runtime kind and both hand back the same [`DiagnosticArtifact`].

mod exec;
mod http;
mod kube_client;
mod registry;

use async_trait::async_trait;
use tracing::info;

pub use exec::{heap_dump_command, thread_dump_command, ClusterConnector, ExecCapture, PodExecutor};
pub use http::{introspection_url, HttpIntrospectionCapture, TaskAddressResolver};
pub use kube_client::{decode_certificate_authority, ApiCache, ClusterEndpoint, KubePodExecutor};
pub use registry::ClusterRegistry;

use crate::error::Result;
use crate::types::{CaptureRequest, DiagnosticArtifact, RuntimeKind};

#[async_trait]
pub trait DumpCapturer: Send + Sync {
    async fn capture(&self, request: &CaptureRequest) -> Result<DiagnosticArtifact>;
}

/// The capture operation for one runtime.
pub enum CaptureStrategy<'a> {
    Exec(&'a ExecCapture),
    HttpIntrospection(&'a HttpIntrospectionCapture),
}

impl CaptureStrategy<'_> {
    pub async fn capture(&self, request: &CaptureRequest) -> Result<DiagnosticArtifact> {
        match self {
            CaptureStrategy::Exec(exec) => exec.capture(request).await,
            CaptureStrategy::HttpIntrospection(http) => http.capture(request).await,
        }
    }
}

pub struct ClusterExecClient {
    exec: ExecCapture,
    http: HttpIntrospectionCapture,
}

impl ClusterExecClient {
    pub fn new(exec: ExecCapture, http: HttpIntrospectionCapture) -> Self {
        Self { exec, http }
    }

    pub fn strategy_for(&self, kind: RuntimeKind) -> CaptureStrategy<'_> {
        match kind {
            RuntimeKind::Exec => CaptureStrategy::Exec(&self.exec),
            RuntimeKind::HttpIntrospection => CaptureStrategy::HttpIntrospection(&self.http),
        }
    }
}

#[async_trait]
impl DumpCapturer for ClusterExecClient {
    async fn capture(&self, request: &CaptureRequest) -> Result<DiagnosticArtifact> {
        info!(
            cluster = %request.cluster_id,
            target = %request.target_id,
            kind = %request.runtime_kind(),
            "Capturing thread dump"
        );
        self.strategy_for(request.runtime_kind())
            .capture(request)
            .await
    }
}
