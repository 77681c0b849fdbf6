use async_trait::async_trait;
use regex::Regex;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::constants::{HEAP_DUMP_MARKER, HEAP_DUMP_PATH, THREAD_DUMP_MARKER};
use crate::error::{DumpwatchError, Result};
use crate::types::{CaptureRequest, DiagnosticArtifact, DumpKind, RuntimeTarget};

/// Pod-level operations against one cluster's control plane.
#[async_trait]
pub trait PodExecutor: Send + Sync {
    async fn running_pod_names(&self, namespace: &str) -> Result<Vec<String>>;

    async fn container_names(&self, namespace: &str, pod: &str) -> Result<Vec<String>>;

    /// Runs `command` in the container and returns stdout followed by stderr.
    async fn exec(
        &self,
        namespace: &str,
        pod: &str,
        container: &str,
        command: Vec<String>,
    ) -> Result<String>;

    /// Raw bytes of a file inside the container.
    async fn read_file(
        &self,
        namespace: &str,
        pod: &str,
        container: &str,
        path: &str,
    ) -> Result<Vec<u8>>;
}

/// Hands out an authorized executor for a named cluster.
#[async_trait]
pub trait ClusterConnector: Send + Sync {
    async fn connect(&self, cluster: &str) -> Result<Arc<dyn PodExecutor>>;
}

pub fn thread_dump_command() -> Vec<String> {
    let script = concat!(
        "if command -v jcmd >/dev/null 2>&1; then ",
        "PID=$(jcmd | grep -v jcmd | cut -d\" \" -f1); ",
        "jcmd $PID Thread.print; ",
        "elif command -v jstack >/dev/null 2>&1; then ",
        "PID=$(ps -ef | grep java | grep -v grep | awk '{print $2}'); ",
        "jstack $PID; ",
        "else echo \"Neither jcmd nor jstack found\"; exit 1; ",
        "fi"
    );
    vec!["/bin/sh".into(), "-c".into(), script.into()]
}

/// Writes a heap dump to `path` with jcmd, or jmap when jcmd is absent.
/// The marker line is only printed when the dump tool succeeded.
pub fn heap_dump_command(path: &str) -> Vec<String> {
    let script = format!(
        "if command -v jcmd >/dev/null 2>&1; then \
         PID=$(jcmd | grep -v jcmd | cut -d\" \" -f1); \
         jcmd $PID GC.heap_dump {path} && echo \"{HEAP_DUMP_MARKER} {path}\"; \
         elif command -v jmap >/dev/null 2>&1; then \
         PID=$(ps -ef | grep java | grep -v grep | awk '{{print $2}}'); \
         jmap -dump:format=b,file={path} $PID && echo \"{HEAP_DUMP_MARKER} {path}\"; \
         else echo \"Neither jcmd nor jmap found\"; exit 1; \
         fi; \
         ls -l {path}"
    );
    vec!["/bin/sh".into(), "-c".into(), script]
}

fn is_pattern(target: &str) -> bool {
    target.contains(['*', '?', '['])
}

pub struct ExecCapture {
    clusters: Arc<dyn ClusterConnector>,
    timeout: Duration,
}

impl ExecCapture {
    pub fn new(clusters: Arc<dyn ClusterConnector>, timeout: Duration) -> Self {
        Self { clusters, timeout }
    }

    pub async fn capture(&self, request: &CaptureRequest) -> Result<DiagnosticArtifact> {
        let RuntimeTarget::Exec { namespace } = &request.runtime else {
            return Err(DumpwatchError::Validation(
                "exec capture needs an exec target".to_string(),
            ));
        };

        let pods = self.clusters.connect(&request.cluster_id).await?;
        let pod = resolve_pod(pods.as_ref(), namespace, &request.target_id).await?;
        let container = match &request.container_name {
            Some(name) => name.clone(),
            None => first_container(pods.as_ref(), namespace, &pod).await?,
        };

        match request.dump_kind {
            DumpKind::Thread => self.thread_dump(pods.as_ref(), namespace, &pod, &container).await,
            DumpKind::Heap => self.heap_dump(pods.as_ref(), namespace, &pod, &container).await,
        }
    }

    async fn thread_dump(
        &self,
        pods: &dyn PodExecutor,
        namespace: &str,
        pod: &str,
        container: &str,
    ) -> Result<DiagnosticArtifact> {
        info!(
            "Executing thread dump command in pod {}, container {}",
            pod, container
        );
        let output = self
            .bounded(namespace, pod, pods.exec(namespace, pod, container, thread_dump_command()))
            .await?;

        if !output.contains(THREAD_DUMP_MARKER) {
            warn!("Thread dump output from {} is missing the dump header", pod);
            return Err(DumpwatchError::capture_failed(
                format!("no thread dump in output of {namespace}/{pod}/{container}"),
                output,
            ));
        }

        Ok(DiagnosticArtifact::raw_dump(output))
    }

    async fn heap_dump(
        &self,
        pods: &dyn PodExecutor,
        namespace: &str,
        pod: &str,
        container: &str,
    ) -> Result<DiagnosticArtifact> {
        info!(
            "Executing heap dump command in pod {}, container {}",
            pod, container
        );
        let output = self
            .bounded(
                namespace,
                pod,
                pods.exec(namespace, pod, container, heap_dump_command(HEAP_DUMP_PATH)),
            )
            .await?;

        if !output.contains(HEAP_DUMP_MARKER) {
            warn!("Failed to create heap dump in {}", pod);
            return Err(DumpwatchError::capture_failed(
                format!("no heap dump written in {namespace}/{pod}/{container}"),
                output,
            ));
        }

        let body = self
            .bounded(namespace, pod, pods.read_file(namespace, pod, container, HEAP_DUMP_PATH))
            .await?;
        if body.is_empty() {
            return Err(DumpwatchError::capture_failed(
                format!("{HEAP_DUMP_PATH} in {namespace}/{pod} is empty"),
                output,
            ));
        }

        info!("Copied {} byte heap dump out of {}", body.len(), pod);
        Ok(DiagnosticArtifact::heap_dump(body))
    }

    /// Remote calls get `timeout`; expiry means the workload never answered.
    async fn bounded<T>(
        &self,
        namespace: &str,
        pod: &str,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        tokio::time::timeout(self.timeout, call).await.map_err(|_| {
            DumpwatchError::UpstreamUnavailable(format!(
                "exec in {namespace}/{pod} did not finish within {}s",
                self.timeout.as_secs()
            ))
        })?
    }
}

async fn resolve_pod(pods: &dyn PodExecutor, namespace: &str, target: &str) -> Result<String> {
    if !is_pattern(target) {
        return Ok(target.to_string());
    }

    let pattern = Regex::new(target).map_err(|e| {
        DumpwatchError::Validation(format!("invalid pod pattern '{target}': {e}"))
    })?;
    let name = pods
        .running_pod_names(namespace)
        .await?
        .into_iter()
        .find(|name| pattern.is_match(name))
        .ok_or_else(|| {
            DumpwatchError::NotFound(format!(
                "no running pod matching '{target}' in namespace '{namespace}'"
            ))
        })?;

    info!("Found matching pod: {}", name);
    Ok(name)
}

async fn first_container(pods: &dyn PodExecutor, namespace: &str, pod: &str) -> Result<String> {
    let container = pods
        .container_names(namespace, pod)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| DumpwatchError::NotFound(format!("pod {namespace}/{pod} has no containers")))?;
    info!("Using container: {}", container);
    Ok(container)
}
