use async_trait::async_trait;
use reqwest::header::ACCEPT;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::error::{DumpwatchError, Result};
use crate::types::{CaptureRequest, DiagnosticArtifact, DumpKind, RuntimeTarget};

/// Looks up the private address of a running task.
#[async_trait]
pub trait TaskAddressResolver: Send + Sync {
    async fn resolve_task_address(&self, cluster: &str, task_id: &str) -> Result<String>;
}

/// Builds the diagnostic URL; an address that already carries a port keeps it.
pub fn introspection_url(address: &str, port: u16, path: &str) -> String {
    let address = address.trim().trim_end_matches('/');
    let base = if address.starts_with("http://") || address.starts_with("https://") {
        address.to_string()
    } else {
        format!("http://{address}")
    };
    let authority = base.split_once("://").map_or("", |(_, rest)| rest);
    let has_port = authority.rsplit_once(':').is_some_and(|(_, p)| p.parse::<u16>().is_ok());

    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };
    if has_port {
        format!("{base}{path}")
    } else {
        format!("{base}:{port}{path}")
    }
}

pub struct HttpIntrospectionCapture {
    client: reqwest::Client,
    resolver: Arc<dyn TaskAddressResolver>,
    port: u16,
    path: String,
}

impl HttpIntrospectionCapture {
    pub fn new(
        resolver: Arc<dyn TaskAddressResolver>,
        port: u16,
        path: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            resolver,
            port,
            path: path.into(),
        })
    }

    pub async fn capture(&self, request: &CaptureRequest) -> Result<DiagnosticArtifact> {
        let RuntimeTarget::HttpIntrospection { network_address } = &request.runtime else {
            return Err(DumpwatchError::Validation(
                "http introspection needs a network target".to_string(),
            ));
        };
        if request.dump_kind == DumpKind::Heap {
            return Err(DumpwatchError::Validation(format!(
                "heap dumps are not available over http for {}",
                request.target_id
            )));
        }

        let address = match network_address {
            Some(address) => {
                info!("Using container address from alert: {}", address);
                address.clone()
            }
            None => {
                self.resolver
                    .resolve_task_address(&request.cluster_id, &request.target_id)
                    .await?
            }
        };

        let url = introspection_url(&address, self.port, &self.path);
        info!("Requesting thread dump from {}", url);

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "text/plain")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            error!("Thread dump endpoint {} answered {}", url, status);
            return Err(DumpwatchError::capture_failed(
                format!("{url} returned {status}"),
                body,
            ));
        }

        Ok(DiagnosticArtifact::raw_dump(body))
    }
}
