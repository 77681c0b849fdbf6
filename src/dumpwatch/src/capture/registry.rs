use async_trait::async_trait;
use aws_config::SdkConfig;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

use super::exec::{ClusterConnector, PodExecutor};
use super::kube_client::{build_client, KubePodExecutor};
use crate::cloud_providers::aws::eks::{EksClient, EksTokenIssuer};
use crate::credentials::{
    spawn_header_propagation, supervise, CredentialRefresher, RefreshSettings,
};
use crate::error::{DumpwatchError, Result};

type ClusterSlot = Arc<OnceCell<Arc<dyn PodExecutor>>>;

/// Lazily builds one authorized client per cluster and keeps it, with its
/// refresh and propagation loops, for the life of the process.
pub struct ClusterRegistry {
    aws: SdkConfig,
    eks: EksClient,
    refresh: RefreshSettings,
    clusters: DashMap<String, ClusterSlot>,
}

impl ClusterRegistry {
    pub fn new(aws: SdkConfig, refresh: RefreshSettings) -> Self {
        let eks = EksClient::new(&aws);
        Self {
            aws,
            eks,
            refresh,
            clusters: DashMap::new(),
        }
    }

    async fn build(&self, cluster: &str) -> Result<Arc<dyn PodExecutor>> {
        let endpoint = self.eks.describe_cluster(cluster).await?;
        info!("Connecting to EKS cluster {} at {}", cluster, endpoint.endpoint);

        let issuer = Arc::new(EksTokenIssuer::new(&self.aws, cluster)?);
        let refresher = Arc::new(
            CredentialRefresher::bootstrap(issuer, self.refresh.clone())
                .await
                .map_err(|e| {
                    DumpwatchError::UpstreamUnavailable(format!(
                        "initial token for {cluster}: {e:#}"
                    ))
                })?,
        );
        let store = refresher.store();

        let loop_refresher = refresher.clone();
        supervise(
            format!("token-refresh:{cluster}"),
            self.refresh.failure_backoff,
            move || loop_refresher.clone().run(),
        );
        let (header, _propagation) =
            spawn_header_propagation(&store, self.refresh.interval, cluster.to_string());

        let client = build_client(&endpoint, header)?;
        Ok(Arc::new(KubePodExecutor::new(client)))
    }

    pub fn connected_clusters(&self) -> Vec<String> {
        self.clusters
            .iter()
            .filter(|entry| entry.value().initialized())
            .map(|entry| entry.key().clone())
            .collect()
    }
}

#[async_trait]
impl ClusterConnector for ClusterRegistry {
    async fn connect(&self, cluster: &str) -> Result<Arc<dyn PodExecutor>> {
        let slot = self
            .clusters
            .entry(cluster.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();
        let executor = slot.get_or_try_init(|| self.build(cluster)).await?;
        Ok(executor.clone())
    }
}
