use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_ecs::types::Task;
use tracing::info;

use crate::capture::TaskAddressResolver;
use crate::error::{DumpwatchError, Result};

const PRIVATE_ADDRESS_DETAIL: &str = "privateIPv4Address";

pub struct EcsClient {
    client: aws_sdk_ecs::Client,
}

impl EcsClient {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_ecs::Client::new(config),
        }
    }
}

fn private_address(task: &Task) -> Option<String> {
    task.attachments()
        .iter()
        .flat_map(|attachment| attachment.details())
        .find(|detail| detail.name() == Some(PRIVATE_ADDRESS_DETAIL))
        .and_then(|detail| detail.value().map(str::to_string))
}

#[async_trait]
impl TaskAddressResolver for EcsClient {
    async fn resolve_task_address(&self, cluster: &str, task_id: &str) -> Result<String> {
        let response = self
            .client
            .describe_tasks()
            .cluster(cluster)
            .tasks(task_id)
            .send()
            .await
            .map_err(|e| {
                DumpwatchError::UpstreamUnavailable(format!("DescribeTasks {task_id}: {e:?}"))
            })?;

        let task = response
            .tasks()
            .first()
            .ok_or_else(|| DumpwatchError::NotFound(format!("task {task_id} in {cluster}")))?;
        let address = private_address(task).ok_or_else(|| {
            DumpwatchError::NotFound(format!("task {task_id} has no private address attached"))
        })?;

        info!("Found private IP: {}", address);
        Ok(address)
    }
}
