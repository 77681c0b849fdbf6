use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::analysis::AnalysisInvoker;
use crate::capture::{ClusterExecClient, ClusterRegistry, ExecCapture, HttpIntrospectionCapture};
use crate::cloud_providers::aws::bedrock::BedrockClient;
use crate::cloud_providers::aws::config::resolve_available_aws_config;
use crate::cloud_providers::aws::ecs::EcsClient;
use crate::cloud_providers::aws::s3::S3Client;
use crate::cloud_providers::aws::secrets::{SecretsClient, SecretsManagerWebhookCredentials};
use crate::cloud_providers::aws::sns::SnsNotifier;
use crate::config::Config;
use crate::pipeline::{BasicAuthGate, Notifier, PipelineOrchestrator, TriggerHandler};
use crate::storage::ArtifactStore;

/// Wires the AWS-backed pipeline described by `config`.
pub async fn build_trigger_handler(config: &Config) -> Result<Arc<TriggerHandler>> {
    let bucket = config.require_bucket()?;
    let sdk = resolve_available_aws_config(config.aws_init_type.clone(), &config.aws_region)
        .await
        .context("no usable AWS credentials")?;

    let clusters = Arc::new(ClusterRegistry::new(sdk.clone(), config.refresh_settings()));
    let exec = ExecCapture::new(clusters, Duration::from_secs(config.exec_timeout_secs));
    let http = HttpIntrospectionCapture::new(
        Arc::new(EcsClient::new(&sdk)),
        config.http_port,
        config.http_path.clone(),
        Duration::from_secs(config.http_timeout_secs),
    )?;
    let capturer = Arc::new(ClusterExecClient::new(exec, http));

    let analyzer = AnalysisInvoker::new(
        Arc::new(BedrockClient::new(&sdk, config.model_settings())),
        config.retry_policy(),
    );
    let store = ArtifactStore::new(Arc::new(S3Client::new(&sdk)), bucket, &config.s3_prefix());

    let notifier = config.sns_topic_arn.as_ref().map(|arn| {
        info!("Publishing results to {}", arn);
        Arc::new(SnsNotifier::new(&sdk, arn.clone())) as Arc<dyn Notifier>
    });

    let orchestrator = Arc::new(PipelineOrchestrator::new(capturer, analyzer, store, notifier));

    let auth = if config.webhook_auth_enabled {
        BasicAuthGate::new(Arc::new(SecretsManagerWebhookCredentials::new(
            SecretsClient::new(&sdk),
            config.webhook_secret_id.clone(),
        )))
    } else {
        warn!("Webhook authentication is disabled");
        BasicAuthGate::disabled()
    };

    Ok(Arc::new(TriggerHandler::new(orchestrator, auth)))
}
