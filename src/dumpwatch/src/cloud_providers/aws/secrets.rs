use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_secretsmanager::Client;

use crate::pipeline::{WebhookCredentialSource, WebhookCredentials};

pub struct SecretsClient {
    client: Client,
}

impl SecretsClient {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }

    pub async fn get_secrets<T>(&self, secret_id: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.client
            .get_secret_value()
            .secret_id(secret_id)
            .send()
            .await?
            .secret_string()
            .ok_or_else(|| anyhow::anyhow!("No secret string stored under {secret_id}"))
            .and_then(|s| serde_json::from_str(s).map_err(Into::into))
    }
}

/// Webhook credentials read from a named secret on every check.
pub struct SecretsManagerWebhookCredentials {
    secrets: SecretsClient,
    secret_id: String,
}

impl SecretsManagerWebhookCredentials {
    pub fn new(secrets: SecretsClient, secret_id: impl Into<String>) -> Self {
        Self {
            secrets,
            secret_id: secret_id.into(),
        }
    }
}

#[async_trait]
impl WebhookCredentialSource for SecretsManagerWebhookCredentials {
    async fn webhook_credentials(&self) -> anyhow::Result<WebhookCredentials> {
        self.secrets.get_secrets(&self.secret_id).await
    }
}
