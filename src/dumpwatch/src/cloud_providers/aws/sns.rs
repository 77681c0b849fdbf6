use async_trait::async_trait;
use aws_config::SdkConfig;
use tracing::info;

use crate::pipeline::Notifier;

pub struct SnsNotifier {
    client: aws_sdk_sns::Client,
    topic_arn: String,
}

impl SnsNotifier {
    pub fn new(config: &SdkConfig, topic_arn: impl Into<String>) -> Self {
        Self {
            client: aws_sdk_sns::Client::new(config),
            topic_arn: topic_arn.into(),
        }
    }
}

#[async_trait]
impl Notifier for SnsNotifier {
    async fn publish(&self, subject: &str, message: &str) -> anyhow::Result<()> {
        let output = self
            .client
            .publish()
            .topic_arn(&self.topic_arn)
            .subject(subject)
            .message(message)
            .send()
            .await?;
        info!(
            "Published notification {} to {}",
            output.message_id().unwrap_or("<none>"),
            self.topic_arn
        );
        Ok(())
    }
}
