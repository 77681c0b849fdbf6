use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_bedrockruntime::primitives::Blob;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::{InferenceClient, InferenceError};
use crate::constants::ANTHROPIC_VERSION;

#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub model_id: String,
    pub max_tokens: u32,
    pub temperature: f64,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct InvokeBody<'a> {
    anthropic_version: &'static str,
    max_tokens: u32,
    messages: [Message<'a>; 1],
    temperature: f64,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

#[derive(Deserialize)]
struct InvokeReply {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

pub fn request_body(settings: &ModelSettings, prompt: &str) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(&InvokeBody {
        anthropic_version: ANTHROPIC_VERSION,
        max_tokens: settings.max_tokens,
        messages: [Message {
            role: "user",
            content: prompt,
        }],
        temperature: settings.temperature,
    })
}

/// Text of the first content element.
pub fn parse_completion(body: &[u8]) -> Result<String, InferenceError> {
    let reply: InvokeReply =
        serde_json::from_slice(body).map_err(|e| InferenceError::Parse(e.to_string()))?;
    reply
        .content
        .into_iter()
        .next()
        .and_then(|block| block.text)
        .ok_or_else(|| InferenceError::Parse("no text in first content element".to_string()))
}

pub struct BedrockClient {
    client: aws_sdk_bedrockruntime::Client,
    settings: ModelSettings,
}

impl BedrockClient {
    pub fn new(config: &SdkConfig, settings: ModelSettings) -> Self {
        Self {
            client: aws_sdk_bedrockruntime::Client::new(config),
            settings,
        }
    }
}

#[async_trait]
impl InferenceClient for BedrockClient {
    async fn complete(&self, prompt: &str) -> Result<String, InferenceError> {
        let body = request_body(&self.settings, prompt)
            .map_err(|e| InferenceError::Client(e.to_string()))?;

        debug!("Invoking {}", self.settings.model_id);
        let response = self
            .client
            .invoke_model()
            .model_id(&self.settings.model_id)
            .content_type("application/json")
            .accept("application/json")
            .body(Blob::new(body))
            .send()
            .await
            .map_err(|err| {
                let throttled = err
                    .as_service_error()
                    .is_some_and(|e| e.is_throttling_exception());
                let message = format!("{}", aws_sdk_bedrockruntime::error::DisplayErrorContext(&err));
                if throttled {
                    InferenceError::Throttled(message)
                } else {
                    InferenceError::Client(message)
                }
            })?;

        parse_completion(response.body().as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let settings = ModelSettings {
            model_id: "m".into(),
            max_tokens: 8192,
            temperature: 0.7,
        };
        let body: serde_json::Value =
            serde_json::from_slice(&request_body(&settings, "analyze").unwrap()).unwrap();
        assert_eq!(body["anthropic_version"], "bedrock-2023-05-31");
        assert_eq!(body["max_tokens"], 8192);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "analyze");
    }

    #[test]
    fn test_first_content_text_is_returned() {
        let body = br###"{"content":[{"type":"text","text":"## Summary"},{"type":"text","text":"ignored"}]}"###;
        assert_eq!(parse_completion(body).unwrap(), "## Summary");
    }

    #[test]
    fn test_missing_content_is_parse_error() {
        assert!(matches!(
            parse_completion(br#"{"content":[]}"#),
            Err(InferenceError::Parse(_))
        ));
        assert!(matches!(
            parse_completion(b"not json"),
            Err(InferenceError::Parse(_))
        ));
    }
}
