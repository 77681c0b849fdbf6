use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use thiserror::Error;

use super::retry::Retryable;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InferenceError {
    /// The endpoint rejected the call with its rate-limit code
    #[error("ThrottlingException: {0}")]
    Throttled(String),

    #[error("{0}")]
    Client(String),

    /// The call succeeded but the reply had no text in its first content element
    #[error("Unexpected response shape: {0}")]
    Parse(String),
}

impl Retryable for InferenceError {
    fn is_retryable(&self) -> bool {
        matches!(self, InferenceError::Throttled(_))
    }
}

/// A single round trip to the hosted model.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, InferenceError>;
}
