use std::sync::Arc;
use tracing::{error, info};

use super::client::InferenceClient;
use super::retry::{RetryError, RetryPolicy};

pub const EXHAUSTED_MESSAGE: &str =
    "Failed to analyze thread dump after multiple retries due to throttling.";

pub fn build_prompt(dump: &str) -> String {
    format!(
        "Analyze this Java thread dump and report on performance problems. \
         Organize the answer into four sections:\n\n\
         1. **Thread State Summary**: counts per state (RUNNABLE, BLOCKED, WAITING, TIMED_WAITING).\n\
         2. **Problems Found**: deadlocks, lock contention, stuck or CPU-bound threads.\n\
         3. **Recommendations**: concrete code, configuration or JVM tuning changes.\n\
         4. **Thread Details**: a technical walk-through of the most relevant threads.\n\n\
         Thread dump:\n{dump}\n"
    )
}

/// Turns a raw dump into analysis text. Never fails: any error is folded
/// into the returned string so the capture it belongs to still completes.
pub struct AnalysisInvoker {
    client: Arc<dyn InferenceClient>,
    policy: RetryPolicy,
}

impl AnalysisInvoker {
    pub fn new(client: Arc<dyn InferenceClient>, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    pub async fn analyze(&self, dump: &str) -> String {
        let prompt = build_prompt(dump);
        info!("Submitting {} byte dump for analysis", dump.len());

        match self.policy.execute(|| self.client.complete(&prompt)).await {
            Ok(text) => text,
            Err(RetryError::Exhausted { attempts, last }) => {
                error!("Analysis throttled on all {} attempts: {}", attempts, last);
                EXHAUSTED_MESSAGE.to_string()
            }
            Err(RetryError::Fatal(e)) => {
                error!("ClientError during analysis: {}", e);
                format!("ClientError during analysis: {e}")
            }
        }
    }
}
