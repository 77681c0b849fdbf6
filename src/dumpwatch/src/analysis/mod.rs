mod client;
mod invoker;
mod retry;

pub use client::{InferenceClient, InferenceError};
#[cfg(test)]
pub use client::MockInferenceClient;
pub use invoker::{build_prompt, AnalysisInvoker, EXHAUSTED_MESSAGE};
pub use retry::{RetryError, RetryPolicy, Retryable};
