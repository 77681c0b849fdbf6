//! Inbound alert shapes and their normalization into capture requests.

mod labels;
mod normalizer;
mod payload;
mod trigger;
pub mod value_string;

pub use labels::{is_missing, LabelSet};
pub use normalizer::{AlertNormalizer, SingleAlertOutcome};
pub use payload::{Alert, AlertPayload, DirectInvocation};
pub use trigger::{parse_direct, parse_pubsub_message, parse_webhook_body, TriggerEvent};
