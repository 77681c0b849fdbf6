use serde_json::Value;
use std::collections::HashMap;

use super::payload::{AlertPayload, DirectInvocation};
use crate::error::{DumpwatchError, Result};

/// One raw invocation event, sorted by shape.
#[derive(Debug, Clone)]
pub enum TriggerEvent {
    /// HTTP webhook forwarded with its headers; `body` is still unparsed
    Webhook {
        headers: HashMap<String, String>,
        body: Value,
    },
    /// Pub/sub notification; `message` is the JSON text of the envelope
    PubSub { message: String },
    Direct(Value),
}

impl TriggerEvent {
    pub fn classify(event: Value) -> Result<Self> {
        let Value::Object(mut object) = event else {
            return Err(DumpwatchError::Malformed(
                "trigger event is not a JSON object".to_string(),
            ));
        };

        if let Some(body) = object.remove("body") {
            let headers = match object.remove("headers") {
                Some(Value::Object(headers)) => headers
                    .into_iter()
                    .filter_map(|(k, v)| v.as_str().map(|v| (k, v.to_string())))
                    .collect(),
                _ => HashMap::new(),
            };
            return Ok(TriggerEvent::Webhook { headers, body });
        }

        let sns_message = object
            .get("Records")
            .and_then(|records| records.get(0))
            .and_then(|record| record.get("Sns"))
            .and_then(|sns| sns.get("Message"));
        if let Some(message) = sns_message {
            let message = match message {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            return Ok(TriggerEvent::PubSub { message });
        }

        Ok(TriggerEvent::Direct(Value::Object(object)))
    }

    /// Header lookup ignoring case, as HTTP header names are.
    pub fn header<'a>(headers: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
        headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Webhook bodies arrive either as a JSON string or already parsed.
pub fn parse_webhook_body(body: &Value) -> Result<AlertPayload> {
    match body {
        Value::String(text) => Ok(serde_json::from_str(text)?),
        other => Ok(serde_json::from_value(other.clone())?),
    }
}

pub fn parse_pubsub_message(message: &str) -> Result<AlertPayload> {
    Ok(serde_json::from_str(message)?)
}

pub fn parse_direct(event: &Value) -> Result<DirectInvocation> {
    serde_json::from_value(event.clone())
        .map_err(|e| DumpwatchError::Validation(format!("invalid direct invocation: {e}")))
}
