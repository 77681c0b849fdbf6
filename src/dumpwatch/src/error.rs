use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failure classes shared by every stage of the capture pipeline.
#[derive(Error, Debug)]
pub enum DumpwatchError {
    /// A required field is missing or holds a sentinel value
    #[error("Validation error: {0}")]
    Validation(String),

    /// Webhook credentials are missing or do not match
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// A pod, container or task could not be located
    #[error("Not found: {0}")]
    NotFound(String),

    /// Control plane or workload endpoint unreachable
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The capture ran but did not produce a usable dump
    #[error("Capture failed: {reason}; output: {output}")]
    CaptureFailed { reason: String, output: String },

    /// Inference call rate-limited
    #[error("Throttled: {0}")]
    Throttled(String),

    /// Persisting an artifact failed
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The trigger payload could not be parsed at all
    #[error("Malformed trigger: {0}")]
    Malformed(String),
}

impl DumpwatchError {
    pub fn capture_failed(reason: impl Into<String>, output: impl Into<String>) -> Self {
        DumpwatchError::CaptureFailed {
            reason: reason.into(),
            output: output.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            DumpwatchError::Validation(_) => StatusCode::BAD_REQUEST,
            DumpwatchError::Authentication(_) => StatusCode::UNAUTHORIZED,
            DumpwatchError::NotFound(_) => StatusCode::NOT_FOUND,
            DumpwatchError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            DumpwatchError::CaptureFailed { .. } => StatusCode::BAD_GATEWAY,
            DumpwatchError::Throttled(_) => StatusCode::TOO_MANY_REQUESTS,
            DumpwatchError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DumpwatchError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DumpwatchError::Malformed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            DumpwatchError::Validation(_) => "VALIDATION_ERROR",
            DumpwatchError::Authentication(_) => "AUTHENTICATION_ERROR",
            DumpwatchError::NotFound(_) => "NOT_FOUND",
            DumpwatchError::UpstreamUnavailable(_) => "UPSTREAM_UNAVAILABLE",
            DumpwatchError::CaptureFailed { .. } => "CAPTURE_FAILED",
            DumpwatchError::Throttled(_) => "THROTTLED",
            DumpwatchError::Storage(_) => "STORAGE_ERROR",
            DumpwatchError::Configuration(_) => "CONFIGURATION_ERROR",
            DumpwatchError::Malformed(_) => "MALFORMED_TRIGGER",
        }
    }
}

impl IntoResponse for DumpwatchError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.to_string();

        tracing::error!(
            error_code = error_code,
            status_code = status.as_u16(),
            message = %message,
            "Request error"
        );

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
                "status": status.as_u16(),
            }
        }));

        (status, body).into_response()
    }
}

impl From<serde_json::Error> for DumpwatchError {
    fn from(err: serde_json::Error) -> Self {
        DumpwatchError::Malformed(err.to_string())
    }
}

impl From<kube::Error> for DumpwatchError {
    fn from(err: kube::Error) -> Self {
        match &err {
            kube::Error::Api(response) if response.code == 404 => {
                DumpwatchError::NotFound(response.message.clone())
            }
            _ => DumpwatchError::UpstreamUnavailable(format!("Kubernetes API error: {err}")),
        }
    }
}

impl From<reqwest::Error> for DumpwatchError {
    fn from(err: reqwest::Error) -> Self {
        DumpwatchError::UpstreamUnavailable(err.to_string())
    }
}

impl From<config::ConfigError> for DumpwatchError {
    fn from(err: config::ConfigError) -> Self {
        DumpwatchError::Configuration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DumpwatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            DumpwatchError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            DumpwatchError::Authentication("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            DumpwatchError::capture_failed("bad", "out").status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_capture_failed_keeps_output() {
        let err = DumpwatchError::capture_failed("missing marker", "Neither jcmd nor jstack found");
        assert!(err.to_string().contains("Neither jcmd nor jstack found"));
        assert_eq!(err.error_code(), "CAPTURE_FAILED");
    }
}
