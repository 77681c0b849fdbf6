use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::{info, warn};

use crate::error::{DumpwatchError, Result};

/// Equality in constant time over SHA-256 digests, so lengths do not leak either.
fn secrets_match(given: &str, expected: &str) -> bool {
    let given = Sha256::digest(given.as_bytes());
    let expected = Sha256::digest(expected.as_bytes());
    given.as_slice().ct_eq(expected.as_slice()).into()
}

#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct WebhookCredentials {
    pub username: String,
    pub password: String,
}

/// Where the expected webhook credentials are kept.
#[async_trait]
pub trait WebhookCredentialSource: Send + Sync {
    async fn webhook_credentials(&self) -> anyhow::Result<WebhookCredentials>;
}

fn decode_basic(header: &str) -> Option<(String, String)> {
    let encoded = header.strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

/// Checks the webhook's Basic-Authentication header. With no credential
/// source configured every request passes.
#[derive(Clone)]
pub struct BasicAuthGate {
    source: Option<Arc<dyn WebhookCredentialSource>>,
}

impl BasicAuthGate {
    pub fn new(source: Arc<dyn WebhookCredentialSource>) -> Self {
        Self {
            source: Some(source),
        }
    }

    pub fn disabled() -> Self {
        Self { source: None }
    }

    pub async fn verify(&self, authorization: Option<&str>) -> Result<()> {
        let Some(source) = &self.source else {
            return Ok(());
        };

        let (username, password) = authorization.and_then(decode_basic).ok_or_else(|| {
            warn!("No Basic Authorization header found");
            DumpwatchError::Authentication("missing Basic credentials".to_string())
        })?;

        let expected = source.webhook_credentials().await.map_err(|e| {
            warn!("Could not load webhook credentials: {:#}", e);
            DumpwatchError::Authentication("credentials unavailable".to_string())
        })?;

        let user_ok = secrets_match(&username, &expected.username);
        let password_ok = secrets_match(&password, &expected.password);
        if !(user_ok & password_ok) {
            warn!("Invalid credentials provided");
            return Err(DumpwatchError::Authentication(
                "invalid credentials".to_string(),
            ));
        }

        info!("Authentication successful");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    struct Fixed;

    #[async_trait]
    impl WebhookCredentialSource for Fixed {
        async fn webhook_credentials(&self) -> anyhow::Result<WebhookCredentials> {
            Ok(WebhookCredentials {
                username: "grafana".into(),
                password: "s3cret:with-colon".into(),
            })
        }
    }

    struct Unavailable;

    #[async_trait]
    impl WebhookCredentialSource for Unavailable {
        async fn webhook_credentials(&self) -> anyhow::Result<WebhookCredentials> {
            anyhow::bail!("AccessDeniedException")
        }
    }

    fn basic(raw: &str) -> String {
        format!("Basic {}", STANDARD.encode(raw))
    }

    #[tokio::test]
    async fn test_matching_credentials_pass() {
        let gate = BasicAuthGate::new(Arc::new(Fixed));
        assert!(gate
            .verify(Some(&basic("grafana:s3cret:with-colon")))
            .await
            .is_ok());
    }

    #[rstest]
    #[case(None)]
    #[case(Some("Bearer abc".to_string()))]
    #[case(Some("Basic !!!".to_string()))]
    #[case(Some(basic("grafana:wrong")))]
    #[case(Some(basic("grafana:s3cret:with-colom")))]
    #[case(Some(basic("grafanA:s3cret:with-colon")))]
    #[case(Some(basic("grafana:s3cret:with-colon ")))]
    #[case(Some(basic("no-colon")))]
    #[tokio::test]
    async fn test_bad_credentials_fail(#[case] header: Option<String>) {
        let gate = BasicAuthGate::new(Arc::new(Fixed));
        let err = gate.verify(header.as_deref()).await.unwrap_err();
        assert!(matches!(err, DumpwatchError::Authentication(_)));
    }

    #[rstest]
    #[case("s3cret", "s3cret", true)]
    #[case("s3cret", "s3creT", false)]
    #[case("s3cret", "s3cre", false)]
    #[case("", "", true)]
    fn test_secrets_match(#[case] given: &str, #[case] expected: &str, #[case] matches: bool) {
        assert_eq!(secrets_match(given, expected), matches);
    }

    #[tokio::test]
    async fn test_unavailable_secret_fails_closed() {
        let gate = BasicAuthGate::new(Arc::new(Unavailable));
        assert!(gate.verify(Some(&basic("a:b"))).await.is_err());
    }

    #[tokio::test]
    async fn test_disabled_gate_allows_all() {
        assert!(BasicAuthGate::disabled().verify(None).await.is_ok());
    }
}
