use anyhow::{anyhow, Context};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};
use aws_credential_types::Credentials;
use aws_sigv4::http_request::{
    sign, SignableBody, SignableRequest, SignatureLocation, SigningSettings,
};
use aws_sigv4::sign::v4;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Duration;
use std::time::SystemTime;
use tracing::debug;

use crate::capture::ClusterEndpoint;
use crate::constants::{EKS_TOKEN_PREFIX, EKS_TOKEN_VALIDITY_SECS};
use crate::credentials::TokenIssuer;
use crate::error::{DumpwatchError, Result};

pub struct EksClient {
    client: aws_sdk_eks::Client,
}

impl EksClient {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_eks::Client::new(config),
        }
    }

    pub async fn describe_cluster(&self, name: &str) -> Result<ClusterEndpoint> {
        let cluster = self
            .client
            .describe_cluster()
            .name(name)
            .send()
            .await
            .map_err(|e| {
                DumpwatchError::UpstreamUnavailable(format!("DescribeCluster {name}: {e:?}"))
            })?
            .cluster
            .ok_or_else(|| DumpwatchError::NotFound(format!("EKS cluster {name}")))?;

        let endpoint = cluster
            .endpoint
            .ok_or_else(|| DumpwatchError::Configuration(format!("cluster {name} has no endpoint")))?;
        let certificate_authority = cluster
            .certificate_authority
            .and_then(|ca| ca.data)
            .ok_or_else(|| DumpwatchError::Configuration(format!("cluster {name} has no CA")))?;

        Ok(ClusterEndpoint {
            name: name.to_string(),
            endpoint,
            certificate_authority,
        })
    }
}

/// Issues cluster bearer tokens from a presigned STS GetCallerIdentity URL.
pub struct EksTokenIssuer {
    cluster: String,
    region: String,
    credentials: SharedCredentialsProvider,
}

impl EksTokenIssuer {
    pub fn new(config: &SdkConfig, cluster: impl Into<String>) -> Result<Self> {
        let credentials = config.credentials_provider().ok_or_else(|| {
            DumpwatchError::Configuration("no AWS credentials provider".to_string())
        })?;
        let region = config
            .region()
            .map(|r| r.to_string())
            .ok_or_else(|| DumpwatchError::Configuration("no AWS region".to_string()))?;
        Ok(Self {
            cluster: cluster.into(),
            region,
            credentials,
        })
    }

    fn presign(&self, credentials: Credentials) -> anyhow::Result<String> {
        let identity = credentials.into();
        let url = format!(
            "https://sts.{}.amazonaws.com/?Action=GetCallerIdentity&Version=2011-06-15",
            self.region
        );

        let mut settings = SigningSettings::default();
        settings.signature_location = SignatureLocation::QueryParams;
        settings.expires_in = Some(std::time::Duration::from_secs(60));

        let params = v4::SigningParams::builder()
            .identity(&identity)
            .region(&self.region)
            .name("sts")
            .time(SystemTime::now())
            .settings(settings)
            .build()?
            .into();

        let headers = [("x-k8s-aws-id", self.cluster.as_str())];
        let signable = SignableRequest::new("GET", &url, headers.into_iter(), SignableBody::Bytes(&[]))?;
        let (instructions, _signature) = sign(signable, &params)?.into_parts();

        let mut request = http::Request::builder().method("GET").uri(&url).body(())?;
        instructions.apply_to_request_http1x(&mut request);
        Ok(request.uri().to_string())
    }
}

#[async_trait]
impl TokenIssuer for EksTokenIssuer {
    async fn issue_token(&self) -> anyhow::Result<String> {
        let credentials = self
            .credentials
            .provide_credentials()
            .await
            .context("failed to load AWS credentials for token signing")?;
        let presigned = self
            .presign(credentials)
            .map_err(|e| anyhow!("failed to presign STS request: {e}"))?;
        debug!("Presigned token request for cluster {}", self.cluster);
        Ok(format!("{}{}", EKS_TOKEN_PREFIX, URL_SAFE_NO_PAD.encode(presigned)))
    }

    fn validity(&self) -> Duration {
        Duration::seconds(EKS_TOKEN_VALIDITY_SECS)
    }

    fn describe(&self) -> String {
        format!("EKS cluster {}", self.cluster)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_config::{BehaviorVersion, Region};

    fn static_config() -> SdkConfig {
        SdkConfig::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(SharedCredentialsProvider::new(Credentials::new(
                "AKIDEXAMPLE",
                "secret",
                None,
                None,
                "test",
            )))
            .build()
    }

    #[tokio::test]
    async fn test_token_is_prefixed_presigned_sts_url() {
        let issuer = EksTokenIssuer::new(&static_config(), "prod-cluster").unwrap();
        let token = issuer.issue_token().await.unwrap();

        let encoded = token.strip_prefix("k8s-aws-v1.").unwrap();
        let url = String::from_utf8(URL_SAFE_NO_PAD.decode(encoded).unwrap()).unwrap();
        assert!(url.starts_with("https://sts.us-east-1.amazonaws.com/?Action=GetCallerIdentity"));
        assert!(url.contains("X-Amz-Signature="));
        assert!(url.contains("X-Amz-Expires=60"));
        assert!(url.contains("x-k8s-aws-id"));
    }

    #[test]
    fn test_validity_is_fixed_window() {
        let issuer = EksTokenIssuer::new(&static_config(), "c").unwrap();
        assert_eq!(issuer.validity(), Duration::minutes(14));
    }
}
