use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::provider::ProvideCredentials;
use config::{Value, ValueKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Where the SDK clients get their credentials from.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AwsConfig {
    Profile(String),
    RoleArn(String),
    Env,
}

impl fmt::Display for AwsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AwsConfig::Profile(profile) => write!(f, "profile:{}", profile),
            AwsConfig::RoleArn(role) => write!(f, "role_arn:{}", role),
            AwsConfig::Env => write!(f, "env"),
        }
    }
}

impl From<AwsConfig> for ValueKind {
    fn from(value: AwsConfig) -> Self {
        let (key, inner) = match value {
            AwsConfig::Profile(profile) => ("profile", profile),
            AwsConfig::RoleArn(role) => ("role_arn", role),
            AwsConfig::Env => return Self::String("env".to_string()),
        };
        let mut table = HashMap::new();
        table.insert(key.to_string(), Value::new(None, Self::String(inner)));
        Self::Table(table)
    }
}

// Inside AWS compute the env chain falls through to the container/instance role.
async fn load_aws_conf(init: AwsConfig, region: &str) -> Option<SdkConfig> {
    let loader = aws_config::defaults(BehaviorVersion::latest());
    let loader = match init {
        AwsConfig::Profile(profile) => {
            tracing::debug!("Loading AWS config using profile '{}'", profile);
            loader.profile_name(profile)
        }
        AwsConfig::RoleArn(arn) => {
            tracing::debug!("Assuming role '{}'", &arn);
            let provider = aws_config::sts::AssumeRoleProvider::builder(&arn)
                .session_name("dumpwatch-session")
                .region(Region::new(region.to_string()))
                .build()
                .await;
            loader.credentials_provider(provider)
        }
        AwsConfig::Env => {
            tracing::debug!("Loading AWS config from environment");
            loader
        }
    };

    let config = loader.region(Region::new(region.to_string())).load().await;
    let credentials_provider = config.credentials_provider()?;

    match credentials_provider.provide_credentials().await {
        Ok(_) => Some(config),
        Err(err) => {
            tracing::warn!("Failed to get AWS credentials: {:?}", err);
            None
        }
    }
}

/// Tries the configured source first and falls back to the environment chain.
pub async fn resolve_available_aws_config(init: AwsConfig, region: &str) -> Option<SdkConfig> {
    if !matches!(init, AwsConfig::Env) {
        let described = init.to_string();
        if let Some(conf) = load_aws_conf(init, region).await {
            tracing::info!("Resolved AWS credentials using {}", described);
            return Some(conf);
        }
        tracing::warn!("Failed to resolve AWS credentials using {}", described);
    }

    let env_conf = load_aws_conf(AwsConfig::Env, region).await;
    if env_conf.is_some() {
        tracing::info!("Resolved AWS credentials using environment");
    } else {
        tracing::warn!("Could not resolve AWS credentials");
    }
    env_conf
}
