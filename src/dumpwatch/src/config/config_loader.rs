use anyhow::{bail, Context, Result};
use config::builder::DefaultState;
use config::{Config as RConfig, ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::analysis::RetryPolicy;
use crate::cloud_providers::aws::bedrock::ModelSettings;
use crate::cloud_providers::aws::config::AwsConfig;
use crate::constants::{
    AWS_REGION, DEFAULT_S3_PREFIX, DEFAULT_SERVER_ADDRESS, DEFAULT_WEBHOOK_SECRET_ID,
    EXEC_TIMEOUT_SECS, INTROSPECTION_PATH, INTROSPECTION_PORT, INTROSPECTION_TIMEOUT_SECS,
    MAX_TOKENS, MODEL_ID, RETRY_BASE_DELAY_MS, RETRY_MAX_ATTEMPTS, RETRY_MAX_DELAY_MS,
    TEMPERATURE, TOKEN_EXPIRY_BUFFER_SECS, TOKEN_REFRESH_BACKOFF_SECS,
    TOKEN_REFRESH_INTERVAL_SECS,
};
use crate::credentials::RefreshSettings;
use crate::storage::normalize_prefix;

pub const ENV_PREFIX: &str = "DUMPWATCH";

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    pub aws_init_type: AwsConfig,
    pub aws_region: String,

    #[serde(default)]
    pub s3_bucket: Option<String>,
    pub s3_prefix: String,
    #[serde(default)]
    pub sns_topic_arn: Option<String>,

    pub webhook_secret_id: String,
    pub webhook_auth_enabled: bool,
    pub server: String,

    pub model_id: String,
    pub max_tokens: u32,
    pub temperature: f64,

    pub retry_max_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,

    pub http_port: u16,
    pub http_path: String,
    pub http_timeout_secs: u64,
    pub exec_timeout_secs: u64,

    pub token_refresh_interval_secs: u64,
    pub token_refresh_backoff_secs: u64,
    pub token_expiry_buffer_secs: u64,

    pub log_format: LogFormat,
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.retry_max_attempts == 0 {
            bail!("retry_max_attempts must be at least 1");
        }
        if self.retry_base_delay_ms > self.retry_max_delay_ms {
            bail!(
                "retry_base_delay_ms ({}) must not exceed retry_max_delay_ms ({})",
                self.retry_base_delay_ms,
                self.retry_max_delay_ms
            );
        }
        if self.http_timeout_secs == 0 || self.exec_timeout_secs == 0 {
            bail!("capture timeouts must be positive");
        }
        if self.token_refresh_interval_secs == 0 {
            bail!("token_refresh_interval_secs must be positive");
        }
        if self.sns_topic_arn.as_deref().is_some_and(|arn| arn.trim().is_empty()) {
            bail!("sns_topic_arn is set but empty");
        }
        Ok(())
    }

    /// The artifact bucket; serving without one is a configuration error.
    pub fn require_bucket(&self) -> Result<&str> {
        match self.s3_bucket.as_deref().map(str::trim) {
            Some(bucket) if !bucket.is_empty() => Ok(bucket),
            _ => bail!("s3_bucket must be set (config file or {}_S3_BUCKET)", ENV_PREFIX),
        }
    }

    pub fn s3_prefix(&self) -> String {
        normalize_prefix(&self.s3_prefix)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_max_attempts,
            Duration::from_millis(self.retry_base_delay_ms),
            Duration::from_millis(self.retry_max_delay_ms),
        )
    }

    pub fn refresh_settings(&self) -> RefreshSettings {
        RefreshSettings {
            interval: Duration::from_secs(self.token_refresh_interval_secs),
            failure_backoff: Duration::from_secs(self.token_refresh_backoff_secs),
            expiry_buffer: chrono::Duration::seconds(self.token_expiry_buffer_secs as i64),
        }
    }

    pub fn model_settings(&self) -> ModelSettings {
        ModelSettings {
            model_id: self.model_id.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    fn with_defaults() -> Result<ConfigBuilder<DefaultState>> {
        Ok(RConfig::builder()
            .set_default("aws_init_type", AwsConfig::Env)?
            .set_default("aws_region", AWS_REGION)?
            .set_default("s3_prefix", DEFAULT_S3_PREFIX)?
            .set_default("webhook_secret_id", DEFAULT_WEBHOOK_SECRET_ID)?
            .set_default("webhook_auth_enabled", true)?
            .set_default("server", DEFAULT_SERVER_ADDRESS)?
            .set_default("model_id", MODEL_ID)?
            .set_default("max_tokens", MAX_TOKENS)?
            .set_default("temperature", TEMPERATURE)?
            .set_default("retry_max_attempts", RETRY_MAX_ATTEMPTS)?
            .set_default("retry_base_delay_ms", RETRY_BASE_DELAY_MS)?
            .set_default("retry_max_delay_ms", RETRY_MAX_DELAY_MS)?
            .set_default("http_port", INTROSPECTION_PORT)?
            .set_default("http_path", INTROSPECTION_PATH)?
            .set_default("http_timeout_secs", INTROSPECTION_TIMEOUT_SECS)?
            .set_default("exec_timeout_secs", EXEC_TIMEOUT_SECS)?
            .set_default("token_refresh_interval_secs", TOKEN_REFRESH_INTERVAL_SECS)?
            .set_default("token_refresh_backoff_secs", TOKEN_REFRESH_BACKOFF_SECS)?
            .set_default("token_expiry_buffer_secs", TOKEN_EXPIRY_BUFFER_SECS)?
            .set_default("log_format", "pretty")?)
    }

    /// Defaults, then the optional TOML file, then `DUMPWATCH_*` variables.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let mut builder = Self::with_defaults()?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }
        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        let config: Config = builder
            .build()?
            .try_deserialize()
            .context("failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_default_config() -> Result<Config> {
        Self::load(None)
    }
}
