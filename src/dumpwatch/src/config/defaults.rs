use crate::cloud_providers::aws::config::AwsConfig;
use crate::config::{Config, LogFormat};
use crate::constants::{
    AWS_REGION, DEFAULT_S3_PREFIX, DEFAULT_SERVER_ADDRESS, DEFAULT_WEBHOOK_SECRET_ID,
    EXEC_TIMEOUT_SECS, INTROSPECTION_PATH, INTROSPECTION_PORT, INTROSPECTION_TIMEOUT_SECS,
    MAX_TOKENS, MODEL_ID, RETRY_BASE_DELAY_MS, RETRY_MAX_ATTEMPTS, RETRY_MAX_DELAY_MS,
    TEMPERATURE, TOKEN_EXPIRY_BUFFER_SECS, TOKEN_REFRESH_BACKOFF_SECS,
    TOKEN_REFRESH_INTERVAL_SECS,
};

impl Default for Config {
    fn default() -> Self {
        Self {
            aws_init_type: AwsConfig::Env,
            aws_region: AWS_REGION.to_string(),

            s3_bucket: None,
            s3_prefix: DEFAULT_S3_PREFIX.to_string(),
            sns_topic_arn: None,

            webhook_secret_id: DEFAULT_WEBHOOK_SECRET_ID.to_string(),
            webhook_auth_enabled: true,
            server: DEFAULT_SERVER_ADDRESS.to_string(),

            model_id: MODEL_ID.to_string(),
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,

            retry_max_attempts: RETRY_MAX_ATTEMPTS,
            retry_base_delay_ms: RETRY_BASE_DELAY_MS,
            retry_max_delay_ms: RETRY_MAX_DELAY_MS,

            http_port: INTROSPECTION_PORT,
            http_path: INTROSPECTION_PATH.to_string(),
            http_timeout_secs: INTROSPECTION_TIMEOUT_SECS,
            exec_timeout_secs: EXEC_TIMEOUT_SECS,

            token_refresh_interval_secs: TOKEN_REFRESH_INTERVAL_SECS,
            token_refresh_backoff_secs: TOKEN_REFRESH_BACKOFF_SECS,
            token_expiry_buffer_secs: TOKEN_EXPIRY_BUFFER_SECS,

            log_format: LogFormat::Pretty,
            log_dir: None,
        }
    }
}
