pub const AWS_REGION: &str = "us-east-1";
pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8722";
pub const DEFAULT_S3_PREFIX: &str = "thread-dumps/";
pub const DEFAULT_WEBHOOK_SECRET_ID: &str = "grafana-webhook-credentials";

pub const MODEL_ID: &str = "us.anthropic.claude-3-7-sonnet-20250219-v1:0";
pub const ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";
pub const MAX_TOKENS: u32 = 8192;
pub const TEMPERATURE: f64 = 0.7;

pub const RETRY_MAX_ATTEMPTS: u32 = 5;
pub const RETRY_BASE_DELAY_MS: u64 = 10_000;
pub const RETRY_MAX_DELAY_MS: u64 = 30_000;

pub const INTROSPECTION_PORT: u16 = 8080;
pub const INTROSPECTION_PATH: &str = "/actuator/threaddump";
pub const INTROSPECTION_TIMEOUT_SECS: u64 = 10;
pub const EXEC_TIMEOUT_SECS: u64 = 60;

pub const TOKEN_REFRESH_INTERVAL_SECS: u64 = 10;
pub const TOKEN_REFRESH_BACKOFF_SECS: u64 = 5;
pub const TOKEN_EXPIRY_BUFFER_SECS: u64 = 60;
/// Presigned STS URLs are accepted by the cluster for 15 minutes; stay under it.
pub const EKS_TOKEN_VALIDITY_SECS: i64 = 14 * 60;
pub const EKS_TOKEN_PREFIX: &str = "k8s-aws-v1.";

pub const THREAD_DUMP_MARKER: &str = "Full thread dump";
pub const HEAP_DUMP_MARKER: &str = "Heap dump created at";
pub const HEAP_DUMP_PATH: &str = "/tmp/heapdump.hprof";
pub const DEFAULT_NAMESPACE: &str = "default";
pub const NO_VALUE_SENTINEL: &str = "[no value]";
pub const ANALYSIS_SUMMARY_CHARS: usize = 500;
