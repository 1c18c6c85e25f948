use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `TIDY_PUSH__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub push: PushConfig,
    #[serde(default)]
    pub trigger: TriggerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

/// Push transport settings. Batch sizes are transport-defined constants,
/// surfaced here so deployments against a different gateway can adjust them.
#[derive(Debug, Clone, Deserialize)]
pub struct PushConfig {
    #[serde(default = "default_send_url")]
    pub send_url: String,
    #[serde(default = "default_receipts_url")]
    pub receipts_url: String,
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
    #[serde(default = "default_receipt_batch_size")]
    pub receipt_batch_size: usize,
    #[serde(default = "default_chunk_concurrency")]
    pub chunk_concurrency: usize,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

/// Settings for the externally triggerable endpoints: the shared cron
/// secret and the admission window applied per caller identifier.
#[derive(Debug, Clone, Deserialize)]
pub struct TriggerConfig {
    #[serde(default = "default_cron_secret")]
    pub cron_secret: String,
    #[serde(default = "default_rate_limit")]
    pub rate_limit: usize,
    #[serde(default = "default_rate_window_ms")]
    pub rate_window_ms: i64,
}

// Default functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    8080
}
fn default_metrics_port() -> u16 {
    9091
}
fn default_send_url() -> String {
    "https://exp.host/--/api/v2/push/send".to_string()
}
fn default_receipts_url() -> String {
    "https://exp.host/--/api/v2/push/getReceipts".to_string()
}
fn default_max_batch_size() -> usize {
    100
}
fn default_receipt_batch_size() -> usize {
    300
}
fn default_chunk_concurrency() -> usize {
    4
}
fn default_request_timeout_ms() -> u64 {
    10_000
}
fn default_cron_secret() -> String {
    // Development fallback. Production: set TIDY_PUSH__TRIGGER__CRON_SECRET.
    "tidy-dev-secret".to_string()
}
fn default_rate_limit() -> usize {
    10
}
fn default_rate_window_ms() -> i64 {
    60_000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            port: default_metrics_port(),
        }
    }
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            send_url: default_send_url(),
            receipts_url: default_receipts_url(),
            max_batch_size: default_max_batch_size(),
            receipt_batch_size: default_receipt_batch_size(),
            chunk_concurrency: default_chunk_concurrency(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            cron_secret: default_cron_secret(),
            rate_limit: default_rate_limit(),
            rate_window_ms: default_rate_window_ms(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            metrics: MetricsConfig::default(),
            push: PushConfig::default(),
            trigger: TriggerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("TIDY_PUSH")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
