use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: Server,
    pub db: Db,
    pub worker: Worker,
    pub delivery: Delivery,
    pub backoff: Backoff,
    pub notifier: Notifier,
    pub observability: Observability,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Db {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Worker {
    /// Default claim size when a trigger does not pass one.
    pub batch_size: u32,
    /// Upper bound on in-flight deliveries per batch.
    pub concurrency: usize,
    /// Internal poll interval; `0` leaves batching to the external trigger.
    pub poll_interval_ms: u64,
    /// Bearer secret required by `/internal/process-batch`.
    pub shared_secret: String,
    /// Jobs stuck in `processing` longer than this are handed back to `pending`.
    #[serde(default)]
    pub stale_processing_seconds: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Delivery {
    pub timeout_ceiling_seconds: u64,
    pub response_body_limit: usize,
    pub user_agent: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Backoff {
    pub base_ms: u64,
    pub cap_ms: u64,
    pub jitter_ratio: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Notifier {
    #[serde(default)]
    pub endpoint: Option<String>,
    pub timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Observability {
    pub log_filter: String,
    pub json_logs: bool,
    pub enable_metrics: bool,
}

fn default_max_connections() -> u32 {
    10
}

/// Load settings from `config/default.toml`, `config/<env>.toml`, and env overrides.
pub fn load() -> Result<Settings, config::ConfigError> {
    let env_name = std::env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());
    config::Config::builder()
        .add_source(config::File::with_name("config/default"))
        .add_source(config::File::with_name(&format!("config/{env_name}")).required(false))
        .add_source(config::Environment::with_prefix("HOOKRELAY").separator("__"))
        .build()?
        .try_deserialize()
}
