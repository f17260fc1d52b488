use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// `None` when unset or blank; search and trends then run on fallbacks.
    pub serpapi_key: Option<String>,
    /// `None` when unset or blank; content generation then uses the offline template.
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub provider_timeout_secs: u64,
    pub trends_geo: String,
    pub cache_max_entries: usize,
    pub cache_ttl_secs: u64,
    pub workflow_max_concurrent: usize,
    pub queue_capacity: usize,
    /// Cron expression for the stale-pending sweep job.
    pub pending_sweep_cron: String,
    pub pending_stale_after_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "serpapi_key",
                &self.serpapi_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "gemini_api_key",
                &self.gemini_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("gemini_model", &self.gemini_model)
            .field("provider_timeout_secs", &self.provider_timeout_secs)
            .field("trends_geo", &self.trends_geo)
            .field("cache_max_entries", &self.cache_max_entries)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .field("workflow_max_concurrent", &self.workflow_max_concurrent)
            .field("queue_capacity", &self.queue_capacity)
            .field("pending_sweep_cron", &self.pending_sweep_cron)
            .field("pending_stale_after_secs", &self.pending_stale_after_secs)
            .finish()
    }
}
