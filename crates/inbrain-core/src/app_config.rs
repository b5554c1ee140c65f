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

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(Environment::Development),
            "test" => Ok(Environment::Test),
            "production" => Ok(Environment::Production),
            other => Err(format!("unknown environment '{other}'")),
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
    /// Key for the clustering service. Cluster generation is disabled without it.
    pub clusterer_api_key: Option<String>,
    pub clusterer_base_url: String,
    pub clusterer_model: String,
    pub clusterer_timeout_secs: u64,
    pub clusterer_max_retries: u32,
    pub clusterer_backoff_base_ms: u64,
    /// Cron expression for the scheduled clustering job; `None` disables it.
    pub cluster_schedule: Option<String>,
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
                "clusterer_api_key",
                &self.clusterer_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("clusterer_base_url", &self.clusterer_base_url)
            .field("clusterer_model", &self.clusterer_model)
            .field("clusterer_timeout_secs", &self.clusterer_timeout_secs)
            .field("clusterer_max_retries", &self.clusterer_max_retries)
            .field("clusterer_backoff_base_ms", &self.clusterer_backoff_base_ms)
            .field("cluster_schedule", &self.cluster_schedule)
            .finish()
    }
}
