use std::net::SocketAddr;
use std::str::FromStr;

use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Typed reads over an env-var lookup.
struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    fn require(&self, var: &str) -> Result<String, ConfigError> {
        (self.lookup)(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    }

    fn or_default(&self, var: &str, default: &str) -> String {
        (self.lookup)(var).unwrap_or_else(|_| default.to_string())
    }

    /// Blank values count as unset.
    fn optional(&self, var: &str) -> Option<String> {
        (self.lookup)(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse<T>(&self, var: &str, default: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.or_default(var, default)
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Build application configuration using the provided env-var lookup function.
///
/// Tests drive this with a `HashMap` lookup instead of touching the process
/// environment.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let env_vars = EnvReader { lookup };

    Ok(AppConfig {
        database_url: env_vars.require("DATABASE_URL")?,
        env: env_vars.parse("INBRAIN_ENV", "development")?,
        bind_addr: env_vars.parse::<SocketAddr>("INBRAIN_BIND_ADDR", "0.0.0.0:3000")?,
        log_level: env_vars.or_default("INBRAIN_LOG_LEVEL", "info"),
        db_max_connections: env_vars.parse("INBRAIN_DB_MAX_CONNECTIONS", "10")?,
        db_min_connections: env_vars.parse("INBRAIN_DB_MIN_CONNECTIONS", "1")?,
        db_acquire_timeout_secs: env_vars.parse("INBRAIN_DB_ACQUIRE_TIMEOUT_SECS", "10")?,
        clusterer_api_key: env_vars.optional("GROQ_API_KEY"),
        clusterer_base_url: env_vars
            .or_default("INBRAIN_CLUSTERER_BASE_URL", "https://api.groq.com/openai/v1"),
        clusterer_model: env_vars.or_default("INBRAIN_CLUSTERER_MODEL", "llama-3.3-70b-versatile"),
        clusterer_timeout_secs: env_vars.parse("INBRAIN_CLUSTERER_TIMEOUT_SECS", "60")?,
        clusterer_max_retries: env_vars.parse("INBRAIN_CLUSTERER_MAX_RETRIES", "3")?,
        clusterer_backoff_base_ms: env_vars.parse("INBRAIN_CLUSTERER_BACKOFF_BASE_MS", "1000")?,
        cluster_schedule: env_vars.optional("INBRAIN_CLUSTER_SCHEDULE"),
    })
}
