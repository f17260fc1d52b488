use crate::app_config::{AppConfig, Environment};
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

/// Build application configuration using the provided env-var lookup function.
///
/// Parsing and validation are decoupled from the real environment so tests can
/// drive them with a plain `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    // Blank keys are treated the same as unset ones: providers fall back.
    let optional_secret = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let parse = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_nonzero_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        match raw.parse::<usize>() {
            Ok(0) => Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "must be greater than zero".to_string(),
            }),
            Ok(v) => Ok(v),
            Err(e) => Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            }),
        }
    };

    let database_url = require("DATABASE_URL")?;

    let env = parse_environment(&or_default("LISTINGSEO_ENV", "development"));

    let bind_addr = parse("LISTINGSEO_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("LISTINGSEO_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("LISTINGSEO_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("LISTINGSEO_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("LISTINGSEO_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let serpapi_key = optional_secret("SERPAPI_KEY");
    let gemini_api_key = optional_secret("GEMINI_API_KEY");
    let gemini_model = or_default("GEMINI_MODEL", "gemini-1.5-flash");
    let provider_timeout_secs = parse_u64("LISTINGSEO_PROVIDER_TIMEOUT_SECS", "7")?;
    let trends_geo = or_default("LISTINGSEO_TRENDS_GEO", "IN");

    let cache_max_entries = parse_nonzero_usize("LISTINGSEO_CACHE_MAX_ENTRIES", "1000")?;
    let cache_ttl_secs = parse_u64("LISTINGSEO_CACHE_TTL_SECS", "21600")?;

    let workflow_max_concurrent = parse_nonzero_usize("LISTINGSEO_WORKFLOW_MAX_CONCURRENT", "4")?;
    let queue_capacity = parse_nonzero_usize("LISTINGSEO_QUEUE_CAPACITY", "256")?;
    let pending_sweep_cron = or_default("LISTINGSEO_PENDING_SWEEP_CRON", "0 */5 * * * *");
    let pending_stale_after_secs = parse_u64("LISTINGSEO_PENDING_STALE_AFTER_SECS", "600")?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        serpapi_key,
        gemini_api_key,
        gemini_model,
        provider_timeout_secs,
        trends_geo,
        cache_max_entries,
        cache_ttl_secs,
        workflow_max_concurrent,
        queue_capacity,
        pending_sweep_cron,
        pending_stale_after_secs,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
