//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub qa_api_key: Option<String>,
    pub qa_api_base: Option<String>,
    pub qa_model: String,
    pub qa_timeout: Duration,
    pub qa_max_retries: u32,
    pub qa_retry_backoff: Duration,
    pub max_upload_bytes: usize,
    pub session_ttl_days: i64,
    pub cors_origin: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Server and Database Settings ---
        let bind_address = parse_or(&lookup, "BIND_ADDRESS", "0.0.0.0:3000".parse().ok())?;

        let database_url =
            lookup("DATABASE_URL").ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Answering Model ---
        let qa_api_key = lookup("QA_API_KEY")
            .or_else(|| lookup("GEMINI_API_KEY"))
            .or_else(|| lookup("OPENAI_API_KEY"));
        let qa_api_base = lookup("QA_API_BASE").filter(|s| !s.trim().is_empty());
        let qa_model = lookup("QA_MODEL").unwrap_or_else(|| "gemini-1.5-flash".to_string());
        let qa_timeout = Duration::from_secs(parse_or(&lookup, "QA_TIMEOUT_SECS", Some(60))?);
        let qa_max_retries = parse_or(&lookup, "QA_MAX_RETRIES", Some(2))?;
        let qa_retry_backoff =
            Duration::from_millis(parse_or(&lookup, "QA_RETRY_BACKOFF_MS", Some(250))?);

        // --- Web Layer ---
        let max_upload_bytes = parse_or(&lookup, "MAX_UPLOAD_BYTES", Some(10 * 1024 * 1024))?;
        let session_ttl_days: i64 = parse_or(&lookup, "SESSION_TTL_DAYS", Some(30))?;
        if session_ttl_days <= 0 {
            return Err(ConfigError::InvalidValue(
                "SESSION_TTL_DAYS".to_string(),
                "must be positive".to_string(),
            ));
        }
        let cors_origin =
            lookup("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string());

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            qa_api_key,
            qa_api_base,
            qa_model,
            qa_timeout,
            qa_max_retries,
            qa_retry_backoff,
            max_upload_bytes,
            session_ttl_days,
            cors_origin,
        })
    }
}

/// Parses `key` if set, otherwise returns `default`.
fn parse_or<F, T>(lookup: &F, key: &str, default: Option<T>) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string())),
        None => default.ok_or_else(|| ConfigError::MissingVar(key.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_database_url_is_set() {
        let config = config_from(&[("DATABASE_URL", "postgres://localhost/docqa")]).unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:3000".parse().unwrap());
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.qa_model, "gemini-1.5-flash");
        assert_eq!(config.qa_timeout, Duration::from_secs(60));
        assert_eq!(config.qa_max_retries, 2);
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.session_ttl_days, 30);
        assert!(config.qa_api_key.is_none());
    }

    #[test]
    fn database_url_is_required() {
        assert!(matches!(config_from(&[]), Err(ConfigError::MissingVar(v)) if v == "DATABASE_URL"));
    }

    #[test]
    fn api_key_falls_back_through_provider_variables() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("OPENAI_API_KEY", "openai"),
            ("GEMINI_API_KEY", "gemini"),
        ])
        .unwrap();
        assert_eq!(config.qa_api_key.as_deref(), Some("gemini"));
    }

    #[test]
    fn invalid_numbers_are_reported_with_their_variable() {
        let err = config_from(&[("DATABASE_URL", "postgres://x"), ("QA_TIMEOUT_SECS", "soon")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(v, _) if v == "QA_TIMEOUT_SECS"));

        let err = config_from(&[("DATABASE_URL", "postgres://x"), ("SESSION_TTL_DAYS", "0")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(v, _) if v == "SESSION_TTL_DAYS"));
    }
}
