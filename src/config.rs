use std::time::Duration;

use thiserror::Error;
use tracing::level_filters::LevelFilter;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} should be set")]
    Missing(&'static str),

    #[error("{var} has invalid value '{value}'")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub teloxide_token: String,
    pub database_url: String,
    pub database_max_connections: u32,
    pub log_level: LevelFilter,
    pub log_json: bool,
    pub session_ttl: Duration,
    pub session_sweep: Duration,
    pub results_history_limit: usize,
}

impl Config {
    /// Read configuration from the process environment, after loading `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |var: &'static str| lookup(var).ok_or(ConfigError::Missing(var));

        Ok(Self {
            teloxide_token: required("TELOXIDE_TOKEN")?,
            database_url: required("DATABASE_URL")?,
            database_max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 5)?,
            log_level: parse_or(&lookup, "LOG_LEVEL", LevelFilter::INFO)?,
            log_json: parse_or(&lookup, "LOG_JSON", true)?,
            session_ttl: Duration::from_secs(parse_or(&lookup, "SESSION_TTL_SECS", 3600)?),
            session_sweep: Duration::from_secs(parse_or(&lookup, "SESSION_SWEEP_SECS", 60)?),
            results_history_limit: parse_or(&lookup, "RESULTS_HISTORY_LIMIT", 10)?,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
        None => Ok(default),
    }
}
