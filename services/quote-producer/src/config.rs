//! Environment-driven producer configuration.

use std::env;
use std::time::Duration;

/// Configuration errors are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {var}: {value}")]
    Invalid { var: &'static str, value: String },
}

/// Producer service configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct ProducerConfig {
    /// Kafka bootstrap servers.
    pub brokers: String,
    /// Topic the events are published to.
    pub topic: String,
    /// The single symbol this pipeline tracks.
    pub symbol: String,
    /// Upstream API credential.
    pub api_key: String,
    /// Upstream API base URL (overridable for tests).
    pub api_base_url: String,
    /// Normal publish cycle interval.
    pub fetch_interval: Duration,
    /// Shorter pacing after an unavailable cycle.
    pub retry_interval: Duration,
}

impl ProducerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            brokers: var_or("BROKER_ADDRESS", "localhost:9092"),
            topic: var_or("TOPIC", "coins"),
            symbol: var_or("SYMBOL", "DOGE"),
            api_key: required("COINMARKETCAP_API_KEY")?,
            api_base_url: var_or("API_BASE_URL", "https://pro-api.coinmarketcap.com"),
            fetch_interval: duration_secs("FETCH_INTERVAL_SECS", 60)?,
            retry_interval: duration_secs("RETRY_INTERVAL_SECS", 30)?,
        })
    }
}

fn var_or(var: &'static str, default: &str) -> String {
    env::var(var).unwrap_or_else(|_| default.to_string())
}

fn required(var: &'static str) -> Result<String, ConfigError> {
    env::var(var).map_err(|_| ConfigError::Missing(var))
}

fn duration_secs(var: &'static str, default: u64) -> Result<Duration, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError::Invalid { var, value }),
        Err(_) => Ok(Duration::from_secs(default)),
    }
}
