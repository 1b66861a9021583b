//! Environment-driven consumer configuration.

use std::env;

/// Configuration errors are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
}

/// Consumer service configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    /// Kafka bootstrap servers.
    pub brokers: String,
    /// Topic the events are consumed from.
    pub topic: String,
    /// Consumer group scoping the offset commits.
    pub group: String,
    /// Postgres connection URL.
    pub database_url: String,
    /// Destination table.
    pub table: String,
}

impl ConsumerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            brokers: var_or("BROKER_ADDRESS", "localhost:9092"),
            topic: var_or("TOPIC", "coins"),
            group: var_or("CONSUMER_GROUP", "coin_group"),
            database_url: database_url()?,
            table: var_or("POSTGRES_TABLE", "cryptoprices"),
        })
    }
}

/// `DATABASE_URL` wins; otherwise the URL is assembled from the
/// individual `POSTGRES_*` variables.
fn database_url() -> Result<String, ConfigError> {
    if let Ok(url) = env::var("DATABASE_URL") {
        return Ok(url);
    }

    let host = var_or("POSTGRES_HOST", "localhost");
    let port = var_or("POSTGRES_PORT", "5432");
    let db = var_or("POSTGRES_DB", "cryptoprices");
    let user = env::var("POSTGRES_USER").map_err(|_| ConfigError::Missing("POSTGRES_USER"))?;
    let password =
        env::var("POSTGRES_PASSWORD").map_err(|_| ConfigError::Missing("POSTGRES_PASSWORD"))?;

    Ok(format!("postgres://{user}:{password}@{host}:{port}/{db}"))
}

fn var_or(var: &'static str, default: &str) -> String {
    env::var(var).unwrap_or_else(|_| default.to_string())
}
