//! Environment-driven configuration.

use std::env::VarError;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub nats_url: Option<String>,
    pub stripe_secret_key: Option<String>,
    pub stripe_api_base: String,
    pub currency: String,
    pub viacep_base_url: String,
}

/// Loads `.env` when present, then reads the process environment.
///
/// # Errors
///
/// Returns [`ConfigError`] if a required variable is missing or a value does not parse.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    build_config(|key| std::env::var(key))
}

fn build_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let optional = |var: &str| lookup(var).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
    let or_default = |var: &str, default: &str| optional(var).unwrap_or_else(|| default.to_string());

    fn parse<T: std::str::FromStr>(var: &str, raw: String) -> Result<T, ConfigError>
    where
        T::Err: std::fmt::Display,
    {
        raw.parse::<T>().map_err(|e| ConfigError::InvalidEnvVar { var: var.to_string(), reason: e.to_string() })
    }

    let database_url = optional("DATABASE_URL").ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".into()))?;

    Ok(AppConfig {
        database_url,
        port: parse("PORT", or_default("PORT", "8083"))?,
        log_level: or_default("LOG_LEVEL", "info"),
        db_max_connections: parse("DB_MAX_CONNECTIONS", or_default("DB_MAX_CONNECTIONS", "10"))?,
        db_acquire_timeout_secs: parse("DB_ACQUIRE_TIMEOUT_SECS", or_default("DB_ACQUIRE_TIMEOUT_SECS", "10"))?,
        nats_url: optional("NATS_URL"),
        stripe_secret_key: optional("STRIPE_SECRET_KEY"),
        stripe_api_base: or_default("STRIPE_API_BASE", "https://api.stripe.com"),
        currency: or_default("STORE_CURRENCY", "brl").to_lowercase(),
        viacep_base_url: or_default("VIACEP_BASE_URL", "https://viacep.com.br"),
    })
}
