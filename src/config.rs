//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// HMAC key used to sign session tokens
    pub jwt_sign_key: String,

    /// Lifetime of an issued session token
    pub jwt_token_ttl: Duration,

    /// Deadline for a single unit of work
    pub request_timeout: Duration,

    /// Apply pending migrations on startup
    pub auto_migrate: bool,

    /// Log output format ("pretty" or "json")
    pub log_format: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingEnv("DATABASE_URL"))?;

        let database_max_connections = parse_var("DATABASE_MAX_CONNECTIONS", "10")?;

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = parse_var("PORT", "8080")?;

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let jwt_sign_key = env::var("JWT_SIGN_KEY")
            .map_err(|_| ConfigError::MissingEnv("JWT_SIGN_KEY"))?;
        if jwt_sign_key.is_empty() {
            return Err(ConfigError::InvalidValue("JWT_SIGN_KEY"));
        }

        let jwt_token_ttl = Duration::from_secs(parse_var("JWT_TOKEN_TTL_SECS", "86400")?);

        let request_timeout = Duration::from_secs(parse_var("REQUEST_TIMEOUT_SECS", "5")?);
        if request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue("REQUEST_TIMEOUT_SECS"));
        }

        let auto_migrate = parse_var("AUTO_MIGRATE", "true")?;

        let log_format = env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

        Ok(Self {
            database_url,
            database_max_connections,
            host,
            port,
            environment,
            jwt_sign_key,
            jwt_token_ttl,
            request_timeout,
            auto_migrate,
            log_format,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: &str) -> Result<T, ConfigError> {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| ConfigError::InvalidValue(name))
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_var_falls_back_to_default() {
        let value: u32 = parse_var("COIN_SHOP_TEST_UNSET_VARIABLE", "42").unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_parse_var_rejects_garbage_default() {
        let result: Result<u16, _> = parse_var("COIN_SHOP_TEST_UNSET_VARIABLE", "not-a-port");
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue("COIN_SHOP_TEST_UNSET_VARIABLE"))
        ));
    }
}
