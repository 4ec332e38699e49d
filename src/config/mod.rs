//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;

/// Default per-connection outbox size (messages buffered before drops)
pub const DEFAULT_OUTBOX_CAPACITY: usize = 256;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Allowed client origins for CORS (comma-separated), permissive when unset
    pub client_origin: Option<String>,
    /// Seed for spawn positions and colors, random when unset
    pub arena_seed: Option<u64>,
    /// Outbound messages buffered per connection
    pub outbox_capacity: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Hosting platforms provide PORT, fall back to SERVER_ADDR or default
        let server_addr = match lookup("PORT") {
            Some(port) => format!("0.0.0.0:{}", port),
            None => lookup("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
        };

        let arena_seed = lookup("ARENA_SEED")
            .map(|raw| raw.parse::<u64>().map_err(|_| ConfigError::Invalid("ARENA_SEED")))
            .transpose()?;

        let outbox_capacity = match lookup("OUTBOX_CAPACITY") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => return Err(ConfigError::Invalid("OUTBOX_CAPACITY")),
            },
            None => DEFAULT_OUTBOX_CAPACITY,
        };

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            client_origin: lookup("CLIENT_ORIGIN").filter(|s| !s.trim().is_empty()),
            arena_seed,
            outbox_capacity,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid server address format")]
    InvalidAddress,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tokio_test::{assert_err, assert_ok};

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = assert_ok!(Config::from_lookup(lookup_from(&[])));
        assert_eq!(config.server_addr, "0.0.0.0:3000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.log_level, "info");
        assert!(config.client_origin.is_none());
        assert!(config.arena_seed.is_none());
        assert_eq!(config.outbox_capacity, DEFAULT_OUTBOX_CAPACITY);
    }

    #[test]
    fn port_takes_precedence_over_server_addr() {
        let config = assert_ok!(Config::from_lookup(lookup_from(&[
            ("PORT", "8081"),
            ("SERVER_ADDR", "127.0.0.1:9000"),
        ])));
        assert_eq!(config.server_addr.port(), 8081);
    }

    #[test]
    fn rejects_bad_values() {
        let err = assert_err!(Config::from_lookup(lookup_from(&[("SERVER_ADDR", "nope")])));
        assert!(matches!(err, ConfigError::InvalidAddress));

        let err = assert_err!(Config::from_lookup(lookup_from(&[("ARENA_SEED", "-1")])));
        assert!(matches!(err, ConfigError::Invalid("ARENA_SEED")));

        let err = assert_err!(Config::from_lookup(lookup_from(&[("OUTBOX_CAPACITY", "0")])));
        assert!(matches!(err, ConfigError::Invalid("OUTBOX_CAPACITY")));
    }

    #[test]
    fn reads_optional_settings() {
        let config = assert_ok!(Config::from_lookup(lookup_from(&[
            ("ARENA_SEED", "42"),
            ("CLIENT_ORIGIN", "http://localhost:5173"),
            ("LOG_LEVEL", "debug"),
        ])));
        assert_eq!(config.arena_seed, Some(42));
        assert_eq!(config.client_origin.as_deref(), Some("http://localhost:5173"));
        assert_eq!(config.log_level, "debug");
    }
}
