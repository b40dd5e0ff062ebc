//! Server configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use serde::Serialize;

/// Server configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to
    pub bind_addr: SocketAddr,

    /// SQLite database file
    pub database_path: String,

    /// Connection pool size
    pub db_max_connections: u32,

    /// HMAC secret for session tokens
    #[serde(skip_serializing)]
    pub session_secret: String,

    /// Session token lifetime in seconds
    pub session_lifetime_secs: i64,

    /// Let invoices drive stock below zero instead of rejecting them
    pub allow_negative_stock: bool,

    /// Admin created on first start when no admin exists
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

/// Credentials for the first admin account.
#[derive(Debug, Clone, Serialize)]
pub struct BootstrapAdmin {
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub email: Option<String>,
}

const DEV_SESSION_SECRET: &str = "backoffice-dev-secret-change-in-production";

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; `load` passes the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bootstrap_admin = match (lookup("ADMIN_USERNAME"), lookup("ADMIN_PASSWORD")) {
            (Some(username), Some(password)) => Some(BootstrapAdmin {
                username,
                password,
                email: lookup("ADMIN_EMAIL"),
            }),
            (Some(_), None) => return Err(ConfigError::MissingRequired("ADMIN_PASSWORD".to_string())),
            (None, Some(_)) => return Err(ConfigError::MissingRequired("ADMIN_USERNAME".to_string())),
            (None, None) => None,
        };

        let config = ServerConfig {
            bind_addr: parse_or(&lookup, "BIND_ADDR", "0.0.0.0:8080")?,

            database_path: lookup("DATABASE_PATH").unwrap_or_else(|| "./backoffice.db".to_string()),

            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", "5")?,

            session_secret: lookup("SESSION_SECRET").unwrap_or_else(|| {
                // Must be set in production
                DEV_SESSION_SECRET.to_string()
            }),

            session_lifetime_secs: parse_or(&lookup, "SESSION_LIFETIME_SECS", "43200")?, // 12 hours

            allow_negative_stock: parse_or(&lookup, "ALLOW_NEGATIVE_STOCK", "false")?,

            bootstrap_admin,
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()));
        }
        if config.session_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("SESSION_LIFETIME_SECS".to_string()));
        }

        Ok(config)
    }

    /// True while the built-in development secret is in use.
    pub fn uses_dev_secret(&self) -> bool {
        self.session_secret == DEV_SESSION_SECRET
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key)
        .unwrap_or_else(|| default.to_string())
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(key.to_string()))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.database_path, "./backoffice.db");
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.session_lifetime_secs, 43200);
        assert!(!config.allow_negative_stock);
        assert!(config.bootstrap_admin.is_none());
        assert!(config.uses_dev_secret());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("ALLOW_NEGATIVE_STOCK", "true"),
            ("SESSION_SECRET", "s3cret"),
            ("ADMIN_USERNAME", "owner"),
            ("ADMIN_PASSWORD", "correct-horse"),
        ])
        .unwrap();

        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:9000");
        assert!(config.allow_negative_stock);
        assert!(!config.uses_dev_secret());
        let admin = config.bootstrap_admin.unwrap();
        assert_eq!(admin.username, "owner");
        assert_eq!(admin.email, None);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            config_from(&[("DB_MAX_CONNECTIONS", "many")]),
            Err(ConfigError::InvalidValue(key)) if key == "DB_MAX_CONNECTIONS"
        ));
        assert!(matches!(
            config_from(&[("SESSION_LIFETIME_SECS", "0")]),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(matches!(
            config_from(&[("ADMIN_USERNAME", "owner")]),
            Err(ConfigError::MissingRequired(key)) if key == "ADMIN_PASSWORD"
        ));
    }
}
