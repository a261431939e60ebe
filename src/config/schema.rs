//! Configuration schema definitions

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Upper bound on `session.ttl_minutes`, ten years
pub const MAX_SESSION_TTL_MINUTES: i64 = 10 * 365 * 24 * 60;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub auth: AuthConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory of static assets served as-is, skipped when missing
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("./public")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

/// Credential store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// libpq-style connection string or postgres:// URL
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Table holding user records
    #[serde(default = "default_table")]
    pub table: String,

    /// Table holding sessions
    #[serde(default = "default_session_table")]
    pub session_table: String,
}

fn default_database_url() -> String {
    "host=localhost port=5432 user=postgres password=postgres dbname=node_auth".to_string()
}

fn default_table() -> String {
    "users".to_string()
}

fn default_session_table() -> String {
    "sessions".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            url: default_database_url(),
            table: default_table(),
            session_table: default_session_table(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Postgres,
    /// Process-local store, lost on restart
    Memory,
}

/// Session cookie and store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Key used to sign session cookies
    #[serde(default)]
    pub secret: String,

    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Lifetime of a session, counted from login
    #[serde(default = "default_ttl_minutes")]
    pub ttl_minutes: i64,

    #[serde(default)]
    pub secure: CookieSecurity,
}

fn default_cookie_name() -> String {
    "gatehouse.sid".to_string()
}

fn default_ttl_minutes() -> i64 {
    24 * 60
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            cookie_name: default_cookie_name(),
            ttl_minutes: default_ttl_minutes(),
            secure: CookieSecurity::default(),
        }
    }
}

/// When to mark the session cookie `Secure`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CookieSecurity {
    /// Only when the request came in over HTTPS
    #[default]
    Auto,
    Always,
    Never,
}

/// Password hashing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

fn default_bcrypt_cost() -> u32 {
    10
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}

impl Config {
    /// Check the settings the server cannot start without
    pub fn validate(&self) -> Result<()> {
        if self.session.secret.trim().is_empty() {
            return Err(Error::Config(
                "session.secret must be set (e.g. secret = \"${SESSION_SECRET}\")".to_string(),
            ));
        }

        if !(4..=31).contains(&self.auth.bcrypt_cost) {
            return Err(Error::Config(format!(
                "auth.bcrypt_cost must be between 4 and 31, got {}",
                self.auth.bcrypt_cost
            )));
        }

        if !(1..=MAX_SESSION_TTL_MINUTES).contains(&self.session.ttl_minutes) {
            return Err(Error::Config(format!(
                "session.ttl_minutes must be between 1 and {}, got {}",
                MAX_SESSION_TTL_MINUTES, self.session.ttl_minutes
            )));
        }

        if self.session.cookie_name.is_empty()
            || !self
                .session
                .cookie_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        {
            return Err(Error::Config(format!(
                "Invalid session.cookie_name: {:?}",
                self.session.cookie_name
            )));
        }

        if self.database.backend == StoreBackend::Postgres {
            if self.database.url.trim().is_empty() {
                return Err(Error::Config("database.url must be set".to_string()));
            }

            // Interpolated into SQL, so restrict to bare identifiers
            for table in [&self.database.table, &self.database.session_table] {
                if !is_identifier(table) {
                    return Err(Error::Config(format!("Invalid table name: {}", table)));
                }
            }
            if self.database.table == self.database.session_table {
                return Err(Error::Config(
                    "database.table and database.session_table must differ".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Session lifetime, counted from creation
    pub fn session_ttl(&self) -> Result<chrono::Duration> {
        chrono::Duration::try_minutes(self.session.ttl_minutes).ok_or_else(|| {
            Error::Config(format!(
                "session.ttl_minutes out of range: {}",
                self.session.ttl_minutes
            ))
        })
    }
}

fn is_identifier(name: &str) -> bool {
    name.chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.session.secret = "s3cret".to_string();
        config
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.backend, StoreBackend::Postgres);
        assert_eq!(config.database.table, "users");
        assert_eq!(config.database.session_table, "sessions");
        assert_eq!(config.auth.bcrypt_cost, 10);
        assert_eq!(config.session.secure, CookieSecurity::Auto);
    }

    #[test]
    fn test_validate_requires_secret() {
        let config = Config::default();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_table_name() {
        let mut config = valid_config();
        config.database.table = "users; DROP TABLE users".to_string();
        assert!(config.validate().is_err());

        config.database.backend = StoreBackend::Memory;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_caps_session_ttl() {
        let mut config = valid_config();
        config.session.ttl_minutes = MAX_SESSION_TTL_MINUTES;
        assert!(config.validate().is_ok());
        assert!(config.session_ttl().is_ok());

        config.session.ttl_minutes = MAX_SESSION_TTL_MINUTES + 1;
        assert!(config.validate().is_err());

        config.session.ttl_minutes = 1_000_000_000_000;
        assert!(config.validate().is_err());

        config.session.ttl_minutes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_session_ttl_out_of_range_is_error() {
        let mut config = valid_config();
        config.session.ttl_minutes = i64::MAX;
        assert!(matches!(config.session_ttl(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_session_table() {
        let mut config = valid_config();
        config.database.session_table = "sessions--".to_string();
        assert!(config.validate().is_err());

        config.database.session_table = "users".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range_cost() {
        let mut config = valid_config();
        config.auth.bcrypt_cost = 3;
        assert!(config.validate().is_err());
        config.auth.bcrypt_cost = 32;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [database]
            backend = "memory"

            [session]
            secret = "abc"
            secure = "never"
            "#,
        )
        .unwrap();

        assert_eq!(config.database.backend, StoreBackend::Memory);
        assert_eq!(config.session.secure, CookieSecurity::Never);
        assert_eq!(config.session.cookie_name, "gatehouse.sid");
        assert_eq!(config.server.host, "0.0.0.0");
    }
}
