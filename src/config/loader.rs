//! Configuration loading and environment variable interpolation

use crate::error::{Error, Result};
use regex::Regex;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use super::Config;

pub const CONFIG_FILENAME: &str = "gatehouse.toml";

/// Load configuration from an explicit path, or gatehouse.toml found upward from cwd
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config_path = match path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };
    load_config_from_path(&config_path)
}

/// Load configuration from a specific path
pub fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path).map_err(|_| Error::ConfigNotFound)?;
    let content = interpolate_env_vars(&content);
    let config: Config = toml::from_str(&content)?;
    tracing::debug!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Find the configuration file, searching upward from current directory
fn find_config_file() -> Result<PathBuf> {
    let mut current = env::current_dir().map_err(|e| Error::Config(e.to_string()))?;

    loop {
        let config_path = current.join(CONFIG_FILENAME);
        if config_path.exists() {
            return Ok(config_path);
        }

        if !current.pop() {
            return Err(Error::ConfigNotFound);
        }
    }
}

/// Interpolate environment variables in the format ${VAR_NAME} or ${VAR_NAME:-default}
fn interpolate_env_vars(content: &str) -> String {
    // This regex is a compile-time constant, panicking is acceptable here
    // as it indicates a programming error in the codebase, not a runtime issue
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}")
        .expect("Invalid regex pattern - this is a bug in the codebase");

    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");

        env::var(var_name).unwrap_or_else(|_| default.to_string())
    })
    .to_string()
}

/// Generate a default configuration file content
pub fn default_config_content() -> &'static str {
    r#"# Gatehouse Configuration

[server]
host = "0.0.0.0"
port = 3000
static_dir = "./public"

[database]
backend = "postgres"  # or "memory" for a throwaway store
url = "${DATABASE_URL:-host=localhost port=5432 user=postgres password=postgres dbname=node_auth}"
table = "users"
session_table = "sessions"

[session]
secret = "${SESSION_SECRET}"
cookie_name = "gatehouse.sid"
ttl_minutes = 1440  # counted from login, at most ten years
secure = "auto"  # "always" behind TLS, "never" for plain http

[auth]
bcrypt_cost = 10
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_env_interpolation() {
        env::set_var("GATEHOUSE_TEST_VAR", "hello");
        let content = "value = \"${GATEHOUSE_TEST_VAR}\"";
        let result = interpolate_env_vars(content);
        assert_eq!(result, "value = \"hello\"");
        env::remove_var("GATEHOUSE_TEST_VAR");
    }

    #[test]
    fn test_env_interpolation_with_default() {
        let content = "value = \"${NONEXISTENT_VAR:-default_value}\"";
        let result = interpolate_env_vars(content);
        assert_eq!(result, "value = \"default_value\"");
    }

    #[test]
    fn test_default_config_parses() {
        env::set_var("GATEHOUSE_DEFAULT_SECRET", "from-env");
        let content = default_config_content()
            .replace("${SESSION_SECRET}", "${GATEHOUSE_DEFAULT_SECRET}");
        let config: Config = toml::from_str(&interpolate_env_vars(&content)).unwrap();
        env::remove_var("GATEHOUSE_DEFAULT_SECRET");

        assert_eq!(config.session.secret, "from-env");
        assert_eq!(config.auth.bcrypt_cost, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_config_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[session]\nsecret = \"abc\"\n[server]\nport = 8080").unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.session.secret, "abc");
    }

    #[test]
    fn test_missing_config_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = load_config(Some(&dir.path().join("missing.toml")));
        assert!(matches!(result, Err(Error::ConfigNotFound)));
    }
}
