//! CLI command implementations

use anyhow::Result;
use dialoguer::Password;
use std::fs;
use std::path::Path;

use crate::auth::{AuthService, Credentials, SessionManager};
use crate::cli::{error, info, success, warn};
use crate::config::{self, Config, StoreBackend};
use crate::store;

/// Write a default gatehouse.toml configuration file
pub async fn init() -> Result<()> {
    let config_path = Path::new(config::loader::CONFIG_FILENAME);

    if config_path.exists() {
        warn("gatehouse.toml already exists");
        return Ok(());
    }

    fs::write(config_path, config::loader::default_config_content())?;

    success("Created gatehouse.toml");
    info("Set SESSION_SECRET, run 'gatehouse migrate', then 'gatehouse serve'");

    Ok(())
}

/// Start the HTTP server
pub async fn serve(config_path: Option<&Path>, host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut config = config::load_config(config_path)?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    info(&format!(
        "Starting server at http://{}:{}",
        config.server.host, config.server.port
    ));

    crate::api::run_server(config).await?;
    Ok(())
}

/// Create the credential and session tables
pub async fn migrate(config_path: Option<&Path>) -> Result<()> {
    let config = load_valid_config(config_path)?;

    if config.database.backend == StoreBackend::Memory {
        warn("The memory backend has nothing to migrate");
        return Ok(());
    }

    store::from_config(&config.database).migrate().await?;
    success(&format!("Credential table '{}' is ready", config.database.table));

    SessionManager::from_config(&config)?.migrate().await?;
    success(&format!(
        "Session table '{}' is ready",
        config.database.session_table
    ));
    Ok(())
}

/// Register a user, prompting for the password
pub async fn add_user(config_path: Option<&Path>, username: &str) -> Result<()> {
    let config = load_valid_config(config_path)?;

    if config.database.backend == StoreBackend::Memory {
        warn("The memory backend does not persist users; this account will be discarded");
    }

    let password = Password::new()
        .with_prompt(format!("Password for {}", username))
        .with_confirmation("Confirm password", "Passwords do not match")
        .interact()?;

    let credentials = Credentials::new(username, password);
    credentials.validate()?;

    let auth = AuthService::new(store::from_config(&config.database), config.auth.bcrypt_cost);
    if auth
        .register(&credentials.username, &credentials.password)
        .await?
    {
        success(&format!("Registered user: {}", username));
        Ok(())
    } else {
        error(&format!("User '{}' already exists", username));
        anyhow::bail!("username taken")
    }
}

fn load_valid_config(config_path: Option<&Path>) -> Result<Config> {
    let config = config::load_config(config_path)?;
    config.validate()?;
    Ok(config)
}
