//! Register and login against the credential store

use std::sync::Arc;

use crate::auth::password;
use crate::error::{Error, Result};
use crate::store::{CredentialStore, UserRecord};

/// Username/password operations over a [`CredentialStore`]
///
/// Each call opens its own connection and drops it before returning, on
/// success and on error alike.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(store: Arc<dyn CredentialStore>, bcrypt_cost: u32) -> Self {
        Self { store, bcrypt_cost }
    }

    /// Create a user. Returns false if the username is already taken.
    pub async fn register(&self, username: &str, password: &str) -> Result<bool> {
        let conn = self.store.connect().await?;

        if conn.find_user(username).await?.is_some() {
            tracing::debug!("Registration refused, username taken: {}", username);
            return Ok(false);
        }

        let record = UserRecord {
            username: username.to_string(),
            password_hash: password::hash_password(password, self.bcrypt_cost).await?,
        };

        // A concurrent registration can still win between lookup and insert
        let inserted = conn.insert_user(&record).await?;
        if inserted {
            tracing::info!("Registered user: {}", username);
        } else {
            tracing::debug!("Registration lost race for username: {}", username);
        }
        Ok(inserted)
    }

    /// Check a username/password pair
    pub async fn login(&self, username: &str, password: &str) -> Result<bool> {
        let conn = self.store.connect().await?;

        let Some(user) = conn.find_user(username).await? else {
            tracing::debug!("Login failed, unknown user: {}", username);
            return Ok(false);
        };

        match password::verify_password(password, &user.password_hash).await {
            Ok(matches) => {
                if !matches {
                    tracing::debug!("Login failed, wrong password for: {}", username);
                }
                Ok(matches)
            }
            Err(Error::Hash(e)) => {
                tracing::warn!("Stored hash for {} is unusable: {}", username, e);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}
