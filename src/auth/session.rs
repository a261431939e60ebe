//! Session management

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::auth::models::SessionUser;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::store::{self, MemorySessionStore, SessionStore};

/// Session information
#[derive(Debug, Clone)]
pub struct Session {
    /// Session ID
    pub id: String,
    /// User this session is authenticated as
    pub user: SessionUser,
    /// When the session was created
    pub created_at: DateTime<Utc>,
    /// When the session was last accessed
    pub last_accessed: DateTime<Utc>,
    /// When the session stops being valid
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Create a new session expiring `ttl` from now
    pub fn new(user: SessionUser, ttl: chrono::Duration) -> Result<Self> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| Error::Session(format!("session lifetime out of range: {}", ttl)))?;

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            user,
            created_at: now,
            last_accessed: now,
            expires_at,
        })
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Creates, resolves and destroys sessions in a [`SessionStore`]
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    ttl: chrono::Duration,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, ttl: chrono::Duration) -> Self {
        Self { store, ttl }
    }

    /// Sessions kept in this process only
    pub fn in_memory(ttl: chrono::Duration) -> Self {
        Self::new(Arc::new(MemorySessionStore::new()), ttl)
    }

    /// Session store and lifetime selected by the configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            store::sessions_from_config(&config.database),
            config.session_ttl()?,
        ))
    }

    /// Create a new session
    pub async fn create_session(&self, user: SessionUser) -> Result<Session> {
        let session = Session::new(user, self.ttl)?;
        self.store.insert(&session).await?;
        Ok(session)
    }

    /// Get a live session by ID, refreshing its last-accessed time
    pub async fn get_session(&self, session_id: &str) -> Result<Option<Session>> {
        self.store.touch(session_id, Utc::now()).await
    }

    /// Delete a session, returning whether it existed
    pub async fn destroy_session(&self, session_id: &str) -> Result<bool> {
        self.store.remove(session_id).await
    }

    /// Cleanup expired sessions, returning how many were dropped
    pub async fn cleanup_expired(&self) -> Result<usize> {
        self.store.remove_expired(Utc::now()).await
    }

    /// Get session count
    pub async fn session_count(&self) -> Result<usize> {
        self.store.count().await
    }

    /// Create the session table if the store needs one
    pub async fn migrate(&self) -> Result<()> {
        self.store.migrate().await
    }

    /// Periodically prune expired sessions
    pub fn spawn_cleanup(&self, every: Duration) -> JoinHandle<()> {
        let manager = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                match manager.cleanup_expired().await {
                    Ok(0) => {}
                    Ok(removed) => tracing::debug!("Pruned {} expired sessions", removed),
                    Err(e) => tracing::warn!("Session cleanup failed: {}", e),
                }
            }
        })
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::in_memory(chrono::Duration::hours(24))
    }
}
