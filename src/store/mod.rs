//! Credential and session storage
//!
//! Every auth operation opens its own [`CredentialConnection`] and drops it
//! before returning, so a connection never outlives the call that opened it.
//! Sessions live in a [`SessionStore`] backed by the same database.

mod memory;
mod postgres;

pub use memory::{MemorySessionStore, MemoryStore};
pub use postgres::{PostgresSessionStore, PostgresStore};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::auth::Session;
use crate::config::{DatabaseConfig, StoreBackend};
use crate::error::Result;

/// A stored user: the username is the unique key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub username: String,
    pub password_hash: String,
}

/// Source of short-lived connections to the credential collection
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Open a connection. It is released when the returned box is dropped.
    async fn connect(&self) -> Result<Box<dyn CredentialConnection>>;

    /// Create the backing collection if the backend needs one
    async fn migrate(&self) -> Result<()> {
        Ok(())
    }
}

/// Point operations over one open connection
#[async_trait]
pub trait CredentialConnection: Send + Sync {
    async fn find_user(&self, username: &str) -> Result<Option<UserRecord>>;

    /// Insert a new record. Returns false if the username is already taken.
    async fn insert_user(&self, record: &UserRecord) -> Result<bool>;
}

/// System of record for server-side sessions
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert(&self, session: &Session) -> Result<()>;

    /// Fetch a live session and set its last-accessed time to `now`.
    /// A session expired at `now` is removed and reported as missing.
    async fn touch(&self, id: &str, now: DateTime<Utc>) -> Result<Option<Session>>;

    /// Delete a session, returning whether it existed
    async fn remove(&self, id: &str) -> Result<bool>;

    /// Delete every session expired at `now`, returning how many were dropped
    async fn remove_expired(&self, now: DateTime<Utc>) -> Result<usize>;

    async fn count(&self) -> Result<usize>;

    /// Create the backing collection if the backend needs one
    async fn migrate(&self) -> Result<()> {
        Ok(())
    }
}

/// Build the session store selected by the configuration
pub fn sessions_from_config(config: &DatabaseConfig) -> Arc<dyn SessionStore> {
    match config.backend {
        StoreBackend::Postgres => Arc::new(PostgresSessionStore::new(
            &config.url,
            &config.session_table,
        )),
        StoreBackend::Memory => Arc::new(MemorySessionStore::new()),
    }
}

/// Build the store selected by the configuration
pub fn from_config(config: &DatabaseConfig) -> Arc<dyn CredentialStore> {
    match config.backend {
        StoreBackend::Postgres => Arc::new(PostgresStore::new(&config.url, &config.table)),
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory credential store; users are lost on restart");
            Arc::new(MemoryStore::new())
        }
    }
}
