//! In-memory credential and session stores

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{CredentialConnection, CredentialStore, SessionStore, UserRecord};
use crate::auth::Session;
use crate::error::Result;

/// Process-local store keyed by username
#[derive(Clone, Default)]
pub struct MemoryStore {
    users: Arc<RwLock<HashMap<String, UserRecord>>>,
    open: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of connections currently held open
    pub fn open_connections(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn connect(&self) -> Result<Box<dyn CredentialConnection>> {
        self.open.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryConnection {
            users: Arc::clone(&self.users),
            open: Arc::clone(&self.open),
        }))
    }
}

struct MemoryConnection {
    users: Arc<RwLock<HashMap<String, UserRecord>>>,
    open: Arc<AtomicUsize>,
}

#[async_trait]
impl CredentialConnection for MemoryConnection {
    async fn find_user(&self, username: &str) -> Result<Option<UserRecord>> {
        Ok(self.users.read().await.get(username).cloned())
    }

    async fn insert_user(&self, record: &UserRecord) -> Result<bool> {
        let mut users = self.users.write().await;
        if users.contains_key(&record.username) {
            return Ok(false);
        }
        users.insert(record.username.clone(), record.clone());
        Ok(true)
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Process-local sessions keyed by id
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn insert(&self, session: &Session) -> Result<()> {
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn touch(&self, id: &str, now: DateTime<Utc>) -> Result<Option<Session>> {
        let mut sessions = self.sessions.write().await;
        let Some(session) = sessions.get_mut(id) else {
            return Ok(None);
        };
        if session.is_expired_at(now) {
            sessions.remove(id);
            return Ok(None);
        }
        session.last_accessed = now;
        Ok(Some(session.clone()))
    }

    async fn remove(&self, id: &str) -> Result<bool> {
        Ok(self.sessions.write().await.remove(id).is_some())
    }

    async fn remove_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired_at(now));
        Ok(before - sessions.len())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.sessions.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SessionUser;

    fn record(username: &str) -> UserRecord {
        UserRecord {
            username: username.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = MemoryStore::new();
        let conn = store.connect().await.unwrap();

        assert!(conn.find_user("alice").await.unwrap().is_none());
        assert!(conn.insert_user(&record("alice")).await.unwrap());
        assert_eq!(conn.find_user("alice").await.unwrap(), Some(record("alice")));
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_rejected() {
        let store = MemoryStore::new();
        let conn = store.connect().await.unwrap();

        assert!(conn.insert_user(&record("alice")).await.unwrap());
        assert!(!conn.insert_user(&record("alice")).await.unwrap());
        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_connections_are_released_on_drop() {
        let store = MemoryStore::new();
        let first = store.connect().await.unwrap();
        let second = store.connect().await.unwrap();
        assert_eq!(store.open_connections(), 2);

        drop(first);
        assert_eq!(store.open_connections(), 1);
        drop(second);
        assert_eq!(store.open_connections(), 0);
    }

    #[tokio::test]
    async fn test_clones_share_records() {
        let store = MemoryStore::new();
        let other = store.clone();

        store.connect().await.unwrap().insert_user(&record("bob")).await.unwrap();
        assert!(other.connect().await.unwrap().find_user("bob").await.unwrap().is_some());
    }

    fn session(username: &str) -> Session {
        Session::new(SessionUser::new(username), chrono::Duration::minutes(30)).unwrap()
    }

    #[tokio::test]
    async fn test_touch_updates_last_accessed() {
        let store = MemorySessionStore::new();
        let session = session("alice");
        store.insert(&session).await.unwrap();

        let later = session.created_at + chrono::Duration::minutes(5);
        let touched = store.touch(&session.id, later).await.unwrap().unwrap();
        assert_eq!(touched.last_accessed, later);
        assert_eq!(touched.expires_at, session.expires_at);
    }

    #[tokio::test]
    async fn test_touch_drops_expired_session() {
        let store = MemorySessionStore::new();
        let session = session("alice");
        store.insert(&session).await.unwrap();

        let after = session.expires_at + chrono::Duration::seconds(1);
        assert!(store.touch(&session.id, after).await.unwrap().is_none());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_remove_expired_keeps_live_sessions() {
        let store = MemorySessionStore::new();
        let live = session("alice");
        let stale = Session::new(SessionUser::new("bob"), chrono::Duration::minutes(1)).unwrap();
        store.insert(&live).await.unwrap();
        store.insert(&stale).await.unwrap();

        let now = stale.expires_at + chrono::Duration::seconds(1);
        assert_eq!(store.remove_expired(now).await.unwrap(), 1);
        assert!(store.touch(&live.id, now).await.unwrap().is_some());
    }
}
