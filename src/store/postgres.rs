//! PostgreSQL credential and session stores

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls, Row};

use super::{CredentialConnection, CredentialStore, SessionStore, UserRecord};
use crate::auth::{Session, SessionUser};
use crate::error::Result;

/// A client together with the task driving its socket
struct PgClient {
    client: Client,
    driver: JoinHandle<()>,
}

impl PgClient {
    async fn connect(url: &str) -> Result<Self> {
        let (client, connection) = tokio_postgres::connect(url, NoTls).await?;

        // Spawn the connection handler
        let driver = tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("PostgreSQL connection error: {}", e);
            }
        });

        Ok(Self { client, driver })
    }
}

impl Drop for PgClient {
    fn drop(&mut self) {
        // Dropping the client closes the socket; stop the driver as well
        self.driver.abort();
    }
}

/// Opens a fresh connection per operation
pub struct PostgresStore {
    url: String,
    table: String,
}

impl PostgresStore {
    /// `table` must already be validated as a bare identifier
    pub fn new(url: &str, table: &str) -> Self {
        Self {
            url: url.to_string(),
            table: table.to_string(),
        }
    }

    async fn open(&self) -> Result<PostgresConnection> {
        Ok(PostgresConnection {
            pg: PgClient::connect(&self.url).await?,
            find_sql: format!(
                "SELECT username, password_hash FROM {} WHERE username = $1",
                self.table
            ),
            insert_sql: format!(
                "INSERT INTO {} (username, password_hash) VALUES ($1, $2) \
                 ON CONFLICT (username) DO NOTHING",
                self.table
            ),
        })
    }
}

#[async_trait]
impl CredentialStore for PostgresStore {
    async fn connect(&self) -> Result<Box<dyn CredentialConnection>> {
        Ok(Box::new(self.open().await?))
    }

    async fn migrate(&self) -> Result<()> {
        let pg = PgClient::connect(&self.url).await?;
        let query = format!(
            "CREATE TABLE IF NOT EXISTS {} (\
                username TEXT PRIMARY KEY, \
                password_hash TEXT NOT NULL, \
                created_at TIMESTAMPTZ NOT NULL DEFAULT now())",
            self.table
        );
        pg.client.batch_execute(&query).await?;
        tracing::info!("Ensured credential table: {}", self.table);
        Ok(())
    }
}

struct PostgresConnection {
    pg: PgClient,
    find_sql: String,
    insert_sql: String,
}

#[async_trait]
impl CredentialConnection for PostgresConnection {
    async fn find_user(&self, username: &str) -> Result<Option<UserRecord>> {
        let row = self.pg.client.query_opt(&self.find_sql, &[&username]).await?;
        Ok(row.map(|row| UserRecord {
            username: row.get(0),
            password_hash: row.get(1),
        }))
    }

    async fn insert_user(&self, record: &UserRecord) -> Result<bool> {
        let inserted = self
            .pg
            .client
            .execute(&self.insert_sql, &[&record.username, &record.password_hash])
            .await?;
        Ok(inserted == 1)
    }
}

const SESSION_COLUMNS: &str = "id, username, created_at, last_accessed, expires_at";

/// Sessions in a table, one connection per operation
pub struct PostgresSessionStore {
    url: String,
    table: String,
}

impl PostgresSessionStore {
    /// `table` must already be validated as a bare identifier
    pub fn new(url: &str, table: &str) -> Self {
        Self {
            url: url.to_string(),
            table: table.to_string(),
        }
    }
}

fn session_from_row(row: &Row) -> Session {
    Session {
        id: row.get(0),
        user: SessionUser::new(row.get::<_, String>(1)),
        created_at: row.get(2),
        last_accessed: row.get(3),
        expires_at: row.get(4),
    }
}

#[async_trait]
impl SessionStore for PostgresSessionStore {
    async fn insert(&self, session: &Session) -> Result<()> {
        let pg = PgClient::connect(&self.url).await?;
        let query = format!(
            "INSERT INTO {} ({}) VALUES ($1, $2, $3, $4, $5)",
            self.table, SESSION_COLUMNS
        );
        pg.client
            .execute(
                &query,
                &[
                    &session.id,
                    &session.user.username,
                    &session.created_at,
                    &session.last_accessed,
                    &session.expires_at,
                ],
            )
            .await?;
        Ok(())
    }

    async fn touch(&self, id: &str, now: DateTime<Utc>) -> Result<Option<Session>> {
        let pg = PgClient::connect(&self.url).await?;
        let update = format!(
            "UPDATE {} SET last_accessed = $2 WHERE id = $1 AND expires_at > $2 RETURNING {}",
            self.table, SESSION_COLUMNS
        );
        if let Some(row) = pg.client.query_opt(&update, &[&id, &now]).await? {
            return Ok(Some(session_from_row(&row)));
        }

        let expire = format!(
            "DELETE FROM {} WHERE id = $1 AND expires_at <= $2",
            self.table
        );
        pg.client.execute(&expire, &[&id, &now]).await?;
        Ok(None)
    }

    async fn remove(&self, id: &str) -> Result<bool> {
        let pg = PgClient::connect(&self.url).await?;
        let query = format!("DELETE FROM {} WHERE id = $1", self.table);
        Ok(pg.client.execute(&query, &[&id]).await? == 1)
    }

    async fn remove_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let pg = PgClient::connect(&self.url).await?;
        let query = format!("DELETE FROM {} WHERE expires_at <= $1", self.table);
        Ok(pg.client.execute(&query, &[&now]).await? as usize)
    }

    async fn count(&self) -> Result<usize> {
        let pg = PgClient::connect(&self.url).await?;
        let query = format!("SELECT count(*) FROM {}", self.table);
        let count: i64 = pg.client.query_one(&query, &[]).await?.get(0);
        Ok(count as usize)
    }

    async fn migrate(&self) -> Result<()> {
        let pg = PgClient::connect(&self.url).await?;
        let query = format!(
            "CREATE TABLE IF NOT EXISTS {table} (\
                id TEXT PRIMARY KEY, \
                username TEXT NOT NULL, \
                created_at TIMESTAMPTZ NOT NULL, \
                last_accessed TIMESTAMPTZ NOT NULL, \
                expires_at TIMESTAMPTZ NOT NULL); \
             CREATE INDEX IF NOT EXISTS {table}_expires_at_idx ON {table} (expires_at)",
            table = self.table
        );
        pg.client.batch_execute(&query).await?;
        tracing::info!("Ensured session table: {}", self.table);
        Ok(())
    }
}
