//! SQLite-backed session attributes.
//!
//! One database holds attributes for every session. [`SqliteSessionStore`]
//! owns the connection and hands out [`SqliteSession`] handles scoped to a
//! single session id.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use crate::store::{Result, SessionStore, StoreError};

/// A session that holds a given attribute, for listings.
#[derive(Debug, Clone)]
pub struct AttributeSummary {
    pub sid: String,
    pub updated_at: DateTime<Utc>,
    pub byte_length: usize,
}

/// SQLite database of session attributes.
#[derive(Clone)]
pub struct SqliteSessionStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSessionStore {
    /// Open (or create) `sessions.db` under `base_dir` and run migrations.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;

        let conn = Connection::open(base_dir.join("sessions.db"))?;

        // Enable WAL mode for better concurrency
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        Self::from_connection(conn)
    }

    /// A private in-memory database.
    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Where the database lives unless told otherwise.
    pub fn default_dir() -> Result<PathBuf> {
        Ok(dirs::data_local_dir()
            .ok_or_else(|| StoreError::PathError("Could not find data directory".into()))?
            .join("crumbtrail"))
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn.lock();

        // Missing table means a fresh database.
        let current_version: i32 = conn
            .query_row(
                "SELECT COALESCE(MAX(version), 0) FROM schema_version",
                [],
                |row| row.get(0),
            )
            .unwrap_or(0);

        if current_version < 1 {
            let migration = include_str!("../migrations/001_initial.sql");
            conn.execute_batch(migration)?;
            tracing::debug!("Applied session schema version 1");
        }

        Ok(())
    }

    /// Handle scoped to one session.
    pub fn session(&self, sid: impl Into<String>) -> SqliteSession {
        SqliteSession {
            conn: Arc::clone(&self.conn),
            sid: sid.into(),
        }
    }

    /// Sessions holding `key`, most recently updated first.
    pub fn sessions_with(&self, key: &str) -> Result<Vec<AttributeSummary>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT sid, updated_at, length(value) FROM session_attribute
             WHERE name = ?1 ORDER BY updated_at DESC, sid",
        )?;

        let rows = stmt.query_map(params![key], |row| {
            let updated_at: String = row.get(1)?;
            let byte_length: i64 = row.get(2)?;
            Ok(AttributeSummary {
                sid: row.get(0)?,
                updated_at: parse_datetime(&updated_at),
                byte_length: byte_length.max(0) as usize,
            })
        })?;

        let mut summaries = Vec::new();
        for row in rows {
            summaries.push(row?);
        }
        Ok(summaries)
    }
}

/// [`SessionStore`] view of one session in a [`SqliteSessionStore`].
#[derive(Clone)]
pub struct SqliteSession {
    conn: Arc<Mutex<Connection>>,
    sid: String,
}

impl SqliteSession {
    pub fn sid(&self) -> &str {
        &self.sid
    }
}

#[async_trait]
impl SessionStore for SqliteSession {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let conn = self.conn.lock();
        let value = conn
            .query_row(
                "SELECT value FROM session_attribute WHERE sid = ?1 AND name = ?2",
                params![self.sid, key],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            r#"
            INSERT INTO session_attribute (sid, name, value, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(sid, name) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![self.sid, key, value, format_datetime(&Utc::now())],
        )?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "DELETE FROM session_attribute WHERE sid = ?1 AND name = ?2",
            params![self.sid, key],
        )?;
        Ok(())
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (SqliteSessionStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteSessionStore::new(temp_dir.path()).unwrap();
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_set_and_get_attribute() {
        let (store, _tmp) = create_test_store();
        let session = store.session("abc");
        assert_eq!(session.sid(), "abc");

        assert!(session.get("breadcrumbs_list").await.unwrap().is_none());
        session.set("breadcrumbs_list", b"[]").await.unwrap();
        session.set("breadcrumbs_list", br#"["wiki/A"]"#).await.unwrap();

        let value = session.get("breadcrumbs_list").await.unwrap();
        assert_eq!(value.as_deref(), Some(&br#"["wiki/A"]"#[..]));
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = SqliteSessionStore::in_memory().unwrap();
        let first = store.session("one");
        let second = store.session("two");

        first.set("k", b"1").await.unwrap();
        assert!(second.get("k").await.unwrap().is_none());

        second.delete("k").await.unwrap();
        assert!(first.get("k").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_sessions_with_key() {
        let store = SqliteSessionStore::in_memory().unwrap();
        store.session("one").set("breadcrumbs_list", b"[]").await.unwrap();
        store.session("two").set("other", b"x").await.unwrap();

        let listed = store.sessions_with("breadcrumbs_list").unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].sid, "one");
        assert_eq!(listed[0].byte_length, 2);
    }

    #[tokio::test]
    async fn test_reopen_keeps_data() {
        let temp_dir = TempDir::new().unwrap();
        {
            let store = SqliteSessionStore::new(temp_dir.path()).unwrap();
            store.session("abc").set("k", b"v").await.unwrap();
        }
        let store = SqliteSessionStore::new(temp_dir.path()).unwrap();
        assert_eq!(
            store.session("abc").get("k").await.unwrap().as_deref(),
            Some(&b"v"[..])
        );
    }
}
