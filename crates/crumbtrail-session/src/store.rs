//! Session store abstraction.
//!
//! The host owns session storage. A [`SessionStore`] is already scoped to
//! one session; keys name attributes inside that session.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;

/// Errors that can occur during session storage operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage path error: {0}")]
    PathError(String),

    #[error("Session backend error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Key-value storage for a single session.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Read an attribute.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Replace an attribute with a new value.
    async fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Remove an attribute. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;
}

/// In-process session, useful for embedding and tests.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    attributes: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored attributes.
    pub fn len(&self) -> usize {
        self.attributes.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.lock().is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.attributes.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.attributes.lock().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.attributes.lock().remove(key);
        Ok(())
    }
}
