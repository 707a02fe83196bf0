//! # crumbtrail-session
//!
//! Session storage for Crumbtrail.
//!
//! This crate provides:
//! - The [`SessionStore`] trait the host implements over its own sessions
//! - The trail codec ([`encode`] / [`decode`]) and its session key
//! - An in-memory store and a SQLite-backed store
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use crumbtrail_session::{SqliteSessionStore, SessionStore, TRAIL_KEY, decode};
//!
//! let db = SqliteSessionStore::new(SqliteSessionStore::default_dir()?)?;
//! let session = db.session("5f2c9b1e");
//! if let Some(raw) = session.get(TRAIL_KEY).await? {
//!     let trail = decode(&raw)?;
//! }
//! ```

pub mod codec;
pub mod sqlite;
pub mod store;

pub use codec::{decode, encode, DecodeError, TRAIL_KEY};
pub use sqlite::{AttributeSummary, SqliteSession, SqliteSessionStore};
pub use store::{MemorySessionStore, SessionStore, StoreError};
