//! Durable key-value storage seam.
//!
//! # Responsibility
//! - Define the opaque get/set-by-key byte store the place store sits on.
//! - Provide a SQLite-backed implementation for devices and an in-memory
//!   one for tests and ephemeral sessions.
//!
//! # Invariants
//! - Reading a missing key yields `Ok(None)`, never an error.
//! - `set` replaces the whole value for the key.
//! - Implementations use interior mutability so one handle can be shared.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

pub type StorageResult<T> = Result<T, StorageError>;

/// Failure reported by a storage backend.
#[derive(Debug)]
pub enum StorageError {
    /// SQLite transport or bootstrap failure.
    Db(DbError),
    /// Backend refused the operation (full, read-only, injected fault).
    Unavailable(String),
    /// A previous holder panicked while owning the backend lock.
    LockPoisoned(&'static str),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Unavailable(message) => write!(f, "storage unavailable: {message}"),
            Self::LockPoisoned(what) => write!(f, "storage lock poisoned: {what}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Unavailable(_) | Self::LockPoisoned(_) => None,
        }
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Opaque byte store addressed by string keys.
pub trait KeyValueStorage {
    /// Returns the stored bytes, or `None` when the key was never written.
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;
    /// Replaces the value stored under `key`.
    fn set(&self, key: &str, value: &[u8]) -> StorageResult<()>;
    /// Deletes `key`. Removing a missing key succeeds.
    fn remove(&self, key: &str) -> StorageResult<()>;
}

impl<S: KeyValueStorage + ?Sized> KeyValueStorage for std::sync::Arc<S> {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        (**self).remove(key)
    }
}
