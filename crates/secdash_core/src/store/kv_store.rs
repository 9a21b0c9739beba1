//! Key-value store contract and error type.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store handle shared between services and timer threads.
pub type SharedStore = Arc<dyn KeyValueStore>;

/// Errors raised by key-value store implementations.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    /// Write rejected because it would exceed the configured byte quota.
    QuotaExceeded {
        key: String,
        limit_bytes: usize,
    },
    /// A previous holder of the store lock panicked.
    Poisoned,
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::QuotaExceeded { key, limit_bytes } => write!(
                f,
                "storage quota of {limit_bytes} bytes exceeded while writing `{key}`"
            ),
            Self::Poisoned => write!(f, "store lock poisoned"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::QuotaExceeded { .. } | Self::Poisoned => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Synchronous string-keyed persistence.
///
/// Entries are never deleted; services only read and overwrite keys.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;
    /// Returns all keys in ascending order.
    fn keys(&self) -> StoreResult<Vec<String>>;
}
