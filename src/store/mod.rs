//! Durable key-value storage for named blobs.
//!
//! A `KeyValueStore` knows nothing about the data it holds: it reads and
//! writes opaque bytes under string keys. Typed access and failure
//! containment live one level up, in [`JsonCollection`](crate::JsonCollection).
//!
//! ## Example
//!
//! ```ignore
//! use bikri_ledger::{InMemoryKeyValueStore, KeyValueStore};
//!
//! let store = InMemoryKeyValueStore::new();
//! store.write("bikri_predictions_v1", b"[]".to_vec())?;
//! let raw = store.read("bikri_predictions_v1")?;
//! ```

mod file;
mod in_memory;

use std::fmt;

/// Abstract blob storage keyed by string.
///
/// Implementations report every failure through `StoreError` and never
/// panic. A missing key reads as `Ok(None)`.
pub trait KeyValueStore: Send + Sync {
    /// Read the blob stored under `key`.
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Store (or overwrite) the blob under `key`.
    fn write(&self, key: &str, bytes: Vec<u8>) -> Result<(), StoreError>;

    /// Remove the blob under `key`. Returns true if one existed.
    fn remove(&self, key: &str) -> Result<bool, StoreError>;
}

/// Error type for key-value store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The in-process lock guarding the store was poisoned.
    LockPoisoned(&'static str),
    /// The backing medium failed to read or write.
    Io { key: String, message: String },
    /// The key cannot be mapped onto the backing medium.
    InvalidKey(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::LockPoisoned(operation) => {
                write!(f, "store lock poisoned during {}", operation)
            }
            StoreError::Io { key, message } => write!(f, "store i/o error on {}: {}", key, message),
            StoreError::InvalidKey(key) => write!(f, "invalid store key: {:?}", key),
        }
    }
}

impl std::error::Error for StoreError {}

pub use file::FileKeyValueStore;
pub use in_memory::InMemoryKeyValueStore;
