//! JsonCollection - typed list view over one key of a `KeyValueStore`.
//!
//! This is the containment boundary for persistence failures: a missing,
//! unreadable or undecodable blob loads as an empty list, and a failed save
//! is reported to the observer and otherwise ignored.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};

use crate::observer::{LedgerEvent, LedgerObserver, StorageOperation};
use crate::store::KeyValueStore;

pub struct JsonCollection<S, T> {
    store: S,
    key: String,
    observer: Arc<dyn LedgerObserver>,
    _marker: PhantomData<fn() -> T>,
}

impl<S: KeyValueStore, T: Serialize + DeserializeOwned> JsonCollection<S, T> {
    pub fn new(store: S, key: impl Into<String>, observer: Arc<dyn LedgerObserver>) -> Self {
        Self {
            store,
            key: key.into(),
            observer,
            _marker: PhantomData,
        }
    }

    /// Load the whole list. Never fails; see module docs.
    pub fn load(&self) -> Vec<T> {
        let bytes = match self.store.read(&self.key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Vec::new(),
            Err(err) => {
                self.report(StorageOperation::Read, err.to_string());
                return Vec::new();
            }
        };

        match serde_json::from_slice::<Vec<T>>(&bytes) {
            Ok(items) => items,
            Err(err) => {
                self.report(StorageOperation::Decode, err.to_string());
                Vec::new()
            }
        }
    }

    /// Replace the whole list. Returns whether the write reached the store.
    pub fn save(&self, items: &[T]) -> bool {
        let bytes = match serde_json::to_vec(items) {
            Ok(bytes) => bytes,
            Err(err) => {
                self.report(StorageOperation::Encode, err.to_string());
                return false;
            }
        };

        match self.store.write(&self.key, bytes) {
            Ok(()) => true,
            Err(err) => {
                self.report(StorageOperation::Write, err.to_string());
                false
            }
        }
    }

    pub(crate) fn observer(&self) -> &dyn LedgerObserver {
        self.observer.as_ref()
    }

    fn report(&self, operation: StorageOperation, message: String) {
        self.observer.observe(&LedgerEvent::StorageFailed {
            key: self.key.clone(),
            operation,
            message,
        });
    }
}
