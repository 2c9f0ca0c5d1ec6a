//! Ledger observers - injected sinks for diagnostics the ledger never raises.
//!
//! Storage failures and operations on missing records are contained inside
//! the ledger. They surface here instead, so callers and tests can watch
//! them without capturing global output.

#[cfg(feature = "emitter")]
mod emitter;

use std::fmt;
use std::sync::{Arc, Mutex};

use serde::Serialize;

/// Which step of a persistence round-trip failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageOperation {
    Read,
    Decode,
    Encode,
    Write,
}

impl fmt::Display for StorageOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StorageOperation::Read => "read",
            StorageOperation::Decode => "decode",
            StorageOperation::Encode => "encode",
            StorageOperation::Write => "write",
        };
        f.write_str(name)
    }
}

/// A contained event worth reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// A collection could not be read, decoded, encoded or written.
    StorageFailed {
        key: String,
        operation: StorageOperation,
        message: String,
    },
    /// An id-addressed operation found no record; nothing changed.
    MissingRecord { operation: &'static str, id: String },
}

impl LedgerEvent {
    /// Stable event name, used as the emitter channel.
    pub fn name(&self) -> &'static str {
        match self {
            LedgerEvent::StorageFailed { .. } => "StorageFailed",
            LedgerEvent::MissingRecord { .. } => "MissingRecord",
        }
    }
}

impl fmt::Display for LedgerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerEvent::StorageFailed {
                key,
                operation,
                message,
            } => write!(f, "storage {} failed for {}: {}", operation, key, message),
            LedgerEvent::MissingRecord { operation, id } => {
                write!(f, "{} skipped: no record with id {}", operation, id)
            }
        }
    }
}

/// Receives contained ledger events.
pub trait LedgerObserver: Send + Sync {
    fn observe(&self, event: &LedgerEvent);
}

/// Default observer: forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl LedgerObserver for TracingObserver {
    fn observe(&self, event: &LedgerEvent) {
        match event {
            LedgerEvent::StorageFailed {
                key,
                operation,
                message,
            } => tracing::warn!(%key, %operation, error = %message, "ledger storage failure"),
            LedgerEvent::MissingRecord { operation, id } => {
                tracing::debug!(%operation, %id, "ledger operation on missing record")
            }
        }
    }
}

/// Observer that collects events into a shared buffer.
#[derive(Clone, Default)]
pub struct BufferObserver {
    buffer: Arc<Mutex<Vec<LedgerEvent>>>,
}

impl BufferObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_buffer(buffer: Arc<Mutex<Vec<LedgerEvent>>>) -> Self {
        BufferObserver { buffer }
    }

    /// Snapshot of the events seen so far.
    pub fn events(&self) -> Vec<LedgerEvent> {
        match self.buffer.lock() {
            Ok(buffer) => buffer.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl LedgerObserver for BufferObserver {
    fn observe(&self, event: &LedgerEvent) {
        let mut buffer = match self.buffer.lock() {
            Ok(buffer) => buffer,
            Err(poisoned) => poisoned.into_inner(),
        };
        buffer.push(event.clone());
    }
}

#[cfg(feature = "emitter")]
pub use emitter::EmitterObserver;
