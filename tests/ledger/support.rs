use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bikri_ledger::{
    BufferObserver, InMemoryKeyValueStore, KeyValueStore, LedgerConfig, MergePolicy, NewPrediction,
    PredictionLedger, StoreError,
};
use chrono::NaiveDate;

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn forecast(product: &str, day: &str, predicted: f64) -> NewPrediction {
    NewPrediction::new(product, date(day), predicted).unwrap()
}

pub fn ledger(policy: MergePolicy) -> (PredictionLedger<InMemoryKeyValueStore>, BufferObserver) {
    ledger_on(InMemoryKeyValueStore::new(), policy)
}

pub fn ledger_on<S: KeyValueStore>(
    store: S,
    policy: MergePolicy,
) -> (PredictionLedger<S>, BufferObserver) {
    let observer = BufferObserver::new();
    let config = LedgerConfig::default().with_merge_policy(policy);
    let ledger = PredictionLedger::with_config(store, &config, Arc::new(observer.clone()));
    (ledger, observer)
}

/// In-memory store whose writes can be switched off.
#[derive(Clone, Default)]
pub struct FlakyStore {
    inner: InMemoryKeyValueStore,
    fail_writes: Arc<AtomicBool>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn inner(&self) -> &InMemoryKeyValueStore {
        &self.inner
    }
}

impl KeyValueStore for FlakyStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.inner.read(key)
    }

    fn write(&self, key: &str, bytes: Vec<u8>) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Io {
                key: key.to_string(),
                message: "storage quota exceeded".into(),
            });
        }
        self.inner.write(key, bytes)
    }

    fn remove(&self, key: &str) -> Result<bool, StoreError> {
        self.inner.remove(key)
    }
}
