//! PredictionLedger - the persisted, most-recently-upserted-first list of forecasts.
//!
//! Every mutation reads the full list, computes the new one and writes it
//! back whole. The computed list is returned even when the write fails; the
//! failure goes to the observer.
//!
//! ## Example
//!
//! ```ignore
//! use bikri_ledger::{InMemoryKeyValueStore, NewPrediction, PredictionLedger};
//!
//! let ledger = PredictionLedger::new(InMemoryKeyValueStore::new());
//! let list = ledger.upsert(NewPrediction::new("Rice", date, 1000.0)?);
//! let list = ledger.record_actual(&list[0].id, 900.0, None)?;
//! assert_eq!(list[0].accuracy, Some(88.89));
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDate;
use uuid::Uuid;

use crate::collection::JsonCollection;
use crate::config::LedgerConfig;
use crate::error::{ensure_non_negative, LedgerError};
use crate::observer::{LedgerEvent, LedgerObserver, TracingObserver};
use crate::prediction::{MergePolicy, NewPrediction, PredictionPatch, PredictionRecord};
use crate::store::KeyValueStore;

pub struct PredictionLedger<S> {
    predictions: JsonCollection<S, PredictionRecord>,
    merge_policy: MergePolicy,
    write_lock: Mutex<()>,
}

impl<S: KeyValueStore> PredictionLedger<S> {
    /// Ledger with default keys, the `Preserve` merge policy and `tracing` output.
    pub fn new(store: S) -> Self {
        Self::with_config(store, &LedgerConfig::default(), Arc::new(TracingObserver))
    }

    pub fn with_config(
        store: S,
        config: &LedgerConfig,
        observer: Arc<dyn LedgerObserver>,
    ) -> Self {
        Self {
            predictions: JsonCollection::new(store, config.predictions_key.clone(), observer),
            merge_policy: config.merge_policy,
            write_lock: Mutex::new(()),
        }
    }

    pub fn merge_policy(&self) -> MergePolicy {
        self.merge_policy
    }

    /// All records, most recently upserted first.
    pub fn list(&self) -> Vec<PredictionRecord> {
        self.predictions.load()
    }

    pub fn get(&self, id: &str) -> Option<PredictionRecord> {
        self.list().into_iter().find(|r| r.id == id)
    }

    /// The record holding the natural key `(product_name, prediction_date)`.
    pub fn find(&self, product_name: &str, prediction_date: NaiveDate) -> Option<PredictionRecord> {
        self.list()
            .into_iter()
            .find(|r| r.matches(product_name, prediction_date))
    }

    /// Insert a new record at the front without checking its natural key.
    pub fn add(&self, prediction: NewPrediction) -> Vec<PredictionRecord> {
        self.mutate("add", |list| {
            let record = prediction.into_record(new_id());
            tracing::debug!(id = %record.id, product = %record.product_name, "prediction added");
            list.insert(0, record);
            true
        })
    }

    /// Insert or merge by `(product_name, prediction_date)`, then move the
    /// record to the front.
    pub fn upsert(&self, prediction: NewPrediction) -> Vec<PredictionRecord> {
        let policy = self.merge_policy;
        self.mutate("upsert", |list| {
            let existing = list
                .iter()
                .position(|r| r.matches(&prediction.product_name, prediction.prediction_date));

            let record = match existing {
                Some(index) => {
                    let current = list.remove(index);
                    tracing::debug!(id = %current.id, from = index, ?policy, "prediction merged");
                    prediction.merge_into(current, policy)
                }
                None => {
                    let record = prediction.into_record(new_id());
                    tracing::debug!(id = %record.id, "prediction created");
                    record
                }
            };
            list.insert(0, record);
            true
        })
    }

    /// Record the observed outcome for `id` and score it.
    ///
    /// A negative or non-finite `actual` is rejected before anything is
    /// read or written. A missing `id` returns the list unchanged.
    pub fn record_actual(
        &self,
        id: &str,
        actual: f64,
        actual_date: Option<NaiveDate>,
    ) -> Result<Vec<PredictionRecord>, LedgerError> {
        let actual = ensure_non_negative("actual", actual)?;
        Ok(self.mutate_by_id("record_actual", id, |record| {
            record.set_actual(actual, actual_date);
        }))
    }

    /// Apply `patch` to the record with `id`, in place.
    pub fn update(&self, id: &str, patch: PredictionPatch) -> Vec<PredictionRecord> {
        self.mutate_by_id("update", id, |record| patch.apply(record))
    }

    /// Remove the record with `id`, if any.
    pub fn delete(&self, id: &str) -> Vec<PredictionRecord> {
        self.mutate("delete", |list| {
            let before = list.len();
            list.retain(|r| r.id != id);
            if list.len() == before {
                self.missing("delete", id);
                return false;
            }
            true
        })
    }

    fn mutate_by_id(
        &self,
        operation: &'static str,
        id: &str,
        change: impl FnOnce(&mut PredictionRecord),
    ) -> Vec<PredictionRecord> {
        self.mutate(operation, |list| match list.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                change(record);
                true
            }
            None => {
                self.missing(operation, id);
                false
            }
        })
    }

    /// Read-modify-write under the ledger lock. `change` returns whether the
    /// list changed and needs saving.
    fn mutate(
        &self,
        operation: &'static str,
        change: impl FnOnce(&mut Vec<PredictionRecord>) -> bool,
    ) -> Vec<PredictionRecord> {
        let _guard = self.lock();
        let mut list = self.predictions.load();
        if change(&mut list) {
            let saved = self.predictions.save(&list);
            tracing::debug!(operation, len = list.len(), saved, "predictions written");
        }
        list
    }

    fn missing(&self, operation: &'static str, id: &str) {
        self.predictions.observer().observe(&LedgerEvent::MissingRecord {
            operation,
            id: id.to_string(),
        });
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        match self.write_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}
