use bikri_ledger::{
    FileKeyValueStore, InMemoryKeyValueStore, JsonCollection, KeyValueStore, LedgerEvent,
    MergePolicy, PredictionLedger, PredictionRecord, StorageOperation, TracingObserver,
    DEFAULT_PREDICTIONS_KEY,
};
use std::sync::Arc;

use crate::support::{date, forecast, ledger_on, FlakyStore};

fn populate<S: KeyValueStore>(ledger: &PredictionLedger<S>) -> Vec<PredictionRecord> {
    ledger.upsert(forecast("Rice", "2024-05-01", 1000.0));
    ledger.upsert(forecast("Dal", "2024-05-01", 250.5));
    let list = ledger.upsert(forecast("Sugar", "2024-06-01", 80.0));
    ledger
        .record_actual(&list[2].id, 900.0, Some(date("2024-05-03")))
        .unwrap()
}

#[test]
fn save_then_load_round_trips_with_order() {
    let store = InMemoryKeyValueStore::new();
    let collection: JsonCollection<_, PredictionRecord> =
        JsonCollection::new(store.clone(), DEFAULT_PREDICTIONS_KEY, Arc::new(TracingObserver));

    let (ledger, _) = ledger_on(InMemoryKeyValueStore::new(), MergePolicy::Preserve);
    let list = populate(&ledger);

    assert!(collection.save(&list));
    assert_eq!(collection.load(), list);
}

#[test]
fn second_ledger_on_same_store_sees_same_list() {
    let store = InMemoryKeyValueStore::new();
    let (first, _) = ledger_on(store.clone(), MergePolicy::Preserve);
    let list = populate(&first);

    let (second, _) = ledger_on(store, MergePolicy::Preserve);
    assert_eq!(second.list(), list);
}

#[test]
fn file_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let (ledger, observer) = ledger_on(FileKeyValueStore::new(dir.path()), MergePolicy::Preserve);
    let list = populate(&ledger);
    assert!(observer.events().is_empty());

    let (reopened, _) = ledger_on(FileKeyValueStore::new(dir.path()), MergePolicy::Preserve);
    assert_eq!(reopened.list(), list);
    assert_eq!(reopened.list()[2].accuracy, Some(88.89));
    assert!(dir.path().join("bikri_predictions_v1.json").exists());
}

#[test]
fn reads_history_written_by_the_shop_app() {
    let store = InMemoryKeyValueStore::new();
    let raw = r#"[
        {"id":"m1a","productName":"Dal","productIdx":"1","prediction_date":"2024-05-01",
         "predicted":250,"actual":200,"actual_date":"2024-05-01","accuracy":75},
        {"id":"m0z","productName":"Rice","productIdx":"0","prediction_date":"2024-05-01",
         "predicted":1000,"actual":null,"accuracy":null}
    ]"#;
    store
        .write(DEFAULT_PREDICTIONS_KEY, raw.as_bytes().to_vec())
        .unwrap();

    let (ledger, _) = ledger_on(store, MergePolicy::Preserve);
    let list = ledger.upsert(forecast("Rice", "2024-05-01", 1100.0));
    assert_eq!(list.len(), 2);
    assert_eq!(list[0].id, "m0z");
    assert_eq!(list[0].predicted, 1100.0);
    assert_eq!(list[1].accuracy, Some(75.0));

    // the app's extra fields are written back untouched
    let reloaded = ledger.list();
    assert_eq!(reloaded[0].extra["productIdx"], "0");
    assert_eq!(reloaded[1].extra["productIdx"], "1");
}

#[test]
fn corrupt_blob_reads_as_empty() {
    let store = InMemoryKeyValueStore::new();
    store
        .write(DEFAULT_PREDICTIONS_KEY, b"<html>not json</html>".to_vec())
        .unwrap();
    let (ledger, observer) = ledger_on(store, MergePolicy::Preserve);

    assert!(ledger.list().is_empty());
    assert!(observer.events().iter().any(|e| matches!(
        e,
        LedgerEvent::StorageFailed { operation: StorageOperation::Decode, .. }
    )));

    // the next mutation starts from the empty view and overwrites the blob
    let list = ledger.upsert(forecast("Rice", "2024-05-01", 1.0));
    assert_eq!(ledger.list(), list);
}

#[test]
fn failed_write_still_returns_computed_list() {
    let store = FlakyStore::new();
    let (ledger, observer) = ledger_on(store.clone(), MergePolicy::Preserve);
    ledger.upsert(forecast("Rice", "2024-05-01", 1.0));

    store.fail_writes(true);
    let list = ledger.upsert(forecast("Dal", "2024-05-01", 2.0));
    assert_eq!(list.len(), 2);
    assert_eq!(list[0].product_name, "Dal");

    // not durable: the store still holds the previous snapshot
    assert_eq!(ledger.list().len(), 1);
    assert!(store.inner().read(DEFAULT_PREDICTIONS_KEY).unwrap().is_some());

    let failures: Vec<_> = observer
        .events()
        .into_iter()
        .filter_map(|e| match e {
            LedgerEvent::StorageFailed { key, operation, .. } => Some((key, operation)),
            _ => None,
        })
        .collect();
    assert_eq!(
        failures,
        vec![(DEFAULT_PREDICTIONS_KEY.to_string(), StorageOperation::Write)]
    );

    store.fail_writes(false);
    let list = ledger.upsert(forecast("Dal", "2024-05-01", 2.0));
    assert_eq!(ledger.list(), list);
}
