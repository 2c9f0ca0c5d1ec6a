mod catalog;
mod collection;
mod config;
mod error;
mod forecast;
mod ledger;
mod observer;
mod prediction;
mod store;

pub use catalog::{Catalog, CatalogError, HistoryRowDraft, Product, ProductDraft, SalesEntry};
pub use collection::JsonCollection;
pub use config::{
    LedgerConfig, BACKEND_URL_ENV, DEFAULT_BACKEND_URL, DEFAULT_PREDICTIONS_KEY,
    DEFAULT_PRODUCTS_KEY, MERGE_POLICY_ENV,
};
pub use error::LedgerError;
pub use forecast::{
    default_target_date, error_message, ForecastError, ForecastRequest, ForecastResponse,
    HealthStatus, HistoricalAccuracy, ProductAttributes,
};
pub use ledger::PredictionLedger;
pub use observer::{BufferObserver, LedgerEvent, LedgerObserver, StorageOperation, TracingObserver};
pub use prediction::{
    accuracy, round2, MergePolicy, NewPrediction, PredictionPatch, PredictionRecord,
};
pub use store::{FileKeyValueStore, InMemoryKeyValueStore, KeyValueStore, StoreError};

#[cfg(feature = "emitter")]
pub use observer::EmitterObserver;

#[cfg(feature = "http")]
pub use forecast::HttpForecastClient;

// Re-export the EventEmitter from the event_emitter_rs crate
#[cfg(feature = "emitter")]
pub use event_emitter_rs::EventEmitter;
