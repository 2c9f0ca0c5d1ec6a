//! Product catalog - the shop's products and their sales history.
//!
//! Products are stored as one JSON array, newest first. Names are unique
//! after trimming and ignoring case. Raw form input arrives as a
//! [`ProductDraft`] and is coerced to typed values here, before anything is
//! stored.

mod draft;

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::collection::JsonCollection;
use crate::config::LedgerConfig;
use crate::observer::{LedgerObserver, TracingObserver};
use crate::store::KeyValueStore;

pub use draft::{HistoryRowDraft, ProductDraft};

/// One sales observation.
///
/// The shop app saves a history row whose date was never filled in as
/// `"Orderdate": ""`, and an unparseable amount as `"Sales": null`. Such rows
/// load with no date and zero sales, and are left out of forecast requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesEntry {
    #[serde(rename = "Orderdate", default, with = "blank_date")]
    pub order_date: Option<NaiveDate>,
    #[serde(rename = "Sales", default, deserialize_with = "null_as_zero")]
    pub sales: f64,
}

mod blank_date {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        date: &Option<NaiveDate>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => serializer.collect_str(date),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(text) => NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .map(Some)
                .map_err(de::Error::custom),
        }
    }
}

fn null_as_zero<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub subcategory: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub history: Vec<SalesEntry>,
}

impl Product {
    /// Name used for ledger records: the product name, or its category and
    /// subcategory when the name is blank.
    pub fn display_name(&self) -> String {
        let name = self.name.trim();
        if !name.is_empty() {
            return name.to_string();
        }
        format!("{} {}", self.category, self.subcategory)
            .trim()
            .to_string()
    }

    /// Whether `other` collides with this product's name.
    pub fn same_name(&self, other: &str) -> bool {
        normalize_name(&self.name) == normalize_name(other)
    }
}

pub(crate) fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Error type for catalog edits.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogError {
    BlankName,
    DuplicateName { name: String },
    IndexOutOfRange { index: usize, len: usize },
    InvalidSales { row: usize, value: String },
    InvalidDate { row: usize, value: String },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::BlankName => write!(f, "product name is required"),
            CatalogError::DuplicateName { name } => {
                write!(f, "a product named {:?} already exists", name)
            }
            CatalogError::IndexOutOfRange { index, len } => {
                write!(f, "no product at index {} (catalog has {})", index, len)
            }
            CatalogError::InvalidSales { row, value } => {
                write!(f, "history row {}: {:?} is not a non-negative number", row, value)
            }
            CatalogError::InvalidDate { row, value } => {
                write!(f, "history row {}: {:?} is not a YYYY-MM-DD date", row, value)
            }
        }
    }
}

impl std::error::Error for CatalogError {}

pub struct Catalog<S> {
    products: JsonCollection<S, Product>,
    write_lock: Mutex<()>,
}

impl<S: KeyValueStore> Catalog<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, &LedgerConfig::default(), Arc::new(TracingObserver))
    }

    pub fn with_config(store: S, config: &LedgerConfig, observer: Arc<dyn LedgerObserver>) -> Self {
        Self {
            products: JsonCollection::new(store, config.products_key.clone(), observer),
            write_lock: Mutex::new(()),
        }
    }

    pub fn list(&self) -> Vec<Product> {
        self.products.load()
    }

    pub fn get(&self, index: usize) -> Option<Product> {
        self.list().into_iter().nth(index)
    }

    /// Add a product (`editing = None`, inserted first) or replace the one
    /// at `editing`. The name must be unique among all other products.
    pub fn save(
        &self,
        draft: ProductDraft,
        editing: Option<usize>,
    ) -> Result<Vec<Product>, CatalogError> {
        let _guard = self.lock();
        let mut list = self.products.load();

        let existing_id = match editing {
            Some(index) if index >= list.len() => {
                return Err(CatalogError::IndexOutOfRange {
                    index,
                    len: list.len(),
                })
            }
            Some(index) => Some(list[index].id.clone()),
            None => None,
        };

        let product = draft.into_product(existing_id)?;
        let clash = list
            .iter()
            .enumerate()
            .any(|(i, p)| Some(i) != editing && p.same_name(&product.name));
        if clash {
            return Err(CatalogError::DuplicateName {
                name: product.name.trim().to_string(),
            });
        }

        match editing {
            Some(index) => {
                tracing::debug!(id = %product.id, index, "product replaced");
                list[index] = product;
            }
            None => {
                tracing::debug!(id = %product.id, "product added");
                list.insert(0, product);
            }
        }
        self.products.save(&list);
        Ok(list)
    }

    /// Remove the product at `index`; out of range leaves the list as is.
    pub fn delete(&self, index: usize) -> Vec<Product> {
        let _guard = self.lock();
        let mut list = self.products.load();
        if index < list.len() {
            let removed = list.remove(index);
            tracing::debug!(id = %removed.id, index, "product deleted");
            self.products.save(&list);
        }
        list
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        match self.write_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
