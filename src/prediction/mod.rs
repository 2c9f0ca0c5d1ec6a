//! Prediction records and the validated inputs that create or change them.

mod accuracy;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite, ensure_non_negative, LedgerError};

pub use accuracy::{accuracy, round2};
pub(crate) use accuracy::clamp_score;

/// One forecast for one product and target date, plus its observed outcome.
///
/// Field names on disk match the layout the shop app has always written
/// (`productName`, `prediction_date`, `actual_date`). Fields this crate does
/// not model, such as the app's `productIdx`, are kept in `extra` and written
/// back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub id: String,
    #[serde(rename = "productName")]
    pub product_name: String,
    pub prediction_date: NaiveDate,
    pub predicted: f64,
    #[serde(default)]
    pub actual: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_date: Option<NaiveDate>,
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PredictionRecord {
    /// Whether this record answers to the natural key `(product_name, date)`.
    pub fn matches(&self, product_name: &str, prediction_date: NaiveDate) -> bool {
        self.product_name == product_name && self.prediction_date == prediction_date
    }

    /// Date the actual was recorded for, falling back to the target date.
    pub fn effective_actual_date(&self) -> Option<NaiveDate> {
        self.actual.map(|_| self.actual_date.unwrap_or(self.prediction_date))
    }

    pub(crate) fn set_actual(&mut self, actual: f64, actual_date: Option<NaiveDate>) {
        self.actual = Some(actual);
        self.actual_date = Some(actual_date.unwrap_or(self.prediction_date));
        self.accuracy = Some(accuracy(self.predicted, actual));
    }

    pub(crate) fn clear_actual(&mut self) {
        self.actual = None;
        self.actual_date = None;
        self.accuracy = None;
    }
}

/// What happens to a recorded outcome when the same product and date is
/// forecast again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Keep `actual`, `actual_date` and `accuracy` from the stored record.
    #[default]
    Preserve,
    /// Clear them, so the outcome has to be recorded again.
    Reset,
}

impl std::str::FromStr for MergePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "preserve" => Ok(MergePolicy::Preserve),
            "reset" => Ok(MergePolicy::Reset),
            other => Err(format!("unknown merge policy: {}", other)),
        }
    }
}

/// A forecast ready to enter the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPrediction {
    pub(crate) product_name: String,
    pub(crate) prediction_date: NaiveDate,
    pub(crate) predicted: f64,
    pub(crate) actual: Option<(f64, Option<NaiveDate>)>,
}

impl NewPrediction {
    pub fn new(
        product_name: impl Into<String>,
        prediction_date: NaiveDate,
        predicted: f64,
    ) -> Result<Self, LedgerError> {
        Ok(Self {
            product_name: product_name.into(),
            prediction_date,
            predicted: ensure_finite("predicted", predicted)?,
            actual: None,
        })
    }

    /// Attach an observed outcome. On merge it replaces the stored one.
    pub fn with_actual(
        mut self,
        actual: f64,
        actual_date: Option<NaiveDate>,
    ) -> Result<Self, LedgerError> {
        self.actual = Some((ensure_non_negative("actual", actual)?, actual_date));
        Ok(self)
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn prediction_date(&self) -> NaiveDate {
        self.prediction_date
    }

    pub fn predicted(&self) -> f64 {
        self.predicted
    }

    pub(crate) fn into_record(self, id: String) -> PredictionRecord {
        let mut record = PredictionRecord {
            id,
            product_name: self.product_name,
            prediction_date: self.prediction_date,
            predicted: self.predicted,
            actual: None,
            actual_date: None,
            accuracy: None,
            extra: serde_json::Map::new(),
        };
        if let Some((actual, actual_date)) = self.actual {
            record.set_actual(actual, actual_date);
        }
        record
    }

    /// Fold this forecast into the record already holding its natural key.
    pub(crate) fn merge_into(
        self,
        existing: PredictionRecord,
        policy: MergePolicy,
    ) -> PredictionRecord {
        let mut merged = PredictionRecord {
            predicted: self.predicted,
            prediction_date: self.prediction_date,
            ..existing
        };
        if policy == MergePolicy::Reset {
            merged.clear_actual();
        }
        if let Some((actual, actual_date)) = self.actual {
            merged.set_actual(actual, actual_date);
        }
        merged
    }
}

/// Field changes for `PredictionLedger::update`.
///
/// `actual` and `accuracy` are absent: outcomes go through `record_actual`,
/// and accuracy is always derived. `actual_date` only applies to a record
/// that already has an actual.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictionPatch {
    product_name: Option<String>,
    prediction_date: Option<NaiveDate>,
    predicted: Option<f64>,
    actual_date: Option<NaiveDate>,
}

impl PredictionPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn product_name(mut self, product_name: impl Into<String>) -> Self {
        self.product_name = Some(product_name.into());
        self
    }

    pub fn prediction_date(mut self, prediction_date: NaiveDate) -> Self {
        self.prediction_date = Some(prediction_date);
        self
    }

    pub fn predicted(mut self, predicted: f64) -> Result<Self, LedgerError> {
        self.predicted = Some(ensure_finite("predicted", predicted)?);
        Ok(self)
    }

    pub fn actual_date(mut self, actual_date: NaiveDate) -> Self {
        self.actual_date = Some(actual_date);
        self
    }

    pub(crate) fn apply(self, record: &mut PredictionRecord) {
        if let Some(product_name) = self.product_name {
            record.product_name = product_name;
        }
        if let Some(prediction_date) = self.prediction_date {
            record.prediction_date = prediction_date;
        }
        if let Some(actual_date) = self.actual_date.filter(|_| record.actual.is_some()) {
            record.actual_date = Some(actual_date);
        }
        if let Some(predicted) = self.predicted {
            record.predicted = predicted;
            if let Some(actual) = record.actual {
                record.accuracy = Some(accuracy(predicted, actual));
            }
        }
    }
}
