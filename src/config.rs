//! Ledger settings.

use serde::Deserialize;

use crate::prediction::MergePolicy;

pub const DEFAULT_PRODUCTS_KEY: &str = "bikri_products_v1";
pub const DEFAULT_PREDICTIONS_KEY: &str = "bikri_predictions_v1";
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";

pub const BACKEND_URL_ENV: &str = "BIKRI_BACKEND_URL";
pub const MERGE_POLICY_ENV: &str = "BIKRI_MERGE_POLICY";

/// Storage keys, merge policy and forecast service location.
///
/// Deserializes from a partial JSON object; missing fields take defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub products_key: String,
    pub predictions_key: String,
    pub merge_policy: MergePolicy,
    pub backend_url: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            products_key: DEFAULT_PRODUCTS_KEY.to_string(),
            predictions_key: DEFAULT_PREDICTIONS_KEY.to_string(),
            merge_policy: MergePolicy::default(),
            backend_url: DEFAULT_BACKEND_URL.to_string(),
        }
    }
}

impl LedgerConfig {
    /// Defaults, overridden by `BIKRI_BACKEND_URL` and `BIKRI_MERGE_POLICY`.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|name| std::env::var(name).ok())
    }

    /// Parse a JSON settings blob.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn with_merge_policy(mut self, merge_policy: MergePolicy) -> Self {
        self.merge_policy = merge_policy;
        self
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(BACKEND_URL_ENV).filter(|u| !u.trim().is_empty()) {
            self.backend_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(raw) = lookup(MERGE_POLICY_ENV) {
            match raw.parse() {
                Ok(policy) => self.merge_policy = policy,
                Err(err) => tracing::warn!(error = %err, "ignoring {}", MERGE_POLICY_ENV),
            }
        }
        self
    }
}
