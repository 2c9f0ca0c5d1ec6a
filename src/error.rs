use std::fmt;

/// Error type for ledger inputs that fail validation.
///
/// The ledger never fails on storage or on a missing id; the only thing it
/// rejects is a number it cannot score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    Validation { field: &'static str, message: String },
}

impl LedgerError {
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        LedgerError::Validation {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::Validation { field, message } => {
                write!(f, "invalid {}: {}", field, message)
            }
        }
    }
}

impl std::error::Error for LedgerError {}

pub(crate) fn ensure_finite(field: &'static str, value: f64) -> Result<f64, LedgerError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(LedgerError::validation(field, format!("{} is not a finite number", value)))
    }
}

pub(crate) fn ensure_non_negative(field: &'static str, value: f64) -> Result<f64, LedgerError> {
    let value = ensure_finite(field, value)?;
    if value < 0.0 {
        return Err(LedgerError::validation(field, format!("{} is negative", value)));
    }
    Ok(value)
}
