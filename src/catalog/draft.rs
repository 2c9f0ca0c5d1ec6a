use chrono::NaiveDate;
use uuid::Uuid;

use super::{CatalogError, Product, SalesEntry};

/// One history row as typed into a form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryRowDraft {
    pub order_date: String,
    pub sales: String,
}

/// A product as typed into a form: every number is still text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductDraft {
    pub id: Option<String>,
    pub name: String,
    pub category: String,
    pub subcategory: String,
    pub city: String,
    pub region: String,
    pub history: Vec<HistoryRowDraft>,
}

impl ProductDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn subcategory(mut self, subcategory: impl Into<String>) -> Self {
        self.subcategory = subcategory.into();
        self
    }

    pub fn city(mut self, city: impl Into<String>) -> Self {
        self.city = city.into();
        self
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn history_row(mut self, order_date: impl Into<String>, sales: impl Into<String>) -> Self {
        self.history.push(HistoryRowDraft {
            order_date: order_date.into(),
            sales: sales.into(),
        });
        self
    }

    /// Coerce the draft into a stored product.
    ///
    /// Blank sales count as zero. The draft's own id wins over
    /// `existing_id`; with neither, a fresh id is generated.
    pub fn into_product(self, existing_id: Option<String>) -> Result<Product, CatalogError> {
        if self.name.trim().is_empty() {
            return Err(CatalogError::BlankName);
        }

        let history = self
            .history
            .into_iter()
            .enumerate()
            .map(|(row, entry)| parse_row(row, entry))
            .collect::<Result<Vec<_>, _>>()?;

        let id = self
            .id
            .filter(|id| !id.trim().is_empty())
            .or(existing_id)
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string());

        Ok(Product {
            id,
            name: self.name,
            category: self.category,
            subcategory: self.subcategory,
            city: self.city,
            region: self.region,
            history,
        })
    }
}

fn parse_row(row: usize, entry: HistoryRowDraft) -> Result<SalesEntry, CatalogError> {
    let order_date = NaiveDate::parse_from_str(entry.order_date.trim(), "%Y-%m-%d").map_err(|_| {
        CatalogError::InvalidDate {
            row,
            value: entry.order_date.clone(),
        }
    })?;

    let raw = entry.sales.trim();
    let sales = if raw.is_empty() {
        0.0
    } else {
        match raw.parse::<f64>() {
            Ok(value) if value.is_finite() && value >= 0.0 => value,
            _ => {
                return Err(CatalogError::InvalidSales {
                    row,
                    value: entry.sales,
                })
            }
        }
    };

    Ok(SalesEntry {
        order_date: Some(order_date),
        sales,
    })
}
