//! Flattened storage row and its column value taxonomy.
//!
//! A row is an ordered column → value map. Ordering is stable so the
//! flattening transform is deterministic and the sink's generated SQL
//! lists columns in a reproducible order.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single column value in a storage row.
///
/// `Null` is an explicit entry: absent upstream fields still claim
/// their column so the sink knows the full column set of the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnValue {
    Text(String),
    Double(f64),
    Timestamp(DateTime<Utc>),
    Null,
}

impl ColumnValue {
    /// SQL type used when the sink has to create this column.
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnValue::Text(_) => "TEXT",
            ColumnValue::Double(_) => "DOUBLE PRECISION",
            ColumnValue::Timestamp(_) => "TIMESTAMPTZ",
            ColumnValue::Null => "TEXT",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ColumnValue::Null)
    }
}

impl From<Option<f64>> for ColumnValue {
    fn from(value: Option<f64>) -> Self {
        match value {
            Some(v) => ColumnValue::Double(v),
            None => ColumnValue::Null,
        }
    }
}

impl From<Option<String>> for ColumnValue {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(v) => ColumnValue::Text(v),
            None => ColumnValue::Null,
        }
    }
}

/// One flattened storage record, destined for a single table append.
///
/// The (coin, timestamp) pair is the natural identity of a reading,
/// but no uniqueness is enforced: redelivered events produce duplicate
/// rows by design.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteRow {
    columns: BTreeMap<String, ColumnValue>,
}

impl QuoteRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, column: impl Into<String>, value: ColumnValue) {
        self.columns.insert(column.into(), value);
    }

    pub fn get(&self, column: &str) -> Option<&ColumnValue> {
        self.columns.get(column)
    }

    /// Column names in stable (sorted) order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnValue)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
