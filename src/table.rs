//! In-memory relational values: rows, tables and the named-table context.

use std::collections::{BTreeMap, HashMap};

use crate::value::Value;

/// A row: column name to value. Keys are unique and kept sorted.
pub type DataRow = BTreeMap<String, Value>;

/// An ordered sequence of rows. Order is observable through
/// `ORDER BY`, `LIMIT` and the final result.
pub type DataTable = Vec<DataRow>;

/// Named tables a query runs against, extended at runtime by `AS`/`SET`.
pub type DataContext = HashMap<String, DataTable>;

/// Canonical text of a row, used as its identity by `DISTINCT` and `EXCEPT`.
///
/// Keys are serialized in sorted order and whole floats are written as
/// integers, so `{a: 1}` and `{a: 1.0}` share a key regardless of how the
/// rows were built.
pub fn canonical_key(row: &DataRow) -> String {
    let normalized: BTreeMap<&str, serde_json::Value> = row
        .iter()
        .map(|(k, v)| (k.as_str(), canonical_value(v)))
        .collect();
    serde_json::to_string(&normalized).unwrap_or_default()
}

fn canonical_value(v: &Value) -> serde_json::Value {
    match v {
        Value::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            serde_json::Value::from(*f as i64)
        }
        Value::Array(items) => serde_json::Value::Array(items.iter().map(canonical_value).collect()),
        Value::Object(fields) => serde_json::Value::Object(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), canonical_value(v)))
                .collect(),
        ),
        other => serde_json::Value::from(other.clone()),
    }
}
