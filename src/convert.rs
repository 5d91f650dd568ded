//! JSON <-> pipeql value conversion utilities

use crate::{
    table::{DataContext, DataRow, DataTable},
    value::Value,
};

/// Errors raised when JSON input does not have the shape of a data context.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DataError {
    #[error("Data must be a JSON object mapping table names to arrays of rows")]
    NotAnObject,

    #[error("Table '{0}' must be an array of row objects")]
    NotATable(String),

    #[error("Row {index} of table '{table}' is not an object")]
    NotARow { table: String, index: usize },
}

/// Convert serde_json::Value to a pipeql Value
pub fn json_to_value(v: serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
        },
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(arr) => Value::Array(arr.into_iter().map(json_to_value).collect()),
        serde_json::Value::Object(obj) => Value::Object(
            obj.into_iter()
                .map(|(k, v)| (k, json_to_value(v)))
                .collect(),
        ),
    }
}

/// Convert a pipeql Value to serde_json::Value
///
/// Non-finite floats have no JSON form and become `null`.
pub fn value_to_json(v: Value) -> serde_json::Value {
    match v {
        Value::Null => serde_json::Value::Null,
        Value::Boolean(b) => serde_json::Value::Bool(b),
        Value::Integer(i) => serde_json::Value::Number(i.into()),
        Value::Float(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::String(s) => serde_json::Value::String(s),
        Value::Array(arr) => serde_json::Value::Array(arr.into_iter().map(value_to_json).collect()),
        Value::Object(obj) => serde_json::Value::Object(
            obj.into_iter()
                .map(|(k, v)| (k, value_to_json(v)))
                .collect(),
        ),
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        json_to_value(v)
    }
}

impl From<Value> for serde_json::Value {
    fn from(v: Value) -> Self {
        value_to_json(v)
    }
}

/// Build a data context from a JSON object of `{ "table": [ {row}, ... ] }`.
pub fn context_from_json(v: serde_json::Value) -> Result<DataContext, DataError> {
    let serde_json::Value::Object(tables) = v else {
        return Err(DataError::NotAnObject);
    };

    let mut context = DataContext::new();
    for (name, rows) in tables {
        let serde_json::Value::Array(rows) = rows else {
            return Err(DataError::NotATable(name));
        };

        let mut table = DataTable::with_capacity(rows.len());
        for (index, row) in rows.into_iter().enumerate() {
            match json_to_value(row) {
                Value::Object(row) => table.push(row),
                _ => {
                    return Err(DataError::NotARow {
                        table: name.clone(),
                        index,
                    })
                }
            }
        }
        context.insert(name, table);
    }
    Ok(context)
}

/// Render a table as a JSON array of objects.
pub fn table_to_json(table: &[DataRow]) -> serde_json::Value {
    serde_json::Value::Array(
        table
            .iter()
            .map(|row| value_to_json(Value::Object(row.clone())))
            .collect(),
    )
}
