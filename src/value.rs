use std::{cmp::Ordering, collections::BTreeMap};

/// A value flowing through a query: a row field, a literal, or an
/// evaluation result.
///
/// Mirrors the JSON types, with integers kept apart from floats.
///
/// # Type Preservation
///
/// - Numeric literals in query text decode to [`Value::Float`]
/// - Integers supplied in the data context stay [`Value::Integer`]
/// - Mixed arithmetic goes through exact decimals and collapses back to an
///   integer when the result is whole
///
/// # Examples
///
/// ```
/// use pipeql::Value;
/// use std::collections::BTreeMap;
///
/// let amount = Value::Integer(10);
/// let ratio = Value::Float(0.5);
/// let name = Value::from("apple");
///
/// let mut row = BTreeMap::new();
/// row.insert("product".to_string(), name);
/// let object = Value::Object(row);
///
/// assert!(amount.is_truthy());
/// assert!(!Value::Null.is_truthy());
/// assert_eq!(object.type_name(), "object");
/// # let _ = ratio;
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// SQL/JSON null
    #[default]
    Null,

    Boolean(bool),

    /// Floating-point number
    Float(f64),

    /// Integer number (preserved separately from floats)
    Integer(i64),

    String(String),

    /// Ordered list, also how a whole table appears inside an expression
    Array(Vec<Value>),

    /// Keyed record with sorted keys
    Object(BTreeMap<String, Value>),
}

impl Value {
    /// Check if the value is truthy (for conditions)
    pub fn is_truthy(&self) -> bool {
        use Value::*;
        match self {
            Null => false,
            Boolean(b) => *b,
            Float(n) => *n != 0.0 && !n.is_nan(),
            Integer(n) => *n != 0,
            String(s) => !s.is_empty(),
            Array(arr) => !arr.is_empty(),
            Object(obj) => !obj.is_empty(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get as float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Get as integer, rounding floats
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            Value::Float(n) if n.is_finite() => Some(n.round() as i64),
            _ => None,
        }
    }

    /// Get as string (concatenation, grouping keys)
    pub fn as_string(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Float(n) => n.to_string(),
            Value::Integer(n) => n.to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Null => "null".to_string(),
            other => serde_json::Value::from(other.clone()).to_string(),
        }
    }

    /// Human-readable type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// Equality by value: integers and floats compare numerically.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Float(b)) | (Value::Float(b), Value::Integer(a)) => {
                (*a as f64) == *b
            }
            (a, b) => a == b,
        }
    }

    /// Ordering between comparable values.
    ///
    /// Numbers compare numerically, strings and booleans naturally;
    /// any other pairing (including null) is incomparable.
    pub fn partial_compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Integer(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Total order used for sorting rows.
    ///
    /// Comparable values use [`Value::partial_compare`]; otherwise values
    /// rank null < boolean < number < string < array < object.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        self.partial_compare(other)
            .unwrap_or_else(|| self.rank().cmp(&other.rank()))
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Boolean(_) => 1,
            Value::Integer(_) | Value::Float(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}
