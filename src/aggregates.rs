//! Aggregate functions usable in `|> AGGREGATE`.
//!
//! An aggregate receives the evaluated argument values of every row in its
//! group, in row order, and folds them into one value.

use std::{collections::HashMap, fmt};

use rust_decimal::{Decimal, prelude::FromPrimitive, prelude::ToPrimitive};

use crate::{interpreter::EvalError, value::Value};

/// Signature of an aggregate function.
///
/// `rows[i]` holds the call's arguments evaluated against row `i` of the group.
pub type AggregateFn = fn(rows: &[Vec<Value>]) -> Result<Value, EvalError>;

/// Name-keyed table of aggregate functions. Lookup is case-insensitive.
///
/// # Examples
///
/// ```
/// use pipeql::{AggregateRegistry, EvalError, Value};
///
/// fn max_len(rows: &[Vec<Value>]) -> Result<Value, EvalError> {
///     let longest = rows
///         .iter()
///         .filter_map(|args| args.first())
///         .map(|v| v.as_string().len() as i64)
///         .max()
///         .unwrap_or(0);
///     Ok(Value::Integer(longest))
/// }
///
/// let mut registry = AggregateRegistry::default();
/// registry.register("max_len", max_len);
/// assert!(registry.get("MAX_LEN").is_some());
/// assert!(registry.get("sum").is_some());
/// ```
#[derive(Clone)]
pub struct AggregateRegistry {
    functions: HashMap<String, AggregateFn>,
}

impl AggregateRegistry {
    /// A registry with no functions at all.
    pub fn empty() -> Self {
        AggregateRegistry {
            functions: HashMap::new(),
        }
    }

    /// Adds or replaces a function.
    pub fn register(&mut self, name: &str, function: AggregateFn) -> &mut Self {
        self.functions.insert(name.to_ascii_uppercase(), function);
        self
    }

    pub fn get(&self, name: &str) -> Option<AggregateFn> {
        self.functions.get(&name.to_ascii_uppercase()).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(&name.to_ascii_uppercase())
    }
}

impl Default for AggregateRegistry {
    /// The builtins: `SUM` and `COUNT`.
    fn default() -> Self {
        let mut registry = AggregateRegistry::empty();
        registry.register("SUM", sum).register("COUNT", count);
        registry
    }
}

impl fmt::Debug for AggregateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("AggregateRegistry")
            .field("functions", &names)
            .finish()
    }
}

/// `COUNT()` / `COUNT(*)` counts rows; `COUNT(x)` counts rows where `x` is not null.
pub fn count(rows: &[Vec<Value>]) -> Result<Value, EvalError> {
    let counted = rows
        .iter()
        .filter(|args| args.first().is_none_or(|v| !v.is_null()))
        .count();
    Ok(Value::Integer(counted as i64))
}

/// `SUM(x)`: nulls are skipped and an empty group sums to `0`.
///
/// Integers are summed exactly; once a float is involved the total is
/// carried as a decimal and collapses back to an integer when whole.
pub fn sum(rows: &[Vec<Value>]) -> Result<Value, EvalError> {
    let mut exact = Some(Decimal::ZERO);
    let mut approx = 0.0_f64;
    let mut saw_integer = false;
    let mut saw_float = false;

    for args in rows {
        let [value] = args.as_slice() else {
            return Err(EvalError::TypeError(format!(
                "SUM expects exactly one argument, got {}",
                args.len()
            )));
        };

        let term = match value {
            Value::Null => continue,
            Value::Integer(n) => {
                saw_integer = true;
                approx += *n as f64;
                Decimal::from_i64(*n)
            }
            Value::Float(n) => {
                saw_float = true;
                approx += n;
                Decimal::from_f64(*n)
            }
            other => {
                return Err(EvalError::TypeError(format!(
                    "SUM requires numeric values, got {}",
                    other.type_name()
                )));
            }
        };
        exact = exact.zip(term).and_then(|(total, term)| total.checked_add(term));
    }

    let Some(total) = exact else {
        return Ok(Value::Float(approx));
    };

    if saw_float && !(saw_integer && total.is_integer()) {
        return Ok(total.to_f64().map_or(Value::Float(approx), Value::Float));
    }
    Ok(match total.to_i64() {
        Some(n) => Value::Integer(n),
        None => Value::Float(approx),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(values: &[Value]) -> Vec<Vec<Value>> {
        values.iter().map(|v| vec![v.clone()]).collect()
    }

    #[test]
    fn sum_skips_nulls() {
        let rows = column(&[Value::Integer(10), Value::Null, Value::Integer(5)]);
        assert_eq!(sum(&rows), Ok(Value::Integer(15)));
    }

    #[test]
    fn sum_of_empty_group_is_zero() {
        assert_eq!(sum(&[]), Ok(Value::Integer(0)));
    }

    #[test]
    fn sum_mixes_integers_and_floats_exactly() {
        let rows = column(&[Value::Integer(1), Value::Float(0.1), Value::Float(0.2)]);
        assert_eq!(sum(&rows), Ok(Value::Float(1.3)));

        let whole = column(&[Value::Integer(1), Value::Float(0.5), Value::Float(0.5)]);
        assert_eq!(sum(&whole), Ok(Value::Integer(2)));
    }

    #[test]
    fn sum_rejects_strings() {
        let rows = column(&[Value::from("ten")]);
        assert!(matches!(sum(&rows), Err(EvalError::TypeError(_))));
    }

    #[test]
    fn count_variants() {
        assert_eq!(count(&[vec![], vec![]]), Ok(Value::Integer(2)));
        let rows = column(&[Value::Integer(1), Value::Null, Value::from("x")]);
        assert_eq!(count(&rows), Ok(Value::Integer(2)));
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let registry = AggregateRegistry::default();
        assert!(registry.contains("count"));
        assert!(registry.get("Sum").is_some());
        assert!(registry.get("AVG").is_none());
        assert!(!AggregateRegistry::empty().contains("SUM"));
    }
}
