//! Pipe operators as pure table transforms.
//!
//! No operator mutates its input; each returns a new table. Expressions are
//! evaluated through an injected [`RowEvaluator`], so these functions know
//! nothing about the named-table context.

use std::collections::{HashMap, HashSet};

use crate::{
    aggregates::AggregateRegistry,
    ast::{AggregateColumn, Expr, OrderByColumn, Rename, SelectColumn, SortDirection},
    interpreter::EvalError,
    table::{DataContext, DataRow, DataTable, canonical_key},
    value::Value,
};

/// Evaluates an expression against one row.
pub type RowEvaluator<'a> = dyn Fn(&Expr, &DataRow) -> Result<Value, EvalError> + 'a;

pub fn from(context: &DataContext, table: &str) -> Result<DataTable, EvalError> {
    context
        .get(table)
        .cloned()
        .ok_or_else(|| EvalError::TableNotFound(table.to_string()))
}

/// Projects each row onto the listed columns.
pub fn select(
    table: &[DataRow],
    columns: &[SelectColumn],
    eval: &RowEvaluator<'_>,
) -> Result<DataTable, EvalError> {
    table
        .iter()
        .map(|row| {
            let mut projected = DataRow::new();
            for column in columns {
                projected.insert(
                    column.output_name().to_string(),
                    eval(&column.expression, row)?,
                );
            }
            Ok(projected)
        })
        .collect()
}

/// Keeps the rows whose condition is truthy.
pub fn where_(
    table: &[DataRow],
    condition: &Expr,
    eval: &RowEvaluator<'_>,
) -> Result<DataTable, EvalError> {
    let mut kept = DataTable::new();
    for row in table {
        if eval(condition, row)?.is_truthy() {
            kept.push(row.clone());
        }
    }
    Ok(kept)
}

/// Adds (or overwrites) computed columns, keeping the existing ones.
///
/// Every column is computed from the input row, so a later column cannot
/// see an earlier one from the same `EXTEND`.
pub fn extend(
    table: &[DataRow],
    columns: &[SelectColumn],
    eval: &RowEvaluator<'_>,
) -> Result<DataTable, EvalError> {
    table
        .iter()
        .map(|row| {
            let mut extended = row.clone();
            for column in columns {
                extended.insert(
                    column.output_name().to_string(),
                    eval(&column.expression, row)?,
                );
            }
            Ok(extended)
        })
        .collect()
}

/// Moves values to new column names. Pairs apply in order; a missing source
/// column leaves the row unchanged.
pub fn rename(table: &[DataRow], renames: &[Rename]) -> DataTable {
    table
        .iter()
        .map(|row| {
            let mut renamed = row.clone();
            for Rename { from, to } in renames {
                if let Some(value) = renamed.remove(from) {
                    renamed.insert(to.clone(), value);
                }
            }
            renamed
        })
        .collect()
}

/// Computes aggregate columns over the whole table, or once per group.
///
/// Groups are keyed by the group-by values joined with `-` (null as the
/// empty string) and emitted in first-seen order. Each output row carries
/// the group-by columns (taken from the group's first row) plus one column
/// per aggregate.
pub fn aggregate(
    table: &[DataRow],
    columns: &[AggregateColumn],
    group_by: &[String],
    registry: &AggregateRegistry,
    eval: &RowEvaluator<'_>,
) -> Result<DataTable, EvalError> {
    if group_by.is_empty() {
        let rows: Vec<&DataRow> = table.iter().collect();
        return Ok(vec![aggregate_group(&rows, columns, &[], registry, eval)?]);
    }

    let mut order: Vec<Vec<&DataRow>> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for row in table {
        let key = group_by
            .iter()
            .map(|column| match row.get(column) {
                None | Some(Value::Null) => String::new(),
                Some(value) => value.as_string(),
            })
            .collect::<Vec<_>>()
            .join("-");
        let slot = *index.entry(key).or_insert_with(|| {
            order.push(Vec::new());
            order.len() - 1
        });
        order[slot].push(row);
    }

    order
        .iter()
        .map(|rows| aggregate_group(rows, columns, group_by, registry, eval))
        .collect()
}

fn aggregate_group(
    rows: &[&DataRow],
    columns: &[AggregateColumn],
    group_by: &[String],
    registry: &AggregateRegistry,
    eval: &RowEvaluator<'_>,
) -> Result<DataRow, EvalError> {
    let mut out = DataRow::new();
    if let Some(first) = rows.first() {
        for column in group_by {
            out.insert(
                column.clone(),
                first.get(column).cloned().unwrap_or_default(),
            );
        }
    }

    for column in columns {
        let (Expr::Call { args, .. }, Some(name)) =
            (&column.expression, column.expression.callee_name())
        else {
            return Err(EvalError::TypeError(format!(
                "aggregate column '{}' must call a function by name",
                column.alias
            )));
        };
        let function = registry
            .get(name)
            .ok_or_else(|| EvalError::UnsupportedAggregate(name.to_string()))?;

        let mut evaluated = Vec::with_capacity(rows.len());
        for row in rows {
            let values = args
                .iter()
                .map(|arg| eval(arg, row))
                .collect::<Result<Vec<_>, _>>()?;
            evaluated.push(values);
        }
        out.insert(column.alias.clone(), function(&evaluated)?);
    }
    Ok(out)
}

/// Stable multi-key sort. `DESC` reverses only its own key.
pub fn order_by(
    table: &[DataRow],
    columns: &[OrderByColumn],
    eval: &RowEvaluator<'_>,
) -> Result<DataTable, EvalError> {
    let mut keyed = Vec::with_capacity(table.len());
    for row in table {
        let keys = columns
            .iter()
            .map(|column| eval(&column.expression, row))
            .collect::<Result<Vec<_>, _>>()?;
        keyed.push((keys, row));
    }

    keyed.sort_by(|(a, _), (b, _)| {
        columns
            .iter()
            .zip(a.iter().zip(b))
            .map(|(column, (x, y))| match column.direction {
                SortDirection::Asc => x.sort_cmp(y),
                SortDirection::Desc => y.sort_cmp(x),
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    Ok(keyed.into_iter().map(|(_, row)| row.clone()).collect())
}

/// Rows `[offset, offset + count)`; out-of-range bounds clamp to the table.
pub fn limit(table: &[DataRow], count: usize, offset: usize) -> DataTable {
    table.iter().skip(offset).take(count).cloned().collect()
}

/// First occurrence of each distinct row, in input order.
pub fn distinct(table: &[DataRow]) -> DataTable {
    let mut seen = HashSet::new();
    table
        .iter()
        .filter(|row| seen.insert(canonical_key(row)))
        .cloned()
        .collect()
}

/// Nested-loop inner join.
///
/// The condition sees the merged row, where right columns shadow left
/// columns of the same name; matching merged rows are emitted.
pub fn join(
    left: &[DataRow],
    right: &[DataRow],
    on: &Expr,
    eval: &RowEvaluator<'_>,
) -> Result<DataTable, EvalError> {
    let mut joined = DataTable::new();
    for l in left {
        for r in right {
            let mut merged = l.clone();
            merged.extend(r.iter().map(|(k, v)| (k.clone(), v.clone())));
            if eval(on, &merged)?.is_truthy() {
                joined.push(merged);
            }
        }
    }
    Ok(joined)
}

/// Concatenation; duplicates are kept.
pub fn union(left: &[DataRow], right: &[DataRow]) -> DataTable {
    left.iter().chain(right).cloned().collect()
}

/// Left rows that do not appear in the right table.
pub fn except(left: &[DataRow], right: &[DataRow]) -> DataTable {
    let exclude: HashSet<String> = right.iter().map(canonical_key).collect();
    left.iter()
        .filter(|row| !exclude.contains(&canonical_key(row)))
        .cloned()
        .collect()
}
