use rust_decimal::{Decimal, prelude::FromPrimitive, prelude::ToPrimitive};
use tracing::{debug, warn};

use crate::{
    aggregates::AggregateRegistry,
    ast::{BinOp, Expr, LogicalOp, QueryStmt, Stmt, TokenKind, UnaryOp},
    operators::{self, RowEvaluator},
    table::{DataContext, DataRow, DataTable},
    value::Value,
};

/// Errors that terminate query execution.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Unsupported aggregate function: {0}")]
    UnsupportedAggregate(String),

    /// Scalar call to a function that is not a known builtin
    #[error("Unsupported function: {0}")]
    UnsupportedFunction(String),

    /// Type mismatch or invalid operation for the given type
    #[error("Type error: {0}")]
    TypeError(String),

    #[error("Division by zero")]
    DivisionByZero,

    /// A pipe stage ran before any `FROM`
    #[error("{0} has no input table; start the query with FROM")]
    NoSourceTable(&'static str),

    #[error("Invalid LIKE pattern: {0}")]
    InvalidPattern(String),
}

/// Executes parsed queries against a [`DataContext`].
///
/// The interpreter itself holds only configuration (the aggregate
/// registry), so one instance can run any number of queries. Execution is
/// a left fold over the statements: the running table is threaded from
/// stage to stage and the context is only touched by `FROM`, `JOIN`,
/// `UNION`, `EXCEPT` (reads) and `AS`/`SET` (writes).
///
/// Errors propagate: the first failing stage ends the query and no partial
/// table is returned.
#[derive(Debug, Clone, Default)]
pub struct Interpreter {
    aggregates: AggregateRegistry,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_aggregates(aggregates: AggregateRegistry) -> Self {
        Interpreter { aggregates }
    }

    /// Runs every statement in order and returns the final table.
    ///
    /// A query without `FROM` (e.g. only function definitions) yields an
    /// empty table.
    pub fn execute(
        &self,
        query: &QueryStmt,
        context: &mut DataContext,
    ) -> Result<DataTable, EvalError> {
        let result = query
            .statements
            .iter()
            .try_fold(None, |current, stmt| self.step(stmt, current, context))?;
        Ok(result.unwrap_or_default())
    }

    fn step(
        &self,
        stmt: &Stmt,
        current: Option<DataTable>,
        context: &mut DataContext,
    ) -> Result<Option<DataTable>, EvalError> {
        match stmt {
            Stmt::From(name) => {
                let table = operators::from(context, name)?;
                debug!(table = %name, rows = table.len(), "FROM");
                Ok(Some(table))
            }
            Stmt::Expression(_) | Stmt::CreateFunction(_) | Stmt::Call { .. } => {
                warn!(
                    statement = stmt.keyword(),
                    "statement is parsed but not executed"
                );
                Ok(current)
            }
            Stmt::Set(name) | Stmt::As(name) => {
                let table = current.ok_or(EvalError::NoSourceTable(stmt.keyword()))?;
                debug!(name = %name, rows = table.len(), "stored table snapshot");
                context.insert(name.clone(), table.clone());
                Ok(Some(table))
            }
            _ => {
                let table = current.ok_or(EvalError::NoSourceTable(stmt.keyword()))?;
                let next = self.pipe(stmt, &table, context)?;
                debug!(
                    stage = stmt.keyword(),
                    rows_in = table.len(),
                    rows_out = next.len(),
                    "pipe stage"
                );
                Ok(Some(next))
            }
        }
    }

    fn pipe(
        &self,
        stmt: &Stmt,
        table: &[DataRow],
        context: &DataContext,
    ) -> Result<DataTable, EvalError> {
        let eval: &RowEvaluator<'_> = &|expr, row| self.evaluate(expr, row, context);

        match stmt {
            Stmt::Select(columns) => operators::select(table, columns, eval),
            Stmt::Where(condition) => operators::where_(table, condition, eval),
            Stmt::Aggregate { columns, group_by } => {
                operators::aggregate(table, columns, group_by, &self.aggregates, eval)
            }
            Stmt::Extend(columns) => operators::extend(table, columns, eval),
            Stmt::Rename(renames) => Ok(operators::rename(table, renames)),
            Stmt::OrderBy(columns) => operators::order_by(table, columns, eval),
            Stmt::Limit { count, offset } => {
                let empty = DataRow::new();
                let count = self.bound(count, &empty, context, "LIMIT")?;
                let offset = match offset {
                    Some(offset) => self.bound(offset, &empty, context, "OFFSET")?,
                    None => 0,
                };
                Ok(operators::limit(table, count, offset))
            }
            Stmt::Distinct => Ok(operators::distinct(table)),
            Stmt::Join { table: name, on } => {
                let right = operators::from(context, name)?;
                operators::join(table, &right, on, eval)
            }
            Stmt::Union(name) => Ok(operators::union(table, &operators::from(context, name)?)),
            Stmt::Except(name) => Ok(operators::except(table, &operators::from(context, name)?)),
            Stmt::From(_)
            | Stmt::Expression(_)
            | Stmt::CreateFunction(_)
            | Stmt::Call { .. }
            | Stmt::Set(_)
            | Stmt::As(_) => Ok(table.to_vec()),
        }
    }

    /// Evaluates a `LIMIT`/`OFFSET` bound to a row count. Fractions truncate.
    fn bound(
        &self,
        expr: &Expr,
        row: &DataRow,
        context: &DataContext,
        clause: &str,
    ) -> Result<usize, EvalError> {
        let value = self.evaluate(expr, row, context)?;
        let whole = match &value {
            Value::Integer(n) => Some(*n),
            Value::Float(n) if n.is_finite() => Some(n.trunc() as i64),
            _ => None,
        };
        whole
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| {
                EvalError::TypeError(format!(
                    "{clause} expects a non-negative number, got {}",
                    value.type_name()
                ))
            })
    }

    /// Evaluates an expression against a row.
    ///
    /// Names resolve to the row's column first, then to a whole table of
    /// the context (as an array of objects), else `NULL`.
    pub fn evaluate(
        &self,
        expr: &Expr,
        row: &DataRow,
        context: &DataContext,
    ) -> Result<Value, EvalError> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Variable(name) => Ok(lookup(name, row, context)),
            Expr::Grouping(inner) => self.evaluate(inner, row, context),
            Expr::Unary { op, operand } => {
                let value = self.evaluate(operand, row, context)?;
                apply_unary(*op, value)
            }
            Expr::Binary {
                left,
                op: BinOp::And,
                right,
            }
            | Expr::Logical {
                left,
                op: LogicalOp::And,
                right,
            } => Ok(Value::Boolean(
                self.evaluate(left, row, context)?.is_truthy()
                    && self.evaluate(right, row, context)?.is_truthy(),
            )),
            Expr::Binary {
                left,
                op: BinOp::Or,
                right,
            }
            | Expr::Logical {
                left,
                op: LogicalOp::Or,
                right,
            } => Ok(Value::Boolean(
                self.evaluate(left, row, context)?.is_truthy()
                    || self.evaluate(right, row, context)?.is_truthy(),
            )),
            Expr::Binary { left, op, right } => {
                let left = self.evaluate(left, row, context)?;
                let right = self.evaluate(right, row, context)?;
                apply_binop(*op, &left, &right)
            }
            Expr::Call { callee, args } => self.call(callee, args, row, context),
            Expr::Get { object, field } => {
                if let Value::Object(fields) = self.evaluate(object, row, context)?
                    && let Some(value) = fields.get(field)
                {
                    return Ok(value.clone());
                }
                Ok(row.get(field).cloned().unwrap_or_default())
            }
            // Rows are immutable; an assignment just yields its value.
            Expr::Assign { value, .. } => self.evaluate(value, row, context),
            Expr::Case { cases, else_branch } => {
                for (condition, result) in cases {
                    if self.evaluate(condition, row, context)?.is_truthy() {
                        return self.evaluate(result, row, context);
                    }
                }
                match else_branch {
                    Some(otherwise) => self.evaluate(otherwise, row, context),
                    None => Ok(Value::Null),
                }
            }
        }
    }

    fn call(
        &self,
        callee: &Expr,
        args: &[Expr],
        row: &DataRow,
        context: &DataContext,
    ) -> Result<Value, EvalError> {
        let Expr::Variable(name) = callee else {
            return Err(EvalError::TypeError(
                "callee must be a function name".to_string(),
            ));
        };

        match name.to_ascii_uppercase().as_str() {
            mode @ ("CAST" | "SAFE_CAST") => {
                let [value, Expr::Variable(target)] = args else {
                    return Err(EvalError::TypeError(format!(
                        "{mode} expects (expression AS type)"
                    )));
                };
                let value = self.evaluate(value, row, context)?;
                match (cast(&value, target), mode) {
                    (Ok(converted), _) => Ok(converted),
                    (Err(_), "SAFE_CAST") => Ok(Value::Null),
                    (Err(e), _) => Err(e),
                }
            }
            _ if self.aggregates.contains(name) => Err(EvalError::TypeError(format!(
                "aggregate function {name} is only allowed in AGGREGATE"
            ))),
            _ => Err(EvalError::UnsupportedFunction(name.clone())),
        }
    }
}

fn lookup(name: &str, row: &DataRow, context: &DataContext) -> Value {
    if let Some(value) = row.get(name) {
        return value.clone();
    }
    match context.get(name) {
        Some(table) => Value::Array(table.iter().cloned().map(Value::Object).collect()),
        None => Value::Null,
    }
}

fn apply_unary(op: UnaryOp, value: Value) -> Result<Value, EvalError> {
    match op {
        UnaryOp::Not => Ok(Value::Boolean(!value.is_truthy())),
        UnaryOp::Negate => match value {
            Value::Null => Ok(Value::Null),
            Value::Integer(n) => Ok(n
                .checked_neg()
                .map_or(Value::Float(-(n as f64)), Value::Integer)),
            Value::Float(n) => Ok(Value::Float(-n)),
            other => Err(EvalError::TypeError(format!(
                "Cannot negate {}",
                other.type_name()
            ))),
        },
    }
}

fn apply_binop(op: BinOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    let ordered = |accept: fn(std::cmp::Ordering) -> bool| {
        Value::Boolean(left.partial_compare(right).is_some_and(accept))
    };

    match op {
        BinOp::Equal | BinOp::Is => Ok(Value::Boolean(left.loose_eq(right))),
        BinOp::NotEqual => Ok(Value::Boolean(!left.loose_eq(right))),
        BinOp::LessThan => Ok(ordered(|o| o.is_lt())),
        BinOp::GreaterThan => Ok(ordered(|o| o.is_gt())),
        BinOp::LessEqual => Ok(ordered(|o| o.is_le())),
        BinOp::GreaterEqual => Ok(ordered(|o| o.is_ge())),
        BinOp::Like => like(left, right),
        BinOp::Concat => match (left, right) {
            (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
            (a, b) => Ok(Value::String(a.as_string() + &b.as_string())),
        },
        BinOp::Add | BinOp::Subtract | BinOp::Multiply | BinOp::Divide => {
            arithmetic(op, left, right)
        }
        BinOp::And => Ok(Value::Boolean(left.is_truthy() && right.is_truthy())),
        BinOp::Or => Ok(Value::Boolean(left.is_truthy() || right.is_truthy())),
    }
}

fn arithmetic(op: BinOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    if left.is_null() || right.is_null() {
        return Ok(Value::Null);
    }
    if op == BinOp::Divide && right.as_float() == Some(0.0) {
        return Err(EvalError::DivisionByZero);
    }

    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => Ok(integer_arithmetic(op, *a, *b)),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(float_arithmetic(op, *a, *b))),
        (Value::Integer(a), Value::Float(b)) => Ok(mixed_arithmetic(
            op,
            Decimal::from_i64(*a),
            Decimal::from_f64(*b),
            float_arithmetic(op, *a as f64, *b),
        )),
        (Value::Float(a), Value::Integer(b)) => Ok(mixed_arithmetic(
            op,
            Decimal::from_f64(*a),
            Decimal::from_i64(*b),
            float_arithmetic(op, *a, *b as f64),
        )),
        (Value::String(a), Value::String(b)) if op == BinOp::Add => {
            Ok(Value::String(format!("{a}{b}")))
        }
        (a, b) => Err(EvalError::TypeError(format!(
            "Cannot apply {op:?} to {} and {}",
            a.type_name(),
            b.type_name()
        ))),
    }
}

fn float_arithmetic(op: BinOp, a: f64, b: f64) -> f64 {
    match op {
        BinOp::Add => a + b,
        BinOp::Subtract => a - b,
        BinOp::Multiply => a * b,
        _ => a / b,
    }
}

/// Exact integer arithmetic; overflow and inexact division fall back to floats.
fn integer_arithmetic(op: BinOp, a: i64, b: i64) -> Value {
    let exact = match op {
        BinOp::Add => a.checked_add(b),
        BinOp::Subtract => a.checked_sub(b),
        BinOp::Multiply => a.checked_mul(b),
        _ if a.checked_rem(b) == Some(0) => a.checked_div(b),
        _ => None,
    };
    exact.map_or_else(
        || Value::Float(float_arithmetic(op, a as f64, b as f64)),
        Value::Integer,
    )
}

/// Integer/float arithmetic through decimals, collapsing whole results to integers.
fn mixed_arithmetic(op: BinOp, a: Option<Decimal>, b: Option<Decimal>, fallback: f64) -> Value {
    let result = a.zip(b).and_then(|(a, b)| match op {
        BinOp::Add => a.checked_add(b),
        BinOp::Subtract => a.checked_sub(b),
        BinOp::Multiply => a.checked_mul(b),
        _ => a.checked_div(b),
    });

    let Some(rd) = result else {
        return Value::Float(fallback);
    };
    if rd.is_integer()
        && let Some(n) = rd.to_i64()
    {
        Value::Integer(n)
    } else {
        rd.to_f64().map_or(Value::Float(fallback), Value::Float)
    }
}

/// SQL `LIKE`: `%` matches any run of characters, `_` exactly one.
fn like(value: &Value, pattern: &Value) -> Result<Value, EvalError> {
    let (Value::String(text), Value::String(pattern)) = (value, pattern) else {
        if value.is_null() || pattern.is_null() {
            return Ok(Value::Null);
        }
        return Err(EvalError::TypeError(format!(
            "LIKE requires strings, got {} and {}",
            value.type_name(),
            pattern.type_name()
        )));
    };

    let mut translated = String::from("(?s)^");
    for ch in pattern.chars() {
        match ch {
            '%' => translated.push_str(".*"),
            '_' => translated.push('.'),
            other => translated.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    translated.push('$');

    let re = regex::Regex::new(&translated)
        .map_err(|e| EvalError::InvalidPattern(format!("{pattern}: {e}")))?;
    Ok(Value::Boolean(re.is_match(text)))
}

/// `CAST(value AS target)`. Null casts to null for every target.
fn cast(value: &Value, target: &str) -> Result<Value, EvalError> {
    let fail = || {
        EvalError::TypeError(format!(
            "Cannot cast {} '{}' to {target}",
            value.type_name(),
            value.as_string()
        ))
    };
    if value.is_null() {
        return Ok(Value::Null);
    }

    match TokenKind::keyword(target) {
        Some(TokenKind::StringType) => Ok(Value::String(value.as_string())),
        Some(TokenKind::Int64) => match value {
            Value::Integer(_) | Value::Float(_) => value.as_int().map(Value::Integer).ok_or_else(fail),
            Value::Boolean(b) => Ok(Value::Integer(i64::from(*b))),
            Value::String(s) => s.trim().parse().map(Value::Integer).map_err(|_| fail()),
            _ => Err(fail()),
        },
        Some(TokenKind::Float64 | TokenKind::Numeric) => match value {
            Value::Integer(_) | Value::Float(_) => value.as_float().map(Value::Float).ok_or_else(fail),
            Value::Boolean(b) => Ok(Value::Float(if *b { 1.0 } else { 0.0 })),
            Value::String(s) => s.trim().parse().map(Value::Float).map_err(|_| fail()),
            _ => Err(fail()),
        },
        Some(TokenKind::Bool) => match value {
            Value::Boolean(b) => Ok(Value::Boolean(*b)),
            Value::Integer(n) => Ok(Value::Boolean(*n != 0)),
            Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(Value::Boolean(true)),
            Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(Value::Boolean(false)),
            _ => Err(fail()),
        },
        _ => Err(EvalError::TypeError(format!("Unsupported CAST target: {target}"))),
    }
}
