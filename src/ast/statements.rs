use crate::ast::{CreateFunctionStmt, Expr};

/// A projected column: `expression [AS alias]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectColumn {
    pub expression: Expr,
    pub alias: Option<String>,
}

impl SelectColumn {
    /// Output column name: the alias, else the variable name, else `"computed"`.
    pub fn output_name(&self) -> &str {
        match (&self.alias, &self.expression) {
            (Some(alias), _) => alias,
            (None, Expr::Variable(name)) => name,
            _ => "computed",
        }
    }
}

/// An aggregate column: `FUNC(args) AS alias`.
///
/// The parser guarantees `expression` is an [`Expr::Call`].
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateColumn {
    pub expression: Expr,
    pub alias: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// One `ORDER BY` key.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByColumn {
    pub expression: Expr,
    pub direction: SortDirection,
}

/// One `RENAME old AS new` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Rename {
    pub from: String,
    pub to: String,
}

/// A top-level statement.
///
/// A query is a flat list of these: a `From` followed by pipe stages, with
/// function definitions and bare expressions allowed at the top level.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Query source
    ///
    /// # Example
    /// ```text
    /// FROM sales
    /// ```
    From(String),

    /// Bare expression (parsed, not executed)
    Expression(Expr),

    /// `CREATE ... FUNCTION` definition (parsed, not executed)
    CreateFunction(CreateFunctionStmt),

    /// # Example
    /// ```text
    /// |> SELECT product, amount * 2 AS doubled
    /// ```
    Select(Vec<SelectColumn>),

    /// # Example
    /// ```text
    /// |> WHERE amount > 10
    /// ```
    Where(Expr),

    /// # Example
    /// ```text
    /// |> AGGREGATE SUM(amount) AS total GROUP BY product
    /// ```
    Aggregate {
        columns: Vec<AggregateColumn>,
        group_by: Vec<String>,
    },

    /// Like `Select`, but keeps the existing columns
    Extend(Vec<SelectColumn>),

    Rename(Vec<Rename>),

    OrderBy(Vec<OrderByColumn>),

    /// # Example
    /// ```text
    /// |> LIMIT 10 OFFSET 20
    /// ```
    Limit { count: Expr, offset: Option<Expr> },

    Distinct,

    /// Inner join against a named table
    ///
    /// # Example
    /// ```text
    /// |> JOIN orders ON id == user_id
    /// ```
    Join { table: String, on: Expr },

    /// Concatenate rows of a named table
    Union(String),

    /// Remove rows that also appear in a named table
    Except(String),

    /// Store the current table in the data context
    Set(String),

    /// Store the current table in the data context
    As(String),

    /// Procedure call (parsed, not executed)
    Call { name: String, args: Vec<Expr> },
}

impl Stmt {
    /// Operator keyword, used in logs and error messages.
    pub fn keyword(&self) -> &'static str {
        match self {
            Stmt::From(_) => "FROM",
            Stmt::Expression(_) => "expression",
            Stmt::CreateFunction(_) => "CREATE FUNCTION",
            Stmt::Select(_) => "SELECT",
            Stmt::Where(_) => "WHERE",
            Stmt::Aggregate { .. } => "AGGREGATE",
            Stmt::Extend(_) => "EXTEND",
            Stmt::Rename(_) => "RENAME",
            Stmt::OrderBy(_) => "ORDER BY",
            Stmt::Limit { .. } => "LIMIT",
            Stmt::Distinct => "DISTINCT",
            Stmt::Join { .. } => "JOIN",
            Stmt::Union(_) => "UNION",
            Stmt::Except(_) => "EXCEPT",
            Stmt::Set(_) => "SET",
            Stmt::As(_) => "AS",
            Stmt::Call { .. } => "CALL",
        }
    }
}
