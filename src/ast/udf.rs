use crate::ast::Expr;

/// Visibility / lifetime modifier of a function definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionModifier {
    Temp,
    Private,
    Public,
}

/// Parameter and return types accepted by `CREATE FUNCTION`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataType {
    /// `ARRAY` or `ARRAY<T>`
    Array(Option<Box<DataType>>),
    Bool,
    Bytes,
    Date,
    Datetime,
    Time,
    Timestamp,
    Struct,
    String,
    Json,
    Int64,
    Numeric,
    Float64,
}

/// A typed parameter: `name TYPE`.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionParam {
    pub name: String,
    pub data_type: DataType,
}

/// User-defined scalar function.
///
/// # Example
/// ```text
/// CREATE TEMP FUNCTION Arithmetic(x INT64, y INT64) RETURNS INT64 AS (x + y);
/// ```
///
/// Definitions are parsed and kept in the tree; the interpreter does not
/// invoke them.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateFunctionStmt {
    pub modifiers: Vec<FunctionModifier>,
    pub name: String,
    pub params: Vec<FunctionParam>,
    pub return_type: DataType,
    pub body: Expr,
}

impl CreateFunctionStmt {
    pub fn is_private(&self) -> bool {
        self.modifiers.contains(&FunctionModifier::Private)
    }
}
