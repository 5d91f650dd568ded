use crate::{
    ast::{BinOp, LogicalOp, UnaryOp},
    value::Value,
};

/// Abstract Syntax Tree node representing a parsed expression.
///
/// Expressions are built once by the parser and evaluated once per row
/// (or once per group inside `AGGREGATE`) by the interpreter.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal value: number, string, `TRUE`, `FALSE` or `NULL`
    ///
    /// # Examples
    /// ```text
    /// 42
    /// 'hello'
    /// NULL
    /// ```
    Literal(Value),

    /// Bare name, resolved against the current row and then the data context
    ///
    /// # Example
    /// ```text
    /// amount
    /// ```
    Variable(String),

    /// Prefix operation
    ///
    /// # Examples
    /// ```text
    /// -price
    /// NOT active
    /// ```
    Unary { op: UnaryOp, operand: Box<Expr> },

    /// Binary operation (arithmetic, comparison, `AND`/`OR`)
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },

    /// Short-circuiting boolean connective.
    ///
    /// The parser emits `AND`/`OR` as [`Expr::Binary`]; this variant is for
    /// trees assembled programmatically and evaluates identically.
    Logical {
        left: Box<Expr>,
        op: LogicalOp,
        right: Box<Expr>,
    },

    /// Parenthesised expression
    Grouping(Box<Expr>),

    /// Function call
    ///
    /// # Examples
    /// ```text
    /// SUM(amount)
    /// CAST(price AS INT64)
    /// ```
    Call { callee: Box<Expr>, args: Vec<Expr> },

    /// Member access
    ///
    /// # Example
    /// ```text
    /// users.id
    /// ```
    Get { object: Box<Expr>, field: String },

    /// Assignment of a value to a name
    Assign { name: String, value: Box<Expr> },

    /// Searched `CASE`
    ///
    /// # Example
    /// ```text
    /// CASE WHEN amount > 10 THEN 'big' ELSE 'small' END
    /// ```
    Case {
        cases: Vec<(Expr, Expr)>,
        else_branch: Option<Box<Expr>>,
    },
}

impl Expr {
    pub fn literal(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Expr::Variable(name.into())
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn binary(left: Expr, op: BinOp, right: Expr) -> Self {
        Expr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn call(callee: Expr, args: Vec<Expr>) -> Self {
        Expr::Call {
            callee: Box::new(callee),
            args,
        }
    }

    /// Name of the called function when the callee is a bare name.
    pub fn callee_name(&self) -> Option<&str> {
        match self {
            Expr::Call { callee, .. } => match callee.as_ref() {
                Expr::Variable(name) => Some(name),
                _ => None,
            },
            _ => None,
        }
    }
}
