//! Query entry points: compile text once, run it against any number of
//! data contexts.

use tracing::debug;

use crate::{
    ast::QueryStmt,
    interpreter::{EvalError, Interpreter},
    lexer::{self, LexError},
    parser::{ParseError, Parser},
    table::{DataContext, DataTable},
};

/// Any failure between query text and result table.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueryError {
    #[error("Lex error: {0}")]
    Lex(#[from] LexError),

    /// One or more grammar violations; never accompanied by a partial tree
    #[error("Parse error: {}", join_lines(.0))]
    Parse(Vec<ParseError>),

    #[error("Evaluation error: {0}")]
    Eval(#[from] EvalError),
}

impl From<ParseError> for QueryError {
    fn from(e: ParseError) -> Self {
        QueryError::Parse(vec![e])
    }
}

fn join_lines(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// A parsed query, ready to run.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    ast: QueryStmt,
}

impl CompiledQuery {
    pub fn ast(&self) -> &QueryStmt {
        &self.ast
    }

    /// Runs the query with the builtin aggregates.
    ///
    /// The context is consumed; tables stored by `AS`/`SET` live only for
    /// the duration of this run.
    pub fn run(&self, mut context: DataContext) -> Result<DataTable, QueryError> {
        self.run_with(&Interpreter::default(), &mut context)
    }

    /// Runs the query with a custom interpreter, leaving any tables stored
    /// by `AS`/`SET` in `context`.
    pub fn run_with(
        &self,
        interpreter: &Interpreter,
        context: &mut DataContext,
    ) -> Result<DataTable, QueryError> {
        Ok(interpreter.execute(&self.ast, context)?)
    }
}

/// Lexes and parses `source`, stopping at the first error.
///
/// # Examples
///
/// ```
/// use pipeql::{compile, DataContext, Value};
/// use std::collections::BTreeMap;
///
/// let query = compile("FROM sales |> WHERE amount > 10 |> SELECT product").unwrap();
///
/// let row = |product: &str, amount: i64| {
///     BTreeMap::from([
///         ("product".to_string(), Value::from(product)),
///         ("amount".to_string(), Value::Integer(amount)),
///     ])
/// };
/// let mut context = DataContext::new();
/// context.insert("sales".into(), vec![row("apple", 10), row("banana", 15)]);
///
/// let result = query.run(context).unwrap();
/// assert_eq!(result.len(), 1);
/// assert_eq!(result[0]["product"], Value::from("banana"));
/// ```
pub fn compile(source: &str) -> Result<CompiledQuery, QueryError> {
    let tokens = lexer::scan(source)?;
    let ast = Parser::new(tokens).parse()?;
    debug!(statements = ast.statements.len(), "compiled query");
    Ok(CompiledQuery { ast })
}

/// Lexes and parses `source`, reporting every parse error rather than the
/// first.
pub fn check(source: &str) -> Result<QueryStmt, QueryError> {
    let tokens = lexer::scan(source)?;
    Parser::new(tokens)
        .parse_recovering()
        .map_err(QueryError::Parse)
}

/// Compiles and runs `source` in one step.
pub fn execute(source: &str, context: DataContext) -> Result<DataTable, QueryError> {
    compile(source)?.run(context)
}
