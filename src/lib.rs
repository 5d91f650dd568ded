pub mod aggregates;
pub mod ast;
pub mod convert;
pub mod interpreter;
pub mod lexer;
pub mod operators;
pub mod parser;
pub mod processor;
pub mod table;
pub mod value;

#[cfg(feature = "cli")]
pub mod cli;

pub use aggregates::{AggregateFn, AggregateRegistry};
pub use ast::{BinOp, Expr, QueryStmt, Stmt, Token, TokenKind};
pub use convert::{DataError, context_from_json, table_to_json};
pub use interpreter::{EvalError, Interpreter};
pub use lexer::{LexError, LexErrorKind, Lexer, Position, scan};
pub use parser::{ParseError, Parser, parse};
pub use processor::{CompiledQuery, QueryError, check, compile, execute};
pub use table::{DataContext, DataRow, DataTable};
pub use value::Value;
