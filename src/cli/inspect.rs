//! Debugging views of the lexer and parser output

use std::fmt::Write;

use super::CliError;
use crate::{lexer, parser::Parser, processor::QueryError};

/// One line per token: `KIND lexeme line:col`.
pub fn format_tokens(query: &str) -> Result<String, CliError> {
    let tokens = lexer::scan(query).map_err(QueryError::from)?;
    let mut out = String::new();
    for token in tokens {
        let _ = writeln!(
            out,
            "{:?} {} {}:{}",
            token.kind, token.lexeme, token.line, token.col
        );
    }
    Ok(out)
}

/// Pretty `Debug` rendering of the parsed query.
pub fn format_ast(query: &str) -> Result<String, CliError> {
    let tokens = lexer::scan(query).map_err(QueryError::from)?;
    let ast = Parser::new(tokens).parse().map_err(QueryError::from)?;
    Ok(format!("{ast:#?}"))
}
