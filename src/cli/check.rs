//! Syntax-only validation of pipeql queries

use super::CliError;
use crate::processor;

/// Validates the query's syntax, returning the number of statements.
///
/// Every parse error in the query is reported, not just the first.
pub fn execute_check(query: &str) -> Result<usize, CliError> {
    let ast = processor::check(query)?;
    Ok(ast.statements.len())
}
