//! CLI support for pipeql
//!
//! The binary is a thin wrapper over these functions; they return the text
//! to print so other tools can embed them.

mod check;
mod inspect;
mod run;

pub use check::execute_check;
pub use inspect::{format_ast, format_tokens};
pub use run::{RunOptions, execute_run};

use std::io;

use crate::{convert::DataError, processor::QueryError};

/// Errors that can occur during CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid data: {0}")]
    Data(#[from] DataError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("No data provided. Use --data, set PIPEQL_DATA, or pipe JSON to stdin.")]
    NoInput,
}
