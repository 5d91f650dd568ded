//! Execute pipeql queries against JSON data

use tracing::info;

use super::CliError;
use crate::{convert, processor};

/// Options for the run command
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub query: String,
    /// JSON object mapping table names to arrays of rows
    pub data: Option<String>,
    pub pretty: bool,
}

/// Compiles and runs the query, returning the result table as JSON text.
pub fn execute_run(options: &RunOptions) -> Result<String, CliError> {
    let query = processor::compile(&options.query)?;

    let data = options.data.as_deref().ok_or(CliError::NoInput)?;
    let json: serde_json::Value = serde_json::from_str(data)?;
    let context = convert::context_from_json(json)?;
    info!(tables = context.len(), "loaded data");

    let table = query.run(context)?;
    let output = convert::table_to_json(&table);

    let text = if options.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    Ok(text)
}
