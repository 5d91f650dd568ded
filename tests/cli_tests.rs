#![cfg(feature = "cli")]

use pipeql::cli::{CliError, RunOptions, execute_check, execute_run, format_ast, format_tokens};
use pipeql::{DataError, QueryError};

fn run(query: &str, data: &str, pretty: bool) -> Result<String, CliError> {
    execute_run(&RunOptions {
        query: query.into(),
        data: Some(data.into()),
        pretty,
    })
}

// ============================================================================
// run
// ============================================================================

#[test]
fn test_run_compact_output() {
    let out = run(
        "FROM sales |> AGGREGATE SUM(amount) AS total GROUP BY product",
        r#"{"sales": [
            {"product": "apple", "amount": 10},
            {"product": "pear", "amount": 4},
            {"product": "apple", "amount": 20}
        ]}"#,
        false,
    )
    .unwrap();
    assert_eq!(
        out,
        r#"[{"product":"apple","total":30},{"product":"pear","total":4}]"#
    );
}

#[test]
fn test_run_pretty_output() {
    let out = run("FROM t |> SELECT n", r#"{"t": [{"n": 1, "m": 2}]}"#, true).unwrap();
    assert_eq!(out, "[\n  {\n    \"n\": 1\n  }\n]");
}

#[test]
fn test_run_rejects_malformed_json() {
    let err = run("FROM t", "{not json", false).unwrap_err();
    assert!(matches!(err, CliError::Json(_)));
    assert!(err.to_string().starts_with("Invalid JSON"));
}

#[test]
fn test_run_rejects_wrongly_shaped_data() {
    let err = run("FROM t", "[1, 2]", false).unwrap_err();
    assert!(matches!(err, CliError::Data(DataError::NotAnObject)));

    let err = run("FROM t", r#"{"t": 5}"#, false).unwrap_err();
    assert!(matches!(err, CliError::Data(DataError::NotATable(ref name)) if name == "t"));

    let err = run("FROM t", r#"{"t": [{"a": 1}, 2]}"#, false).unwrap_err();
    assert_eq!(err.to_string(), "Invalid data: Row 1 of table 't' is not an object");
}

#[test]
fn test_run_surfaces_query_errors() {
    let err = run("FROM missing", r#"{"t": []}"#, false).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Evaluation error: Table not found: missing"
    );

    let err = run("FROM t |> WHERE", r#"{"t": []}"#, false).unwrap_err();
    assert!(matches!(err, CliError::Query(QueryError::Parse(_))));
}

// ============================================================================
// check / tokens / ast
// ============================================================================

#[test]
fn test_check_counts_statements() {
    assert_eq!(execute_check("FROM t; FROM u |> LIMIT 2").unwrap(), 3);
}

#[test]
fn test_check_reports_lex_errors() {
    let err = execute_check("FROM t |> WHERE name = 'open").unwrap_err();
    assert!(matches!(err, CliError::Query(QueryError::Lex(_))));
}

#[test]
fn test_format_tokens_lists_positions() {
    let listing = format_tokens("FROM t\n|> LIMIT 1").unwrap();
    let lines: Vec<&str> = listing.lines().collect();
    assert_eq!(
        lines,
        vec![
            "From FROM 1:1",
            "Identifier t 1:6",
            "PipeGreater |> 2:1",
            "Limit LIMIT 2:4",
            "Number 1 2:10",
            "Eof  2:11",
        ]
    );
}

#[test]
fn test_format_ast_shows_stages() {
    let dump = format_ast("FROM t |> ORDER BY n DESC").unwrap();
    assert!(dump.contains("From("));
    assert!(dump.contains("OrderBy"));
    assert!(dump.contains("Desc"));
}
