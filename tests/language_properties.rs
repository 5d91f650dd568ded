//! Behavioural laws of the language, checked end to end.

use pipeql::ast::{BinOp, Expr, TokenKind, UnaryOp};
use pipeql::lexer::LexErrorKind;
use pipeql::operators;
use pipeql::{DataRow, Parser, Value, context_from_json, execute, scan, table_to_json};
use serde_json::json;

fn expr(source: &str) -> Expr {
    Parser::new(scan(source).unwrap())
        .parse_expression()
        .unwrap()
}

fn var(name: &str) -> Expr {
    Expr::variable(name)
}

fn rows(data: serde_json::Value) -> Vec<DataRow> {
    context_from_json(json!({ "t": data })).unwrap().remove("t").unwrap()
}

// ============================================================================
// Tokenization
// ============================================================================

#[test]
fn every_token_kind_scans_alone() {
    let samples = [
        ("(", TokenKind::LeftParen),
        ("|>", TokenKind::PipeGreater),
        ("<>", TokenKind::LessGreater),
        ("||", TokenKind::PipePipe),
        ("name", TokenKind::Identifier),
        ("`a b`", TokenKind::Identifier),
        ("'text'", TokenKind::String),
        ("1.5e3", TokenKind::Number),
        ("GROUP", TokenKind::Group),
        ("cross", TokenKind::Cross),
        ("timestamp", TokenKind::Timestamp),
    ];
    for (input, kind) in samples {
        let tokens = scan(input).unwrap();
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![kind, TokenKind::Eof], "{input}");
        assert_eq!(tokens[0].lexeme, input);
    }
}

#[test]
fn lexemes_reconstruct_the_source() {
    let source = "FROM sales |> WHERE amount > 10 |> SELECT `the product` , 'x'";
    let tokens = scan(source).unwrap();
    let rebuilt: Vec<&str> = tokens[..tokens.len() - 1]
        .iter()
        .map(|t| t.lexeme.as_str())
        .collect();
    assert_eq!(rebuilt.join(" "), source);
}

#[test]
fn keywords_ignore_case_but_lexemes_do_not() {
    let tokens = scan("sElEcT Name FrOm uSeRs").unwrap();
    assert_eq!(tokens[0].kind, TokenKind::Select);
    assert_eq!(tokens[2].kind, TokenKind::From);
    assert_eq!(tokens[0].lexeme, "sElEcT");
    assert_eq!(tokens[3].lexeme, "uSeRs");
}

// ============================================================================
// Precedence
// ============================================================================

#[test]
fn multiplication_nests_under_addition() {
    assert_eq!(
        expr("x + y * z"),
        Expr::binary(
            var("x"),
            BinOp::Add,
            Expr::binary(var("y"), BinOp::Multiply, var("z"))
        )
    );
}

#[test]
fn and_nests_under_or_and_not_under_and() {
    assert_eq!(
        expr("x OR y AND NOT z"),
        Expr::binary(
            var("x"),
            BinOp::Or,
            Expr::binary(var("y"), BinOp::And, Expr::unary(UnaryOp::Not, var("z")))
        )
    );
}

#[test]
fn parentheses_override_precedence() {
    let Expr::Binary { left, op, right } = expr("(a + b) * c > d / e") else {
        panic!("expected comparison");
    };
    assert_eq!(op, BinOp::GreaterThan);
    assert_eq!(*right, Expr::binary(var("d"), BinOp::Divide, var("e")));
    assert_eq!(
        *left,
        Expr::binary(
            Expr::Grouping(Box::new(Expr::binary(var("a"), BinOp::Add, var("b")))),
            BinOp::Multiply,
            var("c")
        )
    );
}

// ============================================================================
// Relational operators
// ============================================================================

#[test]
fn aggregate_groups_in_first_seen_order() {
    let data = context_from_json(json!({
        "sales": [
            {"product": "apple", "amount": 10},
            {"product": "banana", "amount": 15},
            {"product": "apple", "amount": 20}
        ]
    }))
    .unwrap();
    let result = execute(
        "FROM sales |> AGGREGATE SUM(amount) AS total_sales GROUP BY product",
        data,
    )
    .unwrap();
    assert_eq!(
        table_to_json(&result),
        json!([
            {"product": "apple", "total_sales": 30},
            {"product": "banana", "total_sales": 15}
        ])
    );
}

#[test]
fn join_emits_only_matching_pairs() {
    let data = context_from_json(json!({
        "l": [{"k": 1, "a": "x"}, {"k": 2, "a": "y"}],
        "r": [{"j": 2, "b": "p"}, {"j": 3, "b": "q"}],
        "none": []
    }))
    .unwrap();

    let result = execute("FROM l |> JOIN r ON k = j", data.clone()).unwrap();
    assert_eq!(
        table_to_json(&result),
        json!([{"k": 2, "a": "y", "j": 2, "b": "p"}])
    );

    let result = execute("FROM l |> JOIN none ON k = k", data).unwrap();
    assert!(result.is_empty());
}

#[test]
fn distinct_is_idempotent() {
    let table = rows(json!([{"a": 1}, {"a": 1}, {"a": 2}, {"a": 1, "b": null}]));
    let once = operators::distinct(&table);
    assert_eq!(once.len(), 3);
    assert_eq!(operators::distinct(&once), once);
}

#[test]
fn except_with_itself_is_empty() {
    let table = rows(json!([{"a": 1}, {"a": 2}, {"a": 2}]));
    assert!(operators::except(&table, &table).is_empty());
}

#[test]
fn offset_past_the_end_is_empty_not_an_error() {
    let table = rows(json!([{"a": 1}, {"a": 2}]));
    for offset in [2, 3, 1000] {
        assert!(operators::limit(&table, 5, offset).is_empty());
    }
    assert_eq!(operators::limit(&table, 5, 1), vec![table[1].clone()]);
}

#[test]
fn stages_do_not_modify_their_input() {
    let table = rows(json!([{"a": 2}, {"a": 1}]));
    let snapshot = table.clone();
    let _ = operators::distinct(&table);
    let _ = operators::limit(&table, 1, 0);
    let _ = operators::union(&table, &table);
    assert_eq!(table, snapshot);
    assert_eq!(table[0]["a"], Value::Integer(2));
}

// ============================================================================
// Error scenarios
// ============================================================================

#[test]
fn unterminated_string_is_reported() {
    let err = scan("'hello").unwrap_err();
    assert_eq!(err.kind, LexErrorKind::UnterminatedString);
    assert!(err.to_string().starts_with("Unterminated string"));
}

#[test]
fn unexpected_character_is_reported() {
    let err = scan("SELECT @").unwrap_err();
    assert!(err.to_string().contains("Unexpected character: @"));
}

#[test]
fn malformed_exponent_is_reported() {
    let err = scan("1.2e").unwrap_err();
    assert_eq!(err.kind, LexErrorKind::InvalidNumberFormat);
    assert!(err.to_string().starts_with("Invalid number format"));
}
