// tests/operator_tests.rs

use pipeql::aggregates::AggregateRegistry;
use pipeql::ast::{
    AggregateColumn, Expr, OrderByColumn, Rename, SelectColumn, SortDirection,
};
use pipeql::operators::{self, RowEvaluator};
use pipeql::{DataContext, DataRow, DataTable, EvalError, Interpreter, Parser, Value, scan};

fn row(pairs: &[(&str, Value)]) -> DataRow {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn sales() -> DataTable {
    vec![
        row(&[("product", "apple".into()), ("amount", Value::Integer(10))]),
        row(&[("product", "banana".into()), ("amount", Value::Integer(15))]),
        row(&[("product", "apple".into()), ("amount", Value::Integer(20))]),
    ]
}

fn expr(source: &str) -> Expr {
    Parser::new(scan(source).unwrap())
        .parse_expression()
        .unwrap()
}

fn column(source: &str, alias: Option<&str>) -> SelectColumn {
    SelectColumn {
        expression: expr(source),
        alias: alias.map(str::to_string),
    }
}

fn aggregate_column(source: &str, alias: &str) -> AggregateColumn {
    AggregateColumn {
        expression: expr(source),
        alias: alias.to_string(),
    }
}

/// Evaluate with the interpreter against an empty context.
fn with_eval<T>(f: impl FnOnce(&RowEvaluator<'_>) -> T) -> T {
    let interpreter = Interpreter::new();
    let context = DataContext::new();
    f(&|e: &Expr, r: &DataRow| interpreter.evaluate(e, r, &context))
}

fn column_values(table: &[DataRow], name: &str) -> Vec<Value> {
    table
        .iter()
        .map(|r| r.get(name).cloned().unwrap_or_default())
        .collect()
}

// ============================================================================
// FROM
// ============================================================================

#[test]
fn test_from_returns_named_table() {
    let mut context = DataContext::new();
    context.insert("sales".into(), sales());
    assert_eq!(operators::from(&context, "sales").unwrap(), sales());
}

#[test]
fn test_from_missing_table() {
    let err = operators::from(&DataContext::new(), "nope").unwrap_err();
    assert_eq!(err, EvalError::TableNotFound("nope".into()));
    assert_eq!(err.to_string(), "Table not found: nope");
}

// ============================================================================
// SELECT / WHERE / EXTEND / RENAME
// ============================================================================

#[test]
fn test_select_names_columns() {
    let columns = vec![
        column("product", None),
        column("amount * 2", Some("doubled")),
        column("amount + 1", None),
    ];
    let result = with_eval(|eval| operators::select(&sales(), &columns, eval)).unwrap();

    assert_eq!(
        result[0],
        row(&[
            ("product", "apple".into()),
            ("doubled", Value::Integer(20)),
            ("computed", Value::Integer(11)),
        ])
    );
    assert_eq!(result.len(), 3);
}

#[test]
fn test_where_keeps_truthy_rows() {
    let result =
        with_eval(|eval| operators::where_(&sales(), &expr("amount > 10"), eval)).unwrap();
    assert_eq!(
        column_values(&result, "amount"),
        vec![Value::Integer(15), Value::Integer(20)]
    );
}

#[test]
fn test_where_truthiness() {
    let table = vec![
        row(&[("v", Value::Integer(0))]),
        row(&[("v", Value::Integer(2))]),
        row(&[("v", Value::from(""))]),
        row(&[("v", Value::from("x"))]),
        row(&[("v", Value::Null)]),
        row(&[]),
    ];
    let result = with_eval(|eval| operators::where_(&table, &expr("v"), eval)).unwrap();
    assert_eq!(
        column_values(&result, "v"),
        vec![Value::Integer(2), Value::from("x")]
    );
}

#[test]
fn test_extend_adds_and_overwrites() {
    let columns = vec![
        column("amount * 10", Some("amount")),
        column("amount", Some("original")),
    ];
    let result = with_eval(|eval| operators::extend(&sales(), &columns, eval)).unwrap();

    // Both columns see the input row, not each other.
    assert_eq!(
        result[1],
        row(&[
            ("product", "banana".into()),
            ("amount", Value::Integer(150)),
            ("original", Value::Integer(15)),
        ])
    );
}

#[test]
fn test_rename() {
    let renames = vec![
        Rename {
            from: "product".into(),
            to: "item".into(),
        },
        Rename {
            from: "missing".into(),
            to: "ghost".into(),
        },
    ];
    let result = operators::rename(&sales(), &renames);
    assert_eq!(
        result[0],
        row(&[("item", "apple".into()), ("amount", Value::Integer(10))])
    );
}

// ============================================================================
// AGGREGATE
// ============================================================================

#[test]
fn test_aggregate_groups_in_first_seen_order() {
    let columns = vec![aggregate_column("SUM(amount)", "total_sales")];
    let result = with_eval(|eval| {
        operators::aggregate(
            &sales(),
            &columns,
            &["product".to_string()],
            &AggregateRegistry::default(),
            eval,
        )
    })
    .unwrap();

    assert_eq!(
        result,
        vec![
            row(&[("product", "apple".into()), ("total_sales", Value::Integer(30))]),
            row(&[("product", "banana".into()), ("total_sales", Value::Integer(15))]),
        ]
    );
}

#[test]
fn test_aggregate_multiple_keys() {
    let table = vec![
        row(&[("a", "x".into()), ("b", Value::Integer(1))]),
        row(&[("a", "y".into()), ("b", Value::Integer(1))]),
        row(&[("a", "x".into()), ("b", Value::Integer(1))]),
        row(&[("a", "x".into()), ("b", Value::Integer(2))]),
    ];
    let result = with_eval(|eval| {
        operators::aggregate(
            &table,
            &[aggregate_column("COUNT()", "n")],
            &["a".to_string(), "b".to_string()],
            &AggregateRegistry::default(),
            eval,
        )
    })
    .unwrap();

    assert_eq!(
        column_values(&result, "n"),
        vec![Value::Integer(2), Value::Integer(1), Value::Integer(1)]
    );
    assert_eq!(
        column_values(&result, "a"),
        vec![Value::from("x"), Value::from("y"), Value::from("x")]
    );
}

#[test]
fn test_aggregate_without_groups_yields_one_row() {
    let columns = vec![
        aggregate_column("SUM(amount)", "total"),
        aggregate_column("COUNT(*)", "n"),
    ];
    let registry = AggregateRegistry::default();

    let result =
        with_eval(|eval| operators::aggregate(&sales(), &columns, &[], &registry, eval)).unwrap();
    assert_eq!(
        result,
        vec![row(&[("total", Value::Integer(45)), ("n", Value::Integer(3))])]
    );

    let empty = with_eval(|eval| operators::aggregate(&[], &columns, &[], &registry, eval)).unwrap();
    assert_eq!(
        empty,
        vec![row(&[("total", Value::Integer(0)), ("n", Value::Integer(0))])]
    );
}

#[test]
fn test_aggregate_with_groups_on_empty_table() {
    let result = with_eval(|eval| {
        operators::aggregate(
            &[],
            &[aggregate_column("COUNT()", "n")],
            &["product".to_string()],
            &AggregateRegistry::default(),
            eval,
        )
    })
    .unwrap();
    assert!(result.is_empty());
}

#[test]
fn test_unsupported_aggregate() {
    let err = with_eval(|eval| {
        operators::aggregate(
            &sales(),
            &[aggregate_column("AVG(amount)", "avg")],
            &[],
            &AggregateRegistry::default(),
            eval,
        )
    })
    .unwrap_err();
    assert_eq!(err, EvalError::UnsupportedAggregate("AVG".into()));
    assert_eq!(err.to_string(), "Unsupported aggregate function: AVG");
}

#[test]
fn test_registered_aggregate() {
    fn max(rows: &[Vec<Value>]) -> Result<Value, EvalError> {
        Ok(rows
            .iter()
            .filter_map(|args| args.first())
            .cloned()
            .max_by(|a, b| a.sort_cmp(b))
            .unwrap_or_default())
    }

    let mut registry = AggregateRegistry::default();
    registry.register("MAX", max);

    let result = with_eval(|eval| {
        operators::aggregate(
            &sales(),
            &[aggregate_column("max(amount)", "top")],
            &["product".to_string()],
            &registry,
            eval,
        )
    })
    .unwrap();
    assert_eq!(
        column_values(&result, "top"),
        vec![Value::Integer(20), Value::Integer(15)]
    );
}

// ============================================================================
// ORDER BY / LIMIT
// ============================================================================

#[test]
fn test_order_by_is_stable_and_multi_key() {
    let table = vec![
        row(&[("k", Value::Integer(2)), ("id", Value::Integer(1))]),
        row(&[("k", Value::Integer(1)), ("id", Value::Integer(2))]),
        row(&[("k", Value::Integer(2)), ("id", Value::Integer(3))]),
        row(&[("k", Value::Integer(1)), ("id", Value::Integer(4))]),
    ];

    let by_k = vec![OrderByColumn {
        expression: expr("k"),
        direction: SortDirection::Asc,
    }];
    let result = with_eval(|eval| operators::order_by(&table, &by_k, eval)).unwrap();
    assert_eq!(
        column_values(&result, "id"),
        vec![
            Value::Integer(2),
            Value::Integer(4),
            Value::Integer(1),
            Value::Integer(3)
        ]
    );

    let by_k_desc_then_id_desc = vec![
        OrderByColumn {
            expression: expr("k"),
            direction: SortDirection::Desc,
        },
        OrderByColumn {
            expression: expr("id"),
            direction: SortDirection::Desc,
        },
    ];
    let result =
        with_eval(|eval| operators::order_by(&table, &by_k_desc_then_id_desc, eval)).unwrap();
    assert_eq!(
        column_values(&result, "id"),
        vec![
            Value::Integer(3),
            Value::Integer(1),
            Value::Integer(4),
            Value::Integer(2)
        ]
    );
}

#[test]
fn test_order_by_puts_nulls_first() {
    let table = vec![
        row(&[("v", Value::Integer(3))]),
        row(&[("v", Value::Null)]),
        row(&[("v", Value::Float(1.5))]),
    ];
    let columns = vec![OrderByColumn {
        expression: expr("v"),
        direction: SortDirection::Asc,
    }];
    let result = with_eval(|eval| operators::order_by(&table, &columns, eval)).unwrap();
    assert_eq!(
        column_values(&result, "v"),
        vec![Value::Null, Value::Float(1.5), Value::Integer(3)]
    );
}

#[test]
fn test_limit_boundaries() {
    let table = sales();
    assert_eq!(operators::limit(&table, 2, 0), table[..2].to_vec());
    assert_eq!(operators::limit(&table, 2, 2), table[2..].to_vec());
    assert_eq!(operators::limit(&table, 10, 0), table);
    assert!(operators::limit(&table, 0, 0).is_empty());
    assert!(operators::limit(&table, 5, 3).is_empty());
    assert!(operators::limit(&table, 5, 100).is_empty());
}

// ============================================================================
// DISTINCT / UNION / EXCEPT / JOIN
// ============================================================================

#[test]
fn test_distinct_keeps_first_occurrence() {
    let table = vec![
        row(&[("a", Value::Integer(1)), ("b", "x".into())]),
        row(&[("a", Value::Integer(2)), ("b", "x".into())]),
        row(&[("b", "x".into()), ("a", Value::Float(1.0))]),
    ];
    let result = operators::distinct(&table);
    assert_eq!(result, table[..2].to_vec());
    assert_eq!(operators::distinct(&result), result);
}

#[test]
fn test_union_keeps_duplicates() {
    let result = operators::union(&sales(), &sales());
    assert_eq!(result.len(), 6);
    assert_eq!(result[3], sales()[0]);
}

#[test]
fn test_except() {
    let table = sales();
    let right = vec![table[1].clone()];
    assert_eq!(
        operators::except(&table, &right),
        vec![table[0].clone(), table[2].clone()]
    );
    assert!(operators::except(&table, &table).is_empty());
    assert_eq!(operators::except(&table, &[]), table);
}

#[test]
fn test_join_emits_matching_pairs() {
    let orders = vec![
        row(&[("order_id", Value::Integer(1)), ("user_id", Value::Integer(10))]),
        row(&[("order_id", Value::Integer(2)), ("user_id", Value::Integer(20))]),
        row(&[("order_id", Value::Integer(3)), ("user_id", Value::Integer(10))]),
    ];
    let users = vec![
        row(&[("id", Value::Integer(10)), ("name", "ann".into())]),
        row(&[("id", Value::Integer(30)), ("name", "bob".into())]),
    ];

    let result =
        with_eval(|eval| operators::join(&orders, &users, &expr("user_id = id"), eval)).unwrap();
    assert_eq!(
        column_values(&result, "order_id"),
        vec![Value::Integer(1), Value::Integer(3)]
    );
    assert_eq!(
        result[0],
        row(&[
            ("order_id", Value::Integer(1)),
            ("user_id", Value::Integer(10)),
            ("id", Value::Integer(10)),
            ("name", "ann".into()),
        ])
    );
}

#[test]
fn test_join_right_columns_shadow_left() {
    let left = vec![row(&[("id", Value::Integer(1)), ("v", "left".into())])];
    let right = vec![row(&[("v", "right".into())])];
    let result =
        with_eval(|eval| operators::join(&left, &right, &expr("v = 'right'"), eval)).unwrap();
    assert_eq!(
        result,
        vec![row(&[("id", Value::Integer(1)), ("v", "right".into())])]
    );
}

#[test]
fn test_join_with_empty_side() {
    let on = expr("TRUE");
    let empty = with_eval(|eval| operators::join(&sales(), &[], &on, eval)).unwrap();
    assert!(empty.is_empty());
    let empty = with_eval(|eval| operators::join(&[], &sales(), &on, eval)).unwrap();
    assert!(empty.is_empty());
}
