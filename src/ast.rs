//! # pipeql - Abstract Syntax Tree
//!
//! This module defines the Abstract Syntax Tree (AST) for pipeql, a pipe-style
//! query language over in-memory tables.
//!
//! ## Architecture Overview
//!
//! The AST module is organized into focused submodules:
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[expressions]** - Expression nodes (literals, names, operations, calls, `CASE`)
//! - **[operators]** - Binary, unary and logical operators
//! - **[statements]** - Top-level statements and pipe stages
//! - **[query]** - The parse root, an ordered list of statements
//! - **[udf]** - `CREATE FUNCTION` definitions
//!
//! ## Quick Start
//!
//! ```text
//! FROM sales |> WHERE amount > 10 |> AGGREGATE SUM(amount) AS total GROUP BY product
//! ```
//!
//! This query keeps sales above 10 and totals them per product.
//!
//! ## Core Concepts
//!
//! ### Pipeline Structure
//!
//! Every query starts from a named table and chains stages with `|>`:
//!
//! ```text
//! FROM table |> stage |> stage |> ...
//! ```
//!
//! Each stage consumes the table produced so far and yields a new one; no
//! stage mutates its input.
//!
//! ### Dispatch
//!
//! Expressions and statements are closed enums. The interpreter matches on
//! them exhaustively, so adding a node kind is a compile error until every
//! consumer handles it.
//!
//! ## Examples
//!
//! ### Projection with aliases
//!
//! ```text
//! FROM users |> SELECT name, age * 12 AS months
//! ```
//!
//! ### Join and ordering
//!
//! ```text
//! FROM users |> JOIN orders ON id == user_id |> ORDER BY total DESC |> LIMIT 5
//! ```
//!
//! ### Materialising an intermediate table
//!
//! ```text
//! FROM sales |> WHERE amount > 100 |> AS big_sales
//! ```
pub mod expressions;
pub mod operators;
pub mod query;
pub mod statements;
pub mod tokens;
pub mod udf;

pub use expressions::Expr;
pub use operators::{BinOp, LogicalOp, UnaryOp};
pub use query::QueryStmt;
pub use statements::{
    AggregateColumn, OrderByColumn, Rename, SelectColumn, SortDirection, Stmt,
};
pub use tokens::{Token, TokenKind};
pub use udf::{CreateFunctionStmt, DataType, FunctionModifier, FunctionParam};
