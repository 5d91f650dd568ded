use crate::ast::Stmt;

/// Complete parsed query: the statements in source order.
///
/// Semantically begins with a [`Stmt::From`]; every later pipe stage
/// transforms the table produced by the stages before it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryStmt {
    pub statements: Vec<Stmt>,
}

impl QueryStmt {
    pub fn new(statements: Vec<Stmt>) -> Self {
        QueryStmt { statements }
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}
