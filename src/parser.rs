use tracing::debug;

use crate::{
    ast::{
        AggregateColumn, BinOp, CreateFunctionStmt, DataType, Expr, FunctionModifier,
        FunctionParam, OrderByColumn, QueryStmt, Rename, SelectColumn, SortDirection, Stmt, Token,
        TokenKind, UnaryOp,
    },
    value::Value,
};

/// A grammar violation at a specific token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("[line {line}:{col}] Error at {}: {message}", location(.lexeme))]
pub struct ParseError {
    pub message: String,
    /// Offending token text; empty at end of input
    pub lexeme: String,
    pub line: usize,
    pub col: usize,
}

impl ParseError {
    fn at(token: &Token, message: impl Into<String>) -> Self {
        ParseError {
            message: message.into(),
            lexeme: token.lexeme.clone(),
            line: token.line,
            col: token.col,
        }
    }
}

fn location(lexeme: &str) -> String {
    if lexeme.is_empty() {
        "end".to_string()
    } else {
        format!("'{lexeme}'")
    }
}

type ParseResult<T> = Result<T, ParseError>;

/// Recursive-descent parser over a scanned token sequence.
///
/// Each binary precedence tier is one method that loops over operators of
/// its tier and delegates operands to the next tighter tier, so every
/// binary operator is left-associative.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            let (line, col) = tokens.last().map_or((1, 1), |t| (t.line, t.col));
            tokens.push(Token::new(TokenKind::Eof, "", None, line, col));
        }
        Parser { tokens, current: 0 }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn peek_next_kind(&self) -> TokenKind {
        self.tokens
            .get(self.current + 1)
            .map_or(TokenKind::Eof, |t| t.kind)
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous().clone()
    }

    fn match_kind(&mut self, kinds: &[TokenKind]) -> bool {
        if kinds.iter().any(|k| self.check(*k)) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> ParseResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(message))
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::at(self.peek(), message)
    }

    /// Consumes an identifier (plain or quoted) and returns its name.
    ///
    /// Data-type keywords double as names, so columns such as `date` work.
    fn consume_name(&mut self, message: &str) -> ParseResult<String> {
        let token = self.peek();
        if token.kind == TokenKind::Identifier || token.kind.is_data_type() {
            Ok(self.advance().name())
        } else {
            Err(self.error(message))
        }
    }

    /// Skips tokens up to the start of the next statement: just past a `;`,
    /// or at the next `|>`, `FROM` or `CREATE`.
    pub fn synchronize(&mut self) {
        while !self.is_at_end() {
            if matches!(
                self.peek().kind,
                TokenKind::PipeGreater | TokenKind::From | TokenKind::Create
            ) {
                return;
            }
            if self.advance().kind == TokenKind::Semicolon {
                return;
            }
        }
    }

    // ========================================
    // Statements
    // ========================================

    /// Parse a complete query. Fails on the first grammar violation.
    pub fn parse(&mut self) -> ParseResult<QueryStmt> {
        let mut statements = vec![];
        while !self.is_at_end() {
            if self.match_kind(&[TokenKind::Semicolon]) {
                continue;
            }
            statements.push(self.statement()?);
        }
        debug!(statements = statements.len(), "parsed query");
        Ok(QueryStmt::new(statements))
    }

    /// Parse a complete query, collecting every error instead of stopping
    /// at the first.
    ///
    /// After an error the parser resynchronizes at the next statement
    /// boundary. Any error means no tree is returned.
    pub fn parse_recovering(&mut self) -> Result<QueryStmt, Vec<ParseError>> {
        let mut statements = vec![];
        let mut errors = vec![];
        while !self.is_at_end() {
            if self.match_kind(&[TokenKind::Semicolon]) {
                continue;
            }
            let start = self.current;
            match self.statement() {
                Ok(stmt) => statements.push(stmt),
                Err(e) => {
                    errors.push(e);
                    if self.current == start {
                        self.advance();
                    }
                    self.synchronize();
                }
            }
        }

        if errors.is_empty() {
            Ok(QueryStmt::new(statements))
        } else {
            Err(errors)
        }
    }

    /// Parse the whole input as a single expression.
    pub fn parse_expression(&mut self) -> ParseResult<Expr> {
        let expr = self.expression()?;
        if !self.is_at_end() {
            return Err(self.error("Expect end of expression."));
        }
        Ok(expr)
    }

    fn statement(&mut self) -> ParseResult<Stmt> {
        match self.peek().kind {
            TokenKind::From => {
                self.advance();
                let table = self.consume_name("Expect table name after 'FROM'.")?;
                Ok(Stmt::From(table))
            }
            TokenKind::Create => self.create_function().map(Stmt::CreateFunction),
            TokenKind::PipeGreater => {
                self.advance();
                self.pipe_statement()
            }
            _ => self.expression().map(Stmt::Expression),
        }
    }

    fn pipe_statement(&mut self) -> ParseResult<Stmt> {
        let operator = self.advance();
        match operator.kind {
            TokenKind::Select => Ok(Stmt::Select(self.select_columns()?)),
            TokenKind::Where => Ok(Stmt::Where(self.expression()?)),
            TokenKind::Aggregate => self.aggregate(),
            TokenKind::Extend => Ok(Stmt::Extend(self.select_columns()?)),
            TokenKind::Rename => self.rename(),
            TokenKind::Order => {
                self.consume(TokenKind::By, "Expect 'BY' after 'ORDER'.")?;
                self.order_by()
            }
            TokenKind::Limit => {
                let count = self.expression()?;
                let offset = if self.match_kind(&[TokenKind::Offset]) {
                    Some(self.expression()?)
                } else {
                    None
                };
                Ok(Stmt::Limit { count, offset })
            }
            TokenKind::Distinct => Ok(Stmt::Distinct),
            TokenKind::Inner => {
                self.consume(TokenKind::Join, "Expect 'JOIN' after 'INNER'.")?;
                self.join()
            }
            TokenKind::Join => self.join(),
            TokenKind::Union => Ok(Stmt::Union(
                self.consume_name("Expect table name after 'UNION'.")?,
            )),
            TokenKind::Except => Ok(Stmt::Except(
                self.consume_name("Expect table name after 'EXCEPT'.")?,
            )),
            TokenKind::Set => Ok(Stmt::Set(self.consume_name("Expect name after 'SET'.")?)),
            TokenKind::As => Ok(Stmt::As(self.consume_name("Expect name after 'AS'.")?)),
            TokenKind::Call => {
                let name = self.consume_name("Expect procedure name after 'CALL'.")?;
                self.consume(TokenKind::LeftParen, "Expect '(' after procedure name.")?;
                let args = self.arguments()?;
                Ok(Stmt::Call { name, args })
            }
            TokenKind::Left | TokenKind::Right | TokenKind::Full | TokenKind::Cross => Err(
                ParseError::at(&operator, "Only inner joins are supported."),
            ),
            _ => Err(ParseError::at(&operator, "Expect pipe operator after '|>'.")),
        }
    }

    fn select_columns(&mut self) -> ParseResult<Vec<SelectColumn>> {
        let mut columns = vec![];
        loop {
            let expression = self.expression()?;
            let alias = if self.match_kind(&[TokenKind::As]) {
                Some(self.consume_name("Expect column alias after 'AS'.")?)
            } else {
                None
            };
            columns.push(SelectColumn { expression, alias });

            if !self.match_kind(&[TokenKind::Comma]) {
                return Ok(columns);
            }
        }
    }

    fn aggregate(&mut self) -> ParseResult<Stmt> {
        let mut columns = vec![];
        loop {
            let start = self.peek().clone();
            let expression = self.expression()?;
            if !matches!(expression, Expr::Call { .. }) {
                return Err(ParseError::at(&start, "Expect aggregate function call."));
            }
            self.consume(TokenKind::As, "Expect 'AS' after aggregate function.")?;
            let alias = self.consume_name("Expect alias after 'AS'.")?;
            columns.push(AggregateColumn { expression, alias });

            if !self.match_kind(&[TokenKind::Comma]) {
                break;
            }
        }

        let mut group_by = vec![];
        if self.match_kind(&[TokenKind::Group]) {
            self.consume(TokenKind::By, "Expect 'BY' after 'GROUP'.")?;
            loop {
                let start = self.peek().clone();
                match self.expression()? {
                    Expr::Variable(name) => group_by.push(name),
                    _ => return Err(ParseError::at(&start, "Expect column name in GROUP BY.")),
                }
                if !self.match_kind(&[TokenKind::Comma]) {
                    break;
                }
            }
        }

        Ok(Stmt::Aggregate { columns, group_by })
    }

    fn rename(&mut self) -> ParseResult<Stmt> {
        let mut renames = vec![];
        loop {
            let from = self.consume_name("Expect column name after 'RENAME'.")?;
            self.consume(TokenKind::As, "Expect 'AS' after column name.")?;
            let to = self.consume_name("Expect new column name after 'AS'.")?;
            renames.push(Rename { from, to });

            if !self.match_kind(&[TokenKind::Comma]) {
                return Ok(Stmt::Rename(renames));
            }
        }
    }

    fn order_by(&mut self) -> ParseResult<Stmt> {
        let mut columns = vec![];
        loop {
            let expression = self.expression()?;
            let direction = if self.match_kind(&[TokenKind::Desc]) {
                SortDirection::Desc
            } else {
                self.match_kind(&[TokenKind::Asc]);
                SortDirection::Asc
            };
            columns.push(OrderByColumn {
                expression,
                direction,
            });

            if !self.match_kind(&[TokenKind::Comma]) {
                return Ok(Stmt::OrderBy(columns));
            }
        }
    }

    fn join(&mut self) -> ParseResult<Stmt> {
        let table = self.consume_name("Expect table name after 'JOIN'.")?;
        self.consume(TokenKind::On, "Expect 'ON' after join table.")?;
        // Join conditions bind at the equality tier: no bare AND/OR.
        let on = self.equality()?;
        Ok(Stmt::Join { table, on })
    }

    fn create_function(&mut self) -> ParseResult<CreateFunctionStmt> {
        self.consume(TokenKind::Create, "Expect 'CREATE'.")?;

        let mut modifiers = vec![];
        loop {
            let modifier = match self.peek().kind {
                TokenKind::Temp => FunctionModifier::Temp,
                TokenKind::Private => FunctionModifier::Private,
                TokenKind::Public => FunctionModifier::Public,
                _ => break,
            };
            self.advance();
            modifiers.push(modifier);
        }

        self.consume(TokenKind::Function, "Expect 'FUNCTION' after 'CREATE'.")?;
        let name = self.consume_name("Expect function name.")?;

        self.consume(TokenKind::LeftParen, "Expect '(' after function name.")?;
        let mut params = vec![];
        if !self.check(TokenKind::RightParen) {
            loop {
                let name = self.consume_name("Expect parameter name.")?;
                let data_type = self.data_type()?;
                params.push(FunctionParam { name, data_type });
                if !self.match_kind(&[TokenKind::Comma]) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expect ')' after parameters.")?;

        self.consume(TokenKind::Returns, "Expect 'RETURNS' after parameters.")?;
        let return_type = self.data_type()?;

        self.consume(TokenKind::As, "Expect 'AS' before function body.")?;
        self.consume(TokenKind::LeftParen, "Expect '(' before function body.")?;
        let body = self.expression()?;
        self.consume(TokenKind::RightParen, "Expect ')' after function body.")?;

        if !self.is_at_end() {
            self.consume(TokenKind::Semicolon, "Expect ';' after function definition.")?;
        }

        Ok(CreateFunctionStmt {
            modifiers,
            name,
            params,
            return_type,
            body,
        })
    }

    fn data_type(&mut self) -> ParseResult<DataType> {
        let data_type = match self.peek().kind {
            TokenKind::Array => {
                self.advance();
                if self.match_kind(&[TokenKind::Less]) {
                    let element = self.data_type()?;
                    self.close_angle()?;
                    return Ok(DataType::Array(Some(Box::new(element))));
                }
                return Ok(DataType::Array(None));
            }
            TokenKind::Bool => DataType::Bool,
            TokenKind::Bytes => DataType::Bytes,
            TokenKind::Date => DataType::Date,
            TokenKind::Datetime => DataType::Datetime,
            TokenKind::Time => DataType::Time,
            TokenKind::Timestamp => DataType::Timestamp,
            TokenKind::Struct => DataType::Struct,
            TokenKind::StringType => DataType::String,
            TokenKind::Json => DataType::Json,
            TokenKind::Int64 => DataType::Int64,
            TokenKind::Numeric => DataType::Numeric,
            TokenKind::Float64 => DataType::Float64,
            _ => return Err(self.error("Expect data type.")),
        };
        self.advance();
        Ok(data_type)
    }

    /// Closes an `ARRAY<...>`, splitting a `>>` token for nested arrays.
    fn close_angle(&mut self) -> ParseResult<()> {
        if self.check(TokenKind::ShiftRight) {
            let token = &mut self.tokens[self.current];
            token.kind = TokenKind::Greater;
            token.lexeme = ">".to_string();
            token.col += 1;
            return Ok(());
        }
        self.consume(TokenKind::Greater, "Expect '>' after array element type.")?;
        Ok(())
    }

    // ========================================
    // Expressions, lowest to highest binding
    // ========================================

    fn expression(&mut self) -> ParseResult<Expr> {
        self.or()
    }

    fn or(&mut self) -> ParseResult<Expr> {
        let mut left = self.and()?;
        while self.match_kind(&[TokenKind::Or]) {
            let right = self.and()?;
            left = Expr::binary(left, BinOp::Or, right);
        }
        Ok(left)
    }

    fn and(&mut self) -> ParseResult<Expr> {
        let mut left = self.equality()?;
        while self.match_kind(&[TokenKind::And]) {
            let right = self.equality()?;
            left = Expr::binary(left, BinOp::And, right);
        }
        Ok(left)
    }

    fn equality(&mut self) -> ParseResult<Expr> {
        let mut left = self.comparison()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::EqualEqual | TokenKind::Equal => BinOp::Equal,
                TokenKind::BangEqual | TokenKind::LessGreater => BinOp::NotEqual,
                _ => break,
            };
            self.advance();
            let right = self.comparison()?;
            left = Expr::binary(left, op, right);
        }
        Ok(left)
    }

    fn comparison(&mut self) -> ParseResult<Expr> {
        let mut left = self.additive()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Greater => BinOp::GreaterThan,
                TokenKind::GreaterEqual => BinOp::GreaterEqual,
                TokenKind::Less => BinOp::LessThan,
                TokenKind::LessEqual => BinOp::LessEqual,
                TokenKind::Like | TokenKind::Between | TokenKind::Is | TokenKind::Not => {
                    left = self.predicate(left)?;
                    continue;
                }
                _ => break,
            };
            self.advance();
            let right = self.additive()?;
            left = Expr::binary(left, op, right);
        }
        Ok(left)
    }

    /// `[NOT] LIKE`, `[NOT] BETWEEN` and `IS [NOT] NULL` suffixes.
    fn predicate(&mut self, left: Expr) -> ParseResult<Expr> {
        if self.match_kind(&[TokenKind::Is]) {
            let negated = self.match_kind(&[TokenKind::Not]);
            self.consume(TokenKind::Null, "Expect 'NULL' after 'IS'.")?;
            let test = Expr::binary(left, BinOp::Is, Expr::Literal(Value::Null));
            return Ok(negate_if(negated, test));
        }

        let negated = self.check(TokenKind::Not);
        if negated {
            if !matches!(self.peek_next_kind(), TokenKind::Like | TokenKind::Between) {
                return Err(self.error("Expect 'LIKE' or 'BETWEEN' after 'NOT'."));
            }
            self.advance();
        }

        let test = if self.match_kind(&[TokenKind::Like]) {
            let pattern = self.additive()?;
            Expr::binary(left, BinOp::Like, pattern)
        } else {
            self.consume(TokenKind::Between, "Expect 'BETWEEN'.")?;
            let low = self.additive()?;
            self.consume(TokenKind::And, "Expect 'AND' in BETWEEN.")?;
            let high = self.additive()?;
            Expr::binary(
                Expr::binary(left.clone(), BinOp::GreaterEqual, low),
                BinOp::And,
                Expr::binary(left, BinOp::LessEqual, high),
            )
        };
        Ok(negate_if(negated, test))
    }

    fn additive(&mut self) -> ParseResult<Expr> {
        let mut left = self.multiplicative()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Subtract,
                TokenKind::PipePipe => BinOp::Concat,
                _ => break,
            };
            self.advance();
            let right = self.multiplicative()?;
            left = Expr::binary(left, op, right);
        }
        Ok(left)
    }

    fn multiplicative(&mut self) -> ParseResult<Expr> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinOp::Multiply,
                TokenKind::Slash => BinOp::Divide,
                _ => break,
            };
            self.advance();
            let right = self.unary()?;
            left = Expr::binary(left, op, right);
        }
        Ok(left)
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        let op = match self.peek().kind {
            TokenKind::Bang | TokenKind::Not => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Negate,
            _ => return self.call(),
        };
        self.advance();
        let operand = self.unary()?;
        Ok(Expr::unary(op, operand))
    }

    fn call(&mut self) -> ParseResult<Expr> {
        let mut expr = if self.check(TokenKind::Cast) || self.check(TokenKind::SafeCast) {
            self.cast()?
        } else {
            self.primary()?
        };

        loop {
            if self.match_kind(&[TokenKind::LeftParen]) {
                let args = self.arguments()?;
                expr = Expr::call(expr, args);
            } else if self.match_kind(&[TokenKind::Dot]) {
                let field = self.consume_name("Expect field name after '.'.")?;
                expr = Expr::Get {
                    object: Box::new(expr),
                    field,
                };
            } else {
                return Ok(expr);
            }
        }
    }

    /// `CAST(expr AS type)` / `SAFE_CAST(expr AS type)`.
    ///
    /// Produces a call whose second argument names the target type.
    fn cast(&mut self) -> ParseResult<Expr> {
        let callee = self.advance().lexeme.to_ascii_uppercase();
        self.consume(TokenKind::LeftParen, "Expect '(' after CAST.")?;
        let value = self.expression()?;
        self.consume(TokenKind::As, "Expect 'AS' in CAST.")?;
        if !self.peek().kind.is_data_type() {
            return Err(self.error("Expect data type."));
        }
        let target = self.advance().lexeme.to_ascii_uppercase();
        self.consume(TokenKind::RightParen, "Expect ')' after CAST type.")?;
        Ok(Expr::call(
            Expr::Variable(callee),
            vec![value, Expr::Variable(target)],
        ))
    }

    /// Comma-separated arguments after an opening `(`, through the closing `)`.
    ///
    /// A lone `*` (as in `COUNT(*)`) means no arguments.
    fn arguments(&mut self) -> ParseResult<Vec<Expr>> {
        let mut args = vec![];
        if self.check(TokenKind::Star) && self.peek_next_kind() == TokenKind::RightParen {
            self.advance();
        } else if !self.check(TokenKind::RightParen) {
            loop {
                args.push(self.expression()?);
                if !self.match_kind(&[TokenKind::Comma]) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expect ')' after arguments.")?;
        Ok(args)
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        let token = self.peek().clone();
        let expr = match token.kind {
            TokenKind::True => Expr::Literal(Value::Boolean(true)),
            TokenKind::False => Expr::Literal(Value::Boolean(false)),
            TokenKind::Null => Expr::Literal(Value::Null),
            TokenKind::Number | TokenKind::String => {
                Expr::Literal(token.literal.clone().unwrap_or_default())
            }
            TokenKind::Identifier => Expr::Variable(token.name()),
            kind if kind.is_data_type() => Expr::Variable(token.lexeme.clone()),
            TokenKind::LeftParen => {
                self.advance();
                let inner = self.expression()?;
                self.consume(TokenKind::RightParen, "Expect ')' after expression.")?;
                return Ok(Expr::Grouping(Box::new(inner)));
            }
            TokenKind::Case => {
                self.advance();
                return self.case();
            }
            _ => return Err(self.error("Expect expression.")),
        };
        self.advance();
        Ok(expr)
    }

    fn case(&mut self) -> ParseResult<Expr> {
        let mut cases = vec![];
        loop {
            self.consume(TokenKind::When, "Expect 'WHEN' in CASE expression.")?;
            let condition = self.expression()?;
            self.consume(TokenKind::Then, "Expect 'THEN' after CASE condition.")?;
            let result = self.expression()?;
            cases.push((condition, result));
            if !self.check(TokenKind::When) {
                break;
            }
        }

        let else_branch = if self.match_kind(&[TokenKind::Else]) {
            Some(Box::new(self.expression()?))
        } else {
            None
        };
        self.consume(TokenKind::End, "Expect 'END' after CASE expression.")?;

        Ok(Expr::Case { cases, else_branch })
    }
}

fn negate_if(negated: bool, expr: Expr) -> Expr {
    if negated {
        Expr::unary(UnaryOp::Not, expr)
    } else {
        expr
    }
}

/// Parses scanned tokens into a query tree.
pub fn parse(tokens: Vec<Token>) -> Result<QueryStmt, ParseError> {
    Parser::new(tokens).parse()
}
