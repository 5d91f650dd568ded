use crate::value::Value;

/// The kind of a lexical token.
///
/// Kinds carry no payload; the text of the token lives in [`Token::lexeme`]
/// and decoded literal values in [`Token::literal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Single-character punctuation
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    Dot,
    Minus,
    Plus,
    Semicolon,
    Slash,
    Star,
    Bang,
    Equal,
    Less,
    Greater,
    Ampersand,
    Pipe,
    Caret,
    Tilde,

    // Multi-character operators
    /// Pipe operator (`|>`)
    ///
    /// Introduces every stage after the leading `FROM`.
    ///
    /// # Examples
    /// ```text
    /// FROM sales |> WHERE amount > 10 |> SELECT product
    /// ```
    PipeGreater,
    EqualEqual,
    BangEqual,
    /// SQL-style inequality (`<>`)
    LessGreater,
    LessEqual,
    GreaterEqual,
    ShiftLeft,
    ShiftRight,
    /// String concatenation (`||`)
    PipePipe,

    // Literals
    /// Plain (`name`) or back-tick quoted (`` `my table` ``) identifier.
    ///
    /// Quoted identifiers carry their unquoted text as the token literal.
    Identifier,
    /// Single-quoted string; the decoded text is the token literal.
    String,
    /// Numeric literal, always decoded to a float literal.
    Number,

    // Keywords
    Aggregate,
    And,
    As,
    Asc,
    Between,
    By,
    Call,
    Case,
    Cast,
    Create,
    Cross,
    Desc,
    Distinct,
    Else,
    End,
    Except,
    Extend,
    False,
    From,
    Full,
    Function,
    Group,
    If,
    In,
    Inner,
    Is,
    Join,
    Left,
    Like,
    Limit,
    Not,
    Null,
    Offset,
    On,
    Or,
    Order,
    Outer,
    Private,
    Public,
    Rename,
    Returns,
    Right,
    SafeCast,
    Select,
    Set,
    Table,
    Temp,
    Then,
    True,
    Union,
    When,
    Where,
    With,

    // Data type keywords
    Array,
    /// `BOOL` or `BOOLEAN`
    Bool,
    Bytes,
    Date,
    Datetime,
    Time,
    Timestamp,
    Struct,
    /// The `STRING` type keyword (not a string literal)
    StringType,
    Json,
    /// `INT64`, `INT`, `INTEGER`, `SMALLINT`, `BIGINT`, `TINYINT`, `BYTEINT`
    Int64,
    /// `NUMERIC`, `DECIMAL`, `BIGNUMERIC`, `BIGDECIMAL`
    Numeric,
    Float64,

    /// End of input
    Eof,
}

impl TokenKind {
    /// Looks up a keyword, ignoring ASCII case.
    ///
    /// Returns `None` for plain identifiers.
    pub fn keyword(ident: &str) -> Option<TokenKind> {
        use TokenKind::*;
        let kind = match ident.to_ascii_lowercase().as_str() {
            "aggregate" => Aggregate,
            "and" => And,
            "as" => As,
            "asc" => Asc,
            "between" => Between,
            "by" => By,
            "call" => Call,
            "case" => Case,
            "cast" => Cast,
            "create" => Create,
            "cross" => Cross,
            "desc" => Desc,
            "distinct" => Distinct,
            "else" => Else,
            "end" => End,
            "except" => Except,
            "extend" => Extend,
            "false" => False,
            "from" => From,
            "full" => Full,
            "function" => Function,
            "group" => Group,
            "if" => If,
            "in" => In,
            "inner" => Inner,
            "is" => Is,
            "join" => Join,
            "left" => Left,
            "like" => Like,
            "limit" => Limit,
            "not" => Not,
            "null" | "nil" => Null,
            "offset" => Offset,
            "on" => On,
            "or" => Or,
            "order" => Order,
            "outer" => Outer,
            "private" => Private,
            "public" => Public,
            "rename" => Rename,
            "returns" => Returns,
            "right" => Right,
            "safe_cast" => SafeCast,
            "select" => Select,
            "set" => Set,
            "table" => Table,
            "temp" => Temp,
            "then" => Then,
            "true" => True,
            "union" => Union,
            "when" => When,
            "where" => Where,
            "with" => With,
            "array" => Array,
            "bool" | "boolean" => Bool,
            "bytes" => Bytes,
            "date" => Date,
            "datetime" => Datetime,
            "time" => Time,
            "timestamp" => Timestamp,
            "struct" => Struct,
            "string" => StringType,
            "json" => Json,
            "int64" | "int" | "integer" | "smallint" | "bigint" | "tinyint" | "byteint" => Int64,
            "numeric" | "decimal" | "bignumeric" | "bigdecimal" => Numeric,
            "float64" => Float64,
            _ => return None,
        };
        Some(kind)
    }

    /// True for the keywords that name a data type.
    pub fn is_data_type(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Array
                | Bool
                | Bytes
                | Date
                | Datetime
                | Time
                | Timestamp
                | Struct
                | StringType
                | Json
                | Int64
                | Numeric
                | Float64
        )
    }
}

/// A single lexical token with its source position.
///
/// `lexeme` is the exact source text (original casing, quotes included);
/// `line` and `col` are 1-based and point at the first character.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub literal: Option<Value>,
    pub line: usize,
    pub col: usize,
}

impl Token {
    pub fn new(
        kind: TokenKind,
        lexeme: impl Into<String>,
        literal: Option<Value>,
        line: usize,
        col: usize,
    ) -> Self {
        Token {
            kind,
            lexeme: lexeme.into(),
            literal,
            line,
            col,
        }
    }

    /// The name this token denotes when used as an identifier.
    ///
    /// Quoted identifiers yield their unquoted text, everything else its lexeme.
    pub fn name(&self) -> String {
        match &self.literal {
            Some(Value::String(s)) if self.kind == TokenKind::Identifier => s.clone(),
            _ => self.lexeme.clone(),
        }
    }
}
