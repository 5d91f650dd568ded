use tracing::trace;

use crate::{
    ast::{Token, TokenKind},
    value::Value,
};

/// A 1-based line/column location in the query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

/// What went wrong while scanning.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexErrorKind {
    #[error("Unterminated string")]
    UnterminatedString,

    #[error("Unterminated quoted identifier")]
    UnterminatedQuotedIdentifier,

    #[error("Unterminated block comment")]
    UnterminatedBlockComment,

    #[error("Invalid number format")]
    InvalidNumberFormat,

    #[error("Unexpected character: {0}")]
    UnexpectedCharacter(char),
}

/// A fatal scanning error, positioned at the start of the offending token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at line {}, column {}", position.line, position.col)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub position: Position,
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    col: usize,
    start: usize,
    start_pos: Position,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            col: 1,
            start: 0,
            start_pos: Position { line: 1, col: 1 },
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.current_char() {
            self.position += 1;
            if ch == '\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
        }
    }

    fn here(&self) -> Position {
        Position {
            line: self.line,
            col: self.col,
        }
    }

    fn error(&self, kind: LexErrorKind, position: Position) -> LexError {
        LexError { kind, position }
    }

    fn lexeme(&self) -> String {
        self.input[self.start..self.position].iter().collect()
    }

    fn token(&self, kind: TokenKind, literal: Option<Value>) -> Token {
        Token::new(
            kind,
            self.lexeme(),
            literal,
            self.start_pos.line,
            self.start_pos.col,
        )
    }

    /// Consumes `len` characters and emits a punctuation token.
    fn punct(&mut self, kind: TokenKind, len: usize) -> Token {
        for _ in 0..len {
            self.advance();
        }
        self.token(kind, None)
    }

    fn skip_line(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
    }

    /// Skips whitespace, `--`/`//`/`#` line comments and `/* */` block comments.
    fn skip_trivia(&mut self) -> Result<(), LexError> {
        loop {
            match (self.current_char(), self.peek_char(1)) {
                (Some(ch), _) if ch.is_whitespace() => self.advance(),
                (Some('-'), Some('-')) | (Some('/'), Some('/')) | (Some('#'), _) => {
                    self.skip_line()
                }
                (Some('/'), Some('*')) => {
                    let opened = self.here();
                    self.advance();
                    self.advance();
                    loop {
                        match (self.current_char(), self.peek_char(1)) {
                            (Some('*'), Some('/')) => {
                                self.advance();
                                self.advance();
                                break;
                            }
                            (Some(_), _) => self.advance(),
                            (None, _) => {
                                return Err(
                                    self.error(LexErrorKind::UnterminatedBlockComment, opened)
                                );
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn read_string(&mut self) -> Result<Token, LexError> {
        let mut result = String::new();
        self.advance(); // opening quote

        loop {
            match self.current_char() {
                None => {
                    return Err(self.error(LexErrorKind::UnterminatedString, self.start_pos));
                }
                Some('\'') => {
                    self.advance();
                    return Ok(self.token(TokenKind::String, Some(Value::String(result))));
                }
                Some('\\') => {
                    self.advance();
                    match self.current_char() {
                        Some('\'') => result.push('\''),
                        Some('\\') => result.push('\\'),
                        Some(other) => {
                            result.push('\\');
                            result.push(other);
                        }
                        None => {
                            return Err(
                                self.error(LexErrorKind::UnterminatedString, self.start_pos)
                            );
                        }
                    }
                    self.advance();
                }
                Some(ch) => {
                    result.push(ch);
                    self.advance();
                }
            }
        }
    }

    fn read_quoted_identifier(&mut self) -> Result<Token, LexError> {
        let mut name = String::new();
        self.advance(); // opening back-tick

        while let Some(ch) = self.current_char() {
            self.advance();
            if ch == '`' {
                return Ok(self.token(TokenKind::Identifier, Some(Value::String(name))));
            }
            name.push(ch);
        }

        Err(self.error(
            LexErrorKind::UnterminatedQuotedIdentifier,
            self.start_pos,
        ))
    }

    fn read_digits(&mut self) {
        while self.current_char().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    fn read_number(&mut self) -> Result<Token, LexError> {
        self.read_digits();

        if self.current_char() == Some('.') && self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
        {
            self.advance();
            self.read_digits();
        }

        if matches!(self.current_char(), Some('e' | 'E')) {
            self.advance();
            if matches!(self.current_char(), Some('+' | '-')) {
                self.advance();
            }
            if !self.current_char().is_some_and(|c| c.is_ascii_digit()) {
                return Err(self.error(LexErrorKind::InvalidNumberFormat, self.start_pos));
            }
            self.read_digits();
        }

        let number = self
            .lexeme()
            .parse::<f64>()
            .map_err(|_| self.error(LexErrorKind::InvalidNumberFormat, self.start_pos))?;
        Ok(self.token(TokenKind::Number, Some(Value::Float(number))))
    }

    fn read_identifier(&mut self) -> Token {
        while self
            .current_char()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.advance();
        }

        let kind = TokenKind::keyword(&self.lexeme()).unwrap_or(TokenKind::Identifier);
        self.token(kind, None)
    }

    /// Scans the next token, returning [`TokenKind::Eof`] once input is exhausted.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        use TokenKind::*;

        self.skip_trivia()?;
        self.start = self.position;
        self.start_pos = self.here();

        let Some(ch) = self.current_char() else {
            return Ok(self.token(Eof, None));
        };
        let next = self.peek_char(1);

        let token = match ch {
            '(' => self.punct(LeftParen, 1),
            ')' => self.punct(RightParen, 1),
            '{' => self.punct(LeftBrace, 1),
            '}' => self.punct(RightBrace, 1),
            '[' => self.punct(LeftBracket, 1),
            ']' => self.punct(RightBracket, 1),
            ',' => self.punct(Comma, 1),
            ';' => self.punct(Semicolon, 1),
            '+' => self.punct(Plus, 1),
            '-' => self.punct(Minus, 1),
            '*' => self.punct(Star, 1),
            '/' => self.punct(Slash, 1),
            '&' => self.punct(Ampersand, 1),
            '^' => self.punct(Caret, 1),
            '~' => self.punct(Tilde, 1),
            '|' => match next {
                Some('>') => self.punct(PipeGreater, 2),
                Some('|') => self.punct(PipePipe, 2),
                _ => self.punct(Pipe, 1),
            },
            '=' => match next {
                Some('=') => self.punct(EqualEqual, 2),
                _ => self.punct(Equal, 1),
            },
            '!' => match next {
                Some('=') => self.punct(BangEqual, 2),
                _ => self.punct(Bang, 1),
            },
            '<' => match next {
                Some('=') => self.punct(LessEqual, 2),
                Some('>') => self.punct(LessGreater, 2),
                Some('<') => self.punct(ShiftLeft, 2),
                _ => self.punct(Less, 1),
            },
            '>' => match next {
                Some('=') => self.punct(GreaterEqual, 2),
                Some('>') => self.punct(ShiftRight, 2),
                _ => self.punct(Greater, 1),
            },
            '.' if next.is_some_and(|c| c.is_ascii_digit()) => self.read_number()?,
            '.' => self.punct(Dot, 1),
            '\'' => self.read_string()?,
            '`' => self.read_quoted_identifier()?,
            c if c.is_ascii_digit() => self.read_number()?,
            c if c.is_ascii_alphabetic() || c == '_' => self.read_identifier(),
            c => {
                return Err(self.error(LexErrorKind::UnexpectedCharacter(c), self.start_pos));
            }
        };

        Ok(token)
    }

    /// Scans the whole input. The result always ends with an `Eof` token.
    pub fn scan_tokens(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        trace!(count = tokens.len(), "scanned tokens");
        Ok(tokens)
    }
}

/// Scans `source` into tokens terminated by `Eof`.
pub fn scan(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).scan_tokens()
}

#[test]
fn test_keywords() {
    let kinds: Vec<TokenKind> = scan("and OR Select nil")
        .unwrap()
        .into_iter()
        .map(|t| t.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::And,
            TokenKind::Or,
            TokenKind::Select,
            TokenKind::Null,
            TokenKind::Eof
        ]
    );
}

#[test]
fn test_pipe() {
    let mut lexer = Lexer::new("FROM t |> WHERE x > 5");
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::From);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Identifier);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::PipeGreater);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Where);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Identifier);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Greater);
    let five = lexer.next_token().unwrap();
    assert_eq!(five.literal, Some(Value::Float(5.0)));
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
}

#[test]
fn test_positions_track_newlines() {
    let tokens = scan("FROM t\n  |> DISTINCT").unwrap();
    assert_eq!((tokens[2].line, tokens[2].col), (2, 3));
    assert_eq!((tokens[3].line, tokens[3].col), (2, 6));
}
