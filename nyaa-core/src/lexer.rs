//! Scanner for Nyaa formulas.
//!
//! The scanner hands out one [`Token`] per call to [`Scanner::next_token`].
//! Literal payloads of the most recent token are read back through the
//! accessor methods, and exactly one token can be pushed back with
//! [`Scanner::unget_token`].
//!
//! Inside `{ ... }` the scanner switches to attribute-name rules: a name
//! runs until an unescaped `}`, `:`, `,`, `(` or `)`, and a backslash
//! takes the next character literally.

use std::fmt;

use crate::error::CoreError;
use crate::token::{Token, TokenKind};

/// Everything that describes "where the scanner is and what it just saw".
///
/// A pushed-back token is stored together with a copy of this state so
/// that re-delivering it also restores its payload.
#[derive(Debug, Clone, Default, PartialEq)]
struct ScanState {
    cursor: usize,
    token_start: usize,
    identifier_in_braces: bool,
    string_constant: String,
    float_constant: f64,
    boolean_constant: bool,
    identifier: String,
}

#[derive(Debug)]
struct Pending {
    token: Token,
    state: ScanState,
}

#[derive(Debug)]
pub struct Scanner<'src> {
    source: &'src str,
    state: ScanState,
    pending: Option<Pending>,
    error_msg: String,
    scanned: usize,
}

impl<'src> Scanner<'src> {
    pub fn new(source: &'src str) -> Self {
        Scanner {
            source,
            state: ScanState::default(),
            pending: None,
            error_msg: String::new(),
            scanned: 0,
        }
    }

    /// Returns the next token, or the pushed-back one if there is one.
    ///
    /// Lexical problems never abort scanning: they produce
    /// [`Token::ERROR`] and leave a message in [`Scanner::error_message`].
    pub fn next_token(&mut self) -> Token {
        if let Some(pending) = self.pending.take() {
            self.state = pending.state;
            return pending.token;
        }
        self.scanned += 1;

        self.skip_whitespace();
        self.state.token_start = self.state.cursor;

        let Some(ch) = self.peek_char() else {
            return Token::END_OF_SOURCE;
        };

        let single = match ch {
            ':' => {
                // separates an attribute name from its default value
                self.state.identifier_in_braces = false;
                Some(Token::COLON)
            }
            '{' => {
                self.state.identifier_in_braces = true;
                Some(Token::OPEN_BRACE)
            }
            '}' => {
                self.state.identifier_in_braces = false;
                Some(Token::CLOSE_BRACE)
            }
            '^' => Some(Token::CARET),
            '(' => Some(Token::OPEN_PAREN),
            ')' => Some(Token::CLOSE_PAREN),
            '+' => Some(Token::PLUS),
            '-' => Some(Token::MINUS),
            '/' => Some(Token::SLASH),
            '*' => Some(Token::STAR),
            '=' => Some(Token::EQUAL),
            '$' => Some(Token::DOLLAR),
            ',' => Some(Token::COMMA),
            '&' => Some(Token::AMPERSAND),
            _ => None,
        };
        if let Some(token) = single {
            self.bump(ch);
            return token;
        }

        if ch == '"' {
            return self.scan_string();
        }
        if !self.state.identifier_in_braces && (ch.is_ascii_digit() || ch == '.') {
            return self.scan_number();
        }

        match ch {
            '<' => {
                self.bump(ch);
                return match self.peek_char() {
                    Some('>') => {
                        self.bump('>');
                        Token::NOT_EQUAL
                    }
                    Some('=') => {
                        self.bump('=');
                        Token::LESS_OR_EQUAL
                    }
                    _ => Token::LESS,
                };
            }
            '>' => {
                self.bump(ch);
                return if self.peek_char() == Some('=') {
                    self.bump('=');
                    Token::GREATER_OR_EQUAL
                } else {
                    Token::GREATER
                };
            }
            _ => {}
        }

        if self.state.identifier_in_braces {
            return self.scan_braced_identifier();
        }
        if ch.is_alphabetic() {
            return self.scan_simple_identifier();
        }

        self.bump(ch);
        self.fail(format!("unexpected input character '{ch}'"))
    }

    /// Pushes `token` back so the next [`Scanner::next_token`] returns it.
    ///
    /// Only one token may be pending at a time.
    pub fn unget_token(&mut self, token: Token) -> Result<(), CoreError> {
        if self.pending.is_some() {
            return Err(CoreError::ScannerMisuse);
        }
        self.pending = Some(Pending {
            token,
            state: self.state.clone(),
        });
        Ok(())
    }

    /// Byte offset at which the current token started.
    pub fn start_pos(&self) -> usize {
        self.state.token_start
    }

    /// Byte offset just past the current token.
    pub fn position(&self) -> usize {
        self.state.cursor
    }

    pub fn string_constant(&self) -> &str {
        &self.state.string_constant
    }

    pub fn float_constant(&self) -> f64 {
        self.state.float_constant
    }

    pub fn boolean_constant(&self) -> bool {
        self.state.boolean_constant
    }

    pub fn identifier(&self) -> &str {
        &self.state.identifier
    }

    pub fn error_message(&self) -> &str {
        &self.error_msg
    }

    /// Tokens scanned so far; re-delivered pushbacks are not counted again.
    pub fn token_count(&self) -> usize {
        self.scanned
    }

    fn fail(&mut self, message: impl Into<String>) -> Token {
        self.error_msg = message.into();
        Token::ERROR
    }

    fn scan_string(&mut self) -> Token {
        self.bump('"');

        let mut value = String::new();
        let mut escaped = false;
        while let Some(ch) = self.peek_char() {
            self.bump(ch);
            if escaped {
                match ch {
                    '\\' => value.push('\\'),
                    '"' => value.push('"'),
                    'n' => value.push('\n'),
                    other => return self.fail(format!("unknown escape character '{other}'.")),
                }
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                self.state.string_constant = value;
                return Token::STRING_CONSTANT;
            } else {
                value.push(ch);
            }
        }

        self.fail("unterminated String constant.")
    }

    fn scan_number(&mut self) -> Token {
        let start = self.state.cursor;
        self.eat_digits();

        if self.peek_char() == Some('.') {
            self.bump('.');
            self.eat_digits();
        }

        if let Some(marker @ ('e' | 'E')) = self.peek_char() {
            self.bump(marker);
            match self.peek_char() {
                None => return self.fail("invalid numeric constant."),
                Some(sign @ ('+' | '-')) => self.bump(sign),
                Some(_) => {}
            }
            if !self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                return self.fail("missing digits in exponent.");
            }
            self.eat_digits();
        }

        match self.source[start..self.state.cursor].parse::<f64>() {
            Ok(value) => {
                self.state.float_constant = value;
                Token::FLOAT_CONSTANT
            }
            Err(_) => self.fail("invalid numeric constant."),
        }
    }

    fn scan_simple_identifier(&mut self) -> Token {
        let start = self.state.cursor;
        while let Some(ch) = self.peek_char() {
            if ch.is_alphanumeric() || ch == '_' {
                self.bump(ch);
            } else {
                break;
            }
        }
        let name = self.source[start..self.state.cursor].to_string();
        self.finish_identifier(name)
    }

    fn scan_braced_identifier(&mut self) -> Token {
        let mut name = String::new();
        let mut escaped = false;
        while let Some(ch) = self.peek_char() {
            if !escaped && matches!(ch, '}' | ':' | ',' | '(' | ')') {
                break;
            }
            self.bump(ch);
            if escaped {
                escaped = false;
                name.push(ch);
            } else if ch == '\\' {
                escaped = true;
            } else {
                name.push(ch);
            }
        }

        if escaped {
            return self.fail("invalid column name at end of formula.");
        }
        self.finish_identifier(name)
    }

    fn finish_identifier(&mut self, name: String) -> Token {
        if name.eq_ignore_ascii_case("TRUE") {
            self.state.boolean_constant = true;
            return Token::BOOLEAN_CONSTANT;
        }
        if name.eq_ignore_ascii_case("FALSE") {
            self.state.boolean_constant = false;
            return Token::BOOLEAN_CONSTANT;
        }
        self.state.identifier = name;
        Token::IDENTIFIER
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek_char() {
            if !ch.is_whitespace() {
                break;
            }
            self.bump(ch);
        }
    }

    fn eat_digits(&mut self) {
        while let Some(ch) = self.peek_char() {
            if !ch.is_ascii_digit() {
                break;
            }
            self.bump(ch);
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.source[self.state.cursor..].chars().next()
    }

    fn bump(&mut self, ch: char) {
        self.state.cursor += ch.len_utf8();
    }
}

/// Payload carried alongside a token in [`tokenize`] output.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Float(f64),
    Boolean(bool),
    Identifier(String),
}

/// A token with its start offset and, for value-bearing kinds, its payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ScannedToken {
    pub token: Token,
    pub start: usize,
    pub literal: Option<Literal>,
}

impl fmt::Display for ScannedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>5}  {:<16}", self.start, format!("{:?}", self.token.kind()))?;
        match &self.literal {
            Some(Literal::String(value)) => write!(f, "{value:?}"),
            Some(Literal::Float(value)) => write!(f, "{value}"),
            Some(Literal::Boolean(value)) => write!(f, "{value}"),
            Some(Literal::Identifier(name)) => f.write_str(name),
            None => write!(f, "{}", self.token),
        }
    }
}

/// Scan `source` to the end, collecting every token including the final
/// end-of-source token.
///
/// The first lexical error stops scanning and is returned as
/// [`CoreError::LexError`].
pub fn tokenize(source: &str) -> Result<Vec<ScannedToken>, CoreError> {
    let mut scanner = Scanner::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = scanner.next_token();
        let start = scanner.start_pos();
        let literal = match token.kind() {
            TokenKind::StringConstant => Some(Literal::String(scanner.string_constant().into())),
            TokenKind::FloatConstant => Some(Literal::Float(scanner.float_constant())),
            TokenKind::BooleanConstant => Some(Literal::Boolean(scanner.boolean_constant())),
            TokenKind::Identifier => Some(Literal::Identifier(scanner.identifier().into())),
            TokenKind::Error => {
                return Err(CoreError::LexError {
                    position: start,
                    message: scanner.error_message().to_string(),
                });
            }
            _ => None,
        };
        tokens.push(ScannedToken {
            token,
            start,
            literal,
        });
        if token.kind() == TokenKind::EndOfSource {
            return Ok(tokens);
        }
    }
}
