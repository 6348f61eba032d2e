//! Token model for the formula scanner.
//!
//! A [`Token`] only says *what kind* of lexical unit was seen. Literal
//! values (strings, numbers, booleans, identifier names) are not stored
//! in the token; the scanner exposes them through its accessors for the
//! most recently returned token.

use std::fmt;

/// Kind of a token produced by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Value-bearing
    StringConstant,
    FloatConstant,
    BooleanConstant,
    Identifier,

    // Punctuation
    OpenBrace,      // {
    CloseBrace,     // }
    OpenParen,      // (
    CloseParen,     // )
    Colon,          // :
    Caret,          // ^
    Plus,           // +
    Minus,          // -
    Slash,          // /
    Star,           // *
    Equal,          // =
    NotEqual,       // <>
    Greater,        // >
    Less,           // <
    GreaterOrEqual, // >=
    LessOrEqual,    // <=
    Dollar,         // $
    Comma,          // ,
    Ampersand,      // &

    // Special
    EndOfSource,
    Error,
}

/// Operator classification of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpType {
    None,
    Comparison,
    Arithmetic,
    StringConcat,
}

/// An immutable lexical unit: kind, canonical text and operator class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token {
    kind: TokenKind,
    text: Option<&'static str>,
    op_type: OpType,
}

impl Token {
    /// Rendering used for tokens without a canonical text.
    pub const NO_STRING_REP: &'static str = "?";

    pub const STRING_CONSTANT: Token = Token::valued(TokenKind::StringConstant);
    pub const FLOAT_CONSTANT: Token = Token::valued(TokenKind::FloatConstant);
    pub const BOOLEAN_CONSTANT: Token = Token::valued(TokenKind::BooleanConstant);
    pub const IDENTIFIER: Token = Token::valued(TokenKind::Identifier);
    pub const OPEN_BRACE: Token = Token::fixed(TokenKind::OpenBrace, "{", OpType::None);
    pub const CLOSE_BRACE: Token = Token::fixed(TokenKind::CloseBrace, "}", OpType::None);
    pub const OPEN_PAREN: Token = Token::fixed(TokenKind::OpenParen, "(", OpType::None);
    pub const CLOSE_PAREN: Token = Token::fixed(TokenKind::CloseParen, ")", OpType::None);
    pub const COLON: Token = Token::fixed(TokenKind::Colon, ":", OpType::None);
    pub const CARET: Token = Token::fixed(TokenKind::Caret, "^", OpType::Arithmetic);
    pub const PLUS: Token = Token::fixed(TokenKind::Plus, "+", OpType::Arithmetic);
    pub const MINUS: Token = Token::fixed(TokenKind::Minus, "-", OpType::Arithmetic);
    pub const SLASH: Token = Token::fixed(TokenKind::Slash, "/", OpType::Arithmetic);
    pub const STAR: Token = Token::fixed(TokenKind::Star, "*", OpType::Arithmetic);
    pub const EQUAL: Token = Token::fixed(TokenKind::Equal, "=", OpType::Comparison);
    pub const NOT_EQUAL: Token = Token::fixed(TokenKind::NotEqual, "<>", OpType::Comparison);
    pub const GREATER: Token = Token::fixed(TokenKind::Greater, ">", OpType::Comparison);
    pub const LESS: Token = Token::fixed(TokenKind::Less, "<", OpType::Comparison);
    pub const GREATER_OR_EQUAL: Token =
        Token::fixed(TokenKind::GreaterOrEqual, ">=", OpType::Comparison);
    pub const LESS_OR_EQUAL: Token =
        Token::fixed(TokenKind::LessOrEqual, "<=", OpType::Comparison);
    pub const DOLLAR: Token = Token::fixed(TokenKind::Dollar, "$", OpType::None);
    pub const COMMA: Token = Token::fixed(TokenKind::Comma, ",", OpType::None);
    pub const AMPERSAND: Token = Token::fixed(TokenKind::Ampersand, "&", OpType::StringConcat);
    pub const END_OF_SOURCE: Token = Token::valued(TokenKind::EndOfSource);
    pub const ERROR: Token = Token::valued(TokenKind::Error);

    const fn fixed(kind: TokenKind, text: &'static str, op_type: OpType) -> Token {
        Token {
            kind,
            text: Some(text),
            op_type,
        }
    }

    const fn valued(kind: TokenKind) -> Token {
        Token {
            kind,
            text: None,
            op_type: OpType::None,
        }
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    /// Canonical source text, or `None` for value-bearing and special kinds.
    pub fn text(&self) -> Option<&'static str> {
        self.text
    }

    pub fn op_type(&self) -> OpType {
        self.op_type
    }

    pub fn is_comparison(&self) -> bool {
        self.op_type == OpType::Comparison
    }

    pub fn is_arithmetic(&self) -> bool {
        self.op_type == OpType::Arithmetic
    }

    pub fn is_string_op(&self) -> bool {
        self.op_type == OpType::StringConcat
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text.unwrap_or(Token::NO_STRING_REP))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_operators() {
        for token in [Token::PLUS, Token::MINUS, Token::STAR, Token::SLASH, Token::CARET] {
            assert!(token.is_arithmetic(), "{token} should be arithmetic");
        }
        for token in [
            Token::EQUAL,
            Token::NOT_EQUAL,
            Token::LESS,
            Token::GREATER,
            Token::LESS_OR_EQUAL,
            Token::GREATER_OR_EQUAL,
        ] {
            assert!(token.is_comparison(), "{token} should be a comparison");
        }
        assert!(Token::AMPERSAND.is_string_op());
        assert_eq!(Token::COMMA.op_type(), OpType::None);
    }

    #[test]
    fn value_bearing_tokens_have_no_text() {
        assert_eq!(Token::FLOAT_CONSTANT.text(), None);
        assert_eq!(Token::IDENTIFIER.to_string(), "?");
        assert_eq!(Token::NOT_EQUAL.to_string(), "<>");
    }
}
