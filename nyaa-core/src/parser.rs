//! Recursive-descent parser producing typed trees.
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! formula    := comparison EOS
//! comparison := concat ( compop concat )?
//! concat     := additive ( '&' additive )*
//! additive   := term ( ('+' | '-') term )*
//! term       := power ( ('*' | '/') power )*
//! power      := unary ( '^' power )?
//! unary      := ('+' | '-') unary | primary
//! primary    := FLOAT | STRING | BOOLEAN | '(' comparison ')'
//!             | '{' IDENT ( ':' comparison )? '}'
//!             | IDENT '(' args? ')' | IDENT
//! ```
//!
//! Types are reconciled while building (see [`crate::typecheck`]), so the
//! result is always a well-typed tree.
//!
//! Nesting (parentheses, defaults, call arguments, unary signs, `^`) is
//! limited to [`MAX_NESTING`] levels and the height of operator chains to
//! [`MAX_HEIGHT`], so deep input fails with a `ParseError` instead of
//! exhausting the stack while parsing or lowering.

use crate::ast::Node;
use crate::builtins::FunctionRegistry;
use crate::error::CoreError;
use crate::lexer::Scanner;
use crate::schema::AttributeSchema;
use crate::token::{Token, TokenKind};
use crate::typecheck;

/// Deepest recursion the parser enters.
pub const MAX_NESTING: usize = 64;

/// Tallest tree the parser builds from chained binary operators.
pub const MAX_HEIGHT: usize = 1024;

/// Parse `source` into a typed tree.
pub fn parse(
    source: &str,
    schema: &dyn AttributeSchema,
    functions: &FunctionRegistry,
) -> Result<Node, CoreError> {
    Parser::new(source, schema, functions).parse_formula()
}

pub struct Parser<'src, 'ctx> {
    scanner: Scanner<'src>,
    schema: &'ctx dyn AttributeSchema,
    functions: &'ctx FunctionRegistry,
    nesting: usize,
    height: usize,
}

impl<'src, 'ctx> Parser<'src, 'ctx> {
    pub fn new(
        source: &'src str,
        schema: &'ctx dyn AttributeSchema,
        functions: &'ctx FunctionRegistry,
    ) -> Self {
        Parser {
            scanner: Scanner::new(source),
            schema,
            functions,
            nesting: 0,
            height: 0,
        }
    }

    /// Number of tokens scanned so far.
    pub fn token_count(&self) -> usize {
        self.scanner.token_count()
    }

    /// Parse a complete formula; trailing input is an error.
    pub fn parse_formula(&mut self) -> Result<Node, CoreError> {
        let node = self.parse_comparison()?;
        let token = self.next()?;
        if token.kind() != TokenKind::EndOfSource {
            return Err(CoreError::parse(
                self.scanner.start_pos(),
                format!("unexpected '{}' after end of formula", self.describe(token)),
            ));
        }
        Ok(node)
    }

    fn parse_comparison(&mut self) -> Result<Node, CoreError> {
        self.nested(Self::parse_comparison_inner)
    }

    fn parse_comparison_inner(&mut self) -> Result<Node, CoreError> {
        let lhs = self.parse_concat()?;
        let operator = self.next()?;
        if !operator.is_comparison() {
            self.scanner.unget_token(operator)?;
            return Ok(lhs);
        }
        let position = self.scanner.start_pos();
        let rhs = self.parse_concat()?;
        let node = typecheck::binary(position, operator, lhs, rhs)?;

        let following = self.next()?;
        if following.is_comparison() {
            return Err(CoreError::parse(
                self.scanner.start_pos(),
                "comparison operators cannot be chained",
            ));
        }
        self.scanner.unget_token(following)?;
        Ok(node)
    }

    fn parse_concat(&mut self) -> Result<Node, CoreError> {
        let height = self.height;
        let mut lhs = self.parse_additive()?;
        loop {
            let operator = self.next()?;
            if operator.kind() != TokenKind::Ampersand {
                self.scanner.unget_token(operator)?;
                self.height = height;
                return Ok(lhs);
            }
            let position = self.scanner.start_pos();
            self.grow()?;
            let rhs = self.parse_additive()?;
            lhs = typecheck::binary(position, operator, lhs, rhs)?;
        }
    }

    fn parse_additive(&mut self) -> Result<Node, CoreError> {
        let height = self.height;
        let mut lhs = self.parse_term()?;
        loop {
            let operator = self.next()?;
            if !matches!(operator.kind(), TokenKind::Plus | TokenKind::Minus) {
                self.scanner.unget_token(operator)?;
                self.height = height;
                return Ok(lhs);
            }
            let position = self.scanner.start_pos();
            self.grow()?;
            let rhs = self.parse_term()?;
            lhs = typecheck::binary(position, operator, lhs, rhs)?;
        }
    }

    fn parse_term(&mut self) -> Result<Node, CoreError> {
        let height = self.height;
        let mut lhs = self.parse_power()?;
        loop {
            let operator = self.next()?;
            if !matches!(operator.kind(), TokenKind::Star | TokenKind::Slash) {
                self.scanner.unget_token(operator)?;
                self.height = height;
                return Ok(lhs);
            }
            let position = self.scanner.start_pos();
            self.grow()?;
            let rhs = self.parse_power()?;
            lhs = typecheck::binary(position, operator, lhs, rhs)?;
        }
    }

    fn parse_power(&mut self) -> Result<Node, CoreError> {
        let base = self.parse_unary()?;
        let operator = self.next()?;
        if operator.kind() != TokenKind::Caret {
            self.scanner.unget_token(operator)?;
            return Ok(base);
        }
        let position = self.scanner.start_pos();
        // right-associative
        let exponent = self.nested(Self::parse_power)?;
        typecheck::binary(position, operator, base, exponent)
    }

    fn parse_unary(&mut self) -> Result<Node, CoreError> {
        let operator = self.next()?;
        if !matches!(operator.kind(), TokenKind::Plus | TokenKind::Minus) {
            self.scanner.unget_token(operator)?;
            return self.parse_primary();
        }
        let position = self.scanner.start_pos();
        let operand = self.nested(Self::parse_unary)?;
        typecheck::unary(position, operator, operand)
    }

    fn parse_primary(&mut self) -> Result<Node, CoreError> {
        let token = self.next()?;
        let position = self.scanner.start_pos();
        match token.kind() {
            TokenKind::FloatConstant => Ok(Node::float_constant(
                position,
                self.scanner.float_constant(),
            )),
            TokenKind::StringConstant => Ok(Node::string_constant(
                position,
                self.scanner.string_constant(),
            )),
            TokenKind::BooleanConstant => Ok(Node::boolean_constant(
                position,
                self.scanner.boolean_constant(),
            )),
            TokenKind::OpenParen => {
                let inner = self.parse_comparison()?;
                self.expect(Token::CLOSE_PAREN)?;
                Ok(inner)
            }
            TokenKind::OpenBrace => self.parse_braced_attribute(),
            TokenKind::Identifier => {
                let name = self.scanner.identifier().to_string();
                let following = self.next()?;
                if following.kind() == TokenKind::OpenParen {
                    self.parse_call(position, &name)
                } else {
                    self.scanner.unget_token(following)?;
                    self.attribute(position, name, None)
                }
            }
            TokenKind::Dollar => Err(CoreError::parse(position, "'$' is reserved")),
            TokenKind::EndOfSource => Err(CoreError::parse(position, "unexpected end of formula")),
            _ => Err(CoreError::parse(
                position,
                format!("unexpected '{}'", self.describe(token)),
            )),
        }
    }

    fn parse_braced_attribute(&mut self) -> Result<Node, CoreError> {
        let token = self.next()?;
        let position = self.scanner.start_pos();
        if token.kind() != TokenKind::Identifier {
            return Err(CoreError::parse(
                position,
                format!("expected an attribute name, found '{}'", self.describe(token)),
            ));
        }
        let name = self.scanner.identifier().to_string();

        let separator = self.next()?;
        let default = if separator.kind() == TokenKind::Colon {
            Some(self.parse_comparison()?)
        } else {
            self.scanner.unget_token(separator)?;
            None
        };
        self.expect(Token::CLOSE_BRACE)?;
        self.attribute(position, name, default)
    }

    fn attribute(
        &mut self,
        position: usize,
        name: String,
        default: Option<Node>,
    ) -> Result<Node, CoreError> {
        let ty = self
            .schema
            .attribute_type(&name)
            .ok_or_else(|| CoreError::semantic(position, format!("unknown attribute '{name}'")))?;
        let default = default
            .map(|value| typecheck::attribute_default(position, &name, ty, value))
            .transpose()?;
        Node::identifier(position, name, default, ty)
    }

    fn parse_call(&mut self, position: usize, name: &str) -> Result<Node, CoreError> {
        let function = self
            .functions
            .lookup(name)
            .cloned()
            .ok_or_else(|| CoreError::semantic(position, format!("unknown function '{name}'")))?;

        let mut args = Vec::new();
        let token = self.next()?;
        if token.kind() != TokenKind::CloseParen {
            self.scanner.unget_token(token)?;
            loop {
                args.push(self.parse_comparison()?);
                let separator = self.next()?;
                match separator.kind() {
                    TokenKind::Comma => continue,
                    TokenKind::CloseParen => break,
                    _ => {
                        return Err(CoreError::parse(
                            self.scanner.start_pos(),
                            format!(
                                "expected ',' or ')' in call to {name}, found '{}'",
                                self.describe(separator)
                            ),
                        ));
                    }
                }
            }
        }
        typecheck::function_call(position, function, args)
    }

    fn nested(
        &mut self,
        parse: fn(&mut Self) -> Result<Node, CoreError>,
    ) -> Result<Node, CoreError> {
        if self.nesting >= MAX_NESTING {
            return Err(CoreError::parse(
                self.scanner.position(),
                "formula nested too deeply",
            ));
        }
        self.nesting += 1;
        let result = parse(self);
        self.nesting -= 1;
        result
    }

    /// Account for one more operator in a left-associative chain.
    fn grow(&mut self) -> Result<(), CoreError> {
        self.height += 1;
        if self.height > MAX_HEIGHT {
            return Err(CoreError::parse(
                self.scanner.start_pos(),
                "formula nested too deeply",
            ));
        }
        Ok(())
    }

    fn expect(&mut self, expected: Token) -> Result<(), CoreError> {
        let token = self.next()?;
        if token == expected {
            return Ok(());
        }
        Err(CoreError::parse(
            self.scanner.start_pos(),
            format!("expected '{expected}', found '{}'", self.describe(token)),
        ))
    }

    /// Fetch a token, turning lexical errors into [`CoreError::LexError`].
    fn next(&mut self) -> Result<Token, CoreError> {
        let token = self.scanner.next_token();
        if token.kind() == TokenKind::Error {
            return Err(CoreError::LexError {
                position: self.scanner.start_pos(),
                message: self.scanner.error_message().to_string(),
            });
        }
        Ok(token)
    }

    /// Readable text for `token`, using the scanner's payload for literals.
    fn describe(&self, token: Token) -> String {
        match token.kind() {
            TokenKind::Identifier => self.scanner.identifier().to_string(),
            TokenKind::FloatConstant => self.scanner.float_constant().to_string(),
            TokenKind::StringConstant => format!("{:?}", self.scanner.string_constant()),
            TokenKind::BooleanConstant => {
                let text = if self.scanner.boolean_constant() { "TRUE" } else { "FALSE" };
                text.to_string()
            }
            TokenKind::EndOfSource => "end of formula".to_string(),
            _ => token.to_string(),
        }
    }
}
