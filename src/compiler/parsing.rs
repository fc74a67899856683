use super::lexer::{Token, TokenKind};
use crate::ast::{Expression, Number};
use crate::error::ExpressionError;

/// Recursive descent parser over a token stream.
///
/// Precedence, loosest first: `+ -`, `* / %`, unary `+ -`, `^` (right
/// associative, so `-2^2` is `-(2^2)` and `2^-1` is allowed), then the
/// postfix forms `a.b`, `a[i]` and `f(x, ...)`.
///
/// Every nested operand and every link of an operator chain counts towards
/// `MAX_NESTING`, which bounds the depth of the resulting tree.
pub struct Parser {
    tokens: Vec<Token>,
    cursor: usize,
    depth: usize,
}

pub const MAX_NESTING: usize = 256;

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            cursor: 0,
            depth: 0,
        }
    }

    /// Parses a complete expression. Returns `None` for an empty token stream.
    pub fn parse(mut self) -> Result<Option<Expression>, ExpressionError> {
        if self.peek() == &TokenKind::End {
            return Ok(None);
        }
        let expression = self.additive()?;
        match self.peek() {
            TokenKind::End => Ok(Some(expression)),
            other => Err(self.unexpected(&describe(other))),
        }
    }

    fn additive(&mut self) -> Result<Expression, ExpressionError> {
        let entry = self.depth;
        let mut left = self.multiplicative()?;
        loop {
            let build: fn(Box<Expression>, Box<Expression>) -> Expression = match self.peek() {
                TokenKind::Plus => Expression::Sum,
                TokenKind::Minus => Expression::Subtract,
                _ => {
                    self.depth = entry;
                    return Ok(left);
                }
            };
            self.descend()?;
            self.advance();
            let right = self.multiplicative()?;
            left = build(Box::new(left), Box::new(right));
        }
    }

    fn multiplicative(&mut self) -> Result<Expression, ExpressionError> {
        let entry = self.depth;
        let mut left = self.unary()?;
        loop {
            let build: fn(Box<Expression>, Box<Expression>) -> Expression = match self.peek() {
                TokenKind::Star => Expression::Multiply,
                TokenKind::Slash => Expression::Divide,
                TokenKind::Percent => Expression::Modulo,
                _ => {
                    self.depth = entry;
                    return Ok(left);
                }
            };
            self.descend()?;
            self.advance();
            let right = self.unary()?;
            left = build(Box::new(left), Box::new(right));
        }
    }

    fn unary(&mut self) -> Result<Expression, ExpressionError> {
        self.descend()?;
        let expression = match self.peek() {
            TokenKind::Minus => {
                self.advance();
                Expression::Negate(Box::new(self.unary()?))
            }
            TokenKind::Plus => {
                self.advance();
                self.unary()?
            }
            _ => self.power()?,
        };
        self.depth -= 1;
        Ok(expression)
    }

    fn power(&mut self) -> Result<Expression, ExpressionError> {
        let base = self.postfix()?;
        if self.peek() == &TokenKind::Caret {
            self.advance();
            let exponent = self.unary()?;
            return Ok(Expression::Power(Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn postfix(&mut self) -> Result<Expression, ExpressionError> {
        let entry = self.depth;
        let mut target = self.primary()?;
        loop {
            match self.peek() {
                TokenKind::Dot => {
                    self.descend()?;
                    self.advance();
                    match self.peek().clone() {
                        TokenKind::Identifier(property) => {
                            self.advance();
                            target = Expression::Member(Box::new(target), property);
                        }
                        other => return Err(self.unexpected(&describe(&other))),
                    }
                }
                TokenKind::LBracket => {
                    self.descend()?;
                    self.advance();
                    let index = self.additive()?;
                    self.expect(TokenKind::RBracket, "']'")?;
                    target = Expression::Index(Box::new(target), Box::new(index));
                }
                _ => {
                    self.depth = entry;
                    return Ok(target);
                }
            }
        }
    }

    fn primary(&mut self) -> Result<Expression, ExpressionError> {
        let position = self.position();
        match self.peek().clone() {
            TokenKind::Number(text) => {
                self.advance();
                Number::parse(&text)
                    .map(Expression::Literal)
                    .ok_or_else(|| ExpressionError::Syntax {
                        position,
                        message: format!("Invalid number '{}'", text),
                    })
            }
            TokenKind::Identifier(name) => {
                self.advance();
                if self.peek() == &TokenKind::LParen {
                    self.advance();
                    let args = self.arguments()?;
                    return Ok(Expression::Call { name, args });
                }
                Ok(Expression::Symbol(name))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.additive()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            other => Err(self.unexpected(&describe(&other))),
        }
    }

    // Parses a comma separated argument list; the opening parenthesis has
    // already been consumed.
    fn arguments(&mut self) -> Result<Vec<Expression>, ExpressionError> {
        let mut args = Vec::new();
        if self.peek() == &TokenKind::RParen {
            self.advance();
            return Ok(args);
        }
        loop {
            args.push(self.additive()?);
            match self.peek() {
                TokenKind::Comma => self.advance(),
                TokenKind::RParen => {
                    self.advance();
                    return Ok(args);
                }
                other => return Err(self.unexpected(&describe(other))),
            }
        }
    }

    fn descend(&mut self) -> Result<(), ExpressionError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(ExpressionError::Syntax {
                position: self.position(),
                message: "Expression is nested too deeply".to_string(),
            });
        }
        Ok(())
    }

    fn peek(&self) -> &TokenKind {
        // The lexer always terminates the stream with `End`.
        self.tokens
            .get(self.cursor)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::End)
    }

    fn position(&self) -> usize {
        self.tokens
            .get(self.cursor)
            .or_else(|| self.tokens.last())
            .map(|t| t.position)
            .unwrap_or(0)
    }

    fn advance(&mut self) {
        if self.cursor < self.tokens.len() {
            self.cursor += 1;
        }
    }

    fn expect(&mut self, kind: TokenKind, label: &str) -> Result<(), ExpressionError> {
        if self.peek() == &kind {
            self.advance();
            Ok(())
        } else {
            Err(ExpressionError::Syntax {
                position: self.position(),
                message: format!("{} expected, found {}", label, describe(self.peek())),
            })
        }
    }

    fn unexpected(&self, found: &str) -> ExpressionError {
        ExpressionError::Syntax {
            position: self.position(),
            message: format!("Unexpected {}", found),
        }
    }
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Number(text) => format!("number '{}'", text),
        TokenKind::Identifier(name) => format!("symbol '{}'", name),
        TokenKind::End => "end of expression".to_string(),
        TokenKind::Plus => "operator '+'".to_string(),
        TokenKind::Minus => "operator '-'".to_string(),
        TokenKind::Star => "operator '*'".to_string(),
        TokenKind::Slash => "operator '/'".to_string(),
        TokenKind::Percent => "operator '%'".to_string(),
        TokenKind::Caret => "operator '^'".to_string(),
        TokenKind::LParen => "'('".to_string(),
        TokenKind::RParen => "')'".to_string(),
        TokenKind::LBracket => "'['".to_string(),
        TokenKind::RBracket => "']'".to_string(),
        TokenKind::Dot => "'.'".to_string(),
        TokenKind::Comma => "','".to_string(),
    }
}
