//! Parser for constant initializer expressions
//!
//! Builds a small expression tree from the token stream using precedence
//! climbing with PHP 8 operator precedence.

use super::lexer::{Lexer, Token, TokenKind};
use super::EvaluationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Plus,
    Not,
    BitNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Concat,
    BitAnd,
    BitOr,
    BitXor,
    ShiftLeft,
    ShiftRight,
    And,
    Or,
    Coalesce,
    Equal,
    NotEqual,
    Identical,
    NotIdentical,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayItem {
    pub key: Option<Expr>,
    pub value: Expr,
    /// `...$spread`
    pub unpack: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Integer(i64),
    Float(f64),
    String(String),
    Array(Vec<ArrayItem>),
    /// A bare name: `true`, `PHP_EOL`, `__CLASS__`
    Constant(String),
    /// `Class::NAME`, including `Class::class`
    ClassConstant { class: String, name: String },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `cond ? then : else`, `then` is `None` for `cond ?: else`
    Ternary {
        condition: Box<Expr>,
        then: Option<Box<Expr>>,
        otherwise: Box<Expr>,
    },
}

/// Parse an initializer expression
pub fn parse_expression(input: &str) -> Result<Expr, EvaluationError> {
    let tokens = Lexer::new(input).tokenize()?;
    let mut parser = ExprParser {
        tokens,
        position: 0,
    };
    let expr = parser.parse_ternary()?;
    parser.expect_eof()?;
    Ok(expr)
}

struct ExprParser {
    tokens: Vec<Token>,
    position: usize,
}

/// Binding power of binary operators, lowest first
fn binary_precedence(kind: &TokenKind) -> Option<(u8, BinaryOp)> {
    let entry = match kind {
        TokenKind::Or => (1, BinaryOp::Or),
        TokenKind::And => (2, BinaryOp::And),
        TokenKind::Pipe => (3, BinaryOp::BitOr),
        TokenKind::Caret => (4, BinaryOp::BitXor),
        TokenKind::Ampersand => (5, BinaryOp::BitAnd),
        TokenKind::Equal => (6, BinaryOp::Equal),
        TokenKind::NotEqual => (6, BinaryOp::NotEqual),
        TokenKind::Identical => (6, BinaryOp::Identical),
        TokenKind::NotIdentical => (6, BinaryOp::NotIdentical),
        TokenKind::Less => (7, BinaryOp::Less),
        TokenKind::LessEqual => (7, BinaryOp::LessEqual),
        TokenKind::Greater => (7, BinaryOp::Greater),
        TokenKind::GreaterEqual => (7, BinaryOp::GreaterEqual),
        TokenKind::Dot => (8, BinaryOp::Concat),
        TokenKind::ShiftLeft => (9, BinaryOp::ShiftLeft),
        TokenKind::ShiftRight => (9, BinaryOp::ShiftRight),
        TokenKind::Plus => (10, BinaryOp::Add),
        TokenKind::Minus => (10, BinaryOp::Sub),
        TokenKind::Star => (11, BinaryOp::Mul),
        TokenKind::Slash => (11, BinaryOp::Div),
        TokenKind::Percent => (11, BinaryOp::Mod),
        _ => return None,
    };
    Some(entry)
}

impl ExprParser {
    fn current(&self) -> &Token {
        // The lexer always terminates the stream with Eof
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.current().kind == kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<(), EvaluationError> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.error(format!("expected {}", what)))
        }
    }

    fn expect_eof(&self) -> Result<(), EvaluationError> {
        if self.check(&TokenKind::Eof) {
            Ok(())
        } else {
            Err(self.error("unexpected trailing input".to_string()))
        }
    }

    fn error(&self, message: String) -> EvaluationError {
        EvaluationError::Syntax {
            offset: self.current().offset,
            message: format!("{}, found {:?}", message, self.current().kind),
        }
    }

    /// ternary: coalesce ('?' ternary? ':' ternary)?
    fn parse_ternary(&mut self) -> Result<Expr, EvaluationError> {
        let condition = self.parse_coalesce()?;
        if !self.eat(&TokenKind::Question) {
            return Ok(condition);
        }

        let then = if self.eat(&TokenKind::Colon) {
            None
        } else {
            let then = self.parse_ternary()?;
            self.expect(&TokenKind::Colon, "':'")?;
            Some(Box::new(then))
        };
        let otherwise = self.parse_ternary()?;

        Ok(Expr::Ternary {
            condition: Box::new(condition),
            then,
            otherwise: Box::new(otherwise),
        })
    }

    /// `??` is right associative and binds looser than `||`
    fn parse_coalesce(&mut self) -> Result<Expr, EvaluationError> {
        let left = self.parse_binary(1)?;
        if self.eat(&TokenKind::Coalesce) {
            let right = self.parse_coalesce()?;
            return Ok(Expr::Binary {
                op: BinaryOp::Coalesce,
                left: Box::new(left),
                right: Box::new(right),
            });
        }
        Ok(left)
    }

    fn parse_binary(&mut self, min_precedence: u8) -> Result<Expr, EvaluationError> {
        let mut left = self.parse_unary()?;

        while let Some((precedence, op)) = binary_precedence(&self.current().kind) {
            if precedence < min_precedence {
                break;
            }
            self.advance();
            let right = self.parse_binary(precedence + 1)?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, EvaluationError> {
        let op = match self.current().kind {
            TokenKind::Minus => Some(UnaryOp::Negate),
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Tilde => Some(UnaryOp::BitNot),
            _ => None,
        };

        match op {
            Some(op) => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(Expr::Unary {
                    op,
                    operand: Box::new(operand),
                })
            }
            None => self.parse_pow(),
        }
    }

    /// `**` is right associative and binds tighter than unary minus
    fn parse_pow(&mut self) -> Result<Expr, EvaluationError> {
        let base = self.parse_primary()?;
        if self.eat(&TokenKind::Pow) {
            let exponent = self.parse_unary()?;
            return Ok(Expr::Binary {
                op: BinaryOp::Pow,
                left: Box::new(base),
                right: Box::new(exponent),
            });
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Expr, EvaluationError> {
        let token = self.advance();
        match token.kind {
            TokenKind::Integer(n) => Ok(Expr::Integer(n)),
            TokenKind::Float(f) => Ok(Expr::Float(f)),
            TokenKind::String(s) => Ok(Expr::String(s)),
            TokenKind::LeftParen => {
                let inner = self.parse_ternary()?;
                self.expect(&TokenKind::RightParen, "')'")?;
                Ok(inner)
            }
            TokenKind::LeftBracket => self.parse_array_items(TokenKind::RightBracket),
            TokenKind::Name(name) => self.parse_name(name),
            other => Err(EvaluationError::Syntax {
                offset: token.offset,
                message: format!("unexpected token {:?}", other),
            }),
        }
    }

    fn parse_name(&mut self, name: String) -> Result<Expr, EvaluationError> {
        if name.eq_ignore_ascii_case("array") && self.eat(&TokenKind::LeftParen) {
            return self.parse_array_items(TokenKind::RightParen);
        }
        if name.eq_ignore_ascii_case("new") {
            return Err(EvaluationError::Unsupported("object instantiation".to_string()));
        }
        if self.check(&TokenKind::LeftParen) {
            return Err(EvaluationError::Unsupported(format!(
                "function call {}()",
                name
            )));
        }

        if self.eat(&TokenKind::DoubleColon) {
            let member = self.advance();
            return match member.kind {
                TokenKind::Name(constant) => Ok(Expr::ClassConstant {
                    class: name,
                    name: constant,
                }),
                _ => Err(EvaluationError::Unsupported(
                    "dynamic class member access".to_string(),
                )),
            };
        }

        Ok(Expr::Constant(name))
    }

    fn parse_array_items(&mut self, close: TokenKind) -> Result<Expr, EvaluationError> {
        let mut items = Vec::new();

        loop {
            if self.eat(&close) {
                break;
            }

            let unpack = self.eat(&TokenKind::Ellipsis);
            let first = self.parse_ternary()?;
            let item = if !unpack && self.eat(&TokenKind::DoubleArrow) {
                ArrayItem {
                    key: Some(first),
                    value: self.parse_ternary()?,
                    unpack: false,
                }
            } else {
                ArrayItem {
                    key: None,
                    value: first,
                    unpack,
                }
            };
            items.push(item);

            if !self.eat(&TokenKind::Comma) {
                self.expect(&close, "',' or end of array")?;
                break;
            }
        }

        Ok(Expr::Array(items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence() {
        let expr = parse_expression("1 + 2 * 3").unwrap();
        assert_eq!(
            expr,
            Expr::Binary {
                op: BinaryOp::Add,
                left: Box::new(Expr::Integer(1)),
                right: Box::new(Expr::Binary {
                    op: BinaryOp::Mul,
                    left: Box::new(Expr::Integer(2)),
                    right: Box::new(Expr::Integer(3)),
                }),
            }
        );
    }

    #[test]
    fn test_pow_binds_tighter_than_negation() {
        let expr = parse_expression("-2 ** 2").unwrap();
        assert!(matches!(
            expr,
            Expr::Unary {
                op: UnaryOp::Negate,
                ..
            }
        ));
    }

    #[test]
    fn test_class_constant() {
        let expr = parse_expression("self::FOO").unwrap();
        assert_eq!(
            expr,
            Expr::ClassConstant {
                class: "self".to_string(),
                name: "FOO".to_string(),
            }
        );
    }

    #[test]
    fn test_arrays() {
        let short = parse_expression("['a' => 1, 2,]").unwrap();
        let long = parse_expression("array('a' => 1, 2)").unwrap();
        assert_eq!(short, long);
        if let Expr::Array(items) = short {
            assert_eq!(items.len(), 2);
            assert!(items[0].key.is_some());
            assert!(items[1].key.is_none());
        } else {
            panic!("expected array");
        }
    }

    #[test]
    fn test_short_ternary() {
        let expr = parse_expression("A ?: 'b'").unwrap();
        assert!(matches!(expr, Expr::Ternary { then: None, .. }));
    }

    #[test]
    fn test_unsupported_constructs() {
        assert!(matches!(
            parse_expression("new Foo()"),
            Err(EvaluationError::Unsupported(_))
        ));
        assert!(matches!(
            parse_expression("strlen('a')"),
            Err(EvaluationError::Unsupported(_))
        ));
    }

    #[test]
    fn test_trailing_input() {
        assert!(matches!(
            parse_expression("1 2"),
            Err(EvaluationError::Syntax { .. })
        ));
    }
}
