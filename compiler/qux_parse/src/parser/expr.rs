//! Expressions, one function per precedence level.
//!
//! Binary expressions are positioned at their operator, calls at the
//! (possibly qualified) function name.

use qux_ir::{BinaryOp, Callee, Expr, ExprKind, Literal, UnaryOp};

use super::{nested, PResult, Parser};
use crate::lexer::Token;

impl Parser {
    pub(super) fn parse_expr(&mut self) -> PResult<Expr> {
        nested(self, Parser::parse_or)
    }

    /// Parse a left-associative level: `next (op next)*`.
    fn parse_binary_level(
        &mut self,
        next: fn(&mut Parser) -> PResult<Expr>,
        op_for: fn(&Token) -> Option<BinaryOp>,
    ) -> PResult<Expr> {
        let mut lhs = next(self)?;
        while let Some(op) = self.peek().and_then(op_for) {
            let pos = self.last_pos_after_advance();
            let rhs = next(self)?;
            lhs = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                pos,
            );
        }
        Ok(lhs)
    }

    /// Consume the current token and return its position.
    fn last_pos_after_advance(&mut self) -> qux_ir::Position {
        self.advance();
        self.last_pos()
    }

    fn parse_or(&mut self) -> PResult<Expr> {
        self.parse_binary_level(Parser::parse_and, |t| match t {
            Token::Or => Some(BinaryOp::Or),
            _ => None,
        })
    }

    fn parse_and(&mut self) -> PResult<Expr> {
        self.parse_binary_level(Parser::parse_equality, |t| match t {
            Token::And => Some(BinaryOp::And),
            _ => None,
        })
    }

    fn parse_equality(&mut self) -> PResult<Expr> {
        self.parse_binary_level(Parser::parse_comparison, |t| match t {
            Token::EqEq => Some(BinaryOp::Eq),
            Token::NotEq => Some(BinaryOp::NotEq),
            _ => None,
        })
    }

    fn parse_comparison(&mut self) -> PResult<Expr> {
        self.parse_binary_level(Parser::parse_additive, |t| match t {
            Token::Lt => Some(BinaryOp::Lt),
            Token::LtEq => Some(BinaryOp::LtEq),
            Token::Gt => Some(BinaryOp::Gt),
            Token::GtEq => Some(BinaryOp::GtEq),
            _ => None,
        })
    }

    fn parse_additive(&mut self) -> PResult<Expr> {
        self.parse_binary_level(Parser::parse_multiplicative, |t| match t {
            Token::Plus => Some(BinaryOp::Add),
            Token::Minus => Some(BinaryOp::Sub),
            _ => None,
        })
    }

    fn parse_multiplicative(&mut self) -> PResult<Expr> {
        self.parse_binary_level(Parser::parse_unary, |t| match t {
            Token::Star => Some(BinaryOp::Mul),
            Token::Slash => Some(BinaryOp::Div),
            _ => None,
        })
    }

    /// `("-" | "not") unary | postfix`
    fn parse_unary(&mut self) -> PResult<Expr> {
        let op = match self.peek() {
            Some(Token::Minus) => UnaryOp::Neg,
            Some(Token::Not) => UnaryOp::Not,
            _ => return self.parse_postfix(),
        };
        let pos = self.last_pos_after_advance();
        let operand = nested(self, Parser::parse_unary)?;
        let pos = pos.to(operand.pos);
        Ok(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            pos,
        ))
    }

    /// `primary ("(" args? ")")?`
    fn parse_postfix(&mut self) -> PResult<Expr> {
        let primary = self.parse_primary()?;
        if !self.at(&Token::LParen) {
            return Ok(primary);
        }
        let callee = match primary.kind {
            ExprKind::Ident(name) => Callee::Unresolved {
                qualifier: None,
                name,
            },
            ExprKind::Path { qualifier, name } => Callee::Unresolved {
                qualifier: Some(qualifier),
                name,
            },
            _ => return Err(self.error("only functions can be called", primary.pos)),
        };
        self.expect(&Token::LParen)?;
        let mut args = Vec::new();
        if !self.at(&Token::RParen) {
            loop {
                args.push(self.parse_expr()?);
                if self.eat(&Token::Comma).is_none() {
                    break;
                }
            }
        }
        self.expect(&Token::RParen)?;
        Ok(Expr::new(
            ExprKind::Call {
                callee,
                args,
                signature: None,
            },
            primary.pos,
        ))
    }

    /// `INT | STRING | "true" | "false" | IDENT ("." IDENT)? | "(" expr ")"`
    fn parse_primary(&mut self) -> PResult<Expr> {
        let Some(lexeme) = self.peek_lexeme().cloned() else {
            return Err(self.unexpected("expression"));
        };
        let pos = lexeme.pos;
        let literal = match lexeme.token {
            Token::Int(value) => Literal::Int(value),
            Token::Str(value) => Literal::Str(value),
            Token::True => Literal::Bool(true),
            Token::False => Literal::Bool(false),
            Token::Ident(name) => {
                self.advance();
                if self.eat(&Token::Dot).is_none() {
                    return Ok(Expr::new(ExprKind::Ident(name), pos));
                }
                let (member, member_pos) = self.expect_ident("member name")?;
                return Ok(Expr::new(
                    ExprKind::Path {
                        qualifier: name,
                        name: member,
                    },
                    pos.to(member_pos),
                ));
            }
            Token::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(&Token::RParen)?;
                return Ok(inner);
            }
            _ => return Err(self.unexpected("expression")),
        };
        self.advance();
        Ok(Expr::literal(literal, pos))
    }
}
