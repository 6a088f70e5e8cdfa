//! Blocks and statements.

use qux_ir::{Block, ExprKind, Stmt, StmtKind};

use super::{nested, PResult, Parser};
use crate::lexer::Token;

impl Parser {
    /// `"{" stmt* "}"`
    pub(super) fn parse_block(&mut self) -> PResult<Block> {
        self.expect(&Token::LBrace)?;
        let mut stmts = Vec::new();
        while self.eat(&Token::RBrace).is_none() {
            let stmt = nested(self, Parser::parse_stmt)?;
            stmts.push(stmt);
        }
        Ok(Block::new(stmts))
    }

    fn parse_stmt(&mut self) -> PResult<Stmt> {
        match self.peek() {
            Some(Token::Var) => self.parse_var(),
            Some(Token::If) => self.parse_if(),
            Some(Token::While) => {
                let pos = self.expect(&Token::While)?;
                let cond = self.parse_expr()?;
                let body = self.parse_block()?;
                Ok(Stmt::new(StmtKind::While { cond, body }, pos))
            }
            Some(Token::Return) => self.parse_return(),
            Some(Token::Print) => {
                let pos = self.expect(&Token::Print)?;
                let value = self.parse_expr()?;
                Ok(Stmt::new(StmtKind::Print(value), pos))
            }
            None if self.lex_error.is_none() => Err(self.unexpected("`}`")),
            _ => self.parse_expr_stmt(),
        }
    }

    /// `"var" IDENT (":" type)? "=" expr`; positioned at the name.
    fn parse_var(&mut self) -> PResult<Stmt> {
        self.expect(&Token::Var)?;
        let (name, pos) = self.expect_ident("variable name")?;
        let ty = if self.eat(&Token::Colon).is_some() {
            Some(self.parse_type()?)
        } else {
            None
        };
        self.expect(&Token::Assign)?;
        let value = self.parse_expr()?;
        Ok(Stmt::new(StmtKind::Var { name, ty, value }, pos))
    }

    /// `"if" expr block ("else" (block | if))?`
    fn parse_if(&mut self) -> PResult<Stmt> {
        let pos = self.expect(&Token::If)?;
        let cond = self.parse_expr()?;
        let then = self.parse_block()?;
        let otherwise = if self.eat(&Token::Else).is_some() {
            if self.at(&Token::If) {
                let nested_if = nested(self, Parser::parse_if)?;
                Some(Block::new(vec![nested_if]))
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };
        Ok(Stmt::new(
            StmtKind::If {
                cond,
                then,
                otherwise,
            },
            pos,
        ))
    }

    /// `"return" expr?`
    ///
    /// The value must start on the same line as the keyword; a `return` at
    /// the end of a line returns nothing.
    fn parse_return(&mut self) -> PResult<Stmt> {
        let pos = self.expect(&Token::Return)?;
        let has_value = match self.peek_lexeme() {
            Some(next) => next.pos.line == pos.line && next.token != Token::RBrace,
            None => false,
        };
        let value = if has_value {
            Some(self.parse_expr()?)
        } else {
            None
        };
        Ok(Stmt::new(StmtKind::Return(value), pos))
    }

    /// An assignment or a call evaluated for its effect.
    fn parse_expr_stmt(&mut self) -> PResult<Stmt> {
        let expr = self.parse_expr()?;
        match &expr.kind {
            ExprKind::Ident(target) if self.at(&Token::Assign) => {
                let target = target.clone();
                self.expect(&Token::Assign)?;
                let value = self.parse_expr()?;
                Ok(Stmt::new(StmtKind::Assign { target, value }, expr.pos))
            }
            ExprKind::Call { .. } => {
                let pos = expr.pos;
                Ok(Stmt::new(StmtKind::Expr(expr), pos))
            }
            _ => Err(self.error("expected a statement", expr.pos)),
        }
    }
}
