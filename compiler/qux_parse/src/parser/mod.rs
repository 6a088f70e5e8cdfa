//! Recursive-descent parser.
//!
//! One token of lookahead is enough for the whole grammar. Expression and
//! block recursion runs under [`with_stack`] so deeply nested input grows
//! the stack instead of overflowing it.

mod expr;
mod stmt;

use qux_diagnostic::CompilerError;
use qux_ir::stack::with_stack;
use qux_ir::{
    ConstDecl, Decl, FnDecl, Import, Param, Position, Type, TypeAnn, TypeDecl, TypeName, Unit,
    UnitId,
};

use crate::lexer::{lex, LexError, Lexeme, Token};

type PResult<T> = Result<T, CompilerError>;

/// Parse the text of one source file.
///
/// `stem` is the file name without extension. The unit identifier is the
/// `package` path followed by the stem, or the stem alone when the file has
/// no `package` line.
pub fn parse(stem: &str, text: &str) -> Result<Unit, CompilerError> {
    let (tokens, lex_error) = lex(text);
    let mut parser = Parser {
        tokens,
        cursor: 0,
        lex_error,
        unit: stem.to_string(),
    };
    let result = parser.parse_unit(stem);
    match &result {
        Ok(unit) => tracing::debug!(unit = %unit.id, decls = unit.decls.len(), "parsed"),
        Err(e) => tracing::debug!(stem, "syntax error: {e}"),
    }
    result
}

pub(crate) struct Parser {
    tokens: Vec<Lexeme>,
    cursor: usize,
    lex_error: Option<LexError>,
    /// Name used to locate errors: the stem until the `package` line is read.
    unit: String,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cursor).map(|l| &l.token)
    }

    fn peek_lexeme(&self) -> Option<&Lexeme> {
        self.tokens.get(self.cursor)
    }

    fn at(&self, token: &Token) -> bool {
        self.peek() == Some(token)
    }

    /// Whether every token has been consumed and none failed to lex.
    fn at_end(&self) -> bool {
        self.cursor >= self.tokens.len() && self.lex_error.is_none()
    }

    fn advance(&mut self) -> Option<Lexeme> {
        let lexeme = self.tokens.get(self.cursor).cloned();
        if lexeme.is_some() {
            self.cursor += 1;
        }
        lexeme
    }

    /// Consume the next token if it is `token`.
    fn eat(&mut self, token: &Token) -> Option<Position> {
        if self.at(token) {
            self.advance().map(|l| l.pos)
        } else {
            None
        }
    }

    fn expect(&mut self, token: &Token) -> PResult<Position> {
        match self.eat(token) {
            Some(pos) => Ok(pos),
            None => Err(self.unexpected(&token.to_string())),
        }
    }

    fn expect_ident(&mut self, what: &str) -> PResult<(String, Position)> {
        if let Some(Lexeme {
            token: Token::Ident(name),
            pos,
        }) = self.peek_lexeme()
        {
            let found = (name.clone(), *pos);
            self.cursor += 1;
            return Ok(found);
        }
        Err(self.unexpected(what))
    }

    /// Position of the most recently consumed token.
    fn last_pos(&self) -> Position {
        self.cursor
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map_or(Position::new(1, 0, 1), |l| l.pos)
    }

    fn error(&self, message: impl Into<String>, pos: Position) -> CompilerError {
        CompilerError::at(message, &self.unit, pos)
    }

    /// Error for the token under the cursor, which is not `expected`.
    ///
    /// Past the last good token this is the pending lexical error, if any.
    fn unexpected(&self, expected: &str) -> CompilerError {
        match self.peek_lexeme() {
            Some(lexeme) => self.error(
                format!("expected {expected}, found {}", lexeme.token),
                lexeme.pos,
            ),
            None => match &self.lex_error {
                Some(e) => self.error(e.message.clone(), e.pos),
                None => self.error(
                    format!("expected {expected}, found end of input"),
                    self.last_pos(),
                ),
            },
        }
    }

    fn parse_unit(&mut self, stem: &str) -> PResult<Unit> {
        let package = if self.eat(&Token::Package).is_some() {
            let (path, _) = self.parse_path("package name")?;
            Some(path)
        } else {
            None
        };
        let id = UnitId::from_parts(package.as_deref(), stem);
        self.unit = id.to_string();

        let mut unit = Unit::new(id);
        while let Some(pos) = self.eat(&Token::Import) {
            let (path, path_pos) = self.parse_path("import path")?;
            unit.imports.push(Import {
                id: UnitId::new(path),
                pos: pos.to(path_pos),
            });
        }
        while !self.at_end() {
            let decl = self.parse_decl()?;
            unit.decls.push(decl);
        }
        Ok(unit)
    }

    /// `IDENT ("." IDENT)*`, joined with dots.
    fn parse_path(&mut self, what: &str) -> PResult<(String, Position)> {
        let (mut path, mut pos) = self.expect_ident(what)?;
        while self.eat(&Token::Dot).is_some() {
            let (segment, segment_pos) = self.expect_ident("identifier")?;
            path.push('.');
            path.push_str(&segment);
            pos = pos.to(segment_pos);
        }
        Ok((path, pos))
    }

    fn parse_decl(&mut self) -> PResult<Decl> {
        match self.peek() {
            Some(Token::Const) => self.parse_const().map(Decl::Const),
            Some(Token::Type) => self.parse_type_decl().map(Decl::Type),
            Some(Token::Fn) => self.parse_fn().map(Decl::Function),
            Some(Token::Import) => {
                let pos = self.tokens[self.cursor].pos;
                Err(self.error("imports must precede declarations", pos))
            }
            Some(Token::Package) => {
                let pos = self.tokens[self.cursor].pos;
                Err(self.error("`package` must be the first line of the unit", pos))
            }
            _ => Err(self.unexpected("`const`, `type` or `fn`")),
        }
    }

    fn parse_const(&mut self) -> PResult<ConstDecl> {
        self.expect(&Token::Const)?;
        let (name, pos) = self.expect_ident("constant name")?;
        self.expect(&Token::Colon)?;
        let ty = self.parse_type()?;
        self.expect(&Token::Assign)?;
        let value = self.parse_expr()?;
        Ok(ConstDecl {
            name,
            pos,
            ty,
            value,
        })
    }

    fn parse_type_decl(&mut self) -> PResult<TypeDecl> {
        self.expect(&Token::Type)?;
        let (name, pos) = self.expect_ident("type name")?;
        self.expect(&Token::Assign)?;
        let target = self.parse_type()?;
        Ok(TypeDecl { name, pos, target })
    }

    fn parse_fn(&mut self) -> PResult<FnDecl> {
        self.expect(&Token::Fn)?;
        let (name, pos) = self.expect_ident("function name")?;
        self.expect(&Token::LParen)?;
        let mut params = Vec::new();
        if !self.at(&Token::RParen) {
            loop {
                let (param, param_pos) = self.expect_ident("parameter name")?;
                self.expect(&Token::Colon)?;
                let ty = self.parse_type()?;
                params.push(Param {
                    name: param,
                    pos: param_pos,
                    ty,
                });
                if self.eat(&Token::Comma).is_none() {
                    break;
                }
            }
        }
        self.expect(&Token::RParen)?;
        let ret = if self.eat(&Token::Arrow).is_some() {
            self.parse_type()?
        } else {
            TypeAnn::new(Type::Void, pos)
        };
        let body = self.parse_block()?;
        Ok(FnDecl {
            name,
            pos,
            params,
            ret,
            body,
        })
    }

    /// `Int | Bool | Str | Void | IDENT | IDENT "." IDENT`
    fn parse_type(&mut self) -> PResult<TypeAnn> {
        let (first, pos) = self.expect_ident("type")?;
        if self.eat(&Token::Dot).is_some() {
            let (name, name_pos) = self.expect_ident("type name")?;
            let ty = Type::Named(TypeName::new(Some(first), name));
            return Ok(TypeAnn::new(ty, pos.to(name_pos)));
        }
        let ty = Type::primitive(&first).unwrap_or_else(|| Type::Named(TypeName::new(None, first)));
        Ok(TypeAnn::new(ty, pos))
    }
}

/// Run a recursive parse step with stack growth.
fn nested<T>(parser: &mut Parser, f: impl FnOnce(&mut Parser) -> PResult<T>) -> PResult<T> {
    with_stack(|| f(parser))
}
