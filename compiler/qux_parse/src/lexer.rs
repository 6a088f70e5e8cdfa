//! Tokenizer built on `logos`.
//!
//! Whitespace and `//` comments are skipped. Each token is paired with a
//! line/column [`Position`]; string literals cannot span lines, so every
//! token sits on exactly one line.

use std::fmt;

use logos::Logos;
use qux_ir::Position;

/// A Qux token.
#[derive(Logos, Clone, Debug, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
pub enum Token {
    #[token("package")]
    Package,
    #[token("import")]
    Import,
    #[token("const")]
    Const,
    #[token("type")]
    Type,
    #[token("fn")]
    Fn,
    #[token("var")]
    Var,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("return")]
    Return,
    #[token("print")]
    Print,
    #[token("and")]
    And,
    #[token("or")]
    Or,
    #[token("not")]
    Not,
    #[token("true")]
    True,
    #[token("false")]
    False,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),
    #[regex(r#""([^"\\\n]|\\[^\n])*""#, unescape)]
    Str(String),

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token(":")]
    Colon,
    #[token("->")]
    Arrow,
    #[token("=")]
    Assign,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    LtEq,
    #[token(">")]
    Gt,
    #[token(">=")]
    GtEq,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
}

/// Strip the quotes from a string literal and process its escapes.
fn unescape(lex: &mut logos::Lexer<Token>) -> Option<String> {
    let slice = lex.slice();
    let body = &slice[1..slice.len() - 1];
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            '"' => out.push('"'),
            '\\' => out.push('\\'),
            _ => return None,
        }
    }
    Some(out)
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Token::Package => "package",
            Token::Import => "import",
            Token::Const => "const",
            Token::Type => "type",
            Token::Fn => "fn",
            Token::Var => "var",
            Token::If => "if",
            Token::Else => "else",
            Token::While => "while",
            Token::Return => "return",
            Token::Print => "print",
            Token::And => "and",
            Token::Or => "or",
            Token::Not => "not",
            Token::True => "true",
            Token::False => "false",
            Token::Ident(name) => return write!(f, "identifier `{name}`"),
            Token::Int(value) => return write!(f, "integer `{value}`"),
            Token::Str(_) => return f.write_str("string literal"),
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::Comma => ",",
            Token::Dot => ".",
            Token::Colon => ":",
            Token::Arrow => "->",
            Token::Assign => "=",
            Token::EqEq => "==",
            Token::NotEq => "!=",
            Token::Lt => "<",
            Token::LtEq => "<=",
            Token::Gt => ">",
            Token::GtEq => ">=",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
        };
        write!(f, "`{text}`")
    }
}

/// A token and where it was found.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lexeme {
    pub token: Token,
    pub pos: Position,
}

/// The first piece of text that is not a token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LexError {
    pub message: String,
    pub pos: Position,
}

/// Byte offsets of line starts, for turning spans into positions.
struct LineIndex<'a> {
    text: &'a str,
    starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    fn new(text: &'a str) -> Self {
        let starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        LineIndex { text, starts }
    }

    fn position(&self, span: std::ops::Range<usize>) -> Position {
        let line = match self.starts.binary_search(&span.start) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let start = self.starts[line];
        let col = self.text[start..span.start].chars().count();
        let len = self.text[span].chars().count().max(1);
        Position::new(to_u32(line + 1), to_u32(col), to_u32(len))
    }
}

fn to_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Describe a slice `logos` could not match.
fn describe(slice: &str) -> String {
    match slice.chars().next() {
        Some('"') if slice.len() > 1 && slice.ends_with('"') => {
            "invalid escape sequence in string literal".to_string()
        }
        Some('"') => "unterminated string literal".to_string(),
        Some(c) if c.is_ascii_digit() => format!("integer literal `{slice}` is out of range"),
        Some(c) => format!("unexpected character `{c}`"),
        None => "unexpected end of input".to_string(),
    }
}

/// Tokenize `text`.
///
/// Returns every token up to the first lexical error, and that error if
/// there was one. The parser reports the error only if it gets that far.
pub fn lex(text: &str) -> (Vec<Lexeme>, Option<LexError>) {
    let lines = LineIndex::new(text);
    let mut lexer = Token::lexer(text);
    let mut lexemes = Vec::new();
    while let Some(result) = lexer.next() {
        let pos = lines.position(lexer.span());
        match result {
            Ok(token) => lexemes.push(Lexeme { token, pos }),
            Err(()) => {
                let error = LexError {
                    message: describe(lexer.slice()),
                    pos,
                };
                return (lexemes, Some(error));
            }
        }
    }
    (lexemes, None)
}
