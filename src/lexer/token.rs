//! Token definitions

use std::fmt;

use crate::span::Span;

/// The kind of a lexed token. Literal payloads are already decoded: integer
/// text is parsed, string escapes are resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Ident(String),
    Int(i64),
    Str(String),

    // Keywords
    Def,
    Val,
    Var,
    If,
    Then,
    Else,
    While,
    Break,
    Continue,
    Return,
    Fn,
    True,
    False,

    // Punctuation
    LBrace,
    RBrace,
    LParen,
    RParen,
    Comma,
    Colon,
    Semicolon,
    Newline,
    Assign,
    PlusAssign,
    MinusAssign,
    FatArrow,
    Arrow,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    AndAnd,
    OrOr,
    Bang,

    Eof,
}

impl TokenKind {
    /// Maps an identifier lexeme to its keyword kind, if it is reserved.
    pub fn keyword(ident: &str) -> Option<TokenKind> {
        let kind = match ident {
            "def" => TokenKind::Def,
            "val" => TokenKind::Val,
            "var" => TokenKind::Var,
            "if" => TokenKind::If,
            "then" => TokenKind::Then,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            "return" => TokenKind::Return,
            "fn" => TokenKind::Fn,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            _ => return None,
        };
        Some(kind)
    }
}

/// A single token: kind, raw lexeme, and the position of its first character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }

    /// Returns a human-readable description for parse error messages.
    pub fn describe(&self) -> String {
        match &self.kind {
            TokenKind::Ident(name) => format!("identifier '{name}'"),
            TokenKind::Int(value) => format!("integer '{value}'"),
            TokenKind::Str(_) => format!("string {:?}", self.text),
            TokenKind::Newline => "newline".to_string(),
            TokenKind::Eof => "end of input".to_string(),
            _ => format!("'{}'", self.text),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}
