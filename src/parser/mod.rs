//! Parser: tokens to surface AST
//!
//! Recursive descent over the token stream. [`ParseState`] owns the cursor
//! and supports the save/restore backtracking used for the few ambiguous
//! spots in the grammar (compact lambdas versus parenthesized expressions).
//! The first error aborts parsing; there is no recovery.

mod grammar;

use crate::ast::Program;
use crate::error::{Error, Result};
use crate::lexer::{Token, TokenKind};

/// Parse a complete token stream (as produced by [`crate::lexer::lex`],
/// terminated by `Eof`) into a program.
pub fn parse(tokens: Vec<Token>) -> Result<Program> {
    let mut state = ParseState::new(tokens);
    grammar::program(&mut state)
}

/// Cursor over the token stream.
pub struct ParseState {
    tokens: Vec<Token>,
    index: usize,
}

impl ParseState {
    pub fn new(tokens: Vec<Token>) -> Self {
        debug_assert!(matches!(
            tokens.last().map(|t| &t.kind),
            Some(TokenKind::Eof)
        ));
        Self { tokens, index: 0 }
    }

    /// The next token to consume. The stream is `Eof`-terminated, so there
    /// is always one.
    pub fn peek(&self) -> &Token {
        &self.tokens[self.index.min(self.tokens.len() - 1)]
    }

    pub fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    /// Consume and return the next token. Never advances past `Eof`.
    pub fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !matches!(token.kind, TokenKind::Eof) {
            self.index += 1;
        }
        token
    }

    /// Consume the next token if it has the same kind (payloads ignored).
    pub fn eat(&mut self, kind: &TokenKind) -> bool {
        if std::mem::discriminant(self.peek_kind()) == std::mem::discriminant(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume a token of the given kind or fail with `expected ...`.
    pub fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token> {
        if std::mem::discriminant(self.peek_kind()) == std::mem::discriminant(&kind) {
            Ok(self.advance())
        } else {
            Err(self.error_expected(what))
        }
    }

    /// Skip newline tokens; used where line breaks are insignificant.
    pub fn skip_newlines(&mut self) {
        while matches!(self.peek_kind(), TokenKind::Newline) {
            self.advance();
        }
    }

    /// Skip statement separators (newlines and semicolons).
    pub fn skip_separators(&mut self) {
        while matches!(self.peek_kind(), TokenKind::Newline | TokenKind::Semicolon) {
            self.advance();
        }
    }

    /// Current cursor position, for backtracking.
    pub fn position(&self) -> usize {
        self.index
    }

    /// Restore the cursor to a previously saved position.
    pub fn restore(&mut self, position: usize) {
        self.index = position;
    }

    /// An error of the form `expected <what>, found <token>` at the current
    /// token.
    pub fn error_expected(&self, what: &str) -> Error {
        let token = self.peek();
        Error::parse(
            format!("expected {what}, found {}", token.describe()),
            token.span,
        )
    }
}
