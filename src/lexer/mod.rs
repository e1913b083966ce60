//! Lexer: characters to tokens
//!
//! A hand-written scanner over the input characters. It tracks the current
//! position itself (one column per character, newline bumps the line and
//! resets the column) so downstream stages only ever see positions attached
//! to tokens.
//!
//! Spaces, tabs and carriage returns are skipped; `\n` is emitted as an
//! explicit [`TokenKind::Newline`] because statements may be separated by
//! newlines as well as `;`. `//` comments run to end of line. Multi-character
//! operators are matched with maximal munch. The token stream always ends
//! with a single `Eof` token.

mod token;

pub use token::{Token, TokenKind};

use crate::error::{Error, Result};
use crate::span::Span;

/// Tokenize a complete source text.
pub fn lex(source: &str) -> Result<Vec<Token>> {
    Lexer::new(source).run()
}

struct Lexer {
    chars: Vec<char>,
    index: usize,
    line: usize,
    col: usize,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            index: 0,
            line: 1,
            col: 1,
        }
    }

    fn pos(&self) -> Span {
        Span::new(self.line, self.col)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.index + 1).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.index += 1;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn run(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();

        while let Some(c) = self.peek() {
            let start = self.pos();

            match c {
                ' ' | '\t' | '\r' => {
                    self.bump();
                }
                '\n' => {
                    self.bump();
                    tokens.push(Token::new(TokenKind::Newline, "\n", start));
                }
                '/' if self.peek_next() == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                '"' => tokens.push(self.string(start)?),
                c if c.is_ascii_digit() => tokens.push(self.number(start)?),
                c if c.is_ascii_alphabetic() || c == '_' => tokens.push(self.ident(start)),
                _ => tokens.push(self.operator(start)?),
            }
        }

        tokens.push(Token::new(TokenKind::Eof, "", self.pos()));
        Ok(tokens)
    }

    /// String literal. The error position is the opening quote.
    fn string(&mut self, start: Span) -> Result<Token> {
        self.bump();
        let mut value = String::new();
        let mut raw = String::from('"');

        loop {
            match self.peek() {
                None | Some('\n') => {
                    return Err(Error::lex("unterminated string", start));
                }
                Some('"') => {
                    self.bump();
                    raw.push('"');
                    return Ok(Token::new(TokenKind::Str(value), raw, start));
                }
                Some('\\') => {
                    let escape_pos = self.pos();
                    self.bump();
                    raw.push('\\');
                    let escaped = match self.peek() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('\\') => '\\',
                        Some('"') => '"',
                        Some(other) => {
                            return Err(Error::lex(
                                format!("unknown escape sequence '\\{other}'"),
                                escape_pos,
                            ));
                        }
                        None => return Err(Error::lex("unterminated string", start)),
                    };
                    raw.push(self.bump().unwrap_or_default());
                    value.push(escaped);
                }
                Some(c) => {
                    self.bump();
                    raw.push(c);
                    value.push(c);
                }
            }
        }
    }

    fn number(&mut self, start: Span) -> Result<Token> {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            text.push(c);
            self.bump();
        }
        let value: i64 = text
            .parse()
            .map_err(|_| Error::lex(format!("integer literal '{text}' out of range"), start))?;
        Ok(Token::new(TokenKind::Int(value), text, start))
    }

    fn ident(&mut self, start: Span) -> Token {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if !c.is_ascii_alphanumeric() && c != '_' {
                break;
            }
            text.push(c);
            self.bump();
        }
        match TokenKind::keyword(&text) {
            Some(kind) => Token::new(kind, text, start),
            None => Token::new(TokenKind::Ident(text.clone()), text, start),
        }
    }

    /// Punctuation and operators, longest match first.
    fn operator(&mut self, start: Span) -> Result<Token> {
        let c = self.peek().unwrap_or_default();
        let next = self.peek_next();

        let (kind, len) = match (c, next) {
            ('=', Some('=')) => (TokenKind::EqEq, 2),
            ('=', Some('>')) => (TokenKind::FatArrow, 2),
            ('!', Some('=')) => (TokenKind::NotEq, 2),
            ('<', Some('=')) => (TokenKind::LtEq, 2),
            ('>', Some('=')) => (TokenKind::GtEq, 2),
            ('&', Some('&')) => (TokenKind::AndAnd, 2),
            ('|', Some('|')) => (TokenKind::OrOr, 2),
            ('+', Some('=')) => (TokenKind::PlusAssign, 2),
            ('-', Some('=')) => (TokenKind::MinusAssign, 2),
            ('-', Some('>')) => (TokenKind::Arrow, 2),
            ('=', _) => (TokenKind::Assign, 1),
            ('!', _) => (TokenKind::Bang, 1),
            ('<', _) => (TokenKind::Lt, 1),
            ('>', _) => (TokenKind::Gt, 1),
            ('+', _) => (TokenKind::Plus, 1),
            ('-', _) => (TokenKind::Minus, 1),
            ('*', _) => (TokenKind::Star, 1),
            ('/', _) => (TokenKind::Slash, 1),
            ('%', _) => (TokenKind::Percent, 1),
            ('{', _) => (TokenKind::LBrace, 1),
            ('}', _) => (TokenKind::RBrace, 1),
            ('(', _) => (TokenKind::LParen, 1),
            (')', _) => (TokenKind::RParen, 1),
            (',', _) => (TokenKind::Comma, 1),
            (':', _) => (TokenKind::Colon, 1),
            (';', _) => (TokenKind::Semicolon, 1),
            _ => {
                return Err(Error::lex(format!("unexpected character '{c}'"), start));
            }
        };

        let mut text = String::new();
        for _ in 0..len {
            text.push(self.bump().unwrap_or_default());
        }
        Ok(Token::new(kind, text, start))
    }
}

/// Number of `{`/`(` delimiters currently left open in `source`, ignoring
/// delimiters inside string literals and `//` comments. Negative when there
/// are more closers than openers. Used by the REPL to decide whether an
/// accumulated input block is complete.
pub fn open_delimiters(source: &str) -> isize {
    let mut depth = 0isize;
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' | '(' => depth += 1,
            '}' | ')' => depth -= 1,
            '"' => {
                // Skip to the closing quote, honoring escapes; an
                // unterminated literal swallows the rest of the line.
                while let Some(c) = chars.next() {
                    match c {
                        '\\' => {
                            chars.next();
                        }
                        '"' | '\n' => break,
                        _ => {}
                    }
                }
            }
            '/' if chars.peek() == Some(&'/') => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            _ => {}
        }
    }

    depth
}
