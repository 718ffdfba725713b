//! Lexer for the workflow catalog query language.

use std::fmt;

use crate::token::{Span, Token, TokenKind};

/// An invalid character or an unterminated string literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub message: String,
    /// Byte offset of the offending character.
    pub offset: usize,
}

impl LexError {
    fn new(message: String, offset: usize) -> Self {
        Self { message, offset }
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.message, self.offset)
    }
}

impl std::error::Error for LexError {}

pub struct Lexer<'a> {
    input: &'a str,
    /// Current byte position in the input
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer { input, position: 0 }
    }

    /// Returns the character at the current position without advancing.
    fn peek(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    /// Advances one character and returns it.
    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if let Some(c) = c {
            self.position += c.len_utf8();
        }
        c
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
    }

    /// Reads a double-quoted string literal. The opening quote has already
    /// been consumed by the caller.
    ///
    /// The content is kept verbatim: `\%` and any other backslash sequence
    /// belong to the pattern language, not to the literal.
    fn read_string(&mut self, start: usize) -> Result<Token<'a>, LexError> {
        let content_start = self.position;
        loop {
            match self.peek() {
                Some('"') => break,
                Some(_) => {
                    self.bump();
                }
                None => {
                    return Err(LexError::new(
                        "Unterminated string literal".to_string(),
                        start,
                    ))
                }
            }
        }
        let content_end = self.position;
        self.bump(); // closing quote

        Ok(Token {
            kind: TokenKind::String(&self.input[content_start..content_end]),
            span: Span::new(start, self.position),
        })
    }

    /// Reads an identifier or keyword: letters, digits and underscores.
    fn read_identifier(&mut self, start: usize) -> Token<'a> {
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.bump();
            } else {
                break;
            }
        }
        let literal = &self.input[start..self.position];
        Token {
            kind: match_keyword(literal),
            span: Span::new(start, self.position),
        }
    }

    /// Produces the next token, `Eof` once the input is exhausted.
    pub fn next_token(&mut self) -> Result<Token<'a>, LexError> {
        self.skip_whitespace();
        let start = self.position;

        let Some(c) = self.bump() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                span: Span::new(start, start),
            });
        };

        let kind = match c {
            '=' => TokenKind::Eq,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            ',' => TokenKind::Comma,
            '"' => return self.read_string(start),
            c if c.is_ascii_alphabetic() || c == '_' => return Ok(self.read_identifier(start)),
            other => {
                return Err(LexError::new(
                    format!("Unexpected character '{}'", other),
                    start,
                ))
            }
        };
        Ok(Token {
            kind,
            span: Span::new(start, self.position),
        })
    }

    /// Lexes the whole input. The last token is always `Eof`.
    pub fn tokenize(mut self) -> Result<Vec<Token<'a>>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }
}

/// Keywords are case-sensitive; `and` is a plain identifier.
fn match_keyword(s: &str) -> TokenKind {
    match s {
        "AND" => TokenKind::And,
        "OR" => TokenKind::Or,
        _ => TokenKind::Identifier(s),
    }
}

/// Convenience wrapper around [`Lexer::tokenize`].
pub fn tokenize(input: &str) -> Result<Vec<Token<'_>>, LexError> {
    Lexer::new(input).tokenize()
}
