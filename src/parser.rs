//! Parser for the workflow catalog query language.
//!
//! ## Call graph
//!
//! ```text
//! parse()
//!   ├─ Eof → Predicate::MatchAll
//!   └─ parse_or_expression()
//!        ├─ parse_and_expression()
//!        │    ├─ parse_predicate()
//!        │    │    ├─ name "=" STRING
//!        │    │    ├─ project_name "=" STRING
//!        │    │    ├─ generic_information "(" STRING "," STRING ")"
//!        │    │    └─ variable "(" STRING "," STRING ")"
//!        │    │
//!        │    └─ on AND, parse the next predicate
//!        │
//!        └─ on OR, parse the next AND expression
//! ```
//!
//! ## Precedence (high to low)
//!
//! 1. **Predicates** `name="..."`, `variable("...", "...")`
//! 2. **AND**
//! 3. **OR**
//!
//! Both operators fold to the left: `a AND b AND c` is `And(And(a, b), c)`.
//! There are no parenthesized groups.

use std::fmt;

use crate::ast::Predicate;
use crate::token::{Span, Token, TokenKind};
use crate::wildcard::Pattern;

const PREDICATE_EXPECTED: &str =
    "a predicate (name, project_name, generic_information or variable)";

pub struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    position: usize,
}

/// A grammar violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Span of the offending token.
    pub span: Span,
    /// Human readable description of what was expected.
    pub expected: String,
    /// Human readable description of the offending token.
    pub found: String,
}

impl ParseError {
    fn new(span: Span, expected: impl Into<String>, found: &TokenKind) -> Self {
        Self {
            span,
            expected: expected.into(),
            found: found.to_string(),
        }
    }

    pub fn message(&self) -> String {
        format!("Expected {}, found {}", self.expected, self.found)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.message(), self.span.start)
    }
}

impl std::error::Error for ParseError {}

impl<'a> Parser<'a> {
    /// `tokens` should end with `Eof`, as produced by the lexer. A missing
    /// terminator is added.
    pub fn new(mut tokens: Vec<Token<'a>>) -> Self {
        if tokens.last().map(|t| &t.kind) != Some(&TokenKind::Eof) {
            let end = tokens.last().map(|t| t.span.end).unwrap_or(0);
            tokens.push(Token {
                kind: TokenKind::Eof,
                span: Span::new(end, end),
            });
        }
        Self {
            tokens,
            position: 0,
        }
    }

    /// Current token. Never moves past `Eof`.
    fn peek(&self) -> &Token<'a> {
        let last = self.tokens.len() - 1;
        &self.tokens[self.position.min(last)]
    }

    /// Returns the current token and advances, staying on `Eof`.
    fn advance(&mut self) -> Token<'a> {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.position += 1;
        }
        token
    }

    fn match_token(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(kind)
    }

    /// Consumes a token of the expected kind or fails.
    fn expect(&mut self, expected: TokenKind) -> Result<Token<'a>, ParseError> {
        if self.match_token(&expected) {
            Ok(self.advance())
        } else {
            let token = self.peek();
            Err(ParseError::new(token.span, expected.to_string(), &token.kind))
        }
    }

    fn expect_string(&mut self) -> Result<&'a str, ParseError> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::String(content) => {
                self.advance();
                Ok(content)
            }
            _ => Err(ParseError::new(token.span, "a string literal", &token.kind)),
        }
    }

    pub fn parse(mut self) -> Result<Predicate, ParseError> {
        if self.match_token(&TokenKind::Eof) {
            return Ok(Predicate::MatchAll);
        }

        let predicate = self.parse_or_expression()?;

        let token = self.peek();
        if token.kind != TokenKind::Eof {
            return Err(ParseError::new(
                token.span,
                "'AND', 'OR' or end of input",
                &token.kind,
            ));
        }
        Ok(predicate)
    }

    /// `and_expr (OR and_expr)*`
    fn parse_or_expression(&mut self) -> Result<Predicate, ParseError> {
        let mut left = self.parse_and_expression()?;

        while self.match_token(&TokenKind::Or) {
            self.advance();
            let right = self.parse_and_expression()?;
            left = Predicate::or(left, right);
        }

        Ok(left)
    }

    /// `predicate (AND predicate)*`
    fn parse_and_expression(&mut self) -> Result<Predicate, ParseError> {
        let mut left = self.parse_predicate()?;

        while self.match_token(&TokenKind::And) {
            self.advance();
            let right = self.parse_predicate()?;
            left = Predicate::and(left, right);
        }

        Ok(left)
    }

    fn parse_predicate(&mut self) -> Result<Predicate, ParseError> {
        let token = self.advance();
        match token.kind {
            TokenKind::Identifier("name") => {
                self.expect(TokenKind::Eq)?;
                Ok(Predicate::Name(Pattern::new(self.expect_string()?)))
            }
            TokenKind::Identifier("project_name") => {
                self.expect(TokenKind::Eq)?;
                Ok(Predicate::ProjectName(Pattern::new(self.expect_string()?)))
            }
            TokenKind::Identifier("generic_information") => {
                let (key, value) = self.parse_key_value()?;
                Ok(Predicate::GenericInformation { key, value })
            }
            TokenKind::Identifier("variable") => {
                let (key, value) = self.parse_key_value()?;
                Ok(Predicate::Variable { key, value })
            }
            _ => Err(ParseError::new(token.span, PREDICATE_EXPECTED, &token.kind)),
        }
    }

    /// `"(" STRING "," STRING ")"`
    fn parse_key_value(&mut self) -> Result<(Pattern, Pattern), ParseError> {
        self.expect(TokenKind::LParen)?;
        let key = self.expect_string()?;
        self.expect(TokenKind::Comma)?;
        let value = self.expect_string()?;
        self.expect(TokenKind::RParen)?;
        Ok((Pattern::new(key), Pattern::new(value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse_string(input: &str) -> Result<Predicate, ParseError> {
        Parser::new(tokenize(input).unwrap()).parse()
    }

    #[test]
    fn test_empty_query_matches_all() {
        assert_eq!(parse_string("").unwrap(), Predicate::MatchAll);
        assert_eq!(parse_string("   ").unwrap(), Predicate::MatchAll);
    }

    #[test]
    fn test_simple_predicates() {
        assert_eq!(parse_string(r#"name="B""#).unwrap(), Predicate::name("B"));
        assert_eq!(
            parse_string(r#"project_name = "Fab%""#).unwrap(),
            Predicate::project_name("Fab%")
        );
        assert_eq!(
            parse_string(r#"generic_information("I","E")"#).unwrap(),
            Predicate::generic_information("I", "E")
        );
        assert_eq!(
            parse_string(r#"variable( "CPU" , "5%" )"#).unwrap(),
            Predicate::variable("CPU", "5%")
        );
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let result = parse_string(
            r#"generic_information("I", "E") OR generic_information("C", "E") AND variable("CPU", "%")"#,
        )
        .unwrap();

        assert_eq!(
            result,
            Predicate::or(
                Predicate::generic_information("I", "E"),
                Predicate::and(
                    Predicate::generic_information("C", "E"),
                    Predicate::variable("CPU", "%"),
                ),
            )
        );
    }

    #[test]
    fn test_and_before_or_on_the_left() {
        let result = parse_string(r#"name="a" AND name="b" OR name="c""#).unwrap();
        assert_eq!(
            result,
            Predicate::or(
                Predicate::and(Predicate::name("a"), Predicate::name("b")),
                Predicate::name("c"),
            )
        );
    }

    #[test]
    fn test_left_associative_folding() {
        let result = parse_string(r#"name="a" AND name="b" AND name="c""#).unwrap();
        assert_eq!(
            result,
            Predicate::and(
                Predicate::and(Predicate::name("a"), Predicate::name("b")),
                Predicate::name("c"),
            )
        );

        let result = parse_string(r#"name="a" OR name="b" OR name="c""#).unwrap();
        assert_eq!(
            result,
            Predicate::or(
                Predicate::or(Predicate::name("a"), Predicate::name("b")),
                Predicate::name("c"),
            )
        );
    }

    #[test]
    fn test_missing_closing_parenthesis() {
        let err = parse_string(r#"variable("CPU", "4""#).unwrap_err();
        assert_eq!(err.expected, "')'");
        assert_eq!(err.found, "end of input");
        assert_eq!(err.span.start, 19);
    }

    #[test]
    fn test_missing_comma() {
        let err = parse_string(r#"generic_information("I" "E")"#).unwrap_err();
        assert_eq!(err.expected, "','");
        assert_eq!(err.found, "string \"E\"");
        assert_eq!(err.span.start, 24);
    }

    #[test]
    fn test_unknown_identifier() {
        let err = parse_string(r#"owner="me""#).unwrap_err();
        assert_eq!(err.expected, PREDICATE_EXPECTED);
        assert_eq!(err.found, "identifier 'owner'");
        assert_eq!(err.span.start, 0);
    }

    #[test]
    fn test_string_where_field_expected() {
        let err = parse_string(r#""" = "A""#).unwrap_err();
        assert_eq!(err.expected, PREDICATE_EXPECTED);
        assert_eq!(err.found, "string \"\"");
    }

    #[test]
    fn test_dangling_operator() {
        let err = parse_string(r#"name="A" AND"#).unwrap_err();
        assert_eq!(err.found, "end of input");

        let err = parse_string(r#"OR name="A""#).unwrap_err();
        assert_eq!(err.found, "'OR'");
    }

    #[test]
    fn test_trailing_tokens() {
        let err = parse_string(r#"name="A" name="B""#).unwrap_err();
        assert_eq!(err.expected, "'AND', 'OR' or end of input");
        assert_eq!(err.span.start, 9);
    }

    #[test]
    fn test_parenthesized_groups_are_rejected() {
        let err = parse_string(r#"(name="A")"#).unwrap_err();
        assert_eq!(err.found, "'('");
    }

    #[test]
    fn test_lowercase_operator_is_not_a_keyword() {
        let err = parse_string(r#"name="A" and name="B""#).unwrap_err();
        assert_eq!(err.found, "identifier 'and'");
    }

    #[test]
    fn test_missing_terminator_is_added() {
        let mut tokens = tokenize(r#"name="A""#).unwrap();
        tokens.pop();
        assert_eq!(Parser::new(tokens).parse().unwrap(), Predicate::name("A"));
        assert_eq!(Parser::new(Vec::new()).parse().unwrap(), Predicate::MatchAll);
    }
}
