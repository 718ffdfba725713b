//! Entry points used by the retrieval layer: parse a query once, then test
//! or filter records with it.

use std::fmt;
use std::str::FromStr;

use log::debug;

use crate::ast::Predicate;
use crate::evaluator::evaluate;
use crate::lexer::{tokenize, LexError};
use crate::parser::{ParseError, Parser};
use crate::record::Metadata;

/// Why a query string was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    Lex(LexError),
    Parse(ParseError),
}

impl QueryError {
    /// Byte offset in the query where the problem was detected.
    pub fn offset(&self) -> usize {
        match self {
            QueryError::Lex(e) => e.offset,
            QueryError::Parse(e) => e.span.start,
        }
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::Lex(e) => write!(f, "invalid query: {}", e),
            QueryError::Parse(e) => write!(f, "invalid query: {}", e),
        }
    }
}

impl std::error::Error for QueryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            QueryError::Lex(e) => Some(e),
            QueryError::Parse(e) => Some(e),
        }
    }
}

impl From<LexError> for QueryError {
    fn from(e: LexError) -> Self {
        QueryError::Lex(e)
    }
}

impl From<ParseError> for QueryError {
    fn from(e: ParseError) -> Self {
        QueryError::Parse(e)
    }
}

/// Lexes and parses `query` into a predicate tree.
pub fn parse(query: &str) -> Result<Predicate, QueryError> {
    let tokens = tokenize(query)?;
    let predicate = Parser::new(tokens).parse()?;
    Ok(predicate)
}

/// Parses `query` and evaluates it against a single record.
pub fn matches<M: Metadata + ?Sized>(query: &str, record: &M) -> Result<bool, QueryError> {
    Ok(evaluate(&parse(query)?, record))
}

/// A parsed query together with its source text.
///
/// Immutable once built, so one instance can be shared across threads and
/// evaluated against many records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    source: String,
    predicate: Predicate,
}

impl Query {
    pub fn parse(source: &str) -> Result<Self, QueryError> {
        let predicate = parse(source)?;
        debug!(
            "parsed query '{}' into {} predicate(s)",
            source,
            predicate.leaf_count()
        );
        Ok(Self {
            source: source.to_string(),
            predicate,
        })
    }

    /// The query that matches every record.
    pub fn match_all() -> Self {
        Self {
            source: String::new(),
            predicate: Predicate::MatchAll,
        }
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    pub fn matches<M: Metadata + ?Sized>(&self, record: &M) -> bool {
        evaluate(&self.predicate, record)
    }

    /// Keeps the records that match, in input order.
    pub fn filter<'r, M, I>(&self, records: I) -> Vec<&'r M>
    where
        M: Metadata + 'r,
        I: IntoIterator<Item = &'r M>,
    {
        let mut examined = 0usize;
        let selected: Vec<&'r M> = records
            .into_iter()
            .inspect(|_| examined += 1)
            .filter(|record| self.matches(*record))
            .collect();
        debug!(
            "query '{}' selected {} of {} record(s)",
            self.source,
            selected.len(),
            examined
        );
        selected
    }
}

impl FromStr for Query {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Query::parse(s)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
