//! Workflow catalog query language (WCQL): lexer, parser, evaluator and the
//! surrounding catalog plumbing.
//!
//! ```text
//! query string → lexer → tokens → parser → Predicate → evaluator (per record) → bool
//!                                              └────→ sql_compiler → SQL
//! ```

pub mod ast;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod record;
pub mod sql_compiler;
pub mod token;
pub mod wildcard;

pub use ast::Predicate;
pub use engine::{matches, parse, Query, QueryError};
pub use record::{Metadata, WorkflowMetadata};

/// Application name.
pub const APP_NAME: &str = "wcql";

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
