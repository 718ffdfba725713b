//! SQL compiler that converts a predicate tree into a revision search query
//! using sea-query.
//!
//! Revision metadata is assumed to live in three tables: the revision table
//! (`id`, `name`, `project_name`) and two key/value tables
//! (`workflow_revision_id`, `key`, `value`) for generic information and
//! variables. Map predicates become correlated `EXISTS` subqueries.

use sea_query::{
    Asterisk, Expr, Iden, LikeExpr, PostgresQueryBuilder, QueryStatementWriter, SelectStatement,
    SimpleExpr,
};

use crate::ast::Predicate;
use crate::config::CatalogConfig;
use crate::wildcard::Pattern;

const REVISION_ENTITY: &str = "WorkflowRevision";
const GENERIC_INFORMATION_ENTITY: &str = "GenericInformation";
const VARIABLE_ENTITY: &str = "Variable";

/// Table identifier for sea-query
#[derive(Debug, Clone)]
pub struct TableName(pub String);

impl Iden for TableName {
    fn unquoted(&self, s: &mut dyn std::fmt::Write) {
        write!(s, "{}", self.0).unwrap();
    }
}

/// Column identifier wrapper
#[derive(Debug, Clone)]
pub struct ColumnName(pub &'static str);

impl Iden for ColumnName {
    fn unquoted(&self, s: &mut dyn std::fmt::Write) {
        write!(s, "{}", self.0).unwrap();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompileError {
    pub message: String,
}

impl CompileError {
    fn new(message: String) -> Self {
        Self { message }
    }
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "compile error: {}", self.message)
    }
}

impl std::error::Error for CompileError {}

/// Represents an optimization applied during compilation
#[derive(Debug, Clone, PartialEq)]
pub enum Optimization {
    /// A pattern without wildcard compiled to `=` instead of `LIKE`.
    LikeToEquality { column: String },
    /// A lone `%` pattern dropped, it accepts every value.
    RedundantConditionRemoval { column: String },
}

/// Result of SQL compilation with optimization information
#[derive(Debug)]
pub struct CompileResult {
    pub sql: String,
    pub optimizations: Vec<Optimization>,
}

/// SQL Compiler that converts predicate trees to SQL queries
pub struct SqlCompiler {
    revision_table: String,
    generic_information_table: String,
    variable_table: String,
}

impl Default for SqlCompiler {
    fn default() -> Self {
        Self::with_tables(&CatalogConfig::default())
    }
}

impl SqlCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves the table names once. Map predicates join their key/value
    /// table back to the revision table, so the two must be distinct.
    pub fn from_config(config: &CatalogConfig) -> Result<Self, CompileError> {
        let compiler = Self::with_tables(config);

        for table in [&compiler.generic_information_table, &compiler.variable_table] {
            if *table == compiler.revision_table {
                return Err(CompileError::new(format!(
                    "key/value table '{}' must differ from the revision table",
                    table
                )));
            }
        }

        Ok(compiler)
    }

    fn with_tables(config: &CatalogConfig) -> Self {
        Self {
            revision_table: config.get_table_name(REVISION_ENTITY),
            generic_information_table: config.get_table_name(GENERIC_INFORMATION_ENTITY),
            variable_table: config.get_table_name(VARIABLE_ENTITY),
        }
    }

    /// Compile a predicate into `SELECT * FROM <revisions> WHERE ...`
    pub fn compile(&self, predicate: &Predicate) -> CompileResult {
        let mut optimizations = Vec::new();

        let mut select = SelectStatement::new();
        select.from(TableName(self.revision_table.clone()));
        select.column(Asterisk);

        if *predicate != Predicate::MatchAll {
            let condition = self.compile_condition(predicate, &mut optimizations);
            select.and_where(condition);
        }

        let sql = select.to_string(PostgresQueryBuilder);

        CompileResult { sql, optimizations }
    }

    fn compile_condition(
        &self,
        predicate: &Predicate,
        optimizations: &mut Vec<Optimization>,
    ) -> SimpleExpr {
        match predicate {
            Predicate::MatchAll => Expr::val(true).into(),
            Predicate::Name(pattern) => {
                let table = &self.revision_table;
                self.compile_pattern(table, ColumnName("name"), pattern, optimizations)
                    .unwrap_or_else(|| Expr::val(true).into())
            }
            Predicate::ProjectName(pattern) => {
                let table = &self.revision_table;
                self.compile_pattern(table, ColumnName("project_name"), pattern, optimizations)
                    .unwrap_or_else(|| Expr::val(true).into())
            }
            Predicate::GenericInformation { key, value } => {
                self.compile_entry(&self.generic_information_table, key, value, optimizations)
            }
            Predicate::Variable { key, value } => {
                self.compile_entry(&self.variable_table, key, value, optimizations)
            }
            Predicate::And(left, right) => {
                let left_expr = self.compile_condition(left, optimizations);
                let right_expr = self.compile_condition(right, optimizations);
                left_expr.and(right_expr)
            }
            Predicate::Or(left, right) => {
                let left_expr = self.compile_condition(left, optimizations);
                let right_expr = self.compile_condition(right, optimizations);
                left_expr.or(right_expr)
            }
        }
    }

    /// `EXISTS (SELECT 1 FROM <table> WHERE <table>.workflow_revision_id = <revisions>.id AND ...)`
    fn compile_entry(
        &self,
        table: &str,
        key: &Pattern,
        value: &Pattern,
        optimizations: &mut Vec<Optimization>,
    ) -> SimpleExpr {
        let mut subquery = SelectStatement::new();
        subquery.expr(Expr::val(1));
        subquery.from(TableName(table.to_string()));
        subquery.and_where(
            Expr::col((
                TableName(table.to_string()),
                ColumnName("workflow_revision_id"),
            ))
            .equals((TableName(self.revision_table.clone()), ColumnName("id"))),
        );
        if let Some(condition) = self.compile_pattern(table, ColumnName("key"), key, optimizations) {
            subquery.and_where(condition);
        }
        if let Some(condition) =
            self.compile_pattern(table, ColumnName("value"), value, optimizations)
        {
            subquery.and_where(condition);
        }

        Expr::exists(subquery)
    }

    /// `None` when the pattern accepts every value.
    fn compile_pattern(
        &self,
        table: &str,
        column: ColumnName,
        pattern: &Pattern,
        optimizations: &mut Vec<Optimization>,
    ) -> Option<SimpleExpr> {
        let qualified = format!("{}.{}", table, column.0);
        let col = Expr::col((TableName(table.to_string()), column));

        if pattern.is_match_all() {
            optimizations.push(Optimization::RedundantConditionRemoval { column: qualified });
            return None;
        }
        if let Some(exact) = pattern.as_literal() {
            optimizations.push(Optimization::LikeToEquality { column: qualified });
            return Some(col.eq(exact));
        }
        Some(col.like(LikeExpr::new(pattern.to_sql_like()).escape('\\')))
    }
}
