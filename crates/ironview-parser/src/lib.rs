//! IronView Parser - SQL statement parsing
//!
//! This crate wraps sqlparser-rs. It is a black box to the rest of the catalog:
//! text goes in, a statement or a parse error comes out.

use ironview_common::{Error, Result};
use serde::Deserialize;
use sqlparser::ast::Statement;
use sqlparser::dialect::{Dialect, DuckDbDialect, GenericDialect, HiveDialect};
use sqlparser::parser::Parser;

pub mod ast;

/// SQL dialect used to parse stored definitions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialect {
    #[default]
    Generic,
    DuckDb,
    Hive,
}

/// Options controlling how definition text is parsed
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ParserOptions {
    pub dialect: SqlDialect,
}

impl ParserOptions {
    pub fn with_dialect(mut self, dialect: SqlDialect) -> Self {
        self.dialect = dialect;
        self
    }

    fn dialect(&self) -> Box<dyn Dialect> {
        match self.dialect {
            SqlDialect::Generic => Box::new(GenericDialect {}),
            SqlDialect::DuckDb => Box::new(DuckDbDialect {}),
            SqlDialect::Hive => Box::new(HiveDialect {}),
        }
    }
}

/// Parse a SQL string into a list of statements
pub fn parse_sql(sql: &str, options: &ParserOptions) -> Result<Vec<Statement>> {
    let dialect = options.dialect();
    Parser::parse_sql(dialect.as_ref(), sql).map_err(|e| Error::Parse(e.to_string()))
}

/// Parse exactly one SQL statement.
///
/// Empty input and input holding several statements are parse errors.
pub fn parse_statement(sql: &str, options: &ParserOptions) -> Result<Statement> {
    let mut statements = parse_sql(sql, options)?;
    if statements.len() != 1 {
        return Err(Error::Parse(format!(
            "Expected 1 statement, got {}",
            statements.len()
        )));
    }
    statements
        .pop()
        .ok_or_else(|| Error::Internal("statement list emptied".to_string()))
}
