//! Trait definitions for statement builders.

use crate::value::Value;
use thiserror::Error;

/// Errors raised while rendering a statement.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QbError {
    #[error("select statements must have at least one result column")]
    NoColumns,

    #[error("{0} statements must specify a table")]
    NoTable(&'static str),

    #[error("insert statements must have at least one set of values")]
    NoValues,

    #[error("insert row {row} has {got} values, expected {expected}")]
    RowLength {
        row: usize,
        got: usize,
        expected: usize,
    },

    #[error("update statements must have at least one Set clause")]
    NoSetClauses,

    #[error("expression {sql:?} has {placeholders} placeholders but {args} arguments")]
    ArgCount {
        sql: String,
        placeholders: usize,
        args: usize,
    },
}

/// The result of building a statement.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub sql: String,
    pub args: Vec<Value>,
}

impl BuiltQuery {
    pub fn new(sql: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            args,
        }
    }
}

/// Anything that renders to SQL text with positional arguments.
pub trait SqlQb {
    /// Render SQL and arguments.
    fn build(&self) -> Result<BuiltQuery, QbError>;
}

impl<Q: SqlQb + ?Sized> SqlQb for &Q {
    fn build(&self) -> Result<BuiltQuery, QbError> {
        (**self).build()
    }
}

impl SqlQb for BuiltQuery {
    fn build(&self) -> Result<BuiltQuery, QbError> {
        Ok(self.clone())
    }
}

/// A literal SQL statement without arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawStatement(pub String);

impl RawStatement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self(sql.into())
    }
}

impl SqlQb for RawStatement {
    fn build(&self) -> Result<BuiltQuery, QbError> {
        Ok(BuiltQuery::new(self.0.clone(), Vec::new()))
    }
}

impl SqlQb for str {
    fn build(&self) -> Result<BuiltQuery, QbError> {
        Ok(BuiltQuery::new(self, Vec::new()))
    }
}

impl SqlQb for String {
    fn build(&self) -> Result<BuiltQuery, QbError> {
        Ok(BuiltQuery::new(self.clone(), Vec::new()))
    }
}
