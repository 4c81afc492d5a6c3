//! Error types for sqlstruct

use crate::options::Dialect;
use crate::qb::QbError;
use thiserror::Error;

/// Result type alias for sqlstruct operations
pub type SqlResult<T> = Result<T, SqlError>;

/// Recoverable errors returned by statement building and execution.
#[derive(Debug, Error)]
pub enum SqlError {
    /// The statement builder could not render SQL.
    #[error("failed to build query: {0}")]
    Build(#[from] QbError),

    /// Starting a transaction failed.
    #[error("failed to begin tx: {0}")]
    BeginTx(#[source] Box<SqlError>),

    /// Committing a transaction failed.
    #[error("failed to commit: {0}")]
    Commit(#[source] Box<SqlError>),

    /// Rolling back failed after the wrapped function returned `original`.
    #[error("failed to rollback: {source} (original error: {original})")]
    Rollback {
        #[source]
        source: Box<SqlError>,
        original: Box<SqlError>,
    },

    /// Transaction finalization was requested without a transaction.
    #[error("no running transaction")]
    NoRunningTx,

    /// Single-row fetch found nothing.
    #[error("no rows in result set")]
    NotFound,

    /// Query execution error
    #[error("query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Pool error
    #[error("pool error: {0}")]
    Pool(String),

    /// Database connection error
    #[error("connection error: {0}")]
    Connection(String),

    /// Row decode/mapping error
    #[error("decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl SqlError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Check if this is the "no rows" sentinel.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// Check if this is a failed rollback.
    pub fn is_rollback(&self) -> bool {
        matches!(self, Self::Rollback { .. })
    }

    /// The error that triggered a failed rollback, if any.
    pub fn original(&self) -> Option<&SqlError> {
        match self {
            Self::Rollback { original, .. } => Some(original),
            _ => None,
        }
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for SqlError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}

/// Contract violations by calling code.
///
/// Panicking APIs report these through `panic!`; every such API has a
/// `try_*` variant that returns them instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("unknown field or row")]
    UnknownFieldOrRow,

    #[error("unknown field or row at position {0}")]
    UnknownAt(usize),

    #[error("literal argument at position {0} is not allowed in strict mode")]
    LiteralAt(usize),

    #[error("row needs to be added first with add_table_alias")]
    UnregisteredRow,

    #[error("template has {placeholders} placeholders but {args} arguments")]
    FormatArgs { placeholders: usize, args: usize },

    #[error("insert ignore is not supported for {0:?} dialect")]
    InsertIgnore(Dialect),
}
