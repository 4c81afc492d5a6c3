//! Database executor seam.

use crate::error::SqlResult;
use crate::row::Row;
use crate::value::Value;
use std::future::Future;

/// Outcome of a statement that returns no rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub rows_affected: u64,
}

impl ExecResult {
    pub fn new(rows_affected: u64) -> Self {
        Self { rows_affected }
    }
}

/// Runs rendered SQL with positional arguments.
///
/// Implemented by database handles and by transactions, so storage methods
/// can route a statement to whichever one the [`Context`](super::Context)
/// carries.
pub trait Executor: Send + Sync {
    /// Execute a statement and return the number of affected rows.
    fn execute(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl Future<Output = SqlResult<ExecResult>> + Send;

    /// Execute a query and return all rows.
    fn query(&self, sql: &str, args: &[Value]) -> impl Future<Output = SqlResult<Vec<Row>>> + Send;
}

/// A running transaction.
///
/// Finalizing twice is an error reported by the implementation.
pub trait Transaction: Executor {
    fn commit(&self) -> impl Future<Output = SqlResult<()>> + Send;

    fn rollback(&self) -> impl Future<Output = SqlResult<()>> + Send;
}

/// A database that can start transactions.
pub trait Database: Executor {
    type Tx: Transaction + 'static;

    fn begin(&self) -> impl Future<Output = SqlResult<Self::Tx>> + Send;
}
