//! Statement tracing hooks.

use crate::error::SqlError;
use crate::value::Value;
use std::time::Duration;
use tracing::Level;

/// The type of SQL operation being performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    Select,
    Insert,
    Update,
    Delete,
    /// DDL, CTEs and anything else
    Other,
}

impl QueryType {
    /// Detect the query type from the leading keyword.
    pub fn from_sql(sql: &str) -> Self {
        let keyword = sql
            .trim_start_matches(|c: char| c.is_whitespace() || c == '(')
            .split(|c: char| !c.is_ascii_alphabetic())
            .next()
            .unwrap_or_default();

        if keyword.eq_ignore_ascii_case("SELECT") {
            QueryType::Select
        } else if keyword.eq_ignore_ascii_case("INSERT") {
            QueryType::Insert
        } else if keyword.eq_ignore_ascii_case("UPDATE") {
            QueryType::Update
        } else if keyword.eq_ignore_ascii_case("DELETE") {
            QueryType::Delete
        } else {
            QueryType::Other
        }
    }
}

/// A statement about to run.
#[derive(Debug, Clone)]
pub struct QueryContext<'q> {
    pub sql: &'q str,
    pub args: &'q [Value],
    pub query_type: QueryType,
    /// Whether the statement runs inside a transaction.
    pub in_tx: bool,
}

impl<'q> QueryContext<'q> {
    pub fn new(sql: &'q str, args: &'q [Value], in_tx: bool) -> Self {
        Self {
            sql,
            args,
            query_type: QueryType::from_sql(sql),
            in_tx,
        }
    }
}

/// Observes statement execution.
///
/// `before_query` runs once the statement is built and `after_query` once
/// execution finished, with the failure if there was one. Build failures
/// never reach the hook.
pub trait QueryHook: Send + Sync {
    fn before_query(&self, ctx: &QueryContext<'_>) {
        let _ = ctx;
    }

    fn after_query(&self, _ctx: &QueryContext<'_>, _duration: Duration, _error: Option<&SqlError>) {}
}

/// A `tracing` hook that logs statements and their outcome.
#[derive(Debug, Clone)]
pub struct TracingHook {
    /// Tracing event level to emit at.
    pub level: Level,
    /// Truncate long SQL strings (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for TracingHook {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            max_sql_length: Some(200),
        }
    }
}

/// Dispatch a tracing event at a runtime-determined level.
macro_rules! emit_at_level {
    ($level:expr, $($field:tt)*) => {
        match $level {
            Level::ERROR => tracing::error!($($field)*),
            Level::WARN => tracing::warn!($($field)*),
            Level::INFO => tracing::info!($($field)*),
            Level::DEBUG => tracing::debug!($($field)*),
            Level::TRACE => tracing::trace!($($field)*),
        }
    };
}

impl TracingHook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    pub(crate) fn truncate_sql(&self, sql: &str) -> String {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_bytes(sql, max)),
            _ => sql.to_string(),
        }
    }
}

impl QueryHook for TracingHook {
    fn before_query(&self, ctx: &QueryContext<'_>) {
        let sql = self.truncate_sql(ctx.sql);
        emit_at_level!(
            self.level,
            target: "sqlstruct.sql",
            query_type = ?ctx.query_type,
            param_count = ctx.args.len(),
            in_tx = ctx.in_tx,
            sql = %sql,
            "executing statement"
        );
    }

    fn after_query(&self, ctx: &QueryContext<'_>, duration: Duration, error: Option<&SqlError>) {
        let elapsed_ms = duration.as_secs_f64() * 1000.0;
        match error {
            Some(err) => emit_at_level!(
                self.level,
                target: "sqlstruct.sql",
                query_type = ?ctx.query_type,
                elapsed_ms,
                error = %err,
                "statement failed"
            ),
            None => emit_at_level!(
                self.level,
                target: "sqlstruct.sql",
                query_type = ?ctx.query_type,
                elapsed_ms,
                "statement finished"
            ),
        }
    }
}

fn truncate_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
