//! Storage facade: statement construction and execution over a [`Database`].
//!
//! # Usage
//!
//! ```ignore
//! use sqlstruct::{Context, Options, Storage, StorageConfig, quote_ansi};
//!
//! let st = Storage::with_config(db, StorageConfig::new().with_quoter(quote_ansi));
//! let ctx = Context::background();
//!
//! st.in_tx(&ctx, |ctx| async move {
//!     st.exec(&ctx, &st.insert_stmt("users", &user, Options::new())).await?;
//!     st.exec(&ctx, &st.delete_stmt("sessions").where_sql("user_id = ?", vec![user.id.into()])).await?;
//!     Ok(())
//! })
//! .await?;
//! ```

mod config;
mod context;
mod executor;
mod hook;
mod table;

pub use config::StorageConfig;
pub use context::Context;
pub use executor::{Database, ExecResult, Executor, Transaction};
pub use hook::{QueryContext, QueryHook, QueryType, TracingHook};
pub use table::Table;

use crate::error::{SqlError, SqlResult};
use crate::mapper::Mapper;
use crate::options::Options;
use crate::qb::{
    BuiltQuery, DeleteBuilder, Eq, InsertBuilder, SelectBuilder, SqlQb, StatementBuilder,
    UpdateBuilder,
};
use crate::quote::quote_noop;
use crate::record::{AsRecords, Record};
use crate::referencer::Referencer;
use crate::row::{FromRow, Row};
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

/// Observer of failed storage calls. Not called for [`SqlError::NotFound`].
pub type ErrorObserver = Arc<dyn Fn(&SqlError) + Send + Sync>;

/// Creates and executes database statements.
pub struct Storage<D: Database> {
    db: D,
    config: StorageConfig,
    on_error: Option<ErrorObserver>,
    hook: Option<Arc<dyn QueryHook>>,
}

impl<D: Database> fmt::Debug for Storage<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Storage")
            .field("config", &self.config)
            .field("on_error", &self.on_error.is_some())
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

impl<D: Database> Storage<D> {
    pub fn new(db: D) -> Self {
        Self::with_config(db, StorageConfig::default())
    }

    pub fn with_config(db: D, config: StorageConfig) -> Self {
        Self {
            db,
            config,
            on_error: None,
            hook: None,
        }
    }

    /// Observe every failure except "no rows".
    pub fn on_error(mut self, f: impl Fn(&SqlError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }

    /// Wrap every database call with a hook.
    pub fn with_hook(mut self, hook: impl QueryHook + 'static) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Database instance.
    pub fn db(&self) -> &D {
        &self.db
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn mapper(&self) -> &Arc<Mapper> {
        &self.config.mapper
    }

    // ==================== Transactions ====================

    /// Run `f` in a transaction.
    ///
    /// If `ctx` already carries a transaction, `f` runs in it and its result
    /// is returned unchanged: the outer caller owns commit and rollback.
    /// Otherwise a new transaction is started, then committed when `f`
    /// succeeds or rolled back when it fails.
    pub async fn in_tx<F, Fut, R>(&self, ctx: &Context<D::Tx>, f: F) -> SqlResult<R>
    where
        F: FnOnce(Context<D::Tx>) -> Fut,
        Fut: Future<Output = SqlResult<R>>,
    {
        if ctx.in_tx() {
            return f(ctx.clone()).await;
        }

        let tx = match self.db.begin().await {
            Ok(tx) => Arc::new(tx),
            Err(err) => return Err(self.error(SqlError::BeginTx(Box::new(err)))),
        };
        if self.config.trace_tx {
            tracing::debug!(target: "sqlstruct.tx", "transaction started");
        }

        let ctx = Context::with_tx(tx);
        let result = f(ctx.clone()).await;
        self.finish_tx(&ctx, result).await
    }

    async fn finish_tx<R>(&self, ctx: &Context<D::Tx>, result: SqlResult<R>) -> SqlResult<R> {
        let tx = ctx.require_tx().map_err(|err| self.error(err))?;

        match result {
            Ok(value) => {
                if let Err(err) = tx.commit().await {
                    return Err(self.error(SqlError::Commit(Box::new(err))));
                }
                if self.config.trace_tx {
                    tracing::debug!(target: "sqlstruct.tx", "transaction committed");
                }
                Ok(value)
            }
            Err(original) => {
                if let Err(err) = tx.rollback().await {
                    tracing::warn!(
                        target: "sqlstruct.tx",
                        error = %err,
                        original = %original,
                        "rollback failed"
                    );
                    return Err(self.error(SqlError::Rollback {
                        source: Box::new(err),
                        original: Box::new(original),
                    }));
                }
                if self.config.trace_tx {
                    tracing::debug!(target: "sqlstruct.tx", error = %original, "transaction rolled back");
                }
                Err(original)
            }
        }
    }

    // ==================== Execution ====================

    /// Execute a statement in the context's transaction, or on the database.
    pub async fn exec<Q: SqlQb + ?Sized>(&self, ctx: &Context<D::Tx>, qb: &Q) -> SqlResult<ExecResult> {
        let built = self.build(qb)?;
        let qctx = QueryContext::new(&built.sql, &built.args, ctx.in_tx());
        let started = self.before_query(&qctx);

        let result = match ctx.tx() {
            Some(tx) => tx.execute(&built.sql, &built.args).await,
            None => self.db.execute(&built.sql, &built.args).await,
        };

        self.after_query(&qctx, started, result.as_ref().err());
        result.map_err(|err| self.error(err))
    }

    /// Run a query and return the raw rows.
    pub async fn query<Q: SqlQb + ?Sized>(&self, ctx: &Context<D::Tx>, qb: &Q) -> SqlResult<Vec<Row>> {
        let built = self.build(qb)?;
        let qctx = QueryContext::new(&built.sql, &built.args, ctx.in_tx());
        let started = self.before_query(&qctx);

        let result = match ctx.tx() {
            Some(tx) => tx.query(&built.sql, &built.args).await,
            None => self.db.query(&built.sql, &built.args).await,
        };

        self.after_query(&qctx, started, result.as_ref().err());
        result.map_err(|err| self.error(err))
    }

    /// Fetch the first row of a query.
    ///
    /// Returns [`SqlError::NotFound`] when the query yields no rows.
    pub async fn get<T: FromRow, Q: SqlQb + ?Sized>(&self, ctx: &Context<D::Tx>, qb: &Q) -> SqlResult<T> {
        let rows = self.query(ctx, qb).await?;
        let row = rows.first().ok_or(SqlError::NotFound)?;
        T::from_row(row).map_err(|err| self.error(err))
    }

    /// Fetch all rows of a query.
    pub async fn list<T: FromRow, Q: SqlQb + ?Sized>(&self, ctx: &Context<D::Tx>, qb: &Q) -> SqlResult<Vec<T>> {
        let rows = self.query(ctx, qb).await?;
        rows.iter()
            .map(T::from_row)
            .collect::<SqlResult<Vec<T>>>()
            .map_err(|err| self.error(err))
    }

    fn build<Q: SqlQb + ?Sized>(&self, qb: &Q) -> SqlResult<BuiltQuery> {
        qb.build().map_err(|err| self.error(SqlError::Build(err)))
    }

    fn before_query(&self, ctx: &QueryContext<'_>) -> Instant {
        tracing::debug!(
            target: "sqlstruct.sql",
            query_type = ?ctx.query_type,
            param_count = ctx.args.len(),
            in_tx = ctx.in_tx,
            "executing statement"
        );
        if let Some(hook) = &self.hook {
            hook.before_query(ctx);
        }
        Instant::now()
    }

    fn after_query(&self, ctx: &QueryContext<'_>, started: Instant, error: Option<&SqlError>) {
        if let Some(hook) = &self.hook {
            hook.after_query(ctx, started.elapsed(), error);
        }
    }

    fn error(&self, err: SqlError) -> SqlError {
        if !err.is_not_found() {
            if let Some(on_error) = &self.on_error {
                on_error(&err);
            }
        }
        err
    }

    // ==================== Statements ====================

    /// Statement builder with the configured placeholder format.
    pub fn query_builder(&self) -> StatementBuilder {
        StatementBuilder::new(self.config.format)
    }

    /// SELECT of the record's columns from `table`.
    pub fn select_stmt<A>(&self, table: &str, columns: &A, opts: Options) -> SelectBuilder
    where
        A: AsRecords + ?Sized,
    {
        let q = self
            .query_builder()
            .select(Vec::<String>::new())
            .from(self.quote(table));
        self.config.mapper.select(q, columns, &self.options(opts))
    }

    /// INSERT of one or many records into `table`.
    pub fn insert_stmt<A>(&self, table: &str, val: &A, opts: Options) -> InsertBuilder
    where
        A: AsRecords + ?Sized,
    {
        let q = self.query_builder().insert(&self.quote(table));
        self.config.mapper.insert(q, val, &self.options(opts))
    }

    /// UPDATE of `table` setting the record's columns.
    pub fn update_stmt<'r, T: Record>(
        &self,
        table: &str,
        val: impl Into<Option<&'r T>>,
        opts: Options,
    ) -> UpdateBuilder {
        let q = self.query_builder().update(&self.quote(table));
        self.config.mapper.update(q, val, &self.options(opts))
    }

    /// DELETE from `table`.
    pub fn delete_stmt(&self, table: &str) -> DeleteBuilder {
        self.query_builder().delete(&self.quote(table))
    }

    /// Quoted column name of a field of `row`.
    ///
    /// # Panics
    /// If `field` is not a column field of `row`.
    pub fn col<T: Record>(&self, row: &T, field: &dyn Any) -> String {
        let col = self.config.mapper.col(row, field);
        self.quote(&col)
    }

    /// A referencer sharing this storage's mapper and quoter.
    pub fn referencer<'a>(&self) -> Referencer<'a> {
        Referencer::new()
            .with_mapper(Arc::clone(&self.config.mapper))
            .with_quoter(self.config.quoter.unwrap_or(quote_noop))
    }

    /// Equality conditions from a record, see [`Mapper::where_eq`].
    pub fn where_eq<T: Record>(&self, conditions: &T, opts: Options) -> Option<Eq> {
        self.config.mapper.where_eq(conditions, &self.options(opts))
    }

    fn quote(&self, name: &str) -> String {
        match self.config.quoter {
            Some(quoter) => quoter(&[name]),
            None => name.to_string(),
        }
    }

    fn options(&self, opts: Options) -> Options {
        match self.config.quoter {
            Some(quoter) => opts.prepare_column_or(|| Arc::new(move |col: &str| quoter(&[col]))),
            None => opts,
        }
    }
}

#[cfg(test)]
mod tests;
