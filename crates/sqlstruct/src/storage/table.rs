//! Repository of a single table.

use super::{Context, Database, ExecResult, Storage};
use crate::error::SqlResult;
use crate::options::Options;
use crate::qb::{DeleteBuilder, Eq, SelectBuilder, SqlQb, UpdateBuilder};
use crate::record::Record;
use crate::referencer::Referencer;
use crate::row::FromRow;
use crate::value::Value;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Typed access to rows of one table.
///
/// `r` is a row registered under the table name, so its fields can be used
/// to reference columns:
///
/// ```ignore
/// let users: Table<User, _> = Table::new(st.clone(), "users");
/// let q = users.select_stmt(Options::new()).where_(users.eq(&users.r.id, 123));
/// let user = users.get(&ctx, &q).await?;
/// ```
pub struct Table<T, D: Database> {
    storage: Arc<Storage<D>>,
    name: String,
    /// Row registered under the table name.
    pub r: Arc<T>,
    rf: Referencer<'static>,
}

impl<T, D: Database> fmt::Debug for Table<T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table").field("name", &self.name).finish()
    }
}

impl<T, D> Table<T, D>
where
    T: Record + Default + Send + Sync,
    D: Database,
{
    pub fn new(storage: Arc<Storage<D>>, name: &str) -> Self {
        let mut rf = storage.referencer();
        let r = rf.add_table_alias_owned(Arc::new(T::default()), name);
        Self {
            storage,
            name: name.to_string(),
            r,
            rf,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn storage(&self) -> &Arc<Storage<D>> {
        &self.storage
    }

    /// Referencer with this table and every attached alias registered.
    pub fn referencer(&self) -> &Referencer<'static> {
        &self.rf
    }

    /// Attach another row, typically another table's `r`, for references.
    pub fn add_table_alias<R>(&mut self, row: &Arc<R>, alias: &str)
    where
        R: Record + Send + Sync,
    {
        self.rf.add_table_alias_owned(Arc::clone(row), alias);
    }

    // ==================== Writes ====================

    pub async fn insert_row(&self, ctx: &Context<D::Tx>, row: &T, opts: Options) -> SqlResult<ExecResult> {
        let q = self
            .storage
            .insert_stmt(&self.name, std::slice::from_ref(row), opts);
        self.storage.exec(ctx, &q).await
    }

    pub async fn insert_rows(&self, ctx: &Context<D::Tx>, rows: &[T], opts: Options) -> SqlResult<ExecResult> {
        let q = self.storage.insert_stmt(&self.name, rows, opts);
        self.storage.exec(ctx, &q).await
    }

    /// UPDATE setting the row's columns; add conditions with `where_`.
    pub fn update_stmt(&self, row: &T, opts: Options) -> UpdateBuilder {
        self.storage.update_stmt(&self.name, row, opts)
    }

    pub fn delete_stmt(&self) -> DeleteBuilder {
        self.storage.delete_stmt(&self.name)
    }

    // ==================== Reads ====================

    /// SELECT of all columns, qualified by the table name.
    pub fn select_stmt(&self, opts: Options) -> SelectBuilder {
        let opts = opts.prepare_column_or(|| self.rf.columns_of(&*self.r));
        self.storage
            .select_stmt(&self.name, std::slice::from_ref(&*self.r), opts)
    }

    pub async fn get<Q: SqlQb + ?Sized>(&self, ctx: &Context<D::Tx>, qb: &Q) -> SqlResult<T>
    where
        T: FromRow,
    {
        self.storage.get(ctx, qb).await
    }

    pub async fn list<Q: SqlQb + ?Sized>(&self, ctx: &Context<D::Tx>, qb: &Q) -> SqlResult<Vec<T>>
    where
        T: FromRow,
    {
        self.storage.list(ctx, qb).await
    }

    // ==================== References ====================

    /// Equality condition on a registered field.
    ///
    /// # Panics
    /// If `ptr` is not registered.
    pub fn eq(&self, ptr: &dyn Any, value: impl Into<Value>) -> Eq {
        self.rf.eq(ptr, value)
    }

    /// Format a template with references, see [`Referencer::fmt`].
    pub fn fmt(&self, template: &str, args: &[&dyn Any]) -> String {
        self.rf.fmt(template, args)
    }
}
