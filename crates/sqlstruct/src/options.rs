//! Mapping options and SQL dialects.

use std::fmt;
use std::sync::Arc;

/// Column name transformation applied to every column the mapper emits.
pub type PrepareColumn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// SQL dialect of the target database.
///
/// Only consulted when [`Options::insert_ignore`] is requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Dialect {
    #[default]
    Unknown,
    /// `INSERT IGNORE INTO ...`
    MySql,
    /// `INSERT OR IGNORE INTO ...`
    Sqlite,
    /// `INSERT INTO ... ON CONFLICT DO NOTHING`
    Postgres,
}

/// Options for a single mapper call.
///
/// # Example
/// ```ignore
/// let opts = Options::new().skip_zero_values().columns(["id", "name"]);
/// ```
#[derive(Clone, Default)]
pub struct Options {
    /// Omit fields holding their type's zero value, regardless of `omit_empty` tags.
    pub skip_zero_values: bool,
    /// Treat `omit_empty` tags as absent.
    pub ignore_omit_empty: bool,
    /// Restrict extraction to these raw column names. Empty means all columns.
    pub columns: Vec<String>,
    /// Descending order for [`Mapper::order`](crate::Mapper::order).
    pub order_desc: bool,
    /// Post-process each resolved column name.
    pub prepare_column: Option<PrepareColumn>,
    /// Tolerate duplicate keys on insert, in a dialect-specific way.
    pub insert_ignore: bool,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skip_zero_values(mut self) -> Self {
        self.skip_zero_values = true;
        self
    }

    pub fn ignore_omit_empty(mut self) -> Self {
        self.ignore_omit_empty = true;
        self
    }

    /// Restrict to the given column names.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn order_desc(mut self) -> Self {
        self.order_desc = true;
        self
    }

    pub fn insert_ignore(mut self) -> Self {
        self.insert_ignore = true;
        self
    }

    /// Set a column name transformation.
    pub fn prepare_column(mut self, prepare: PrepareColumn) -> Self {
        self.prepare_column = Some(prepare);
        self
    }

    /// Set a column name transformation unless one is already present.
    pub fn prepare_column_or(mut self, prepare: impl FnOnce() -> PrepareColumn) -> Self {
        if self.prepare_column.is_none() {
            self.prepare_column = Some(prepare());
        }
        self
    }

    pub(crate) fn column_name(&self, raw: &str) -> String {
        match &self.prepare_column {
            Some(prepare) => prepare(raw),
            None => raw.to_string(),
        }
    }

    pub(crate) fn allows(&self, raw: &str) -> bool {
        self.columns.is_empty() || self.columns.iter().any(|c| c == raw)
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("skip_zero_values", &self.skip_zero_values)
            .field("ignore_omit_empty", &self.ignore_omit_empty)
            .field("columns", &self.columns)
            .field("order_desc", &self.order_desc)
            .field("prepare_column", &self.prepare_column.as_ref().map(|_| "<fn>"))
            .field("insert_ignore", &self.insert_ignore)
            .finish()
    }
}
