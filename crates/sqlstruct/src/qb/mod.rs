//! Statement builders.
//!
//! Builders accumulate SQL with `?` placeholders and positional [`Value`]
//! arguments, then render the configured [`PlaceholderFormat`] at build time.
//!
//! # Usage
//!
//! ```ignore
//! use sqlstruct::qb::{self, Eq, PlaceholderFormat, SqlQb, StatementBuilder};
//!
//! let sb = StatementBuilder::new(PlaceholderFormat::Dollar);
//!
//! let q = sb.select(["id", "name"])
//!     .from("users")
//!     .where_(Eq::new().with("status", "active"))
//!     .order_by("created_at DESC")
//!     .limit(20)
//!     .build()?;
//! assert_eq!(q.sql, "SELECT id, name FROM users WHERE status = $1 ORDER BY created_at DESC LIMIT 20");
//!
//! let q = sb.insert("users").columns(["name"]).values(vec!["alice".into()]).build()?;
//! ```
//!
//! [`Value`]: crate::Value

mod delete;
mod expr;
mod format;
mod insert;
mod select;
mod traits;
mod update;
mod writer;

pub use delete::DeleteBuilder;
pub use expr::{Eq, Expr};
pub use format::PlaceholderFormat;
pub use insert::InsertBuilder;
pub use select::SelectBuilder;
pub use traits::{BuiltQuery, QbError, RawStatement, SqlQb};
pub use update::UpdateBuilder;

/// Creates builders that share one placeholder format.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatementBuilder {
    format: PlaceholderFormat,
}

impl StatementBuilder {
    pub fn new(format: PlaceholderFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> PlaceholderFormat {
        self.format
    }

    /// Start a SELECT with the given result columns.
    pub fn select<I, S>(&self, columns: I) -> SelectBuilder
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SelectBuilder::new().columns(columns).placeholder_format(self.format)
    }

    pub fn insert(&self, table: &str) -> InsertBuilder {
        InsertBuilder::new(table).placeholder_format(self.format)
    }

    pub fn update(&self, table: &str) -> UpdateBuilder {
        UpdateBuilder::new(table).placeholder_format(self.format)
    }

    pub fn delete(&self, table: &str) -> DeleteBuilder {
        DeleteBuilder::new(table).placeholder_format(self.format)
    }
}

/// Create a SELECT builder with `?` placeholders.
///
/// # Example
/// ```ignore
/// let qb = sqlstruct::qb::select(["id"]).from("users");
/// ```
pub fn select<I, S>(columns: I) -> SelectBuilder
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    SelectBuilder::new().columns(columns)
}

/// Create an INSERT builder with `?` placeholders.
pub fn insert(table: &str) -> InsertBuilder {
    InsertBuilder::new(table)
}

/// Create an UPDATE builder with `?` placeholders.
pub fn update(table: &str) -> UpdateBuilder {
    UpdateBuilder::new(table)
}

/// Create a DELETE builder with `?` placeholders.
pub fn delete(table: &str) -> DeleteBuilder {
    DeleteBuilder::new(table)
}
