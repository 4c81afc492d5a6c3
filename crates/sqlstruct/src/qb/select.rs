//! SELECT statement builder.

use super::expr::{Expr, write_where};
use super::format::PlaceholderFormat;
use super::traits::{BuiltQuery, QbError, SqlQb};
use super::writer::{Fragment, SqlWriter, write_list, write_suffixes};
use crate::value::Value;

/// SELECT statement builder.
#[derive(Clone, Debug, Default)]
pub struct SelectBuilder {
    /// Result columns
    columns: Vec<String>,
    /// DISTINCT flag
    distinct: bool,
    /// FROM expression
    from: Option<String>,
    /// JOIN clauses, keyword included
    joins: Vec<Fragment>,
    /// WHERE predicates, joined with AND
    wheres: Vec<Expr>,
    /// GROUP BY expressions
    group_by: Vec<String>,
    /// HAVING predicates, joined with AND
    having: Vec<Expr>,
    /// ORDER BY expressions
    order_by: Vec<String>,
    limit: Option<u64>,
    offset: Option<u64>,
    suffixes: Vec<Fragment>,
    format: PlaceholderFormat,
}

impl SelectBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== Columns ====================

    /// Append result columns.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Append one result column.
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.columns.push(column.into());
        self
    }

    /// Drop all result columns.
    pub fn remove_columns(mut self) -> Self {
        self.columns.clear();
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    // ==================== FROM / JOIN ====================

    pub fn from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    /// Add `JOIN <join>`; `?` placeholders in `join` bind `args`.
    pub fn join(self, join: &str, args: Vec<Value>) -> Self {
        self.join_clause("JOIN", join, args)
    }

    pub fn left_join(self, join: &str, args: Vec<Value>) -> Self {
        self.join_clause("LEFT JOIN", join, args)
    }

    pub fn inner_join(self, join: &str, args: Vec<Value>) -> Self {
        self.join_clause("INNER JOIN", join, args)
    }

    pub fn right_join(self, join: &str, args: Vec<Value>) -> Self {
        self.join_clause("RIGHT JOIN", join, args)
    }

    fn join_clause(mut self, keyword: &str, join: &str, args: Vec<Value>) -> Self {
        self.joins.push(Fragment::new(format!("{keyword} {join}"), args));
        self
    }

    // ==================== WHERE / GROUP BY / HAVING ====================

    /// Add a predicate, AND-ed with the others.
    pub fn where_(mut self, pred: impl Into<Expr>) -> Self {
        self.wheres.push(pred.into());
        self
    }

    /// Add a raw predicate with `?` placeholders.
    pub fn where_sql(self, sql: &str, args: Vec<Value>) -> Self {
        self.where_(Expr::Sql {
            sql: sql.to_string(),
            args,
        })
    }

    pub fn group_by(mut self, expr: impl Into<String>) -> Self {
        self.group_by.push(expr.into());
        self
    }

    pub fn having(mut self, pred: impl Into<Expr>) -> Self {
        self.having.push(pred.into());
        self
    }

    // ==================== ORDER / LIMIT ====================

    pub fn order_by(mut self, expr: impl Into<String>) -> Self {
        self.order_by.push(expr.into());
        self
    }

    pub fn order_by_all<I, S>(mut self, exprs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.order_by.extend(exprs.into_iter().map(Into::into));
        self
    }

    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }

    /// Append raw SQL after everything else, e.g. `FOR UPDATE`.
    pub fn suffix(mut self, sql: &str) -> Self {
        self.suffixes.push(Fragment::new(sql, Vec::new()));
        self
    }

    pub fn suffix_sql(mut self, sql: &str, args: Vec<Value>) -> Self {
        self.suffixes.push(Fragment::new(sql, args));
        self
    }

    pub fn placeholder_format(mut self, format: PlaceholderFormat) -> Self {
        self.format = format;
        self
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns
    }
}

impl SqlQb for SelectBuilder {
    fn build(&self) -> Result<BuiltQuery, QbError> {
        if self.columns.is_empty() {
            return Err(QbError::NoColumns);
        }

        let mut w = SqlWriter::new();
        w.push("SELECT ");
        if self.distinct {
            w.push("DISTINCT ");
        }
        w.push(&self.columns.join(", "));

        if let Some(from) = &self.from {
            w.push(" FROM ");
            w.push(from);
        }
        for join in &self.joins {
            w.push(" ");
            join.write(&mut w)?;
        }

        write_where(&mut w, "WHERE", &self.wheres)?;
        write_list(&mut w, "GROUP BY", &self.group_by);
        write_where(&mut w, "HAVING", &self.having)?;
        write_list(&mut w, "ORDER BY", &self.order_by);

        if let Some(limit) = self.limit {
            w.push(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.offset {
            w.push(&format!(" OFFSET {offset}"));
        }
        write_suffixes(&mut w, &self.suffixes)?;

        Ok(w.finish(self.format))
    }
}
