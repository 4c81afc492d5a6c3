//! DELETE statement builder.

use super::expr::{Expr, write_where};
use super::format::PlaceholderFormat;
use super::traits::{BuiltQuery, QbError, SqlQb};
use super::writer::{Fragment, SqlWriter, write_list, write_suffixes};
use crate::value::Value;

/// DELETE statement builder.
#[derive(Clone, Debug)]
pub struct DeleteBuilder {
    table: String,
    wheres: Vec<Expr>,
    order_by: Vec<String>,
    limit: Option<u64>,
    suffixes: Vec<Fragment>,
    format: PlaceholderFormat,
}

impl DeleteBuilder {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            wheres: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            suffixes: Vec::new(),
            format: PlaceholderFormat::default(),
        }
    }

    pub fn from(mut self, table: &str) -> Self {
        self.table = table.to_string();
        self
    }

    pub fn where_(mut self, pred: impl Into<Expr>) -> Self {
        self.wheres.push(pred.into());
        self
    }

    pub fn where_sql(self, sql: &str, args: Vec<Value>) -> Self {
        self.where_(Expr::Sql {
            sql: sql.to_string(),
            args,
        })
    }

    pub fn order_by(mut self, expr: impl Into<String>) -> Self {
        self.order_by.push(expr.into());
        self
    }

    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn suffix(mut self, sql: &str) -> Self {
        self.suffixes.push(Fragment::new(sql, Vec::new()));
        self
    }

    pub fn placeholder_format(mut self, format: PlaceholderFormat) -> Self {
        self.format = format;
        self
    }
}

impl SqlQb for DeleteBuilder {
    fn build(&self) -> Result<BuiltQuery, QbError> {
        if self.table.is_empty() {
            return Err(QbError::NoTable("delete"));
        }

        let mut w = SqlWriter::new();
        w.push("DELETE FROM ");
        w.push(&self.table);
        write_where(&mut w, "WHERE", &self.wheres)?;
        write_list(&mut w, "ORDER BY", &self.order_by);
        if let Some(limit) = self.limit {
            w.push(&format!(" LIMIT {limit}"));
        }
        write_suffixes(&mut w, &self.suffixes)?;

        Ok(w.finish(self.format))
    }
}
