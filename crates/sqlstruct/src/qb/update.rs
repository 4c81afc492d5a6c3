//! UPDATE statement builder.

use super::expr::{Expr, write_where};
use super::format::PlaceholderFormat;
use super::traits::{BuiltQuery, QbError, SqlQb};
use super::writer::{Fragment, SqlWriter, write_list, write_suffixes};
use crate::value::Value;

#[derive(Clone, Debug)]
enum Assignment {
    Value(Value),
    Raw(Fragment),
}

/// UPDATE statement builder.
#[derive(Clone, Debug)]
pub struct UpdateBuilder {
    table: String,
    sets: Vec<(String, Assignment)>,
    wheres: Vec<Expr>,
    order_by: Vec<String>,
    limit: Option<u64>,
    suffixes: Vec<Fragment>,
    format: PlaceholderFormat,
}

impl UpdateBuilder {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            sets: Vec::new(),
            wheres: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            suffixes: Vec::new(),
            format: PlaceholderFormat::default(),
        }
    }

    /// Add `column = ?`.
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.sets.push((column.into(), Assignment::Value(value.into())));
        self
    }

    /// Add `column = <sql>`; `?` placeholders in `sql` bind `args`.
    pub fn set_raw(mut self, column: impl Into<String>, sql: &str, args: Vec<Value>) -> Self {
        self.sets.push((column.into(), Assignment::Raw(Fragment::new(sql, args))));
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

    /// Columns assigned so far, in order.
    pub fn set_columns(&self) -> impl Iterator<Item = &str> {
        self.sets.iter().map(|(c, _)| c.as_str())
    }
}

impl SqlQb for UpdateBuilder {
    fn build(&self) -> Result<BuiltQuery, QbError> {
        if self.table.is_empty() {
            return Err(QbError::NoTable("update"));
        }
        if self.sets.is_empty() {
            return Err(QbError::NoSetClauses);
        }

        let mut w = SqlWriter::new();
        w.push("UPDATE ");
        w.push(&self.table);
        w.push(" SET ");
        for (i, (col, assignment)) in self.sets.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            w.push(col);
            w.push(" = ");
            match assignment {
                Assignment::Value(v) => w.push_arg(v.clone()),
                Assignment::Raw(f) => f.write(&mut w)?,
            }
        }

        write_where(&mut w, "WHERE", &self.wheres)?;
        write_list(&mut w, "ORDER BY", &self.order_by);
        if let Some(limit) = self.limit {
            w.push(&format!(" LIMIT {limit}"));
        }
        write_suffixes(&mut w, &self.suffixes)?;

        Ok(w.finish(self.format))
    }
}
