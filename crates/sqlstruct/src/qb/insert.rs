//! INSERT statement builder.

use super::format::PlaceholderFormat;
use super::traits::{BuiltQuery, QbError, SqlQb};
use super::writer::{Fragment, SqlWriter, write_suffixes};
use crate::value::Value;

/// INSERT statement builder.
///
/// Renders `INSERT [options] INTO table (a,b) VALUES (?,?),(?,?) [suffix]`.
#[derive(Clone, Debug)]
pub struct InsertBuilder {
    table: String,
    /// Keywords between INSERT and INTO, e.g. `IGNORE`
    options: Vec<String>,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    suffixes: Vec<Fragment>,
    format: PlaceholderFormat,
}

impl InsertBuilder {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            options: Vec::new(),
            columns: Vec::new(),
            rows: Vec::new(),
            suffixes: Vec::new(),
            format: PlaceholderFormat::default(),
        }
    }

    pub fn into_table(mut self, table: &str) -> Self {
        self.table = table.to_string();
        self
    }

    /// Append insert columns.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Append one row of values.
    pub fn values(mut self, row: Vec<Value>) -> Self {
        self.rows.push(row);
        self
    }

    /// Add a keyword between `INSERT` and `INTO`.
    pub fn options(mut self, option: &str) -> Self {
        self.options.push(option.to_string());
        self
    }

    /// Append raw SQL after the values, e.g. `RETURNING id`.
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

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }
}

impl SqlQb for InsertBuilder {
    fn build(&self) -> Result<BuiltQuery, QbError> {
        if self.table.is_empty() {
            return Err(QbError::NoTable("insert"));
        }
        if self.rows.is_empty() {
            return Err(QbError::NoValues);
        }
        if !self.columns.is_empty() {
            for (i, row) in self.rows.iter().enumerate() {
                if row.len() != self.columns.len() {
                    return Err(QbError::RowLength {
                        row: i,
                        got: row.len(),
                        expected: self.columns.len(),
                    });
                }
            }
        }

        let mut w = SqlWriter::new();
        w.push("INSERT ");
        for opt in &self.options {
            w.push(opt);
            w.push(" ");
        }
        w.push("INTO ");
        w.push(&self.table);
        if !self.columns.is_empty() {
            w.push(" (");
            w.push(&self.columns.join(","));
            w.push(")");
        }

        w.push(" VALUES ");
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                w.push(",");
            }
            w.push("(");
            for (j, val) in row.iter().enumerate() {
                if j > 0 {
                    w.push(",");
                }
                w.push_arg(val.clone());
            }
            w.push(")");
        }
        write_suffixes(&mut w, &self.suffixes)?;

        Ok(w.finish(self.format))
    }
}
