use super::format::{PlaceholderFormat, count_placeholders};
use super::traits::{BuiltQuery, QbError};
use crate::value::Value;

/// Accumulates SQL text and positional arguments.
#[derive(Debug, Default)]
pub(crate) struct SqlWriter {
    sql: String,
    args: Vec<Value>,
}

impl SqlWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, s: &str) {
        self.sql.push_str(s);
    }

    /// Append a placeholder bound to `value`.
    pub(crate) fn push_arg(&mut self, value: Value) {
        self.sql.push('?');
        self.args.push(value);
    }

    /// Append a SQL fragment whose `?` placeholders bind `args`.
    pub(crate) fn push_template(&mut self, sql: &str, args: &[Value]) -> Result<(), QbError> {
        let placeholders = count_placeholders(sql);
        if placeholders != args.len() {
            return Err(QbError::ArgCount {
                sql: sql.to_string(),
                placeholders,
                args: args.len(),
            });
        }
        self.sql.push_str(sql);
        self.args.extend(args.iter().cloned());
        Ok(())
    }

    pub(crate) fn finish(self, format: PlaceholderFormat) -> BuiltQuery {
        BuiltQuery {
            sql: format.replace(&self.sql),
            args: self.args,
        }
    }
}

/// A SQL fragment with bound arguments, used for joins and suffixes.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Fragment {
    pub(crate) sql: String,
    pub(crate) args: Vec<Value>,
}

impl Fragment {
    pub(crate) fn new(sql: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            args,
        }
    }

    pub(crate) fn write(&self, w: &mut SqlWriter) -> Result<(), QbError> {
        w.push_template(&self.sql, &self.args)
    }
}

/// Write ` <keyword> a, b` when `items` is non-empty.
pub(crate) fn write_list(w: &mut SqlWriter, keyword: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    w.push(" ");
    w.push(keyword);
    w.push(" ");
    w.push(&items.join(", "));
}

/// Write ` SUFFIX` fragments separated by spaces.
pub(crate) fn write_suffixes(w: &mut SqlWriter, suffixes: &[Fragment]) -> Result<(), QbError> {
    for s in suffixes {
        w.push(" ");
        s.write(w)?;
    }
    Ok(())
}
