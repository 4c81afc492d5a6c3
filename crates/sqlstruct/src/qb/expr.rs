//! Predicate expressions.

use super::traits::QbError;
use super::writer::SqlWriter;
use crate::value::Value;
use std::collections::BTreeMap;

/// Column equality conditions, rendered in column name order.
///
/// A [`Value::Array`] renders `IN (...)`, [`Value::Null`] renders `IS NULL`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Eq(BTreeMap<String, Value>);

impl Eq {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition, replacing any previous one on the same column.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(column.into(), value.into());
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(column.into(), value.into())
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn write(&self, w: &mut SqlWriter, negate: bool) {
        if self.0.is_empty() {
            w.push(if negate { "(1=0)" } else { "(1=1)" });
            return;
        }
        let (eq, is, inn) = if negate {
            ("<>", "IS NOT NULL", "NOT IN")
        } else {
            ("=", "IS NULL", "IN")
        };
        for (i, (col, val)) in self.0.iter().enumerate() {
            if i > 0 {
                w.push(" AND ");
            }
            match val {
                // Nothing is IN an empty set.
                Value::Array(items) if items.is_empty() => {
                    w.push(if negate { "(1=1)" } else { "(1=0)" });
                }
                Value::Null => {
                    w.push(col);
                    w.push(" ");
                    w.push(is);
                }
                Value::Array(items) => {
                    w.push(col);
                    w.push(" ");
                    w.push(inn);
                    w.push(" (");
                    for (j, item) in items.iter().enumerate() {
                        if j > 0 {
                            w.push(",");
                        }
                        w.push_arg(item.clone());
                    }
                    w.push(")");
                }
                other => {
                    w.push(col);
                    w.push(" ");
                    w.push(eq);
                    w.push(" ");
                    w.push_arg(other.clone());
                }
            }
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Eq {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl From<BTreeMap<String, Value>> for Eq {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }
}

impl IntoIterator for Eq {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// A WHERE/HAVING predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Column equality.
    Eq(Eq),
    /// Column inequality.
    NotEq(Eq),
    /// Raw SQL with `?` placeholders.
    Sql { sql: String, args: Vec<Value> },
    /// All of; empty renders `(1=1)`.
    And(Vec<Expr>),
    /// Any of; empty renders `(1=0)`.
    Or(Vec<Expr>),
    Not(Box<Expr>),
    True,
    False,
}

impl Expr {
    /// Raw SQL predicate.
    ///
    /// # Example
    /// ```ignore
    /// Expr::sql("created_at > ?", [Value::from(ts)])
    /// ```
    pub fn sql<I>(sql: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Expr::Sql {
            sql: sql.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn and(self, other: impl Into<Expr>) -> Self {
        match self {
            Expr::And(mut items) => {
                items.push(other.into());
                Expr::And(items)
            }
            first => Expr::And(vec![first, other.into()]),
        }
    }

    pub fn or(self, other: impl Into<Expr>) -> Self {
        match self {
            Expr::Or(mut items) => {
                items.push(other.into());
                Expr::Or(items)
            }
            first => Expr::Or(vec![first, other.into()]),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Expr::Not(Box::new(self))
    }

    pub(crate) fn write(&self, w: &mut SqlWriter) -> Result<(), QbError> {
        match self {
            Expr::Eq(eq) => eq.write(w, false),
            Expr::NotEq(eq) => eq.write(w, true),
            Expr::Sql { sql, args } => w.push_template(sql, args)?,
            Expr::And(items) => write_group(w, items, " AND ", "(1=1)")?,
            Expr::Or(items) => write_group(w, items, " OR ", "(1=0)")?,
            Expr::Not(inner) => {
                w.push("NOT (");
                inner.write(w)?;
                w.push(")");
            }
            Expr::True => w.push("(1=1)"),
            Expr::False => w.push("(1=0)"),
        }
        Ok(())
    }
}

fn write_group(w: &mut SqlWriter, items: &[Expr], sep: &str, empty: &str) -> Result<(), QbError> {
    if items.is_empty() {
        w.push(empty);
        return Ok(());
    }
    w.push("(");
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            w.push(sep);
        }
        item.write(w)?;
    }
    w.push(")");
    Ok(())
}

/// Write ` WHERE a AND b` when `preds` is non-empty.
pub(crate) fn write_where(w: &mut SqlWriter, keyword: &str, preds: &[Expr]) -> Result<(), QbError> {
    if preds.is_empty() {
        return Ok(());
    }
    w.push(" ");
    w.push(keyword);
    w.push(" ");
    for (i, p) in preds.iter().enumerate() {
        if i > 0 {
            w.push(" AND ");
        }
        p.write(w)?;
    }
    Ok(())
}

impl From<Eq> for Expr {
    fn from(eq: Eq) -> Self {
        Expr::Eq(eq)
    }
}

/// `None` renders as an always-true predicate.
impl From<Option<Eq>> for Expr {
    fn from(eq: Option<Eq>) -> Self {
        match eq {
            Some(eq) => Expr::Eq(eq),
            None => Expr::True,
        }
    }
}

impl From<&str> for Expr {
    fn from(sql: &str) -> Self {
        Expr::Sql {
            sql: sql.to_string(),
            args: Vec::new(),
        }
    }
}

impl From<String> for Expr {
    fn from(sql: String) -> Self {
        Expr::Sql {
            sql,
            args: Vec::new(),
        }
    }
}
