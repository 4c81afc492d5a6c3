//! Result rows and row mapping.

use crate::error::{SqlError, SqlResult};
use crate::value::{FromValue, Value};
use std::sync::Arc;

/// A decoded result row.
///
/// Column names are shared between the rows of one result set.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    /// Build a row from column/value pairs.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        let (columns, values): (Vec<String>, Vec<Value>) =
            pairs.into_iter().map(|(c, v)| (c.into(), v)).unzip();
        Self {
            columns: columns.into(),
            values,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw value of a column, the first one if the name repeats.
    pub fn value(&self, column: &str) -> Option<&Value> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.values.get(idx)
    }

    /// Decode a column by name, returning [`SqlError::Decode`] on failure.
    pub fn get<T: FromValue>(&self, column: &str) -> SqlResult<T> {
        let value = self
            .value(column)
            .ok_or_else(|| SqlError::decode(column, "column not found"))?;
        T::from_value(value.clone()).map_err(|e| SqlError::decode(column, e))
    }

    /// Decode a column by position.
    pub fn get_idx<T: FromValue>(&self, idx: usize) -> SqlResult<T> {
        let value = self
            .values
            .get(idx)
            .ok_or_else(|| SqlError::decode(idx.to_string(), "column index out of range"))?;
        T::from_value(value.clone()).map_err(|e| {
            let name = self.columns.get(idx).cloned().unwrap_or_else(|| idx.to_string());
            SqlError::decode(name, e)
        })
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

/// Trait for types that can be built from a result row.
///
/// Usually derived:
///
/// ```ignore
/// #[derive(FromRow)]
/// struct User {
///     #[db(column = "id")]
///     id: i64,
///     #[db(column = "name")]
///     name: String,
/// }
/// ```
pub trait FromRow: Sized {
    /// Convert a row into Self
    fn from_row(row: &Row) -> SqlResult<Self>;
}

impl FromRow for Row {
    fn from_row(row: &Row) -> SqlResult<Self> {
        Ok(row.clone())
    }
}

impl<T: FromRow> FromRow for Box<T> {
    fn from_row(row: &Row) -> SqlResult<Self> {
        T::from_row(row).map(Box::new)
    }
}

macro_rules! tuple_from_row {
    ($($idx:tt => $name:ident),+) => {
        impl<$($name: FromValue),+> FromRow for ($($name,)+) {
            fn from_row(row: &Row) -> SqlResult<Self> {
                Ok(($(row.get_idx::<$name>($idx)?,)+))
            }
        }
    };
}

tuple_from_row!(0 => A);
tuple_from_row!(0 => A, 1 => B);
tuple_from_row!(0 => A, 1 => B, 2 => C);
tuple_from_row!(0 => A, 1 => B, 2 => C, 3 => D);
tuple_from_row!(0 => A, 1 => B, 2 => C, 3 => D, 4 => E);
