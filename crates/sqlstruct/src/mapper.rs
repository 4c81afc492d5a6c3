//! Record to statement mapping.
//!
//! The [`Mapper`] turns records into column lists, bound values and
//! equality predicates, and feeds them into the statement builders.
//!
//! # Example
//!
//! ```ignore
//! use sqlstruct::{Mapper, Options, qb};
//!
//! let m = Mapper::default();
//! let q = m.insert(qb::insert("products"), &product, &Options::new());
//! let q = m.update(qb::update("products"), &product, &Options::new().skip_zero_values())
//!     .where_(m.where_eq(&Product { id: 2, ..Default::default() }, &Options::new().skip_zero_values()));
//! ```

use crate::error::UsageError;
use crate::options::{Dialect, Options};
use crate::qb::{Eq, InsertBuilder, SelectBuilder, UpdateBuilder};
use crate::record::{AsRecords, FieldDescriptor, Ptr, Record, Records};
use crate::value::{Column, Value};
use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, LazyLock, Mutex};

/// Column fields of a record type, in flattening order.
#[derive(Debug)]
pub struct TypeMap {
    columns: Vec<FieldDescriptor>,
}

impl TypeMap {
    /// Build the column list of `T`.
    ///
    /// A leaf is a column iff it is tagged and every ancestor is embedded.
    /// Named sub-records are never described, so their fields cannot leak in.
    pub fn of<T: Record>() -> Self {
        let columns = T::descriptors()
            .into_iter()
            .filter(|fd| !fd.embedded && fd.column.is_some())
            .collect();
        Self { columns }
    }

    pub fn columns(&self) -> &[FieldDescriptor] {
        &self.columns
    }
}

/// A raw column name with its value.
struct Extracted<'r> {
    raw: &'r str,
    value: &'r dyn Column,
}

static DEFAULT_MAPPER: LazyLock<Arc<Mapper>> = LazyLock::new(|| Arc::new(Mapper::default()));

/// Maps record values to statement fragments.
///
/// Type metadata is computed once per type and cached for the lifetime of
/// the mapper. The cache is safe for concurrent use.
#[derive(Debug, Default)]
pub struct Mapper {
    /// Dialect used for [`Options::insert_ignore`].
    pub dialect: Dialect,
    types: Mutex<HashMap<TypeId, Arc<TypeMap>>>,
}

impl Mapper {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            types: Mutex::new(HashMap::new()),
        }
    }

    /// The process-wide mapper used when none is configured.
    pub fn global() -> Arc<Mapper> {
        Arc::clone(&DEFAULT_MAPPER)
    }

    /// Cached column metadata for `T`.
    pub fn type_map<T: Record>(&self) -> Arc<TypeMap> {
        let mut types = self
            .types
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(
            types
                .entry(TypeId::of::<T>())
                .or_insert_with(|| Arc::new(TypeMap::of::<T>())),
        )
    }

    /// Set columns and values of one or many records.
    ///
    /// A batch whose elements yield different column sets is re-extracted
    /// with `ignore_omit_empty` on and `skip_zero_values` off against the
    /// union of observed columns, so every row shares one column list.
    pub fn insert<A>(&self, q: InsertBuilder, val: &A, opts: &Options) -> InsertBuilder
    where
        A: AsRecords + ?Sized,
    {
        let q = match val.records() {
            Records::None => return q,
            Records::One(row) => {
                let (cols, vals) = self.columns_values(row, opts);
                q.columns(cols).values(vals)
            }
            Records::Many(rows) => self.insert_many(q, rows, opts),
        };
        self.insert_ignore(q, opts)
    }

    fn insert_many<T: Record>(&self, mut q: InsertBuilder, rows: &[T], opts: &Options) -> InsertBuilder {
        let Some(first) = rows.first() else {
            return q;
        };

        let tm = self.type_map::<T>();
        let first_set: HashSet<&str> = extract(&tm, first, opts).iter().map(|e| e.raw).collect();

        let mut union = first_set.clone();
        let mut heterogeneous = false;
        for row in &rows[1..] {
            let cols: HashSet<&str> = extract(&tm, row, opts).iter().map(|e| e.raw).collect();
            if cols != first_set {
                heterogeneous = true;
                union.extend(cols);
            }
        }

        // Every row binds the same header: the first row's columns, or the
        // union in declaration order with omission switched off.
        let (opts, header) = if heterogeneous {
            let mut promoted = opts.clone();
            promoted.ignore_omit_empty = true;
            promoted.skip_zero_values = false;
            promoted.columns = ordered_columns(&tm, &union);
            let header = promoted.columns.clone();
            (promoted, header)
        } else {
            (opts.clone(), ordered_columns(&tm, &first_set))
        };

        q = q.columns(header.iter().map(|c| opts.column_name(c)));
        for row in rows {
            let extracted = extract(&tm, row, &opts);
            let vals = header
                .iter()
                .map(|col| {
                    extracted
                        .iter()
                        .find(|e| e.raw == col.as_str())
                        .map_or(Value::Null, |e| e.value.to_value())
                })
                .collect::<Vec<_>>();
            q = q.values(vals);
        }
        q
    }

    fn insert_ignore(&self, q: InsertBuilder, opts: &Options) -> InsertBuilder {
        if !opts.insert_ignore {
            return q;
        }
        match self.dialect {
            Dialect::MySql => q.options("IGNORE"),
            Dialect::Sqlite => q.options("OR IGNORE"),
            Dialect::Postgres => q.suffix("ON CONFLICT DO NOTHING"),
            Dialect::Unknown => panic!("{}", UsageError::InsertIgnore(self.dialect)),
        }
    }

    /// Set update assignments from a record.
    ///
    /// Does not add a WHERE clause; use [`Mapper::where_eq`] for that.
    pub fn update<'r, T: Record>(
        &self,
        mut q: UpdateBuilder,
        val: impl Into<Option<&'r T>>,
        opts: &Options,
    ) -> UpdateBuilder {
        let Some(row) = val.into() else {
            return q;
        };
        let (cols, vals) = self.columns_values(row, opts);
        for (col, val) in cols.into_iter().zip(vals) {
            q = q.set(col, val);
        }
        q
    }

    /// Add the record's columns to a select.
    ///
    /// `omit_empty` tags are ignored. For a single record `skip_zero_values`
    /// still drops zero fields; for a sequence values are not read.
    pub fn select<A>(&self, q: SelectBuilder, columns: &A, opts: &Options) -> SelectBuilder
    where
        A: AsRecords + ?Sized,
    {
        let tm = self.type_map::<A::Record>();
        match columns.records() {
            Records::None => q,
            Records::One(row) if opts.skip_zero_values => {
                let mut opts = opts.clone();
                opts.ignore_omit_empty = true;
                q.columns(
                    extract(&tm, row, &opts)
                        .iter()
                        .map(|e| opts.column_name(e.raw)),
                )
            }
            _ => q.columns(
                tm.columns()
                    .iter()
                    .filter_map(|fd| fd.column.as_deref())
                    .filter(|c| opts.allows(c))
                    .map(|c| opts.column_name(c)),
            ),
        }
    }

    /// Equality conditions from a record.
    ///
    /// Returns `None` when every field is omitted, so callers can tell "no
    /// predicate" apart from a predicate that matches nothing.
    pub fn where_eq<T: Record>(&self, conditions: &T, opts: &Options) -> Option<Eq> {
        let (cols, vals) = self.columns_values(conditions, opts);
        if cols.is_empty() {
            return None;
        }
        Some(cols.into_iter().zip(vals).collect())
    }

    /// Parallel column names and values of a record.
    pub fn columns_values<T: Record>(&self, row: &T, opts: &Options) -> (Vec<String>, Vec<Value>) {
        let tm = self.type_map::<T>();
        extract(&tm, row, opts)
            .into_iter()
            .map(|e| (opts.column_name(e.raw), e.value.to_value()))
            .unzip()
    }

    /// Sort expressions for the record's columns.
    #[deprecated(note = "compose ORDER BY with Referencer::fmt")]
    pub fn order<T: Record>(&self, columns: &T, opts: &Options) -> Vec<String> {
        let direction = if opts.order_desc { "DESC" } else { "ASC" };
        let tm = self.type_map::<T>();
        extract(&tm, columns, opts)
            .into_iter()
            .map(|e| format!("{} {direction}", opts.column_name(e.raw)))
            .collect()
    }

    /// Column name of a field of `row`.
    pub fn find_column_name<T: Record>(&self, row: &T, field: &dyn Any) -> Result<String, UsageError> {
        let target = Ptr::of_any(field);
        let tm = self.type_map::<T>();
        tm.columns()
            .iter()
            .find_map(|fd| {
                let value = row.column(&fd.path)?;
                (Ptr::of_column(value) == target)
                    .then(|| fd.column.clone())
                    .flatten()
            })
            .ok_or(UsageError::UnknownFieldOrRow)
    }

    /// Column names of all column fields of `row`, keyed by field identity.
    pub fn find_column_names<T: Record>(&self, row: &T) -> HashMap<Ptr, String> {
        let tm = self.type_map::<T>();
        tm.columns()
            .iter()
            .filter_map(|fd| {
                let value = row.column(&fd.path)?;
                Some((Ptr::of_column(value), fd.column.clone()?))
            })
            .collect()
    }

    /// Column name of a field of `row`.
    ///
    /// # Panics
    /// If `field` is not a column field of `row`.
    pub fn col<T: Record>(&self, row: &T, field: &dyn Any) -> String {
        match self.find_column_name(row, field) {
            Ok(col) => col,
            Err(err) => panic!("{err}"),
        }
    }
}

/// Bound for leaf columns of an absent embedded record.
static ABSENT: Value = Value::Null;

/// Walk the column fields of `row` applying omission and column filters.
///
/// Leaves under an absent embedded record extract as NULL.
fn extract<'r, T: Record>(
    tm: &'r TypeMap,
    row: &'r T,
    opts: &Options,
) -> Vec<Extracted<'r>> {
    tm.columns()
        .iter()
        .filter_map(|fd| {
            let raw = fd.column.as_deref()?;
            let value = row.column(&fd.path).unwrap_or(&ABSENT);
            if !opts.allows(raw) {
                return None;
            }
            let omit = opts.skip_zero_values || (fd.omit_empty && !opts.ignore_omit_empty);
            if omit && value.is_zero() {
                return None;
            }
            Some(Extracted { raw, value })
        })
        .collect()
}

/// Columns of `set` in type declaration order.
fn ordered_columns(tm: &TypeMap, set: &HashSet<&str>) -> Vec<String> {
    tm.columns()
        .iter()
        .filter_map(|fd| fd.column.as_deref())
        .filter(|c| set.contains(c))
        .map(str::to_string)
        .collect()
}
