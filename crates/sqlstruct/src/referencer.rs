//! Identity-based references to aliased records and their fields.
//!
//! A [`Referencer`] is filled with record instances under table aliases.
//! Afterwards a reference to the record, or to one of its fields, resolves
//! to the quoted, alias-qualified identifier for use in raw SQL fragments.
//!
//! ```ignore
//! let manager = User::default();
//! let employee = User::default();
//!
//! let mut rf = Referencer::new().with_quoter(quote_ansi);
//! rf.add_table_alias(&manager, "manager");
//! rf.add_table_alias(&employee, "employee");
//!
//! let cond = rf.fmt("{} = {}", &[&manager.last_name, &employee.last_name]);
//! assert_eq!(cond, r#""manager"."last_name" = "employee"."last_name""#);
//! ```
//!
//! The registry is keyed by memory identity, so the referencer borrows every
//! registered record for its whole lifetime. A `Referencer` is not meant to
//! be mutated from several threads at once.

use crate::error::UsageError;
use crate::mapper::Mapper;
use crate::options::PrepareColumn;
use crate::qb::Eq;
use crate::quote::{Quoter, quote_noop};
use crate::record::{Ptr, Record};
use crate::value::Value;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// A string that is interpolated into SQL as is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Quoted(String);

impl Quoted {
    /// Wrap text that is already safe to interpolate.
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Quoted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Quoted {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<Quoted> for String {
    fn from(q: Quoted) -> Self {
        q.0
    }
}

/// A field reference that resolves without its table qualifier.
///
/// Useful where only bare columns are allowed, e.g.
/// `ON CONFLICT (id) DO UPDATE SET name = excluded.name`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoTable(Ptr);

/// Wrap a field so it resolves to its unqualified column.
pub fn no_table(field: &dyn Any) -> NoTable {
    NoTable(Ptr::of_any(field))
}

/// [`no_table`] for several fields.
pub fn no_table_all(fields: &[&dyn Any]) -> Vec<NoTable> {
    fields.iter().map(|f| no_table(*f)).collect()
}

/// Registry of record and field identities to quoted references.
pub struct Referencer<'a> {
    mapper: Arc<Mapper>,
    quoter: Quoter,
    strict: bool,
    /// Record and field identities to qualified references.
    refs: HashMap<Ptr, Quoted>,
    /// Field identities to raw column names.
    column_names: HashMap<Ptr, String>,
    /// Record identities to sorted qualified column references.
    struct_columns: HashMap<Ptr, Vec<String>>,
    /// Record identities to the field identities registered with them.
    fields: HashMap<Ptr, Vec<Ptr>>,
    /// Rows owned by the referencer.
    pinned: Vec<Arc<dyn Any + Send + Sync>>,
    _rows: PhantomData<&'a ()>,
}

impl Default for Referencer<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Referencer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Referencer")
            .field("strict", &self.strict)
            .field("refs", &self.refs.len())
            .field("pinned", &self.pinned.len())
            .finish()
    }
}

impl<'a> Referencer<'a> {
    /// Referencer with the global mapper and no identifier quoting.
    pub fn new() -> Self {
        Self {
            mapper: Mapper::global(),
            quoter: quote_noop,
            strict: false,
            refs: HashMap::new(),
            column_names: HashMap::new(),
            struct_columns: HashMap::new(),
            fields: HashMap::new(),
            pinned: Vec::new(),
            _rows: PhantomData,
        }
    }

    pub fn with_mapper(mut self, mapper: Arc<Mapper>) -> Self {
        self.mapper = mapper;
        self
    }

    pub fn with_quoter(mut self, quoter: Quoter) -> Self {
        self.quoter = quoter;
        self
    }

    /// Reject literal arguments in [`Referencer::fmt`].
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn mapper(&self) -> &Arc<Mapper> {
        &self.mapper
    }

    pub fn quoter(&self) -> Quoter {
        self.quoter
    }

    /// Quote an identifier.
    pub fn q(&self, parts: &[&str]) -> Quoted {
        Quoted((self.quoter)(parts))
    }

    // ==================== Registration ====================

    /// Register a record and its column fields under `alias`.
    ///
    /// An empty alias registers fields as bare columns and the record itself
    /// is not resolvable. Registering the same record again replaces all of
    /// its previous entries.
    pub fn add_table_alias<T: Record>(&mut self, row: &'a T, alias: &str) {
        self.register(row, alias);
    }

    /// Register a row owned by the referencer.
    ///
    /// The returned handle points to the registered instance.
    pub fn add_table_alias_owned<T>(&mut self, row: Arc<T>, alias: &str) -> Arc<T>
    where
        T: Record + Send + Sync,
    {
        self.register(row.as_ref(), alias);
        self.pinned.push(row.clone());
        row
    }

    fn register<T: Record>(&mut self, row: &T, alias: &str) {
        let row_ptr = Ptr::of(row);
        self.forget(row_ptr);

        let names = self.mapper.find_column_names(row);
        if !alias.is_empty() {
            self.refs.insert(row_ptr, self.q(&[alias]));
        }

        let mut columns = Vec::with_capacity(names.len());
        let mut fields = Vec::with_capacity(names.len());
        for (ptr, column) in names {
            let reference = if alias.is_empty() {
                self.q(&[column.as_str()])
            } else {
                self.q(&[alias, column.as_str()])
            };
            columns.push(reference.0.clone());
            self.refs.insert(ptr, reference);
            self.column_names.insert(ptr, column);
            fields.push(ptr);
        }
        columns.sort();

        self.struct_columns.insert(row_ptr, columns);
        self.fields.insert(row_ptr, fields);
    }

    fn forget(&mut self, row_ptr: Ptr) {
        self.refs.remove(&row_ptr);
        self.struct_columns.remove(&row_ptr);
        for ptr in self.fields.remove(&row_ptr).unwrap_or_default() {
            self.refs.remove(&ptr);
            self.column_names.remove(&ptr);
        }
    }

    // ==================== Resolution ====================

    /// Quoted reference of a registered record or field.
    ///
    /// # Panics
    /// If `ptr` is not registered.
    pub fn reference(&self, ptr: &dyn Any) -> String {
        unwrap_usage(self.try_reference(ptr))
    }

    /// Quoted reference of a registered record, field or [`NoTable`] field.
    pub fn try_reference(&self, ptr: &dyn Any) -> Result<String, UsageError> {
        if let Some(nt) = ptr.downcast_ref::<NoTable>() {
            return self.resolve_no_table(nt).map(Quoted::into_string);
        }
        self.refs
            .get(&Ptr::of_any(ptr))
            .map(|q| q.0.clone())
            .ok_or(UsageError::UnknownFieldOrRow)
    }

    /// References of several records or fields.
    ///
    /// # Panics
    /// On the first unregistered pointer.
    pub fn refs(&self, ptrs: &[&dyn Any]) -> Vec<String> {
        unwrap_usage(self.try_refs(ptrs))
    }

    pub fn try_refs(&self, ptrs: &[&dyn Any]) -> Result<Vec<String>, UsageError> {
        ptrs.iter()
            .enumerate()
            .map(|(i, ptr)| {
                self.try_reference(*ptr)
                    .map_err(|_| UsageError::UnknownAt(i))
            })
            .collect()
    }

    /// Raw column name of a registered field.
    ///
    /// # Panics
    /// If `field` is not a registered field.
    pub fn col(&self, field: &dyn Any) -> String {
        unwrap_usage(self.try_col(field))
    }

    pub fn try_col(&self, field: &dyn Any) -> Result<String, UsageError> {
        let ptr = match field.downcast_ref::<NoTable>() {
            Some(nt) => nt.0,
            None => Ptr::of_any(field),
        };
        self.column_names
            .get(&ptr)
            .cloned()
            .ok_or(UsageError::UnknownFieldOrRow)
    }

    /// Sorted qualified column references of a registered record.
    ///
    /// # Panics
    /// If `row` is not registered.
    pub fn cols(&self, row: &dyn Any) -> Vec<String> {
        unwrap_usage(self.try_cols(row))
    }

    pub fn try_cols(&self, row: &dyn Any) -> Result<Vec<String>, UsageError> {
        self.struct_columns
            .get(&Ptr::of_any(row))
            .cloned()
            .ok_or(UsageError::UnknownFieldOrRow)
    }

    /// Equality on a referenced column.
    ///
    /// # Panics
    /// If `ptr` is not registered.
    pub fn eq(&self, ptr: &dyn Any, value: impl Into<Value>) -> Eq {
        unwrap_usage(self.try_eq(ptr, value))
    }

    pub fn try_eq(&self, ptr: &dyn Any, value: impl Into<Value>) -> Result<Eq, UsageError> {
        Ok(Eq::new().with(self.try_reference(ptr)?, value))
    }

    /// A column name transform that qualifies columns with a table.
    ///
    /// `table` is a registered record, an alias string, or a [`Quoted`]
    /// table reference.
    ///
    /// # Panics
    /// If `table` is an unregistered record.
    pub fn columns_of(&self, table: &dyn Any) -> PrepareColumn {
        unwrap_usage(self.try_columns_of(table))
    }

    pub fn try_columns_of(&self, table: &dyn Any) -> Result<PrepareColumn, UsageError> {
        let table = if let Some(q) = table.downcast_ref::<Quoted>() {
            q.clone()
        } else if let Some(alias) = table.downcast_ref::<&'static str>() {
            self.q(&[*alias])
        } else if let Some(alias) = table.downcast_ref::<String>() {
            self.q(&[alias.as_str()])
        } else {
            self.refs
                .get(&Ptr::of_any(table))
                .cloned()
                .ok_or(UsageError::UnregisteredRow)?
        };

        let quoter = self.quoter;
        Ok(Arc::new(move |col: &str| format!("{table}.{}", quoter(&[col]))))
    }

    fn resolve_no_table(&self, nt: &NoTable) -> Result<Quoted, UsageError> {
        self.column_names
            .get(&nt.0)
            .map(|col| self.q(&[col.as_str()]))
            .ok_or(UsageError::UnknownFieldOrRow)
    }

    // ==================== Formatting ====================

    /// Substitute `{}` placeholders with resolved references.
    ///
    /// Each argument is, in order of precedence: a [`Quoted`] string, a
    /// [`NoTable`] field, a registered record or field, or a `&'static str`
    /// literal that is copied verbatim. Literals are rejected when the
    /// referencer is strict. Any other argument, such as a field of an
    /// unregistered record, is an error. `{{` and `}}` render single braces.
    ///
    /// # Panics
    /// If an argument cannot be resolved or the argument count does not
    /// match the template.
    pub fn fmt(&self, template: &str, args: &[&dyn Any]) -> String {
        unwrap_usage(self.try_fmt(template, args))
    }

    pub fn try_fmt(&self, template: &str, args: &[&dyn Any]) -> Result<String, UsageError> {
        let resolved = args
            .iter()
            .enumerate()
            .map(|(i, arg)| self.resolve_arg(i, *arg))
            .collect::<Result<Vec<_>, _>>()?;

        let mut out = String::with_capacity(template.len() + resolved.iter().map(String::len).sum::<usize>());
        let mut next = resolved.into_iter();
        let mut placeholders = 0usize;
        let mut chars = template.chars().peekable();
        while let Some(ch) = chars.next() {
            match (ch, chars.peek()) {
                ('{', Some('{')) | ('}', Some('}')) => {
                    chars.next();
                    out.push(ch);
                }
                ('{', Some('}')) => {
                    chars.next();
                    placeholders += 1;
                    if let Some(arg) = next.next() {
                        out.push_str(&arg);
                    }
                }
                _ => out.push(ch),
            }
        }

        if placeholders != args.len() {
            return Err(UsageError::FormatArgs {
                placeholders,
                args: args.len(),
            });
        }
        Ok(out)
    }

    fn resolve_arg(&self, position: usize, arg: &dyn Any) -> Result<String, UsageError> {
        if let Some(q) = arg.downcast_ref::<Quoted>() {
            return Ok(q.0.clone());
        }
        if let Some(nt) = arg.downcast_ref::<NoTable>() {
            return self
                .resolve_no_table(nt)
                .map(Quoted::into_string)
                .map_err(|_| UsageError::UnknownAt(position));
        }
        if let Some(q) = self.refs.get(&Ptr::of_any(arg)) {
            return Ok(q.0.clone());
        }
        match literal_text(arg) {
            Some(_) if self.strict => Err(UsageError::LiteralAt(position)),
            Some(text) => Ok(text),
            None => Err(UsageError::UnknownAt(position)),
        }
    }
}

/// Text of a template literal.
///
/// Only `&'static str` qualifies. Owned strings and numbers are treated as
/// record fields, so an unregistered one never reaches the SQL text.
fn literal_text(arg: &dyn Any) -> Option<String> {
    arg.downcast_ref::<&'static str>().map(|s| s.to_string())
}

fn unwrap_usage<T>(res: Result<T, UsageError>) -> T {
    match res {
        Ok(v) => v,
        Err(err) => panic!("{err}"),
    }
}

#[cfg(test)]
mod tests;
