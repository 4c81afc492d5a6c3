//! Record self-description.
//!
//! `#[derive(Record)]` implements [`Record`] for a struct with named fields.
//! The derive replaces runtime reflection: it emits the field descriptors of
//! the type and a path-based accessor for leaf values.
//!
//! ```ignore
//! use sqlstruct::Record;
//!
//! #[derive(Record, Default)]
//! struct Timestamps {
//!     #[db(column = "created_at")]
//!     created_at: i64,
//! }
//!
//! #[derive(Record, Default)]
//! struct User {
//!     #[db(column = "id", omit_empty)]
//!     id: i64,
//!     #[db(embed)]
//!     ts: Timestamps,
//!     // Not a column.
//!     cache: Vec<u8>,
//! }
//! ```

use crate::value::Column;
use std::any::{Any, TypeId};
use std::sync::Arc;

/// Metadata for one field of a record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Rust field name.
    pub field: &'static str,
    /// Declared column name, `None` for untagged fields.
    pub column: Option<String>,
    /// Field indices from the root record down to this field.
    pub path: Vec<usize>,
    /// Whether this entry is a flattened sub-record rather than a leaf.
    pub embedded: bool,
    /// Whether zero values are omitted by default.
    pub omit_empty: bool,
}

impl FieldDescriptor {
    /// A tagged leaf field.
    pub fn column(
        parent: &[usize],
        index: usize,
        field: &'static str,
        column: &str,
        omit_empty: bool,
    ) -> Self {
        Self {
            field,
            column: Some(column.to_string()),
            path: child_path(parent, index),
            embedded: false,
            omit_empty,
        }
    }

    /// A flattened sub-record.
    pub fn embedded(parent: &[usize], index: usize, field: &'static str) -> Self {
        Self {
            field,
            column: None,
            path: child_path(parent, index),
            embedded: true,
            omit_empty: false,
        }
    }

    /// A field without a column tag.
    pub fn untagged(parent: &[usize], index: usize, field: &'static str) -> Self {
        Self {
            field,
            column: None,
            path: child_path(parent, index),
            embedded: false,
            omit_empty: false,
        }
    }
}

/// Build the path of a child field.
pub fn child_path(parent: &[usize], index: usize) -> Vec<usize> {
    let mut path = Vec::with_capacity(parent.len() + 1);
    path.extend_from_slice(parent);
    path.push(index);
    path
}

/// A struct whose fields map to SQL columns.
pub trait Record: 'static {
    /// Append descriptors for this type's fields in declaration order.
    ///
    /// Embedded fields push their own entry and then recurse in place.
    fn describe(fields: &mut Vec<FieldDescriptor>, parent: &[usize]);

    /// Return the leaf value at `path`, as produced by [`Record::describe`].
    fn column(&self, path: &[usize]) -> Option<&dyn Column>;

    /// All descriptors of the type.
    fn descriptors() -> Vec<FieldDescriptor>
    where
        Self: Sized,
    {
        let mut fields = Vec::new();
        Self::describe(&mut fields, &[]);
        fields
    }
}

impl<T: Record> Record for Box<T> {
    fn describe(fields: &mut Vec<FieldDescriptor>, parent: &[usize]) {
        T::describe(fields, parent);
    }

    fn column(&self, path: &[usize]) -> Option<&dyn Column> {
        (**self).column(path)
    }
}

/// An absent embedded record has no values; the mapper binds NULL for its columns.
impl<T: Record> Record for Option<T> {
    fn describe(fields: &mut Vec<FieldDescriptor>, parent: &[usize]) {
        T::describe(fields, parent);
    }

    fn column(&self, path: &[usize]) -> Option<&dyn Column> {
        self.as_ref()?.column(path)
    }
}

/// Borrowed view over one or many records.
#[derive(Debug)]
pub enum Records<'a, T> {
    None,
    One(&'a T),
    Many(&'a [T]),
}

impl<'a, T> Records<'a, T> {
    /// Iterate the records in order.
    pub fn iter(&self) -> impl Iterator<Item = &'a T> + '_ {
        let (one, many): (Option<&'a T>, &'a [T]) = match *self {
            Records::None => (None, &[]),
            Records::One(r) => (Some(r), &[]),
            Records::Many(rs) => (None, rs),
        };
        one.into_iter().chain(many.iter())
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Records::None)
    }
}

/// Input accepted where either a record or a sequence of records is allowed.
///
/// `#[derive(Record)]` implements this for the record itself; slices,
/// vectors, arrays, references, boxes and options are covered here.
pub trait AsRecords {
    type Record: Record;

    fn records(&self) -> Records<'_, Self::Record>;
}

impl<A: AsRecords + ?Sized> AsRecords for &A {
    type Record = A::Record;

    fn records(&self) -> Records<'_, Self::Record> {
        (**self).records()
    }
}

impl<A: AsRecords + ?Sized> AsRecords for Box<A> {
    type Record = A::Record;

    fn records(&self) -> Records<'_, Self::Record> {
        (**self).records()
    }
}

impl<A: AsRecords + ?Sized> AsRecords for Arc<A> {
    type Record = A::Record;

    fn records(&self) -> Records<'_, Self::Record> {
        (**self).records()
    }
}

impl<A: AsRecords> AsRecords for Option<A> {
    type Record = A::Record;

    fn records(&self) -> Records<'_, Self::Record> {
        match self {
            Some(inner) => inner.records(),
            None => Records::None,
        }
    }
}

impl<T: Record> AsRecords for [T] {
    type Record = T;

    fn records(&self) -> Records<'_, T> {
        Records::Many(self)
    }
}

impl<T: Record> AsRecords for Vec<T> {
    type Record = T;

    fn records(&self) -> Records<'_, T> {
        Records::Many(self)
    }
}

impl<T: Record, const N: usize> AsRecords for [T; N] {
    type Record = T;

    fn records(&self) -> Records<'_, T> {
        Records::Many(self)
    }
}

/// Identity of a memory location of a given type.
///
/// Two references produce the same `Ptr` iff they point to the same address
/// with the same concrete type, so a record and its first field never
/// collide. The address is never dereferenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ptr {
    type_id: TypeId,
    addr: usize,
}

impl Ptr {
    /// Identity of a typed reference.
    pub fn of<T: Any>(value: &T) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            addr: value as *const T as usize,
        }
    }

    /// Identity of a type-erased reference, keyed by its concrete type.
    pub fn of_any(value: &dyn Any) -> Self {
        Self {
            type_id: (*value).type_id(),
            addr: value as *const dyn Any as *const () as usize,
        }
    }

    /// Identity of a record column.
    pub fn of_column(value: &dyn Column) -> Self {
        let any: &dyn Any = value;
        Self::of_any(any)
    }
}
