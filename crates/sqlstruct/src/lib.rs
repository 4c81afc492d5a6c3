//! # sqlstruct
//!
//! Struct-to-SQL mapping on top of a small statement builder.
//!
//! ## Features
//!
//! - **Mapper**: derive column lists, values, assignments and equality
//!   conditions from `#[derive(Record)]` structs
//! - **Referencer**: address columns through struct fields instead of strings,
//!   with table aliases and identifier quoting
//! - **Storage**: execute built statements, with transaction reuse and hooks
//!
//! ## Mapper
//!
//! ```ignore
//! use sqlstruct::{Mapper, Options, Record, qb};
//!
//! #[derive(Record, Default)]
//! struct User {
//!     #[db(column = "id", omit_empty)]
//!     id: i64,
//!     #[db(column = "name")]
//!     name: String,
//! }
//!
//! let m = Mapper::global();
//! let q = m.insert(qb::insert("users"), &user, &Options::new());
//! // INSERT INTO users (id,name) VALUES (?,?)
//! ```
//!
//! ## Referencer
//!
//! ```ignore
//! use sqlstruct::{Referencer, qb, quote_ansi};
//!
//! let (manager, employee) = (User::default(), User::default());
//! let mut rf = Referencer::new().with_quoter(quote_ansi);
//! rf.add_table_alias(&manager, "manager");
//! rf.add_table_alias(&employee, "employee");
//!
//! let q = qb::select(rf.cols(&employee))
//!     .from(rf.fmt("{} AS {}", &[&rf.q(&["users"]), &employee]))
//!     .join(&rf.fmt("{} AS {} ON {} = {}", &[&rf.q(&["users"]), &manager, &manager.id, &employee.manager_id]), vec![]);
//! ```

extern crate self as sqlstruct;

pub mod error;
pub mod mapper;
pub mod options;
pub mod qb;
pub mod quote;
pub mod record;
pub mod referencer;
pub mod row;
pub mod statement;
pub mod storage;
pub mod value;

pub use error::{SqlError, SqlResult, UsageError};
pub use mapper::{Mapper, TypeMap};
pub use options::{Dialect, Options, PrepareColumn};
pub use quote::{
    Quoter, quote_ansi, quote_backticks, quote_noop, quote_required_ansi,
    quote_required_backticks, unquote,
};
pub use record::{AsRecords, FieldDescriptor, Ptr, Record, Records, child_path};
pub use referencer::{NoTable, Quoted, Referencer, no_table, no_table_all};
pub use row::{FromRow, Row};
pub use statement::split_statements;
pub use storage::{
    Context, Database, ErrorObserver, ExecResult, Executor, QueryContext, QueryHook, QueryType,
    Storage, StorageConfig, Table, TracingHook, Transaction,
};
pub use value::{Column, FromValue, Json, Value};

pub use qb::{
    BuiltQuery, DeleteBuilder, Eq, Expr, InsertBuilder, PlaceholderFormat, QbError, RawStatement,
    SelectBuilder, SqlQb, StatementBuilder, UpdateBuilder,
};

#[cfg(feature = "pool")]
pub mod postgres;

#[cfg(feature = "pool")]
pub use postgres::{
    PgDatabase, PgTransaction, create_pool, create_pool_with_config,
    create_pool_with_manager_config,
};

#[cfg(feature = "derive")]
pub use sqlstruct_derive::{FromRow, Record};
