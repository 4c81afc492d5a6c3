//! Derive macros for sqlstruct
//!
//! Provides `#[derive(Record)]` and `#[derive(FromRow)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod attrs;
mod from_row;
mod record;

/// Derive `Record` and `AsRecords` for a struct with named fields.
///
/// # Example
///
/// ```ignore
/// use sqlstruct::Record;
///
/// #[derive(Record, Default)]
/// struct User {
///     #[db(column = "id", omit_empty)]
///     id: i64,
///     #[db(column = "name")]
///     name: String,
///     #[db(embed)]
///     audit: Audit,
///     // Untagged fields are not columns.
///     cached: Vec<u8>,
/// }
/// ```
///
/// # Attributes
///
/// - `#[db(column = "name")]` - Map field to a column
/// - `#[db(column = "name", omit_empty)]` - Omit the column when the value is zero
/// - `#[db(embed)]` - Flatten the columns of a nested `Record`
#[proc_macro_derive(Record, attributes(db))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Derive `FromRow` for a struct, using the same `#[db(...)]` attributes.
///
/// Tagged fields are decoded by column name, embedded fields through their
/// own `FromRow`, and untagged fields take `Default::default()`.
#[proc_macro_derive(FromRow, attributes(db))]
pub fn derive_from_row(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    from_row::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
