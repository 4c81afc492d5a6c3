//! Field-level `#[db(...)]` attribute parsing.

use syn::{Data, DeriveInput, Fields, Result};

/// How a field maps to columns.
pub(crate) enum FieldKind {
    /// `#[db(column = "...")]`
    Column { name: String, omit_empty: bool },
    /// `#[db(embed)]`
    Embed,
    /// No attribute.
    Untagged,
}

pub(crate) struct FieldInfo<'a> {
    pub ident: &'a syn::Ident,
    pub ty: &'a syn::Type,
    pub kind: FieldKind,
}

#[derive(Default)]
struct FieldAttr {
    column: Option<syn::LitStr>,
    omit_empty: bool,
    embed: bool,
}

impl syn::parse::Parse for FieldAttr {
    fn parse(input: syn::parse::ParseStream) -> Result<Self> {
        let mut attr = FieldAttr::default();

        while !input.is_empty() {
            let ident: syn::Ident = input.parse()?;
            if ident == "column" {
                let _: syn::Token![=] = input.parse()?;
                attr.column = Some(input.parse()?);
            } else if ident == "omit_empty" {
                attr.omit_empty = true;
            } else if ident == "embed" {
                attr.embed = true;
            } else {
                return Err(syn::Error::new_spanned(
                    &ident,
                    "expected `column = \"...\"`, `omit_empty` or `embed`",
                ));
            }

            if input.peek(syn::Token![,]) {
                let _: syn::Token![,] = input.parse()?;
            } else {
                break;
            }
        }

        Ok(attr)
    }
}

fn field_kind(field: &syn::Field) -> Result<FieldKind> {
    let mut attr = FieldAttr::default();
    for a in field.attrs.iter().filter(|a| a.path().is_ident("db")) {
        let parsed: FieldAttr = a.parse_args()?;
        attr.column = parsed.column.or(attr.column);
        attr.omit_empty |= parsed.omit_empty;
        attr.embed |= parsed.embed;
    }

    match (attr.column, attr.embed) {
        (Some(col), true) => Err(syn::Error::new_spanned(
            col,
            "`embed` fields take their columns from the embedded record",
        )),
        (Some(col), false) if col.value().is_empty() => {
            Err(syn::Error::new_spanned(col, "column name must not be empty"))
        }
        (Some(col), false) => Ok(FieldKind::Column {
            name: col.value(),
            omit_empty: attr.omit_empty,
        }),
        (None, true) => Ok(FieldKind::Embed),
        (None, false) => Ok(FieldKind::Untagged),
    }
}

/// Named fields of a struct with their mapping.
pub(crate) fn struct_fields<'a>(input: &'a DeriveInput, derive: &str) -> Result<Vec<FieldInfo<'a>>> {
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    format!("{derive} can only be derived for structs with named fields"),
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                format!("{derive} can only be derived for structs"),
            ));
        }
    };

    fields
        .iter()
        .map(|field| {
            Ok(FieldInfo {
                ident: field
                    .ident
                    .as_ref()
                    .ok_or_else(|| syn::Error::new_spanned(field, "expected a named field"))?,
                ty: &field.ty,
                kind: field_kind(field)?,
            })
        })
        .collect()
}
