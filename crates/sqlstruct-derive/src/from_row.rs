//! FromRow derive macro implementation

use crate::attrs::{FieldKind, struct_fields};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Result};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let fields = struct_fields(&input, "FromRow")?;

    let field_extracts: Vec<_> = fields
        .iter()
        .map(|field| {
            let ident = field.ident;
            let ty = field.ty;
            match &field.kind {
                FieldKind::Column { name, .. } => quote! {
                    #ident: row.get(#name)?
                },
                FieldKind::Embed => quote! {
                    #ident: <#ty as ::sqlstruct::FromRow>::from_row(row)?
                },
                FieldKind::Untagged => quote! {
                    #ident: ::std::default::Default::default()
                },
            }
        })
        .collect();

    Ok(quote! {
        impl #impl_generics ::sqlstruct::FromRow for #name #ty_generics #where_clause {
            fn from_row(row: &::sqlstruct::Row) -> ::sqlstruct::SqlResult<Self> {
                ::std::result::Result::Ok(Self {
                    #(#field_extracts),*
                })
            }
        }
    })
}
