//! Record derive macro implementation

use crate::attrs::{FieldKind, struct_fields};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Result};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let fields = struct_fields(&input, "Record")?;

    let mut describe = Vec::with_capacity(fields.len());
    let mut accessors = Vec::new();

    for (index, field) in fields.iter().enumerate() {
        let ident = field.ident;
        let ty = field.ty;
        let field_name = ident.to_string();

        match &field.kind {
            FieldKind::Column { name, omit_empty } => {
                describe.push(quote! {
                    fields.push(::sqlstruct::FieldDescriptor::column(
                        parent, #index, #field_name, #name, #omit_empty,
                    ));
                });
                accessors.push(quote! {
                    [#index] => ::std::option::Option::Some(&self.#ident),
                });
            }
            FieldKind::Embed => {
                describe.push(quote! {
                    fields.push(::sqlstruct::FieldDescriptor::embedded(parent, #index, #field_name));
                    <#ty as ::sqlstruct::Record>::describe(
                        fields,
                        &::sqlstruct::child_path(parent, #index),
                    );
                });
                accessors.push(quote! {
                    [#index, rest @ ..] => ::sqlstruct::Record::column(&self.#ident, rest),
                });
            }
            FieldKind::Untagged => {
                describe.push(quote! {
                    fields.push(::sqlstruct::FieldDescriptor::untagged(parent, #index, #field_name));
                });
            }
        }
    }

    Ok(quote! {
        impl #impl_generics ::sqlstruct::Record for #name #ty_generics #where_clause {
            #[allow(unused_variables)]
            fn describe(
                fields: &mut ::std::vec::Vec<::sqlstruct::FieldDescriptor>,
                parent: &[usize],
            ) {
                #(#describe)*
            }

            fn column(&self, path: &[usize]) -> ::std::option::Option<&dyn ::sqlstruct::Column> {
                match path {
                    #(#accessors)*
                    _ => ::std::option::Option::None,
                }
            }
        }

        impl #impl_generics ::sqlstruct::AsRecords for #name #ty_generics #where_clause {
            type Record = Self;

            fn records(&self) -> ::sqlstruct::Records<'_, Self> {
                ::sqlstruct::Records::One(self)
            }
        }
    })
}
