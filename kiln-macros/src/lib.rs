//! Procedural macros for the kiln project.
//!
//! This crate provides compile-time code generation for the kiln framework. The generated
//! code refers to the `kiln` facade crate, so it is meant to be used through `kiln::Record`.

#[allow(unused_extern_crates)]
extern crate self as kiln_macros;

use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Field, Fields, parse_macro_input, spanned::Spanned};

/// Derives `Record` and by-value `Element` for a struct.
///
/// A named field marked `#[record(id)]` additionally implements `Identifiable`, returning that
/// field as the record id. The field type must implement `AsRef<str>`.
///
/// ```ignore
/// #[derive(Debug, Default, Serialize, Deserialize, Record)]
/// pub struct Book {
///     #[record(id)]
///     #[serde(rename = "book_id")]
///     pub id: String,
///     pub name: String,
/// }
/// ```
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    expand_record(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_record(input: DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new(input.span(), "Record can only be derived for structs"));
    };

    let identifiable = match id_field(&data.fields)? {
        Some(field) => {
            let ident = &field.ident;
            quote! {
                impl #impl_generics ::kiln::record::Identifiable for #name #ty_generics #where_clause {
                    fn id(&self) -> &str {
                        ::core::convert::AsRef::<str>::as_ref(&self.#ident)
                    }
                }
            }
        }
        None => quote! {},
    };

    Ok(quote! {
        impl #impl_generics ::kiln::record::Record for #name #ty_generics #where_clause {}

        impl #impl_generics ::kiln::record::Element for #name #ty_generics #where_clause {
            type Record = Self;

            const BY_REFERENCE: bool = false;

            fn from_boxed(record: ::std::boxed::Box<Self>) -> Self {
                *record
            }
        }

        #identifiable
    })
}

/// Finds the single field marked `#[record(id)]`, if any.
fn id_field(fields: &Fields) -> syn::Result<Option<&Field>> {
    let mut found: Option<&Field> = None;

    for field in fields {
        for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("record")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("id") {
                    Ok(())
                } else {
                    Err(meta.error("unsupported record attribute, expected `id`"))
                }
            })?;

            if field.ident.is_none() {
                return Err(syn::Error::new(field.span(), "#[record(id)] requires a named field"));
            }
            if found.replace(field).is_some() {
                return Err(syn::Error::new(field.span(), "only one field can be marked #[record(id)]"));
            }
        }
    }

    Ok(found)
}
