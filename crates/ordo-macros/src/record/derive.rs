//! Implementation of the `#[derive(Record)]` macro.
//!
//! Generates an `ordo::Record` impl with the `Struct` layout, plus name
//! constants for every exposed field.

use std::collections::HashSet;

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{spanned::Spanned, Data, DeriveInput, Error, Fields, Result};

use super::attrs::{parse_container_attrs, parse_field_attrs};

/// Main implementation of the Record derive macro.
pub fn record_derive_impl(input: DeriveInput) -> Result<TokenStream> {
    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    // Ensure we have a struct with named fields
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(Error::new(
                    input.span(),
                    "Record can only be derived for structs with named fields",
                ))
            }
        },
        _ => {
            return Err(Error::new(
                input.span(),
                "Record can only be derived for structs",
            ))
        }
    };

    let container = parse_container_attrs(&input.attrs)?;

    let mut seen: HashSet<String> = HashSet::new();
    let mut field_constants: Vec<TokenStream> = Vec::new();
    let mut get_arms: Vec<TokenStream> = Vec::new();
    let mut field_entries: Vec<TokenStream> = Vec::new();
    // (exposed name, value expression), sorted before emission
    let mut members: Vec<(String, TokenStream)> = Vec::new();

    for field in fields.iter() {
        let field_name = field
            .ident
            .as_ref()
            .ok_or_else(|| Error::new(field.span(), "expected named field"))?;

        let attrs = parse_field_attrs(&field.attrs)?;
        if attrs.skip {
            continue;
        }

        let exposed = attrs.rename.unwrap_or_else(|| field_name.to_string());
        if !seen.insert(exposed.clone()) {
            return Err(Error::new(
                attrs.span,
                format!("duplicate record attribute name '{}'", exposed),
            ));
        }

        let const_name = format_ident!("{}", to_screaming_snake_case(&exposed));
        field_constants.push(quote! {
            /// Attribute name constant for order keys.
            pub const #const_name: &'static str = #exposed;
        });

        let value_expr = quote! { ::ordo::ToValue::to_value(&self.#field_name) };
        get_arms.push(quote! {
            #exposed => ::core::option::Option::Some(#value_expr),
        });
        field_entries.push(quote! { (#exposed, #value_expr) });
        members.push((exposed, value_expr));
    }

    for method in &container.computed {
        let exposed = method.to_string();
        if !seen.insert(exposed.clone()) {
            return Err(Error::new(
                method.span(),
                format!("duplicate record attribute name '{}'", exposed),
            ));
        }

        let value_expr = quote! { ::ordo::Value::from(self.#method()) };
        get_arms.push(quote! {
            #exposed => ::core::option::Option::Some(#value_expr),
        });
        members.push((exposed, value_expr));
    }

    members.sort_by(|a, b| a.0.cmp(&b.0));
    let member_entries = members
        .iter()
        .map(|(name, value_expr)| quote! { (#name, #value_expr) });

    let expanded = quote! {
        impl #impl_generics #struct_name #ty_generics #where_clause {
            #(#field_constants)*
        }

        impl #impl_generics ::ordo::Record for #struct_name #ty_generics #where_clause {
            fn layout(&self) -> ::ordo::Layout {
                ::ordo::Layout::Struct
            }

            fn get(&self, name: &str) -> ::core::option::Option<::ordo::Value<'_>> {
                match name {
                    #(#get_arms)*
                    _ => ::core::option::Option::None,
                }
            }

            fn fields(&self) -> ::std::vec::Vec<(&str, ::ordo::Value<'_>)> {
                ::std::vec![#(#field_entries),*]
            }

            fn members(&self) -> ::std::vec::Vec<(&str, ::ordo::Value<'_>)> {
                ::std::vec![#(#member_entries),*]
            }
        }
    };

    Ok(expanded)
}

/// Convert a string to SCREAMING_SNAKE_CASE.
fn to_screaming_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let mut prev_was_lower = false;

    for c in s.chars() {
        if c.is_uppercase() {
            if prev_was_lower {
                result.push('_');
            }
            result.push(c);
            prev_was_lower = false;
        } else if c == '_' || c == '-' {
            result.push('_');
            prev_was_lower = false;
        } else {
            result.push(c.to_ascii_uppercase());
            prev_was_lower = true;
        }
    }

    result
}
