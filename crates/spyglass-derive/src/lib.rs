//! Derive macros for spyglass-value conversion.
//!
//! `#[derive(ArgValue)]` generates `From<T> for Value` and
//! `TryFrom<Value> for T`, so domain types can be passed as call arguments
//! and used directly in argument matchers.
//!
//! # Example
//!
//! ```ignore
//! use spyglass_value::{ArgValue, Value};
//!
//! #[derive(ArgValue)]
//! struct Point {
//!     x: i64,
//!     y: i64,
//! }
//!
//! let value: Value = Point { x: 10, y: 20 }.into();
//! let back: Point = value.try_into().unwrap();
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Fields, LitStr};

/// Derive `Value` conversions.
///
/// - Named structs become `Value::Record` keyed by field name.
/// - Tuple structs become `Value::Tuple`; unit structs become `Value::Unit`.
/// - Enums become `Value::Variant`, matched back by case name. Tuple cases
///   carry their fields as the payload; struct-like cases carry one record.
///
/// `#[arg(rename = "name")]` overrides the name of a field, case or type.
/// `#[arg(crate = "path")]` on the type sets where the value crate is found,
/// e.g. `#[arg(crate = "spyglass::value")]` when only `spyglass` is a
/// dependency.
#[proc_macro_derive(ArgValue, attributes(arg))]
pub fn derive_arg_value(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let expanded = match &input.data {
        Data::Struct(data) => derive_struct(&input, data),
        Data::Enum(data) => derive_enum(&input, data),
        Data::Union(_) => Err(syn::Error::new_spanned(
            &input,
            "ArgValue cannot be derived for unions",
        )),
    };

    expanded.unwrap_or_else(syn::Error::into_compile_error).into()
}

fn derive_struct(input: &DeriveInput, data: &syn::DataStruct) -> syn::Result<TokenStream2> {
    let krate = crate_path(&input.attrs)?;
    let name = &input.ident;
    let type_name = rename(&input.attrs)?.unwrap_or_else(|| name.to_string());
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let (to_value, from_value) = match &data.fields {
        Fields::Named(fields) => {
            let mut pairs = Vec::new();
            let mut reads = Vec::new();
            for field in &fields.named {
                let ident = field.ident.as_ref().ok_or_else(|| {
                    syn::Error::new_spanned(field, "named field without identifier")
                })?;
                let key = rename(&field.attrs)?.unwrap_or_else(|| ident.to_string());
                let ty = &field.ty;
                pairs.push(quote! {
                    (
                        #krate::__private::String::from(#key),
                        #krate::Value::from(value.#ident)
                    )
                });
                reads.push(quote! {
                    #ident: {
                        let field_value = fields.iter()
                            .position(|(name, _)| name == #key)
                            .map(|i| fields.swap_remove(i).1)
                            .ok_or_else(|| #krate::ConversionError::MissingField(
                                #krate::__private::String::from(#key)
                            ))?;
                        <#ty as #krate::__private::TryFrom<#krate::Value>>::try_from(field_value)
                            .map_err(|e| #krate::ConversionError::FieldError(
                                #krate::__private::String::from(#key),
                                #krate::__private::Box::new(e),
                            ))?
                    }
                });
            }
            let count = fields.named.len();

            let to_value = quote! {
                #krate::Value::Record {
                    type_name: #krate::__private::String::from(#type_name),
                    fields: #krate::__private::vec![#(#pairs),*],
                }
            };
            let from_value = quote! {
                match value {
                    #krate::Value::Record { mut fields, .. } => {
                        if fields.len() != #count {
                            return #krate::__private::Err(
                                #krate::ConversionError::WrongFieldCount {
                                    expected: #count,
                                    got: fields.len(),
                                },
                            );
                        }
                        #krate::__private::Ok(Self { #(#reads),* })
                    }
                    other => #krate::__private::Err(
                        #krate::ConversionError::ExpectedRecord(
                            #krate::__private::String::from(other.kind())
                        )
                    ),
                }
            };
            (to_value, from_value)
        }
        Fields::Unnamed(fields) => {
            let indices: Vec<_> = (0..fields.unnamed.len()).map(syn::Index::from).collect();
            let reads = tuple_reads(&krate, fields.unnamed.iter().map(|f| &f.ty), quote!(items));
            let count = fields.unnamed.len();

            let to_value = quote! {
                #krate::Value::Tuple(#krate::__private::vec![
                    #(#krate::Value::from(value.#indices)),*
                ])
            };
            let from_value = quote! {
                match value {
                    #krate::Value::Tuple(items) => {
                        if items.len() != #count {
                            return #krate::__private::Err(
                                #krate::ConversionError::WrongFieldCount {
                                    expected: #count,
                                    got: items.len(),
                                },
                            );
                        }
                        let mut items = items.into_iter();
                        #krate::__private::Ok(Self(#(#reads),*))
                    }
                    other => #krate::__private::Err(
                        #krate::ConversionError::ExpectedTuple(
                            #krate::__private::String::from(other.kind())
                        )
                    ),
                }
            };
            (to_value, from_value)
        }
        Fields::Unit => {
            let to_value = quote! {
                {
                    let _ = value;
                    #krate::Value::Unit
                }
            };
            let from_value = quote! {
                match value {
                    #krate::Value::Unit => #krate::__private::Ok(Self),
                    other => #krate::__private::Err(
                        #krate::ConversionError::TypeMismatch {
                            expected: #krate::__private::String::from("unit"),
                            got: #krate::__private::String::from(other.kind()),
                        }
                    ),
                }
            };
            (to_value, from_value)
        }
    };

    Ok(quote! {
        impl #impl_generics #krate::__private::From<#name #ty_generics> for #krate::Value #where_clause {
            fn from(value: #name #ty_generics) -> #krate::Value {
                #to_value
            }
        }

        impl #impl_generics #krate::__private::TryFrom<#krate::Value> for #name #ty_generics #where_clause {
            type Error = #krate::ConversionError;

            fn try_from(value: #krate::Value) -> #krate::__private::Result<Self, Self::Error> {
                #from_value
            }
        }
    })
}

fn derive_enum(input: &DeriveInput, data: &syn::DataEnum) -> syn::Result<TokenStream2> {
    let krate = crate_path(&input.attrs)?;
    let name = &input.ident;
    let type_name = rename(&input.attrs)?.unwrap_or_else(|| name.to_string());
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let mut to_arms = Vec::new();
    let mut from_arms = Vec::new();

    for variant in &data.variants {
        let ident = &variant.ident;
        let case_name = rename(&variant.attrs)?.unwrap_or_else(|| ident.to_string());

        match &variant.fields {
            Fields::Named(fields) => {
                let idents: Vec<_> = fields.named.iter().filter_map(|f| f.ident.as_ref()).collect();
                let keys = fields
                    .named
                    .iter()
                    .map(|f| {
                        let ident = f.ident.as_ref().map(ToString::to_string).unwrap_or_default();
                        Ok(rename(&f.attrs)?.unwrap_or(ident))
                    })
                    .collect::<syn::Result<Vec<_>>>()?;
                let types: Vec<_> = fields.named.iter().map(|f| &f.ty).collect();

                to_arms.push(quote! {
                    #name::#ident { #(#idents),* } => #krate::Value::Variant {
                        type_name: #krate::__private::String::from(#type_name),
                        case_name: #krate::__private::String::from(#case_name),
                        payload: #krate::__private::vec![#krate::Value::Record {
                            type_name: #krate::__private::String::from(#case_name),
                            fields: #krate::__private::vec![#((
                                #krate::__private::String::from(#keys),
                                #krate::Value::from(#idents)
                            )),*],
                        }],
                    }
                });
                from_arms.push(quote! {
                    #case_name => {
                        let record = payload.into_iter().next()
                            .ok_or(#krate::ConversionError::MissingIndex(0))?;
                        let fields = match record {
                            #krate::Value::Record { fields, .. } => fields,
                            other => return #krate::__private::Err(
                                #krate::ConversionError::ExpectedRecord(
                                    #krate::__private::String::from(other.kind())
                                )
                            ),
                        };
                        #krate::__private::Ok(#name::#ident {
                            #(#idents: {
                                let field_value = fields.iter()
                                    .find(|(name, _)| name == #keys)
                                    .map(|(_, v)| v.clone())
                                    .ok_or_else(|| #krate::ConversionError::MissingField(
                                        #krate::__private::String::from(#keys)
                                    ))?;
                                <#types as #krate::__private::TryFrom<#krate::Value>>::try_from(field_value)
                                    .map_err(|e| #krate::ConversionError::FieldError(
                                        #krate::__private::String::from(#keys),
                                        #krate::__private::Box::new(e),
                                    ))?
                            }),*
                        })
                    }
                });
            }
            Fields::Unnamed(fields) => {
                let bindings: Vec<_> = (0..fields.unnamed.len())
                    .map(|i| format_ident!("f{}", i))
                    .collect();
                let reads = tuple_reads(&krate, fields.unnamed.iter().map(|f| &f.ty), quote!(items));
                let count = fields.unnamed.len();

                to_arms.push(quote! {
                    #name::#ident(#(#bindings),*) => #krate::Value::Variant {
                        type_name: #krate::__private::String::from(#type_name),
                        case_name: #krate::__private::String::from(#case_name),
                        payload: #krate::__private::vec![
                            #(#krate::Value::from(#bindings)),*
                        ],
                    }
                });
                from_arms.push(quote! {
                    #case_name => {
                        if payload.len() != #count {
                            return #krate::__private::Err(
                                #krate::ConversionError::WrongFieldCount {
                                    expected: #count,
                                    got: payload.len(),
                                },
                            );
                        }
                        let mut items = payload.into_iter();
                        #krate::__private::Ok(#name::#ident(#(#reads),*))
                    }
                });
            }
            Fields::Unit => {
                to_arms.push(quote! {
                    #name::#ident => #krate::Value::Variant {
                        type_name: #krate::__private::String::from(#type_name),
                        case_name: #krate::__private::String::from(#case_name),
                        payload: #krate::__private::Vec::new(),
                    }
                });
                from_arms.push(quote! {
                    #case_name => {
                        if !payload.is_empty() {
                            return #krate::__private::Err(
                                #krate::ConversionError::UnexpectedPayload,
                            );
                        }
                        #krate::__private::Ok(#name::#ident)
                    }
                });
            }
        }
    }

    Ok(quote! {
        impl #impl_generics #krate::__private::From<#name #ty_generics> for #krate::Value #where_clause {
            fn from(value: #name #ty_generics) -> #krate::Value {
                match value {
                    #(#to_arms),*
                }
            }
        }

        impl #impl_generics #krate::__private::TryFrom<#krate::Value> for #name #ty_generics #where_clause {
            type Error = #krate::ConversionError;

            fn try_from(value: #krate::Value) -> #krate::__private::Result<Self, Self::Error> {
                match value {
                    #krate::Value::Variant { case_name, payload, .. } => {
                        match case_name.as_str() {
                            #(#from_arms)*
                            _ => #krate::__private::Err(
                                #krate::ConversionError::UnknownCase {
                                    type_name: #krate::__private::String::from(#type_name),
                                    case_name,
                                }
                            ),
                        }
                    }
                    other => #krate::__private::Err(
                        #krate::ConversionError::ExpectedVariant(
                            #krate::__private::String::from(other.kind())
                        )
                    ),
                }
            }
        }
    })
}

/// Positional conversions pulling from an `IntoIter` named `source`.
fn tuple_reads<'a>(
    krate: &TokenStream2,
    types: impl Iterator<Item = &'a syn::Type>,
    source: TokenStream2,
) -> Vec<TokenStream2> {
    types
        .enumerate()
        .map(|(i, ty)| {
            quote! {
                <#ty as #krate::__private::TryFrom<#krate::Value>>::try_from(
                    #source.next().ok_or(#krate::ConversionError::MissingIndex(#i))?
                ).map_err(|e| #krate::ConversionError::IndexError(
                    #i,
                    #krate::__private::Box::new(e),
                ))?
            }
        })
        .collect()
}

#[derive(Default)]
struct ArgAttrs {
    rename: Option<String>,
    krate: Option<syn::Path>,
}

/// Parse every `#[arg(...)]` on an item.
fn arg_attrs(attrs: &[Attribute]) -> syn::Result<ArgAttrs> {
    let mut parsed = ArgAttrs::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("arg")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let lit: LitStr = meta.value()?.parse()?;
                parsed.rename = Some(lit.value());
                Ok(())
            } else if meta.path.is_ident("crate") {
                let lit: LitStr = meta.value()?.parse()?;
                parsed.krate = Some(lit.parse()?);
                Ok(())
            } else {
                Err(meta.error("unsupported arg attribute, expected `rename` or `crate`"))
            }
        })?;
    }
    Ok(parsed)
}

/// Extract `#[arg(rename = "...")]`.
fn rename(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    Ok(arg_attrs(attrs)?.rename)
}

/// Path the generated code reaches the value crate through:
/// `#[arg(crate = "...")]`, or `::spyglass_value`.
fn crate_path(attrs: &[Attribute]) -> syn::Result<TokenStream2> {
    Ok(match arg_attrs(attrs)?.krate {
        Some(path) => quote!(#path),
        None => quote!(::spyglass_value),
    })
}
