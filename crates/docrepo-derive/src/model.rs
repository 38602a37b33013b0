use proc_macro2::{Literal, TokenStream};
use quote::{format_ident, quote, quote_spanned};
use syn::{DataStruct, DeriveInput, Field, Fields, Ident, Result, Type};

use crate::attrs::{Bound, ContainerAttrs, FieldAttrs, wire_name};
use crate::kind::{Kind, Measure, is_primitive_number, option_inner};

const RESERVED: [&str; 3] = ["id", "created_at", "updated_at"];

/// One serialized user field.
struct UserField<'a> {
    ident: &'a Ident,
    ty: &'a Type,
    wire: String,
    kind: Kind,
    attrs: FieldAttrs,
}

pub(crate) fn generate_model_for_struct(ast: &DeriveInput, data: &DataStruct) -> Result<TokenStream> {
    let name = &ast.ident;
    let vis = &ast.vis;

    if !ast.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &ast.generics,
            "Model cannot be derived for generic structs",
        ));
    }

    let Fields::Named(named) = &data.fields else {
        return Err(syn::Error::new_spanned(
            ast,
            "Model can only be derived for structs with named fields",
        ));
    };

    let container = ContainerAttrs::parse(&ast.attrs)?;

    let mut meta_field: Option<&Ident> = None;
    let mut user_fields = Vec::new();

    for field in &named.named {
        let attrs = FieldAttrs::parse(field)?;
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };

        if is_meta_field(field, &attrs) {
            if let Some(previous) = meta_field {
                return Err(syn::Error::new_spanned(
                    field,
                    format!("Multiple metadata fields, `{}` is already the metadata field", previous),
                ));
            }
            if !attrs.flatten {
                return Err(syn::Error::new_spanned(
                    field,
                    "The metadata field must be marked #[serde(flatten)]",
                ));
            }
            meta_field = Some(ident);
            continue;
        }

        if attrs.skip || attrs.flatten {
            continue;
        }

        let wire = wire_name(field, &attrs, container.rename_all);
        let plain = syn::ext::IdentExt::unraw(ident).to_string();
        if RESERVED.contains(&wire.as_str()) || RESERVED.contains(&plain.as_str()) {
            return Err(syn::Error::new_spanned(
                field,
                format!("Field name '{}' is reserved for repository metadata", wire),
            ));
        }

        let kind = attrs.kind.clone().unwrap_or_else(|| Kind::infer(&field.ty));
        user_fields.push(UserField {
            ident,
            ty: &field.ty,
            wire,
            kind,
            attrs,
        });
    }

    let Some(meta_ident) = meta_field else {
        return Err(syn::Error::new_spanned(
            ast,
            "Model needs a `#[serde(flatten)]` field of type docrepo_core::Metadata",
        ));
    };

    let fields_name = format_ident!("{}Fields", name);
    let schema = name.to_string();
    let fields_doc = format!("Field paths of [`{}`].", name);

    let idents: Vec<_> = user_fields.iter().map(|f| f.ident).collect();
    let types: Vec<_> = user_fields.iter().map(|f| f.ty).collect();
    let wires: Vec<_> = user_fields.iter().map(|f| f.wire.as_str()).collect();
    let kinds: Vec<_> = user_fields.iter().map(|f| &f.kind).collect();

    let mut checks = Vec::new();
    for field in &user_fields {
        checks.extend(constraint_checks(field)?);
    }
    let custom = container.validate.as_ref().map(|path| {
        quote! { #path(self)?; }
    });

    Ok(quote! {
        #[doc = #fields_doc]
        #[derive(Debug)]
        #vis struct #fields_name {
            pub id: ::docrepo_core::FieldPath<::docrepo_core::DocumentId>,
            pub created_at: ::docrepo_core::FieldPath<::docrepo_core::__private::DateTime<::docrepo_core::__private::Utc>>,
            pub updated_at: ::docrepo_core::FieldPath<::docrepo_core::__private::DateTime<::docrepo_core::__private::Utc>>,
            #( pub #idents: ::docrepo_core::FieldPath<#types>, )*
        }

        impl #fields_name {
            fn new() -> Self {
                Self {
                    id: ::docrepo_core::FieldPath::new("id", ::docrepo_core::ValueKind::Id),
                    created_at: ::docrepo_core::FieldPath::new("created_at", ::docrepo_core::ValueKind::Timestamp),
                    updated_at: ::docrepo_core::FieldPath::new("updated_at", ::docrepo_core::ValueKind::Timestamp),
                    #( #idents: ::docrepo_core::FieldPath::new(#wires, #kinds), )*
                }
            }
        }

        impl ::docrepo_core::FieldSet for #fields_name {
            fn schema(&self) -> &'static str {
                #schema
            }

            fn all(&self) -> ::std::vec::Vec<::docrepo_core::FieldInfo> {
                ::std::vec![
                    self.id.info().clone(),
                    self.created_at.info().clone(),
                    self.updated_at.info().clone(),
                    #( self.#idents.info().clone(), )*
                ]
            }

            fn get(&self, name: &str) -> ::docrepo_core::Result<::docrepo_core::FieldInfo> {
                match name {
                    "id" => ::std::result::Result::Ok(self.id.info().clone()),
                    "created_at" => ::std::result::Result::Ok(self.created_at.info().clone()),
                    "updated_at" => ::std::result::Result::Ok(self.updated_at.info().clone()),
                    #( #wires => ::std::result::Result::Ok(self.#idents.info().clone()), )*
                    _ => ::std::result::Result::Err(::docrepo_core::model::unknown_field(#schema, name)),
                }
            }
        }

        impl ::docrepo_core::Model for #name {
            type Fields = #fields_name;

            fn metadata(&self) -> &::docrepo_core::Metadata {
                &self.#meta_ident
            }

            fn metadata_mut(&mut self) -> &mut ::docrepo_core::Metadata {
                &mut self.#meta_ident
            }

            fn fields() -> &'static #fields_name {
                static FIELDS: ::std::sync::OnceLock<#fields_name> = ::std::sync::OnceLock::new();
                FIELDS.get_or_init(#fields_name::new)
            }

            fn validate(&self) -> ::std::result::Result<(), ::docrepo_core::ValidationError> {
                #( #checks )*
                #custom
                ::std::result::Result::Ok(())
            }
        }
    })
}

fn is_meta_field(field: &Field, attrs: &FieldAttrs) -> bool {
    if attrs.meta {
        return true;
    }
    if let Type::Path(path) = &field.ty {
        if path.path.segments.last().is_some_and(|s| s.ident == "Metadata") {
            return true;
        }
    }
    field.ident.as_ref().is_some_and(|ident| ident == "meta")
}

/// Validation statements for one field's `min`, `max` and `non_empty`.
fn constraint_checks(field: &UserField) -> Result<Vec<TokenStream>> {
    let attrs = &field.attrs;
    if attrs.min.is_none() && attrs.max.is_none() && !attrs.non_empty {
        return Ok(Vec::new());
    }

    let (inner_ty, optional) = match option_inner(field.ty) {
        Some(inner) => (inner, true),
        None => (field.ty, false),
    };
    let kind = match &field.kind {
        Kind::Nullable(inner) => inner.as_ref(),
        other => other,
    };
    let Some(measure) = kind.measure() else {
        return Err(syn::Error::new_spanned(
            field.ty,
            "Size constraints need a number, string, collection or map field",
        ));
    };
    if measure == Measure::Number && !is_primitive_number(inner_ty) {
        return Err(syn::Error::new_spanned(
            field.ty,
            "Numeric bounds need a primitive number type",
        ));
    }

    let mut checks = Vec::new();
    if let Some(bound) = &attrs.min {
        checks.push(bound_check(field, measure, bound, true)?);
    }
    if let Some(bound) = &attrs.max {
        checks.push(bound_check(field, measure, bound, false)?);
    }
    if attrs.non_empty {
        let cond = match measure {
            Measure::Number => {
                return Err(syn::Error::new_spanned(
                    field.ty,
                    "non_empty needs a string, collection or map field",
                ));
            }
            Measure::Text | Measure::Items => quote!(!value.is_empty()),
        };
        let wire = &field.wire;
        checks.push(quote! {
            if !(#cond) {
                return ::std::result::Result::Err(::docrepo_core::ValidationError::new(#wire, "must not be empty"));
            }
        });
    }

    let ident = field.ident;
    let access = if optional {
        quote!(if let ::std::option::Option::Some(value) = &self.#ident)
    } else {
        quote!(let value = &self.#ident;)
    };
    let body = quote!(#( #checks )*);

    Ok(vec![if optional {
        quote! { #access { #body } }
    } else {
        quote! { { #access #body } }
    }])
}

fn bound_check(field: &UserField, measure: Measure, bound: &Bound, lower: bool) -> Result<TokenStream> {
    let wire = &field.wire;
    let (actual, limit, unit) = match measure {
        Measure::Number => {
            let limit = Literal::f64_suffixed(bound.value);
            (quote!((*value as f64)), quote!(#limit), "")
        }
        Measure::Text | Measure::Items => {
            if bound.value < 0.0 || bound.value.fract() != 0.0 {
                return Err(syn::Error::new(
                    bound.span,
                    "Length bounds must be non-negative integers",
                ));
            }
            let limit = Literal::usize_suffixed(bound.value as usize);
            let actual = if measure == Measure::Text {
                quote!(value.chars().count())
            } else {
                quote!(value.len())
            };
            let unit = if measure == Measure::Text { " characters" } else { " items" };
            (actual, quote!(#limit), unit)
        }
    };

    let (violated, message) = if lower {
        (quote!(#actual < #limit), format!("must be at least {}{}", bound.text, unit))
    } else {
        (quote!(#actual > #limit), format!("must be at most {}{}", bound.text, unit))
    };

    Ok(quote_spanned! {bound.span=>
        if #violated {
            return ::std::result::Result::Err(::docrepo_core::ValidationError::new(#wire, #message));
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn expand(input: DeriveInput) -> Result<String> {
        let syn::Data::Struct(data) = &input.data else {
            panic!("not a struct");
        };
        generate_model_for_struct(&input, data).map(|tokens| tokens.to_string())
    }

    #[test]
    fn generates_field_table() {
        let out = expand(parse_quote! {
            struct User {
                #[serde(flatten)]
                meta: Metadata,
                #[serde(rename = "displayName")]
                name: String,
                tags: Vec<String>,
                #[serde(skip)]
                cache: u8,
            }
        })
        .unwrap();

        assert!(out.contains("struct UserFields"));
        assert!(out.contains("\"displayName\""));
        assert!(out.contains("pub tags"));
        assert!(!out.contains("pub cache"));
    }

    #[test]
    fn reserved_names_are_rejected() {
        let err = expand(parse_quote! {
            struct User {
                #[serde(flatten)]
                meta: Metadata,
                created_at: String,
            }
        })
        .unwrap_err();
        assert!(err.to_string().contains("reserved"));
    }

    #[test]
    fn metadata_field_is_required() {
        assert!(expand(parse_quote! {
            struct User {
                name: String,
            }
        })
        .is_err());

        assert!(expand(parse_quote! {
            struct User {
                meta: Metadata,
            }
        })
        .is_err());
    }

    #[test]
    fn constraints_need_a_measurable_field() {
        assert!(expand(parse_quote! {
            struct User {
                #[serde(flatten)]
                meta: Metadata,
                #[model(min = 1)]
                active: bool,
            }
        })
        .is_err());

        assert!(expand(parse_quote! {
            struct User {
                #[serde(flatten)]
                meta: Metadata,
                #[model(min = 0, max = 150)]
                age: Option<u32>,
                #[model(non_empty, max = 3)]
                tags: Vec<String>,
            }
        })
        .is_ok());
    }

    #[test]
    fn generics_are_rejected() {
        assert!(expand(parse_quote! {
            struct Wrapper<T> {
                #[serde(flatten)]
                meta: Metadata,
                inner: T,
            }
        })
        .is_err());
    }
}
