//! # docrepo derive macros
//!
//! `#[derive(Model)]` implements `docrepo_core::Model` for a struct with
//! named fields and generates a `<Name>Fields` struct holding one typed
//! `FieldPath` per serialized field.
//!
//! ## Attributes
//!
//! - `#[model(meta)]` marks the flattened `Metadata` field. A field typed
//!   `Metadata` or named `meta` is picked up without it.
//! - `#[model(kind = "...")]` overrides the inferred value kind, e.g.
//!   `"integer"` or `"array<string>"`.
//! - `#[model(min = N)]` and `#[model(max = N)]` bound numbers by value and
//!   strings or collections by length.
//! - `#[model(non_empty)]` rejects empty strings and collections.
//! - `#[model(validate = "path")]` on the struct runs
//!   `fn(&Self) -> Result<(), ValidationError>` after the field checks.
//!
//! `#[serde(rename)]`, `#[serde(rename_all)]`, `#[serde(skip)]` and
//! `#[serde(flatten)]` are honoured when naming field paths.
//!
//! # Example
//!
//! ```rust,ignore
//! use docrepo_core::{Metadata, Model};
//!
//! #[derive(Serialize, Deserialize, Model)]
//! #[model(validate = "check_user")]
//! pub struct User {
//!     #[serde(flatten)]
//!     meta: Metadata,
//!     #[model(non_empty, max = 64)]
//!     pub name: String,
//!     #[model(min = 0, max = 150)]
//!     pub age: u32,
//!     pub tags: Vec<String>,
//! }
//! ```
//!
//! ## Error Messages
//!
//! Derivation fails at compile time for enums, tuple structs, generic
//! structs, a missing or non-flattened metadata field, user fields named
//! `id`, `created_at` or `updated_at`, and size constraints on fields that
//! cannot be measured.

extern crate proc_macro;
mod attrs;
mod kind;
mod model;

use crate::model::generate_model_for_struct;
use proc_macro::TokenStream;
use syn::{Data, DeriveInput};

/// Derives `docrepo_core::Model` and a typed field table.
#[proc_macro_derive(Model, attributes(model))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let ast = syn::parse_macro_input!(input as DeriveInput);

    match ast.data {
        Data::Struct(ref data) => match generate_model_for_struct(&ast, data) {
            Ok(tokens) => tokens.into(),
            Err(e) => e.to_compile_error().into(),
        },
        Data::Enum(_) | Data::Union(_) => syn::Error::new_spanned(
            &ast.ident,
            format!(
                "Failed to derive Model for '{}': only structs with named fields are supported",
                ast.ident
            ),
        )
        .to_compile_error()
        .into(),
    }
}
