use proc_macro2::TokenStream;
use quote::{ToTokens, quote};
use syn::{GenericArgument, PathArguments, Type};

/// Compile-time mirror of `docrepo_core::ValueKind`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Kind {
    Any,
    Bool,
    Integer,
    Float,
    String,
    Timestamp,
    Id,
    Array(Box<Kind>),
    Map,
    Nullable(Box<Kind>),
}

/// How `min`, `max` and `non_empty` apply to a field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Measure {
    /// Compared by value.
    Number,
    /// Compared by character count.
    Text,
    /// Compared by element count.
    Items,
}

const INTEGERS: &[&str] = &[
    "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64", "u128", "usize",
];
const FLOATS: &[&str] = &["f32", "f64"];
const STRINGS: &[&str] = &["String", "str", "char"];
const SEQUENCES: &[&str] = &["Vec", "VecDeque", "HashSet", "BTreeSet", "LinkedList", "BinaryHeap"];
const MAPS: &[&str] = &["HashMap", "BTreeMap", "Map", "IndexMap"];
const POINTERS: &[&str] = &["Box", "Arc", "Rc", "Cow"];

impl Kind {
    /// Infer the kind of a field from its declared type.
    pub fn infer(ty: &Type) -> Kind {
        match ty {
            Type::Reference(reference) => Kind::infer(&reference.elem),
            Type::Paren(paren) => Kind::infer(&paren.elem),
            Type::Group(group) => Kind::infer(&group.elem),
            Type::Array(array) => Kind::Array(Box::new(Kind::infer(&array.elem))),
            Type::Slice(slice) => Kind::Array(Box::new(Kind::infer(&slice.elem))),
            Type::Tuple(tuple) if tuple.elems.is_empty() => Kind::Any,
            Type::Tuple(_) => Kind::Array(Box::new(Kind::Any)),
            Type::Path(path) if path.qself.is_none() => {
                let Some(last) = path.path.segments.last() else {
                    return Kind::Any;
                };
                let name = last.ident.to_string();
                let first_arg = || first_type_arg(&last.arguments).map(Kind::infer);

                match name.as_str() {
                    "bool" => Kind::Bool,
                    n if INTEGERS.contains(&n) => Kind::Integer,
                    n if FLOATS.contains(&n) => Kind::Float,
                    n if STRINGS.contains(&n) => Kind::String,
                    "DateTime" => Kind::Timestamp,
                    "DocumentId" => Kind::Id,
                    "Option" => Kind::Nullable(Box::new(first_arg().unwrap_or(Kind::Any))),
                    n if SEQUENCES.contains(&n) => {
                        Kind::Array(Box::new(first_arg().unwrap_or(Kind::Any)))
                    }
                    n if MAPS.contains(&n) => Kind::Map,
                    n if POINTERS.contains(&n) => first_arg().unwrap_or(Kind::Any),
                    _ => Kind::Any,
                }
            }
            _ => Kind::Any,
        }
    }

    /// Parse a `#[model(kind = "...")]` override such as `integer` or
    /// `array<string>`.
    pub fn parse(s: &str) -> Option<Kind> {
        let s = s.trim();
        if let Some(inner) = s.strip_prefix("array<").and_then(|r| r.strip_suffix('>')) {
            return Kind::parse(inner).map(|k| Kind::Array(Box::new(k)));
        }
        if let Some(inner) = s.strip_prefix("nullable<").and_then(|r| r.strip_suffix('>')) {
            return Kind::parse(inner).map(|k| Kind::Nullable(Box::new(k)));
        }
        Some(match s {
            "any" => Kind::Any,
            "boolean" | "bool" => Kind::Bool,
            "integer" => Kind::Integer,
            "float" => Kind::Float,
            "string" => Kind::String,
            "timestamp" => Kind::Timestamp,
            "id" => Kind::Id,
            "map" => Kind::Map,
            _ => return None,
        })
    }

    /// The measure used by size constraints, ignoring one level of
    /// nullability.
    pub fn measure(&self) -> Option<Measure> {
        match self {
            Kind::Integer | Kind::Float => Some(Measure::Number),
            Kind::String => Some(Measure::Text),
            Kind::Array(_) | Kind::Map => Some(Measure::Items),
            _ => None,
        }
    }
}

impl ToTokens for Kind {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let path = quote!(::docrepo_core::ValueKind);
        tokens.extend(match self {
            Kind::Any => quote!(#path::Any),
            Kind::Bool => quote!(#path::Bool),
            Kind::Integer => quote!(#path::Integer),
            Kind::Float => quote!(#path::Float),
            Kind::String => quote!(#path::String),
            Kind::Timestamp => quote!(#path::Timestamp),
            Kind::Id => quote!(#path::Id),
            Kind::Map => quote!(#path::Map),
            Kind::Array(inner) => quote!(#path::array(#inner)),
            Kind::Nullable(inner) => quote!(#path::nullable(#inner)),
        });
    }
}

/// Returns the inner type if `ty` is `Option<T>`.
pub(crate) fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let last = path.path.segments.last()?;
    if last.ident != "Option" {
        return None;
    }
    first_type_arg(&last.arguments)
}

/// Returns true for primitive numeric types, which size constraints can
/// cast to `f64`.
pub(crate) fn is_primitive_number(ty: &Type) -> bool {
    let Type::Path(path) = ty else {
        return false;
    };
    path.path
        .get_ident()
        .is_some_and(|ident| {
            let name = ident.to_string();
            INTEGERS.contains(&name.as_str()) || FLOATS.contains(&name.as_str())
        })
}

fn first_type_arg(arguments: &PathArguments) -> Option<&Type> {
    let PathArguments::AngleBracketed(args) = arguments else {
        return None;
    };
    args.args.iter().find_map(|arg| match arg {
        GenericArgument::Type(ty) => Some(ty),
        _ => None,
    })
}
