use proc_macro2::{Span, TokenTree};
use syn::ext::IdentExt;
use syn::meta::ParseNestedMeta;
use syn::spanned::Spanned;
use syn::{Attribute, Expr, ExprLit, ExprPath, ExprUnary, Field, Lit, LitStr, Result, Token, UnOp};

use crate::kind::Kind;

/// Container attributes from `#[serde(...)]` and `#[model(...)]`.
#[derive(Default)]
pub(crate) struct ContainerAttrs {
    pub rename_all: Option<RenameRule>,
    pub validate: Option<ExprPath>,
}

impl ContainerAttrs {
    pub fn parse(attrs: &[Attribute]) -> Result<Self> {
        let mut out = ContainerAttrs::default();

        for attr in attrs {
            if attr.path().is_ident("serde") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("rename_all") {
                        if let Some(lit) = serialize_name(&meta)? {
                            out.rename_all = Some(RenameRule::from_lit(&lit)?);
                        }
                        Ok(())
                    } else {
                        skip_value(&meta)
                    }
                })?;
            } else if attr.path().is_ident("model") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("validate") {
                        let lit: LitStr = meta.value()?.parse()?;
                        out.validate = Some(lit.parse()?);
                        Ok(())
                    } else {
                        Err(meta.error("Unknown model attribute, expected `validate`"))
                    }
                })?;
            }
        }

        Ok(out)
    }
}

/// A numeric bound from `min = ...` or `max = ...`.
pub(crate) struct Bound {
    pub value: f64,
    pub text: String,
    pub span: Span,
}

/// Field attributes from `#[serde(...)]` and `#[model(...)]`.
#[derive(Default)]
pub(crate) struct FieldAttrs {
    pub rename: Option<String>,
    pub skip: bool,
    pub flatten: bool,
    pub meta: bool,
    pub kind: Option<Kind>,
    pub min: Option<Bound>,
    pub max: Option<Bound>,
    pub non_empty: bool,
}

impl FieldAttrs {
    pub fn parse(field: &Field) -> Result<Self> {
        let mut out = FieldAttrs::default();

        for attr in &field.attrs {
            if attr.path().is_ident("serde") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("rename") {
                        if let Some(lit) = serialize_name(&meta)? {
                            out.rename = Some(lit.value());
                        }
                        Ok(())
                    } else if meta.path.is_ident("skip") || meta.path.is_ident("skip_serializing") {
                        out.skip = true;
                        Ok(())
                    } else if meta.path.is_ident("flatten") {
                        out.flatten = true;
                        Ok(())
                    } else {
                        skip_value(&meta)
                    }
                })?;
            } else if attr.path().is_ident("model") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("meta") {
                        out.meta = true;
                        Ok(())
                    } else if meta.path.is_ident("kind") {
                        let lit: LitStr = meta.value()?.parse()?;
                        let kind = Kind::parse(&lit.value())
                            .ok_or_else(|| syn::Error::new_spanned(&lit, "Unknown value kind"))?;
                        out.kind = Some(kind);
                        Ok(())
                    } else if meta.path.is_ident("min") {
                        out.min = Some(parse_bound(&meta)?);
                        Ok(())
                    } else if meta.path.is_ident("max") {
                        out.max = Some(parse_bound(&meta)?);
                        Ok(())
                    } else if meta.path.is_ident("non_empty") {
                        out.non_empty = true;
                        Ok(())
                    } else {
                        Err(meta.error(
                            "Unknown model attribute, expected one of `meta`, `kind`, `min`, `max`, `non_empty`",
                        ))
                    }
                })?;
            }
        }

        Ok(out)
    }
}

/// Name from `key = "..."` or `key(serialize = "...", ...)`.
fn serialize_name(meta: &ParseNestedMeta) -> Result<Option<LitStr>> {
    if meta.input.peek(Token![=]) {
        return Ok(Some(meta.value()?.parse()?));
    }

    let mut name = None;
    meta.parse_nested_meta(|inner| {
        if inner.path.is_ident("serialize") {
            name = Some(inner.value()?.parse()?);
            Ok(())
        } else {
            skip_value(&inner)
        }
    })?;
    Ok(name)
}

/// Consume the value of a serde key this macro does not interpret.
fn skip_value(meta: &ParseNestedMeta) -> Result<()> {
    if meta.input.peek(Token![=]) {
        meta.value()?.parse::<Expr>()?;
    } else if meta.input.peek(syn::token::Paren) {
        meta.input.parse::<TokenTree>()?;
    }
    Ok(())
}

fn parse_bound(meta: &ParseNestedMeta) -> Result<Bound> {
    let expr: Expr = meta.value()?.parse()?;
    let (negative, lit) = match &expr {
        Expr::Lit(ExprLit { lit, .. }) => (false, lit),
        Expr::Unary(ExprUnary {
            op: UnOp::Neg(_),
            expr: inner,
            ..
        }) => match inner.as_ref() {
            Expr::Lit(ExprLit { lit, .. }) => (true, lit),
            _ => return Err(syn::Error::new_spanned(&expr, "Bound must be a number literal")),
        },
        _ => return Err(syn::Error::new_spanned(&expr, "Bound must be a number literal")),
    };

    let (value, text) = match lit {
        Lit::Int(int) => (int.base10_parse::<f64>()?, int.base10_digits().to_string()),
        Lit::Float(float) => (float.base10_parse::<f64>()?, float.base10_digits().to_string()),
        _ => return Err(syn::Error::new_spanned(lit, "Bound must be a number literal")),
    };

    Ok(if negative {
        Bound {
            value: -value,
            text: format!("-{}", text),
            span: meta.path.span(),
        }
    } else {
        Bound {
            value,
            text,
            span: meta.path.span(),
        }
    })
}

/// serde `rename_all` rules, applied to snake_case field names.
#[derive(Clone, Copy)]
pub(crate) enum RenameRule {
    Lower,
    Upper,
    Pascal,
    Camel,
    Snake,
    ScreamingSnake,
    Kebab,
    ScreamingKebab,
}

impl RenameRule {
    fn from_lit(lit: &LitStr) -> Result<Self> {
        Ok(match lit.value().as_str() {
            "lowercase" => RenameRule::Lower,
            "UPPERCASE" => RenameRule::Upper,
            "PascalCase" => RenameRule::Pascal,
            "camelCase" => RenameRule::Camel,
            "snake_case" => RenameRule::Snake,
            "SCREAMING_SNAKE_CASE" => RenameRule::ScreamingSnake,
            "kebab-case" => RenameRule::Kebab,
            "SCREAMING-KEBAB-CASE" => RenameRule::ScreamingKebab,
            _ => return Err(syn::Error::new_spanned(lit, "Unknown rename_all rule")),
        })
    }

    pub fn apply(self, field: &str) -> String {
        match self {
            RenameRule::Lower | RenameRule::Snake => field.to_string(),
            RenameRule::Upper | RenameRule::ScreamingSnake => field.to_ascii_uppercase(),
            RenameRule::Kebab => field.replace('_', "-"),
            RenameRule::ScreamingKebab => field.to_ascii_uppercase().replace('_', "-"),
            RenameRule::Pascal => {
                let mut out = String::with_capacity(field.len());
                let mut upper = true;
                for ch in field.chars() {
                    if ch == '_' {
                        upper = true;
                    } else if upper {
                        out.push(ch.to_ascii_uppercase());
                        upper = false;
                    } else {
                        out.push(ch);
                    }
                }
                out
            }
            RenameRule::Camel => {
                let pascal = RenameRule::Pascal.apply(field);
                let mut chars = pascal.chars();
                match chars.next() {
                    Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
                    None => pascal,
                }
            }
        }
    }
}

/// Wire name of a field after serde renames.
pub(crate) fn wire_name(field: &Field, attrs: &FieldAttrs, rule: Option<RenameRule>) -> String {
    if let Some(name) = &attrs.rename {
        return name.clone();
    }
    let ident = field
        .ident
        .as_ref()
        .map(|ident| ident.unraw().to_string())
        .unwrap_or_default();
    match rule {
        Some(rule) => rule.apply(&ident),
        None => ident,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rename_rules_match_serde() {
        assert_eq!(RenameRule::Camel.apply("display_name"), "displayName");
        assert_eq!(RenameRule::Pascal.apply("display_name"), "DisplayName");
        assert_eq!(RenameRule::Kebab.apply("display_name"), "display-name");
        assert_eq!(RenameRule::ScreamingSnake.apply("display_name"), "DISPLAY_NAME");
        assert_eq!(RenameRule::ScreamingKebab.apply("display_name"), "DISPLAY-NAME");
        assert_eq!(RenameRule::Camel.apply("age"), "age");
    }

    #[test]
    fn field_attributes() {
        let field: Field = syn::parse_quote! {
            #[serde(rename = "userName", default, skip_serializing_if = "String::is_empty")]
            #[model(non_empty, max = 40)]
            name: String
        };
        let attrs = FieldAttrs::parse(&field).unwrap();
        assert_eq!(attrs.rename.as_deref(), Some("userName"));
        assert!(attrs.non_empty);
        assert_eq!(attrs.max.as_ref().map(|b| b.value), Some(40.0));
        assert_eq!(wire_name(&field, &attrs, Some(RenameRule::Camel)), "userName");
    }

    #[test]
    fn negative_bounds() {
        let field: Field = syn::parse_quote! {
            #[model(min = -1.5)]
            delta: f64
        };
        let attrs = FieldAttrs::parse(&field).unwrap();
        let min = attrs.min.unwrap();
        assert_eq!(min.value, -1.5);
        assert_eq!(min.text, "-1.5");
    }

    #[test]
    fn unknown_model_key_is_rejected() {
        let field: Field = syn::parse_quote! {
            #[model(primary)]
            id: String
        };
        assert!(FieldAttrs::parse(&field).is_err());
    }
}
