//! Typed field paths.

use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;

use chrono::DateTime;
use serde_json::Value;

use super::Operator;
use crate::types::DocumentId;

/// The declared value kind of a model field.
///
/// Kinds are derived from the Rust type of each field by
/// `#[derive(Model)]` and used to check filter operands when a query is
/// built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// No constraint; any value is accepted.
    Any,
    Bool,
    Integer,
    /// Any JSON number.
    Float,
    String,
    /// An RFC 3339 timestamp string.
    Timestamp,
    /// A document id string.
    Id,
    Array(Box<ValueKind>),
    Map,
    /// The inner kind or `null`.
    Nullable(Box<ValueKind>),
}

static ANY: ValueKind = ValueKind::Any;

impl ValueKind {
    /// Array of `inner`.
    pub fn array(inner: ValueKind) -> Self {
        ValueKind::Array(Box::new(inner))
    }

    /// `inner` or `null`.
    pub fn nullable(inner: ValueKind) -> Self {
        ValueKind::Nullable(Box::new(inner))
    }

    /// Returns true if `value` is a valid value of this kind.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ValueKind::Any => true,
            ValueKind::Nullable(inner) => value.is_null() || inner.accepts(value),
            ValueKind::Bool => value.is_boolean(),
            ValueKind::Integer => value.is_i64() || value.is_u64(),
            ValueKind::Float => value.is_number(),
            ValueKind::String => value.is_string(),
            ValueKind::Timestamp => value
                .as_str()
                .is_some_and(|s| DateTime::parse_from_rfc3339(s).is_ok()),
            ValueKind::Id => value
                .as_str()
                .is_some_and(|s| DocumentId::new(s).is_ok()),
            ValueKind::Array(inner) => value
                .as_array()
                .is_some_and(|items| items.iter().all(|item| inner.accepts(item))),
            ValueKind::Map => value.is_object(),
        }
    }

    /// Element kind for array fields.
    ///
    /// Returns `None` when the field cannot hold an array.
    pub fn element(&self) -> Option<&ValueKind> {
        match self {
            ValueKind::Array(inner) => Some(inner),
            ValueKind::Nullable(inner) => inner.element(),
            ValueKind::Any => Some(&ANY),
            _ => None,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Any => f.write_str("any"),
            ValueKind::Bool => f.write_str("boolean"),
            ValueKind::Integer => f.write_str("integer"),
            ValueKind::Float => f.write_str("float"),
            ValueKind::String => f.write_str("string"),
            ValueKind::Timestamp => f.write_str("timestamp"),
            ValueKind::Id => f.write_str("id"),
            ValueKind::Array(inner) => write!(f, "array<{}>", inner),
            ValueKind::Map => f.write_str("map"),
            ValueKind::Nullable(inner) => write!(f, "nullable<{}>", inner),
        }
    }
}

/// Untyped description of one field: wire name and declared kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldInfo {
    name: Cow<'static, str>,
    kind: ValueKind,
}

impl FieldInfo {
    /// Describe a field.
    pub fn new(name: impl Into<Cow<'static, str>>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Wire name of the field.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared kind of the field.
    pub fn kind(&self) -> &ValueKind {
        &self.kind
    }
}

impl fmt::Display for FieldInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A handle to one field of a model, typed by the field's Rust type.
///
/// Field paths are generated by `#[derive(Model)]` and reached through
/// [`Model::fields`](crate::Model::fields) or
/// [`Repository::fields`](crate::Repository::fields). The typed helpers
/// (`eq`, `gte`, `contains`, ...) only accept values of the field's type.
///
/// ```
/// use docrepo_core::{FieldPath, Operator, ValueKind};
///
/// let age: FieldPath<u32> = FieldPath::new("age", ValueKind::Integer);
/// let cond = age.gte(18);
/// assert_eq!(cond.op(), Operator::Gte);
/// assert_eq!(age.to_string(), "age");
/// ```
pub struct FieldPath<T> {
    info: FieldInfo,
    _marker: PhantomData<fn() -> T>,
}

impl<T> FieldPath<T> {
    /// Create a field path.
    pub fn new(name: impl Into<Cow<'static, str>>, kind: ValueKind) -> Self {
        Self {
            info: FieldInfo::new(name, kind),
            _marker: PhantomData,
        }
    }

    /// Wire name of the field.
    pub fn name(&self) -> &str {
        self.info.name()
    }

    /// Declared kind of the field.
    pub fn kind(&self) -> &ValueKind {
        self.info.kind()
    }

    /// The untyped description of this field.
    pub fn info(&self) -> &FieldInfo {
        &self.info
    }

    fn condition<V>(&self, op: Operator, value: V) -> Condition<V> {
        Condition {
            field: self.info.clone(),
            op,
            value,
        }
    }

    pub fn eq(&self, value: T) -> Condition<T> {
        self.condition(Operator::Eq, value)
    }

    pub fn ne(&self, value: T) -> Condition<T> {
        self.condition(Operator::Ne, value)
    }

    pub fn lt(&self, value: T) -> Condition<T> {
        self.condition(Operator::Lt, value)
    }

    pub fn lte(&self, value: T) -> Condition<T> {
        self.condition(Operator::Lte, value)
    }

    pub fn gt(&self, value: T) -> Condition<T> {
        self.condition(Operator::Gt, value)
    }

    pub fn gte(&self, value: T) -> Condition<T> {
        self.condition(Operator::Gte, value)
    }

    /// Field value is one of `values`.
    pub fn is_in(&self, values: Vec<T>) -> Condition<Vec<T>> {
        self.condition(Operator::In, values)
    }

    /// Field value is none of `values`.
    pub fn not_in(&self, values: Vec<T>) -> Condition<Vec<T>> {
        self.condition(Operator::NotIn, values)
    }
}

impl<E> FieldPath<Vec<E>> {
    /// Array field contains `element`.
    pub fn contains(&self, element: E) -> Condition<E> {
        self.condition(Operator::ArrayContains, element)
    }

    /// Array field contains at least one of `elements`.
    pub fn contains_any(&self, elements: Vec<E>) -> Condition<Vec<E>> {
        self.condition(Operator::ArrayContainsAny, elements)
    }
}

impl<T> Clone for FieldPath<T> {
    fn clone(&self) -> Self {
        Self {
            info: self.info.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for FieldPath<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldPath")
            .field("name", &self.info.name())
            .field("kind", &self.info.kind())
            .finish()
    }
}

impl<T> fmt::Display for FieldPath<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single typed predicate, ready to be added with
/// [`QueryBuilder::and`](super::QueryBuilder::and).
#[derive(Debug, Clone)]
pub struct Condition<V> {
    field: FieldInfo,
    op: Operator,
    value: V,
}

impl<V> Condition<V> {
    /// Create a condition on an untyped field.
    pub fn new(field: FieldInfo, op: Operator, value: V) -> Self {
        Self { field, op, value }
    }

    pub fn field(&self) -> &FieldInfo {
        &self.field
    }

    pub fn op(&self) -> Operator {
        self.op
    }

    pub fn value(&self) -> &V {
        &self.value
    }
}
