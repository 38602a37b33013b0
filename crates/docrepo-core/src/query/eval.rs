//! Reference evaluation of filters against documents.
//!
//! Missing fields never match. Numbers compare numerically, strings that
//! both parse as RFC 3339 compare as instants, other strings compare
//! lexicographically. Values of different types are never equal and never
//! ordered relative to each other in a filter.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde_json::{Number, Value};

use super::{Filter, Operator};
use crate::document::StoredDocument;

pub(crate) fn filter_matches(filter: &Filter, doc: &StoredDocument) -> bool {
    let Some(actual) = doc.field(filter.field()) else {
        return false;
    };
    let actual = actual.as_ref();
    let operand = filter.value();

    match filter.op() {
        Operator::Eq => equal(actual, operand),
        Operator::Ne => !actual.is_null() && !equal(actual, operand),
        Operator::Lt => compare(actual, operand) == Some(Ordering::Less),
        Operator::Lte => matches!(
            compare(actual, operand),
            Some(Ordering::Less | Ordering::Equal)
        ),
        Operator::Gt => compare(actual, operand) == Some(Ordering::Greater),
        Operator::Gte => matches!(
            compare(actual, operand),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        Operator::In => operand
            .as_array()
            .is_some_and(|items| items.iter().any(|item| equal(actual, item))),
        Operator::NotIn => {
            !actual.is_null()
                && operand
                    .as_array()
                    .is_some_and(|items| !items.iter().any(|item| equal(actual, item)))
        }
        Operator::ArrayContains => actual
            .as_array()
            .is_some_and(|items| items.iter().any(|item| equal(item, operand))),
        Operator::ArrayContainsAny => match (actual.as_array(), operand.as_array()) {
            (Some(items), Some(wanted)) => items
                .iter()
                .any(|item| wanted.iter().any(|w| equal(item, w))),
            _ => false,
        },
    }
}

pub(crate) fn equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Object(_), Value::Object(_)) => a == b,
        _ => compare(a, b) == Some(Ordering::Equal),
    }
}

/// Compare two values of the same type.
pub(crate) fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y),
        (Value::String(x), Value::String(y)) => Some(compare_strings(x, y)),
        (Value::Array(xs), Value::Array(ys)) => {
            for (x, y) in xs.iter().zip(ys) {
                match compare(x, y)? {
                    Ordering::Equal => continue,
                    other => return Some(other),
                }
            }
            Some(xs.len().cmp(&ys.len()))
        }
        _ => None,
    }
}

/// Total order across types, used for sorting.
pub(crate) fn total_order(a: &Value, b: &Value) -> Ordering {
    type_rank(a).cmp(&type_rank(b)).then_with(|| {
        compare(a, b).unwrap_or_else(|| a.to_string().cmp(&b.to_string()))
    })
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

fn compare_numbers(x: &Number, y: &Number) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (x.as_i64(), y.as_i64()) {
        return Some(a.cmp(&b));
    }
    if let (Some(a), Some(b)) = (x.as_u64(), y.as_u64()) {
        return Some(a.cmp(&b));
    }
    x.as_f64()?.partial_cmp(&y.as_f64()?)
}

fn compare_strings(x: &str, y: &str) -> Ordering {
    match (parse_timestamp(x), parse_timestamp(y)) {
        (Some(a), Some(b)) => a.cmp(&b),
        _ => x.cmp(y),
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
