//! Typed field paths, the query builder and backend query objects.
//!
//! A [`QueryBuilder`] accumulates type-checked filters, one ordering and a
//! limit against the [`FieldPath`]s generated for a model, and materializes
//! them as a [`Query`] that a [`DocumentStore`](crate::DocumentStore) can run.

mod builder;
mod eval;
mod field;
mod operator;
#[allow(clippy::module_inception)]
mod query;

pub use builder::QueryBuilder;
pub use field::{Condition, FieldInfo, FieldPath, ValueKind};
pub use operator::{Direction, Operator};
pub use query::{Filter, OrderBy, Query};
