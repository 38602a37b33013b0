//! Fluent, type-checked query builder.

use std::fmt;
use std::marker::PhantomData;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::{Condition, Direction, FieldInfo, FieldPath, Filter, Operator, OrderBy, Query, ValueKind};
use crate::document::{StoredDocument, json_type};
use crate::error::{Error, InvalidInputError, QueryError};
use crate::model::{FieldSet, Model};
use crate::traits::DocumentStore;
use crate::types::CollectionName;
use crate::Result;

/// Builds a [`Query`] over the collection of model `M`.
///
/// Every step takes `&self` and returns a new builder, so a partially
/// built query can be reused as the base of several independent queries.
/// Operands are checked against the field's declared kind as soon as they
/// are added.
///
/// ```
/// use docrepo_core::{Direction, Metadata, Model, Operator, QueryBuilder, CollectionName};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize, Model)]
/// struct User {
///     #[serde(flatten)]
///     meta: Metadata,
///     name: String,
///     age: u32,
///     active: bool,
/// }
///
/// # fn main() -> docrepo_core::Result<()> {
/// let f = User::fields();
/// let adults = QueryBuilder::<User>::new(CollectionName::new("users")?)
///     .filter(&f.age, Operator::Gte, 18)?
///     .and(f.active.eq(true))?;
///
/// let oldest = adults.order_by(&f.age, Direction::Descending).limit(10)?;
/// assert_eq!(oldest.build().filters().len(), 2);
///
/// // Wrong operand type is rejected while building.
/// assert!(adults.filter(&f.age, Operator::Eq, "eighteen").is_err());
/// # Ok(())
/// # }
/// ```
pub struct QueryBuilder<M: Model> {
    collection: CollectionName,
    filters: Vec<Filter>,
    order: Option<OrderBy>,
    limit: Option<usize>,
    _marker: PhantomData<fn() -> M>,
}

impl<M: Model> QueryBuilder<M> {
    /// An empty query over `collection`.
    pub fn new(collection: CollectionName) -> Self {
        Self {
            collection,
            filters: Vec::new(),
            order: None,
            limit: None,
            _marker: PhantomData,
        }
    }

    /// The collection this builder queries.
    pub fn collection(&self) -> &CollectionName {
        &self.collection
    }

    /// Field paths of the model.
    pub fn fields(&self) -> &'static M::Fields {
        M::fields()
    }

    /// Filters accumulated so far.
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Add a filter on a field path.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::TypeMismatch`] or [`QueryError::InvalidOperand`]
    /// if `value` does not fit the field and operator.
    pub fn filter<T, V>(&self, field: &FieldPath<T>, op: Operator, value: V) -> Result<Self>
    where
        V: Serialize,
    {
        self.push(field.info(), op, &value)
    }

    /// Add a filter on a field looked up by name.
    ///
    /// # Errors
    ///
    /// Returns a lookup error for names the model does not declare, and
    /// the same errors as [`filter`](Self::filter) otherwise.
    pub fn filter_named<V>(&self, name: &str, op: Operator, value: V) -> Result<Self>
    where
        V: Serialize,
    {
        let field = M::fields().get(name)?;
        self.push(&field, op, &value)
    }

    /// Add a typed condition built from a [`FieldPath`].
    pub fn and<V>(&self, condition: Condition<V>) -> Result<Self>
    where
        V: Serialize,
    {
        self.push(condition.field(), condition.op(), condition.value())
    }

    /// Set the ordering, replacing any previous one.
    pub fn order_by<T>(&self, field: &FieldPath<T>, direction: Direction) -> Self {
        let mut next = self.clone();
        next.order = Some(OrderBy::new(field.name(), direction));
        next
    }

    /// Set the ordering on a field looked up by name.
    pub fn order_by_named(&self, name: &str, direction: Direction) -> Result<Self> {
        let field = M::fields().get(name)?;
        let mut next = self.clone();
        next.order = Some(OrderBy::new(field.name(), direction));
        Ok(next)
    }

    /// Cap the number of results. The last call wins.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidLimit`] for zero.
    pub fn limit(&self, count: usize) -> Result<Self> {
        if count == 0 {
            return Err(QueryError::InvalidLimit { value: count }.into());
        }
        let mut next = self.clone();
        next.limit = Some(count);
        Ok(next)
    }

    /// Materialize the backend query: filters, then ordering, then limit.
    pub fn build(&self) -> Query {
        let mut query = Query::new(self.collection.clone());
        for filter in &self.filters {
            query = query.filter(filter.clone());
        }
        if let Some(order) = &self.order {
            query = query.order_by(order.clone());
        }
        if let Some(limit) = self.limit {
            query = query.limit(limit);
        }
        query
    }

    /// Run the query against `store` and decode each result in backend order.
    pub async fn execute<S, T, F>(&self, store: &S, decode: F) -> Result<Vec<T>>
    where
        S: DocumentStore + ?Sized,
        F: FnMut(StoredDocument) -> Result<T>,
    {
        let query = self.build();
        let docs = store.run_query(&query).await?;
        debug!(collection = %self.collection, count = docs.len(), "Query returned documents");
        docs.into_iter().map(decode).collect()
    }

    fn push<V>(&self, field: &FieldInfo, op: Operator, value: &V) -> Result<Self>
    where
        V: Serialize + ?Sized,
    {
        let value = serde_json::to_value(value).map_err(|e| {
            Error::InvalidInput(InvalidInputError::Encode {
                schema: M::fields().schema().to_string(),
                message: format!("operand for '{}': {}", field.name(), e),
            })
        })?;

        typecheck(field, op, &value)?;

        let mut next = self.clone();
        next.filters.push(Filter::new(field.name(), op, value));
        Ok(next)
    }
}

fn typecheck(field: &FieldInfo, op: Operator, value: &Value) -> std::result::Result<(), QueryError> {
    let kind = field.kind();
    match op {
        Operator::Eq | Operator::Ne => expect(field, op, kind, value),
        Operator::Lt | Operator::Lte | Operator::Gt | Operator::Gte => {
            if value.is_null() {
                return Err(invalid(field, op, "cannot order against null"));
            }
            expect(field, op, kind, value)
        }
        Operator::In | Operator::NotIn => {
            for item in non_empty_array(field, op, value)? {
                expect(field, op, kind, item)?;
            }
            Ok(())
        }
        Operator::ArrayContains => expect(field, op, array_element(field, op)?, value),
        Operator::ArrayContainsAny => {
            let element = array_element(field, op)?;
            for item in non_empty_array(field, op, value)? {
                expect(field, op, element, item)?;
            }
            Ok(())
        }
    }
}

fn expect(
    field: &FieldInfo,
    op: Operator,
    expected: &ValueKind,
    value: &Value,
) -> std::result::Result<(), QueryError> {
    if expected.accepts(value) {
        Ok(())
    } else {
        Err(QueryError::TypeMismatch {
            field: field.name().to_string(),
            op,
            expected: expected.clone(),
            found: json_type(value).to_string(),
        })
    }
}

fn non_empty_array<'a>(
    field: &FieldInfo,
    op: Operator,
    value: &'a Value,
) -> std::result::Result<&'a Vec<Value>, QueryError> {
    match value.as_array() {
        Some(items) if !items.is_empty() => Ok(items),
        Some(_) => Err(invalid(field, op, "requires at least one value")),
        None => Err(QueryError::TypeMismatch {
            field: field.name().to_string(),
            op,
            expected: ValueKind::array(field.kind().clone()),
            found: json_type(value).to_string(),
        }),
    }
}

fn array_element<'a>(
    field: &'a FieldInfo,
    op: Operator,
) -> std::result::Result<&'a ValueKind, QueryError> {
    field.kind().element().ok_or_else(|| {
        invalid(
            field,
            op,
            &format!("requires an array field, field is {}", field.kind()),
        )
    })
}

fn invalid(field: &FieldInfo, op: Operator, reason: &str) -> QueryError {
    QueryError::InvalidOperand {
        field: field.name().to_string(),
        op,
        reason: reason.to_string(),
    }
}

impl<M: Model> Clone for QueryBuilder<M> {
    fn clone(&self) -> Self {
        Self {
            collection: self.collection.clone(),
            filters: self.filters.clone(),
            order: self.order.clone(),
            limit: self.limit,
            _marker: PhantomData,
        }
    }
}

impl<M: Model> fmt::Debug for QueryBuilder<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("schema", &M::fields().schema())
            .field("collection", &self.collection)
            .field("filters", &self.filters)
            .field("order", &self.order)
            .field("limit", &self.limit)
            .finish()
    }
}
