//! Backend query objects.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::eval;
use super::{Direction, Operator};
use crate::document::StoredDocument;
use crate::types::CollectionName;

/// One materialized filter: field, operator and operand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    field: String,
    op: Operator,
    value: Value,
}

impl Filter {
    /// Create a filter.
    ///
    /// No type checking happens here; typed filters come from
    /// [`QueryBuilder`](super::QueryBuilder).
    pub fn new(field: impl Into<String>, op: Operator, value: Value) -> Self {
        Self {
            field: field.into(),
            op,
            value,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn op(&self) -> Operator {
        self.op
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Returns true if the document satisfies this filter.
    pub fn matches(&self, doc: &StoredDocument) -> bool {
        eval::filter_matches(self, doc)
    }
}

/// The ordering clause of a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    field: String,
    direction: Direction,
}

impl OrderBy {
    pub fn new(field: impl Into<String>, direction: Direction) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }
}

/// A query as understood by a [`DocumentStore`](crate::DocumentStore).
///
/// Filters are conjunctive. Backends apply filters first, then the
/// ordering, then the limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    collection: CollectionName,
    filters: Vec<Filter>,
    order: Option<OrderBy>,
    limit: Option<usize>,
}

impl Query {
    /// A query selecting every document of a collection.
    pub fn new(collection: CollectionName) -> Self {
        Self {
            collection,
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    /// Add a filter.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Set the ordering, replacing any previous one.
    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order = Some(order);
        self
    }

    /// Set the maximum number of results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn collection(&self) -> &CollectionName {
        &self.collection
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn ordering(&self) -> Option<&OrderBy> {
        self.order.as_ref()
    }

    pub fn max_results(&self) -> Option<usize> {
        self.limit
    }

    /// Returns true if the document satisfies every filter.
    pub fn matches(&self, doc: &StoredDocument) -> bool {
        self.filters.iter().all(|f| f.matches(doc))
    }

    /// Evaluate this query over a set of documents.
    ///
    /// This is the reference evaluation used by local stores: filter,
    /// then sort (documents lacking the order field are dropped; without
    /// an ordering results are sorted by id), then truncate to the limit.
    pub fn apply<I>(&self, docs: I) -> Vec<StoredDocument>
    where
        I: IntoIterator<Item = StoredDocument>,
    {
        let mut results: Vec<StoredDocument> =
            docs.into_iter().filter(|d| self.matches(d)).collect();

        match &self.order {
            Some(order) => {
                results.retain(|d| d.field(order.field()).is_some());
                results.sort_by(|a, b| {
                    let ord = match (a.field(order.field()), b.field(order.field())) {
                        (Some(x), Some(y)) => eval::total_order(&x, &y),
                        _ => std::cmp::Ordering::Equal,
                    };
                    let ord = match order.direction() {
                        Direction::Ascending => ord,
                        Direction::Descending => ord.reverse(),
                    };
                    ord.then_with(|| a.id.cmp(&b.id))
                });
            }
            None => results.sort_by(|a, b| a.id.cmp(&b.id)),
        }

        if let Some(limit) = self.limit {
            results.truncate(limit);
        }

        results
    }
}
