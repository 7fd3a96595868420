//! Fluent query chain
//!
//! A [`QueryRef`] pairs an immutable [`Query`] with the store it runs
//! against. Every builder consumes nothing and returns a new handle, so a
//! partial chain can be reused:
//!
//! ```ignore
//! let mine = store.collection("diary").filter("userId", Operator::Eq, user);
//! let latest = mine.order_by_desc("createdAt").limit(5).get()?;
//! let total = mine.count()?;
//! ```

use std::sync::Arc;

use fieldbook_core::{Document, Result, Value};
use fieldbook_engine::{Direction, DocumentStore, Operator, Query};

/// Query over one collection, bound to a store
#[derive(Clone)]
pub struct QueryRef {
    documents: Arc<DocumentStore>,
    query: Query,
}

impl QueryRef {
    pub(crate) fn new(documents: Arc<DocumentStore>, query: Query) -> Self {
        QueryRef { documents, query }
    }

    fn with(&self, query: Query) -> QueryRef {
        QueryRef {
            documents: Arc::clone(&self.documents),
            query,
        }
    }

    /// The query description
    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Add a filter (logical AND with earlier filters)
    pub fn filter(&self, field: impl Into<String>, op: Operator, value: impl Into<Value>) -> QueryRef {
        self.with(self.query.filter(field, op, value))
    }

    /// Add a filter with the operator in its string form
    ///
    /// # Errors
    ///
    /// `Error::Validation` for an unsupported operator.
    pub fn filter_op(&self, field: impl Into<String>, op: &str, value: impl Into<Value>) -> Result<QueryRef> {
        Ok(self.with(self.query.filter_op(field, op, value)?))
    }

    /// Sort ascending by `field`
    pub fn order_by(&self, field: impl Into<String>) -> QueryRef {
        self.order_by_direction(field, Direction::Asc)
    }

    /// Sort descending by `field`
    pub fn order_by_desc(&self, field: impl Into<String>) -> QueryRef {
        self.order_by_direction(field, Direction::Desc)
    }

    // later keys break ties
    fn order_by_direction(&self, field: impl Into<String>, direction: Direction) -> QueryRef {
        self.with(self.query.order_by(field, direction))
    }

    /// Keep at most `n` results
    pub fn limit(&self, n: usize) -> QueryRef {
        self.with(self.query.limit(n))
    }

    /// Run the query
    pub fn get(&self) -> Result<Vec<Document>> {
        self.documents.query(&self.query)
    }

    /// Run the query and return only the number of results
    pub fn count(&self) -> Result<usize> {
        self.documents.count(&self.query)
    }
}

impl std::fmt::Debug for QueryRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryRef").field("query", &self.query).finish()
    }
}
