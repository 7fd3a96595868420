//! Collection handle

use std::sync::Arc;

use fieldbook_core::{Document, Error, Fields, Result, Value};
use fieldbook_engine::{DocumentStore, Operator, Query};

use crate::facade::{DocumentRef, QueryRef};

/// Handle to one collection
///
/// Creating a handle does not touch storage; a collection comes into being
/// with its first write.
///
/// The event bus's collection is read-only through the facade: writes are
/// `Error::Validation`.
#[derive(Clone)]
pub struct CollectionRef {
    documents: Arc<DocumentStore>,
    name: String,
    read_only: bool,
}

impl CollectionRef {
    pub(crate) fn new(documents: Arc<DocumentStore>, name: String, read_only: bool) -> Self {
        CollectionRef {
            documents,
            name,
            read_only,
        }
    }

    /// Collection name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handle to a document by id
    pub fn doc(&self, id: impl Into<String>) -> DocumentRef {
        DocumentRef::new(
            Arc::clone(&self.documents),
            self.name.clone(),
            id.into(),
            self.read_only,
        )
    }

    /// True for the event bus's collection
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Insert a document with a generated id
    pub fn add(&self, fields: Fields) -> Result<DocumentRef> {
        ensure_writable(&self.name, self.read_only)?;
        let id = self.documents.create(&self.name, fields)?;
        Ok(self.doc(id))
    }

    /// Every document, in stored order
    pub fn get(&self) -> Result<Vec<Document>> {
        self.documents.read_all(&self.name)
    }

    /// Number of documents
    pub fn count(&self) -> Result<usize> {
        self.query().count()
    }

    /// Start a query with one filter
    pub fn filter(&self, field: impl Into<String>, op: Operator, value: impl Into<Value>) -> QueryRef {
        self.query().filter(field, op, value)
    }

    /// Start a query with one filter, operator given as `"=="`, `"array-contains"`, ...
    pub fn filter_op(&self, field: impl Into<String>, op: &str, value: impl Into<Value>) -> Result<QueryRef> {
        self.query().filter_op(field, op, value)
    }

    /// Start a query sorted ascending by `field`
    pub fn order_by(&self, field: impl Into<String>) -> QueryRef {
        self.query().order_by(field)
    }

    /// Start a query sorted descending by `field`
    pub fn order_by_desc(&self, field: impl Into<String>) -> QueryRef {
        self.query().order_by_desc(field)
    }

    /// Start a query returning the first `n` documents in stored order
    pub fn limit(&self, n: usize) -> QueryRef {
        self.query().limit(n)
    }

    /// Unfiltered query over this collection
    pub fn query(&self) -> QueryRef {
        QueryRef::new(Arc::clone(&self.documents), Query::new(self.name.as_str()))
    }
}

pub(crate) fn ensure_writable(collection: &str, read_only: bool) -> Result<()> {
    if read_only {
        return Err(Error::validation(format!(
            "collection '{}' holds the event log; publish through the event bus",
            collection
        )));
    }
    Ok(())
}

impl std::fmt::Debug for CollectionRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionRef").field("name", &self.name).finish()
    }
}
