//! Document handle

use std::sync::Arc;

use fieldbook_core::{Document, Fields, Result};
use fieldbook_engine::{DocumentStore, SetOptions};

use crate::facade::collection::ensure_writable;

/// Handle to one document of a collection
///
/// The document need not exist; `get` returns `None` and `set` creates it.
#[derive(Clone)]
pub struct DocumentRef {
    documents: Arc<DocumentStore>,
    collection: String,
    id: String,
    read_only: bool,
}

impl DocumentRef {
    pub(crate) fn new(
        documents: Arc<DocumentStore>,
        collection: String,
        id: String,
        read_only: bool,
    ) -> Self {
        DocumentRef {
            documents,
            collection,
            id,
            read_only,
        }
    }

    /// Document id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Owning collection
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Fetch the document; `None` if absent
    pub fn get(&self) -> Result<Option<Document>> {
        self.documents.read(&self.collection, &self.id)
    }

    /// True if the document exists
    pub fn exists(&self) -> Result<bool> {
        Ok(self.get()?.is_some())
    }

    /// Create or replace the document's fields
    pub fn set(&self, fields: Fields) -> Result<()> {
        ensure_writable(&self.collection, self.read_only)?;
        self.documents
            .set(&self.collection, &self.id, fields, SetOptions::replace())
    }

    /// Create the document or merge into its fields
    pub fn set_merge(&self, fields: Fields) -> Result<()> {
        ensure_writable(&self.collection, self.read_only)?;
        self.documents
            .set(&self.collection, &self.id, fields, SetOptions::merge())
    }

    /// Merge into an existing document
    ///
    /// # Errors
    ///
    /// `Error::NotFound` if the document does not exist.
    pub fn update(&self, partial: Fields) -> Result<()> {
        ensure_writable(&self.collection, self.read_only)?;
        self.documents.update(&self.collection, &self.id, partial)
    }

    /// Delete the document; `false` if it was already absent
    pub fn delete(&self) -> Result<bool> {
        ensure_writable(&self.collection, self.read_only)?;
        self.documents.delete(&self.collection, &self.id)
    }
}

impl std::fmt::Debug for DocumentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentRef")
            .field("collection", &self.collection)
            .field("id", &self.id)
            .finish()
    }
}
