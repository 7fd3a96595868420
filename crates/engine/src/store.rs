//! DocumentStore: collection-oriented CRUD over a persistence backend
//!
//! ## Design: WHOLE-COLLECTION READ-MODIFY-WRITE
//!
//! Every mutation loads the entire collection from the backend, edits the
//! loaded copy, and saves the entire collection back. A failed save
//! therefore never leaves a half-applied edit anywhere: the backend keeps
//! its previous contents and the edited copy is dropped.
//!
//! Consistency is "last writer for a collection wins". Within one process
//! the store serializes writers with a mutex per collection, held across
//! load → modify → save, so operations on one collection complete in issue
//! order. Operations on different collections proceed independently.
//!
//! Write cost grows with collection size.
//!
//! ## Ownership
//!
//! The store never hands out references into stored state. Reads return
//! freshly decoded documents and callers may mutate them freely.
//!
//! ## Policies
//!
//! - `read` of a missing id returns `Ok(None)`
//! - `update` of a missing id is `Error::NotFound`
//! - `delete` of a missing id is a no-op (no write happens)

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::debug;

use fieldbook_core::{
    system_clock, validate_fields, Document, Error, Fields, IdGenerator, Result, SharedClock,
    Timestamp,
};
use fieldbook_storage::{validate_collection_name, PersistenceBackend};

use crate::change::{ChangeKind, ChangeListener, DocumentChange};
use crate::query::{self, Query};

/// Behaviour of [`DocumentStore::set`] for an existing document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Merge into existing fields instead of replacing them
    pub merge: bool,
}

impl SetOptions {
    /// Replace existing fields (default)
    pub fn replace() -> Self {
        SetOptions { merge: false }
    }

    /// Merge into existing fields
    pub fn merge() -> Self {
        SetOptions { merge: true }
    }
}

/// Result of one read-modify-write pass
struct Outcome<T> {
    value: T,
    changes: Vec<(ChangeKind, Document)>,
}

impl<T> Outcome<T> {
    fn unchanged(value: T) -> Self {
        Outcome {
            value,
            changes: Vec::new(),
        }
    }

    fn changed(value: T, kind: ChangeKind, document: Document) -> Self {
        Outcome {
            value,
            changes: vec![(kind, document)],
        }
    }
}

/// Collection-oriented document store
///
/// # Thread Safety
///
/// `DocumentStore` is `Send + Sync`; share it behind an `Arc`.
///
/// # Example
///
/// ```ignore
/// use fieldbook_engine::DocumentStore;
/// use fieldbook_storage::InMemoryBackend;
///
/// let store = DocumentStore::new(Arc::new(InMemoryBackend::new("journal")?));
/// let id = store.create("diary", fields_from_json(json!({"title": "Day 1"}))?)?;
/// let doc = store.read("diary", &id)?.expect("just created");
/// ```
pub struct DocumentStore {
    backend: Arc<dyn PersistenceBackend>,
    clock: SharedClock,
    ids: IdGenerator,
    locks: DashMap<String, Arc<Mutex<()>>>,
    listener: RwLock<Option<Arc<dyn ChangeListener>>>,
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore")
            .field("backend", &self.backend.mode_name())
            .field("collections_locked", &self.locks.len())
            .finish()
    }
}

impl DocumentStore {
    /// Create a store over `backend` using the system clock
    pub fn new(backend: Arc<dyn PersistenceBackend>) -> Self {
        Self::with_clock(backend, system_clock())
    }

    /// Create a store with an explicit clock
    pub fn with_clock(backend: Arc<dyn PersistenceBackend>, clock: SharedClock) -> Self {
        Self {
            backend,
            clock,
            ids: IdGenerator::new(),
            locks: DashMap::new(),
            listener: RwLock::new(None),
        }
    }

    /// The persistence backend
    pub fn backend(&self) -> &Arc<dyn PersistenceBackend> {
        &self.backend
    }

    /// The store's clock
    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    /// Current time according to the store's clock
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Mint an id the same way `create` does
    pub fn new_id(&self) -> String {
        self.ids.next_id(self.clock.now())
    }

    /// Install the change listener, replacing any previous one
    pub fn set_listener(&self, listener: Arc<dyn ChangeListener>) {
        *self.listener.write() = Some(listener);
    }

    /// Remove the change listener
    pub fn clear_listener(&self) {
        *self.listener.write() = None;
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Insert a new document with a generated id
    ///
    /// Stamps `created_at` and `updated_at` and returns the id.
    ///
    /// # Errors
    ///
    /// - `Error::Validation` for reserved or malformed field names
    /// - `Error::Storage` if the collection cannot be loaded or saved
    pub fn create(&self, collection: &str, fields: Fields) -> Result<String> {
        validate_fields(&fields)?;
        self.mutate(collection, |docs, now| {
            let mut id = self.ids.next_id(now);
            while docs.iter().any(|d| d.id == id) {
                id = self.ids.next_id(now);
            }
            let doc = Document::new(id.clone(), fields, now);
            docs.push(doc.clone());
            Ok(Outcome::changed(id, ChangeKind::Created, doc))
        })
    }

    /// Insert a new document under a caller-chosen id
    ///
    /// # Errors
    ///
    /// `Error::Validation` if the id is empty or already taken.
    pub fn create_with_id(&self, collection: &str, id: &str, fields: Fields) -> Result<()> {
        validate_id(id)?;
        validate_fields(&fields)?;
        self.mutate(collection, |docs, now| {
            if docs.iter().any(|d| d.id == id) {
                return Err(Error::validation(format!(
                    "document {}/{} already exists",
                    collection, id
                )));
            }
            let doc = Document::new(id, fields, now);
            docs.push(doc.clone());
            Ok(Outcome::changed((), ChangeKind::Created, doc))
        })
    }

    /// Shallow-merge `partial` into an existing document
    ///
    /// Fields not named in `partial` keep their stored values.
    ///
    /// # Errors
    ///
    /// `Error::NotFound` if the document does not exist.
    pub fn update(&self, collection: &str, id: &str, partial: Fields) -> Result<()> {
        validate_id(id)?;
        validate_fields(&partial)?;
        self.mutate(collection, |docs, now| {
            let doc = docs
                .iter_mut()
                .find(|d| d.id == id)
                .ok_or_else(|| Error::not_found(collection, id))?;
            doc.merge(partial, now);
            Ok(Outcome::changed((), ChangeKind::Updated, doc.clone()))
        })
    }

    /// Create or overwrite a document under a known id
    ///
    /// An existing document keeps its position and `created_at`; its fields
    /// are replaced, or merged when `options.merge` is set.
    pub fn set(&self, collection: &str, id: &str, fields: Fields, options: SetOptions) -> Result<()> {
        validate_id(id)?;
        validate_fields(&fields)?;
        self.mutate(collection, |docs, now| {
            match docs.iter_mut().find(|d| d.id == id) {
                Some(doc) => {
                    if options.merge {
                        doc.merge(fields, now);
                    } else {
                        doc.replace(fields, now);
                    }
                    Ok(Outcome::changed((), ChangeKind::Updated, doc.clone()))
                }
                None => {
                    let doc = Document::new(id, fields, now);
                    docs.push(doc.clone());
                    Ok(Outcome::changed((), ChangeKind::Created, doc))
                }
            }
        })
    }

    /// Remove a document
    ///
    /// Idempotent: returns `false` (and writes nothing) if it was absent.
    pub fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        self.mutate(collection, |docs, _| {
            match docs.iter().position(|d| d.id == id) {
                Some(pos) => {
                    let removed = docs.remove(pos);
                    Ok(Outcome::changed(true, ChangeKind::Deleted, removed))
                }
                None => Ok(Outcome::unchanged(false)),
            }
        })
    }

    /// Remove several documents in one write
    ///
    /// Missing ids are ignored. Returns how many documents were removed.
    pub fn delete_many<S: AsRef<str>>(&self, collection: &str, ids: &[S]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        self.mutate(collection, |docs, _| {
            let mut removed = Vec::new();
            let mut kept = Vec::with_capacity(docs.len());
            for doc in docs.drain(..) {
                if ids.iter().any(|id| id.as_ref() == doc.id) {
                    removed.push((ChangeKind::Deleted, doc));
                } else {
                    kept.push(doc);
                }
            }
            *docs = kept;
            Ok(Outcome {
                value: removed.len(),
                changes: removed,
            })
        })
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Fetch one document; `Ok(None)` if absent
    pub fn read(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        Ok(self
            .read_all(collection)?
            .into_iter()
            .find(|d| d.id == id))
    }

    /// Snapshot of the whole collection in stored order
    pub fn read_all(&self, collection: &str) -> Result<Vec<Document>> {
        validate_collection_name(collection)?;
        let lock = self.collection_lock(collection);
        let _guard = lock.lock();
        self.backend.load(collection)
    }

    /// Evaluate a query against a fresh snapshot of its collection
    pub fn query(&self, query: &Query) -> Result<Vec<Document>> {
        let snapshot = self.read_all(query.collection())?;
        query::evaluate(query, snapshot)
    }

    /// Number of documents a query returns
    pub fn count(&self, query: &Query) -> Result<usize> {
        let snapshot = self.read_all(query.collection())?;
        query::count(query, snapshot)
    }

    /// Collections persisted by the backend
    pub fn collections(&self) -> Result<Vec<String>> {
        self.backend.collections()
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn collection_lock(&self, collection: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(collection.to_string())
            .or_default()
            .value()
            .clone()
    }

    /// Load → apply → save under the collection lock, then notify
    fn mutate<T, F>(&self, collection: &str, apply: F) -> Result<T>
    where
        F: FnOnce(&mut Vec<Document>, Timestamp) -> Result<Outcome<T>>,
    {
        validate_collection_name(collection)?;
        let lock = self.collection_lock(collection);
        let outcome = {
            let _guard = lock.lock();
            let mut documents = self.backend.load(collection)?;
            let outcome = apply(&mut documents, self.clock.now())?;
            if !outcome.changes.is_empty() {
                self.backend.save(collection, &documents)?;
                for (kind, doc) in &outcome.changes {
                    debug!(
                        target: "fieldbook::store",
                        collection,
                        id = %doc.id,
                        change = ?kind,
                        size = documents.len(),
                        "collection written"
                    );
                }
            }
            outcome
        };
        self.notify(collection, outcome.changes);
        Ok(outcome.value)
    }

    fn notify(&self, collection: &str, changes: Vec<(ChangeKind, Document)>) {
        if changes.is_empty() {
            return;
        }
        let listener = self.listener.read().clone();
        let Some(listener) = listener else {
            return;
        };
        for (kind, document) in changes {
            listener.on_change(&DocumentChange {
                collection: collection.to_string(),
                kind,
                document,
            });
        }
    }
}

fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(Error::validation("document id must not be empty"));
    }
    Ok(())
}
