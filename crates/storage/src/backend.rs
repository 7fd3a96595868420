//! Persistence backend abstraction
//!
//! A backend stores whole collections. Every implementation satisfies the
//! same two-operation contract, which is what makes the document store
//! independent of where bytes end up:
//!
//! - **InMemory**: process-local key/value area, lost on exit
//! - **File**: one JSON file per collection, atomic replace on save
//!
//! # Contract
//!
//! ```text
//! load(collection) -> Vec<Document>     missing collection = empty
//! save(collection, &[Document])         all-or-nothing
//! ```
//!
//! A failed `save` must leave the previously persisted collection intact.
//! Backends do not serialize writers themselves; the document store holds a
//! per-collection lock across load → modify → save.
//!
//! # Keys
//!
//! Collections are stored under `"<prefix>-<collection>"`, where the prefix
//! is injected at construction so independent stores never collide.

use fieldbook_core::{Document, Error, Result};

/// Storage of whole collections
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` for use in multi-threaded contexts.
pub trait PersistenceBackend: Send + Sync {
    /// Load every document of a collection, in stored order
    ///
    /// A collection that was never saved loads as empty.
    ///
    /// # Errors
    ///
    /// `Error::Storage` if the stored bytes cannot be read or decoded.
    fn load(&self, collection: &str) -> Result<Vec<Document>>;

    /// Replace the stored collection with `documents`
    ///
    /// # Errors
    ///
    /// `Error::Storage` on encode or write failure; prior state is unchanged.
    fn save(&self, collection: &str, documents: &[Document]) -> Result<()>;

    /// Names of collections persisted under this backend's namespace, sorted
    fn collections(&self) -> Result<Vec<String>>;

    /// Check if data survives process exit
    fn is_persistent(&self) -> bool;

    /// Get human-readable mode name for logging/debugging
    fn mode_name(&self) -> &'static str;
}

/// Key namespace shared by all backends
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    prefix: String,
}

impl Namespace {
    /// Create a namespace
    ///
    /// # Errors
    ///
    /// `Error::Validation` if the prefix is empty or contains a path separator.
    pub fn new(prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        validate_name("store prefix", &prefix)?;
        Ok(Self { prefix })
    }

    /// The injected prefix
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Storage key for a collection: `"<prefix>-<collection>"`
    pub fn key_for(&self, collection: &str) -> String {
        format!("{}-{}", self.prefix, collection)
    }

    /// Inverse of [`Namespace::key_for`]; `None` for foreign keys
    pub fn collection_of<'k>(&self, key: &'k str) -> Option<&'k str> {
        key.strip_prefix(self.prefix.as_str())?
            .strip_prefix('-')
            .filter(|rest| !rest.is_empty())
    }
}

/// Reject collection names that cannot be stored safely under every backend
pub fn validate_collection_name(name: &str) -> Result<()> {
    validate_name("collection name", name)
}

fn validate_name(what: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::validation(format!("{} must not be empty", what)));
    }
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(Error::validation(format!(
            "{} '{}' must not contain path separators",
            what, name
        )));
    }
    Ok(())
}

/// Encode a collection as a JSON array of document records
pub fn encode_collection(collection: &str, documents: &[Document]) -> Result<String> {
    serde_json::to_string(documents).map_err(|e| {
        Error::storage(format!("failed to encode collection '{}': {}", collection, e))
    })
}

/// Decode a JSON array of document records
pub fn decode_collection(collection: &str, raw: &str) -> Result<Vec<Document>> {
    serde_json::from_str(raw).map_err(|e| {
        Error::storage(format!("failed to decode collection '{}': {}", collection, e))
    })
}
