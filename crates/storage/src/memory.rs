//! InMemory persistence backend
//!
//! Emulates a browser-style key/value area: each collection is kept as its
//! serialized JSON string under `"<prefix>-<collection>"`. Keeping the
//! serialized form (rather than live documents) means the in-memory mode
//! exercises the same wire format as durable backends, and a decode failure
//! looks the same everywhere.
//!
//! Several backends may share one [`MemoryArea`] under different prefixes,
//! the way several apps share one origin's local storage.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use fieldbook_core::{Document, Result};

use crate::backend::{decode_collection, encode_collection, Namespace, PersistenceBackend};

/// Shared key/value area
#[derive(Debug, Clone, Default)]
pub struct MemoryArea {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryArea {
    /// Create an empty area
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw value stored under a key
    pub fn get_raw(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    /// Overwrite a raw value (used to simulate foreign or corrupted data)
    pub fn set_raw(&self, key: impl Into<String>, raw: impl Into<String>) {
        self.entries.write().insert(key.into(), raw.into());
    }
}

/// Process-memory backend
///
/// # Example
///
/// ```ignore
/// use fieldbook_storage::{InMemoryBackend, PersistenceBackend};
///
/// let backend = InMemoryBackend::new("journal")?;
/// assert!(!backend.is_persistent());
/// assert!(backend.load("diary")?.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryBackend {
    area: MemoryArea,
    namespace: Namespace,
}

impl InMemoryBackend {
    /// Create a backend over a private area
    pub fn new(prefix: impl Into<String>) -> Result<Self> {
        Self::with_area(MemoryArea::new(), prefix)
    }

    /// Create a backend over a shared area
    pub fn with_area(area: MemoryArea, prefix: impl Into<String>) -> Result<Self> {
        Ok(Self {
            area,
            namespace: Namespace::new(prefix)?,
        })
    }

    /// The backing area
    pub fn area(&self) -> &MemoryArea {
        &self.area
    }

    /// The key namespace
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }
}

impl PersistenceBackend for InMemoryBackend {
    fn load(&self, collection: &str) -> Result<Vec<Document>> {
        match self.area.get_raw(&self.namespace.key_for(collection)) {
            Some(raw) => decode_collection(collection, &raw),
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, collection: &str, documents: &[Document]) -> Result<()> {
        // Encode before touching the area so a failure leaves it untouched
        let raw = encode_collection(collection, documents)?;
        self.area.set_raw(self.namespace.key_for(collection), raw);
        debug!(
            target: "fieldbook::backend",
            collection,
            documents = documents.len(),
            "collection saved in memory"
        );
        Ok(())
    }

    fn collections(&self) -> Result<Vec<String>> {
        let entries = self.area.entries.read();
        let mut names: Vec<String> = entries
            .keys()
            .filter_map(|key| self.namespace.collection_of(key))
            .map(str::to_string)
            .collect();
        names.sort();
        Ok(names)
    }

    #[inline]
    fn is_persistent(&self) -> bool {
        false
    }

    #[inline]
    fn mode_name(&self) -> &'static str {
        "InMemory"
    }
}
