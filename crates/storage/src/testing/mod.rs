//! Testing utilities for storage
//!
//! - **FaultyBackend**: wraps any backend and fails loads or saves on demand,
//!   for exercising error propagation above the storage layer.
//!
//! # Example
//!
//! ```ignore
//! use fieldbook_storage::testing::FaultyBackend;
//!
//! let backend = FaultyBackend::wrap(InMemoryBackend::new("t")?);
//! backend.fail_saves(true);
//! assert!(backend.save("diary", &[]).is_err());
//! ```

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use fieldbook_core::{Document, Error, Result};

use crate::backend::PersistenceBackend;

/// Backend wrapper with switchable failures
#[derive(Debug)]
pub struct FaultyBackend<B> {
    inner: B,
    fail_loads: AtomicBool,
    fail_saves: AtomicBool,
    saves: AtomicUsize,
}

impl<B: PersistenceBackend> FaultyBackend<B> {
    /// Wrap a healthy backend
    pub fn wrap(inner: B) -> Self {
        Self {
            inner,
            fail_loads: AtomicBool::new(false),
            fail_saves: AtomicBool::new(false),
            saves: AtomicUsize::new(0),
        }
    }

    /// Make every subsequent load fail (or stop failing)
    pub fn fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent save fail (or stop failing)
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// The wrapped backend
    pub fn inner(&self) -> &B {
        &self.inner
    }
}

impl<B: PersistenceBackend> PersistenceBackend for FaultyBackend<B> {
    fn load(&self, collection: &str) -> Result<Vec<Document>> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(Error::storage(format!("injected load failure for '{}'", collection)));
        }
        self.inner.load(collection)
    }

    fn save(&self, collection: &str, documents: &[Document]) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(Error::storage(format!("injected save failure for '{}'", collection)));
        }
        self.inner.save(collection, documents)?;
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn collections(&self) -> Result<Vec<String>> {
        self.inner.collections()
    }

    fn is_persistent(&self) -> bool {
        self.inner.is_persistent()
    }

    fn mode_name(&self) -> &'static str {
        "Faulty"
    }
}
