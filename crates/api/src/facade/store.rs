//! Store entry point
//!
//! A [`Store`] bundles the document store, the event bus wired to it, and
//! the optional background sweeper. Clones share everything; the sweeper is
//! stopped when the last clone is dropped.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use fieldbook_core::{system_clock, Result, SharedClock};
use fieldbook_engine::DocumentStore;
use fieldbook_realtime::{BusChangeNotifier, EventBus, Sweeper};
use fieldbook_storage::{FileBackend, InMemoryBackend, PersistenceBackend};

use crate::config::{BackendKind, FieldbookConfig, CONFIG_FILE_NAME};
use crate::facade::CollectionRef;

struct StoreInner {
    documents: Arc<DocumentStore>,
    bus: EventBus,
    config: FieldbookConfig,
    sweeper: Option<Sweeper>,
}

impl Drop for StoreInner {
    fn drop(&mut self) {
        if let Some(sweeper) = &self.sweeper {
            sweeper.shutdown();
        }
    }
}

/// Handle to an open store
///
/// # Example
///
/// ```ignore
/// let store = Store::ephemeral()?;
/// let diary = store.collection("diary");
/// let entry = diary.add(fields_from_json(json!({"title": "Day 1", "mood": "good"}))?)?;
///
/// let good = diary.filter("mood", Operator::Eq, "good").get()?;
/// assert_eq!(good[0].id, entry.id());
/// ```
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("backend", &self.inner.documents.backend().mode_name())
            .field("prefix", &self.inner.config.store_prefix)
            .field("sweeper", &self.inner.sweeper.is_some())
            .finish()
    }
}

impl Store {
    /// Open a store as described by `config`
    ///
    /// # Errors
    ///
    /// `Error::Validation` for invalid settings; `Error::Io` if the file
    /// backend's directory cannot be created.
    pub fn open(config: FieldbookConfig) -> Result<Store> {
        config.validate()?;
        let backend: Arc<dyn PersistenceBackend> = match config.backend_kind()? {
            BackendKind::Memory => Arc::new(InMemoryBackend::new(config.store_prefix.as_str())?),
            BackendKind::File => {
                let dir = config.data_dir.clone().unwrap_or_default();
                Arc::new(FileBackend::open(dir, config.store_prefix.as_str())?)
            }
        };
        Self::with_backend(backend, system_clock(), config)
    }

    /// In-memory store with default settings and no sweeper thread
    pub fn ephemeral() -> Result<Store> {
        let mut config = FieldbookConfig::default();
        config.realtime.sweep_interval_ms = 0;
        Self::open(config)
    }

    /// File-backed store rooted at `dir`
    ///
    /// Settings come from `dir/fieldbook.toml`, which is created with
    /// defaults if missing. The backend is always the file backend rooted
    /// at `dir`, whatever the file says.
    pub fn open_dir(dir: impl AsRef<Path>) -> Result<Store> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let path = dir.join(CONFIG_FILE_NAME);
        FieldbookConfig::write_default_if_missing(&path)?;
        let mut config = FieldbookConfig::from_file(&path)?;
        config.backend = "file".to_string();
        config.data_dir = Some(dir.to_path_buf());
        Self::open(config)
    }

    /// Store over an explicit backend and clock
    ///
    /// `config.backend` and `config.data_dir` are ignored.
    pub fn with_backend(
        backend: Arc<dyn PersistenceBackend>,
        clock: SharedClock,
        config: FieldbookConfig,
    ) -> Result<Store> {
        config.realtime.validate()?;
        let mode = backend.mode_name();
        let documents = Arc::new(DocumentStore::with_clock(backend, clock));
        let bus = EventBus::new(Arc::clone(&documents), config.realtime.clone())?;
        documents.set_listener(Arc::new(BusChangeNotifier::new(&bus)));

        let sweeper = config.realtime.sweep_interval().map(|interval| {
            let sweeper = Sweeper::new(bus.clone(), interval);
            // detached; stops via the shutdown flag when the store is dropped
            let _ = sweeper.start();
            sweeper
        });

        info!(
            target: "fieldbook::store",
            backend = mode,
            prefix = %config.store_prefix,
            sweeper = sweeper.is_some(),
            "store opened"
        );

        Ok(Store {
            inner: Arc::new(StoreInner {
                documents,
                bus,
                config,
                sweeper,
            }),
        })
    }

    /// Handle to a collection
    ///
    /// The events collection is returned read-only.
    pub fn collection(&self, name: impl Into<String>) -> CollectionRef {
        let name = name.into();
        let read_only = name == self.inner.config.realtime.events_collection;
        CollectionRef::new(Arc::clone(&self.inner.documents), name, read_only)
    }

    /// Collections persisted so far
    pub fn collections(&self) -> Result<Vec<String>> {
        self.inner.documents.collections()
    }

    /// Underlying document store
    pub fn documents(&self) -> &Arc<DocumentStore> {
        &self.inner.documents
    }

    /// Event bus wired to this store
    pub fn bus(&self) -> &EventBus {
        &self.inner.bus
    }

    /// Settings the store was opened with
    pub fn config(&self) -> &FieldbookConfig {
        &self.inner.config
    }
}
