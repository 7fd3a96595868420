//! File persistence backend
//!
//! One file per collection: `<dir>/<prefix>-<collection>.json`, holding the
//! JSON array of document records. Saves are atomic: the new contents are
//! written to a sibling temp file, fsynced, then renamed over the target, so
//! a crash or error mid-write leaves the previous file in place.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use fieldbook_core::{Document, Error, Result};

use crate::backend::{decode_collection, encode_collection, Namespace, PersistenceBackend};

const EXTENSION: &str = "json";
const TEMP_EXTENSION: &str = "json.tmp";

/// Directory-of-files backend
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
    namespace: Namespace,
}

impl FileBackend {
    /// Open a backend rooted at `dir`, creating the directory if needed
    pub fn open(dir: impl AsRef<Path>, prefix: impl Into<String>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            namespace: Namespace::new(prefix)?,
        })
    }

    /// Root directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding a collection
    pub fn path_for(&self, collection: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", self.namespace.key_for(collection), EXTENSION))
    }

    fn write_atomic(&self, path: &Path, contents: &str) -> io::Result<()> {
        let tmp_path = path.with_extension(TEMP_EXTENSION);
        {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(contents.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, path)
    }
}

impl PersistenceBackend for FileBackend {
    fn load(&self, collection: &str) -> Result<Vec<Document>> {
        let path = self.path_for(collection);
        match fs::read_to_string(&path) {
            Ok(raw) => decode_collection(collection, &raw),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(Error::storage(format!(
                "failed to read '{}': {}",
                path.display(),
                e
            ))),
        }
    }

    fn save(&self, collection: &str, documents: &[Document]) -> Result<()> {
        let raw = encode_collection(collection, documents)?;
        let path = self.path_for(collection);
        if let Err(e) = self.write_atomic(&path, &raw) {
            warn!(
                target: "fieldbook::backend",
                path = %path.display(),
                error = %e,
                "collection write failed"
            );
            return Err(Error::storage(format!(
                "failed to write '{}': {}",
                path.display(),
                e
            )));
        }
        debug!(
            target: "fieldbook::backend",
            collection,
            documents = documents.len(),
            bytes = raw.len(),
            "collection saved to disk"
        );
        Ok(())
    }

    fn collections(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if let Some(name) = self.namespace.collection_of(stem) {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    #[inline]
    fn is_persistent(&self) -> bool {
        true
    }

    #[inline]
    fn mode_name(&self) -> &'static str {
        "File"
    }
}
