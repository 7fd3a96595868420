//! Storage layer for Fieldbook
//!
//! This crate implements the persistence backends the document store writes
//! through:
//! - PersistenceBackend: whole-collection load/save contract
//! - InMemoryBackend: serialized collections in a shared key/value area
//! - FileBackend: one JSON file per collection with atomic replace
//! - Namespace: `"<prefix>-<collection>"` key convention
//! - testing::FaultyBackend: failure injection for upper layers

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod file;
pub mod memory;
pub mod testing;

pub use backend::{
    decode_collection, encode_collection, validate_collection_name, Namespace, PersistenceBackend,
};
pub use file::FileBackend;
pub use memory::{InMemoryBackend, MemoryArea};
