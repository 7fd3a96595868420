//! Public API layer for Fieldbook
//!
//! This crate provides the interface feature code uses:
//! - **Facade API**: `Store`, collection and document handles, fluent queries
//! - **Configuration**: `FieldbookConfig`, loaded from `fieldbook.toml`
//!
//! ## Architectural Invariant
//!
//! Every facade call **desugars to exactly one DocumentStore call**.
//! No caching, no hidden state between calls.
//!
//! ## Quick Start
//!
//! ```ignore
//! use fieldbook_api::{Operator, Store};
//!
//! let store = Store::open_dir("/var/lib/fieldbook")?;
//! let diary = store.collection("diary");
//! diary.add(fields_from_json(json!({"title": "Day 1", "mood": "good"}))?)?;
//!
//! let good = diary.filter("mood", Operator::Eq, "good").get()?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod facade;

pub use config::{BackendKind, FieldbookConfig, CONFIG_FILE_NAME};
pub use facade::{CollectionRef, DocumentRef, QueryRef, Store};

// Types that appear in facade signatures
pub use fieldbook_core::{Document, Error, Fields, Result, Value};
pub use fieldbook_engine::{Direction, Operator};
