//! Document engine for Fieldbook
//!
//! This crate sits on top of the storage layer:
//! - DocumentStore: collection CRUD with per-collection serialization
//! - Query: immutable filter/order/limit descriptions and their evaluation
//! - ChangeListener: hook that observes every committed mutation
//!
//! The engine is the only component that knows about:
//! - Id minting and timestamp stamping
//! - Read-modify-write of whole collections
//! - Query semantics over collection snapshots

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod change;
pub mod query;
pub mod store;

pub use change::{ChangeKind, ChangeListener, DocumentChange};
pub use query::{count, evaluate, Direction, Operator, OrderBy, Predicate, Query};
pub use store::{DocumentStore, SetOptions};
