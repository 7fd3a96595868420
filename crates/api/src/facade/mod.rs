//! Facade API - document-database style surface
//!
//! The facade gives feature code the familiar collection/document handles
//! and a fluent `filter → order_by → limit → get` chain. Handles are cheap
//! values holding the collection name (and id); nothing is read until a
//! terminal call.
//!
//! ## Module Structure
//!
//! - `store`: `Store`, the entry point, and its constructors
//! - `collection`: `CollectionRef`
//! - `document`: `DocumentRef`
//! - `query`: `QueryRef`, the fluent query chain
//!
//! ## Desugaring
//!
//! | Facade Call | DocumentStore Equivalent |
//! |-------------|--------------------------|
//! | `collection(c).add(f)` | `create(c, f)` |
//! | `collection(c).get()` | `read_all(c)` |
//! | `doc(id).get()` | `read(c, id)` |
//! | `doc(id).set(f)` | `set(c, id, f, SetOptions::replace())` |
//! | `doc(id).set_merge(f)` | `set(c, id, f, SetOptions::merge())` |
//! | `doc(id).update(f)` | `update(c, id, f)` |
//! | `doc(id).delete()` | `delete(c, id)` |
//! | `filter(..).order_by(..).limit(n).get()` | `query(&Query)` |

pub mod collection;
pub mod document;
pub mod query;
pub mod store;

pub use collection::CollectionRef;
pub use document::DocumentRef;
pub use query::QueryRef;
pub use store::Store;
