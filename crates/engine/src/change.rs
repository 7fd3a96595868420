//! Change notification hook
//!
//! The document store reports every committed mutation to an optional
//! [`ChangeListener`]. Listeners run after the collection lock is released,
//! so they may call back into the store.

use fieldbook_core::Document;

/// Kind of committed mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Document was inserted
    Created,
    /// Existing document was merged into or replaced
    Updated,
    /// Document was removed
    Deleted,
}

/// One committed mutation
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentChange {
    /// Collection that changed
    pub collection: String,
    /// What happened
    pub kind: ChangeKind,
    /// State after the change; for deletions, the removed document
    pub document: Document,
}

/// Observer of committed mutations
pub trait ChangeListener: Send + Sync {
    /// Called once per committed mutation, on the writing thread
    ///
    /// Runs after the collection lock is released, so calls caused by
    /// concurrent writers to one collection may arrive out of commit order.
    fn on_change(&self, change: &DocumentChange);
}
