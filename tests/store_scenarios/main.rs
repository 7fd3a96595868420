//! Store Scenario Tests
//!
//! End-to-end behaviour of the document store through the public facade:
//! - diary: the create → query → update → query walkthrough
//! - crud: round-trip, partial update, delete idempotence
//! - queries: operator semantics, ordering, limits
//! - persistence: file backend reopen, storage failures

#[path = "../common/mod.rs"]
mod common;

mod crud;
mod diary;
mod persistence;
