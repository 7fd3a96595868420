//! Error types for Fieldbook
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! | Variant        | Raised by                                   |
//! |----------------|---------------------------------------------|
//! | `NotFound`     | document updates against a missing id       |
//! | `TypeMismatch` | ordering/membership operators on bad types  |
//! | `Storage`      | persistence backend load/save failures      |
//! | `Validation`   | malformed queries, reserved field names     |
//! | `Serialization`| wire-format encode/decode                   |
//! | `Io`           | file backend and config file access         |

use std::io;
use thiserror::Error;

/// Result type alias for Fieldbook operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the document store and event bus
#[derive(Debug, Error)]
pub enum Error {
    /// Document does not exist in its collection
    #[error("document not found: {collection}/{id}")]
    NotFound {
        /// Collection that was searched
        collection: String,
        /// Missing document id
        id: String,
    },

    /// Comparison applied to operands that have no common ordering
    #[error("type mismatch on field '{field}': cannot compare {left} with {right}")]
    TypeMismatch {
        /// Field path being evaluated
        field: String,
        /// Type name of the stored value
        left: &'static str,
        /// Type name of the query operand
        right: &'static str,
    },

    /// Persistence backend failed to load or save
    #[error("storage error: {0}")]
    Storage(String),

    /// Malformed input (query construction, reserved names, bad config)
    #[error("validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error (file operations)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Build a `NotFound` error
    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Error::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Build a `Storage` error
    pub fn storage(msg: impl Into<String>) -> Self {
        Error::Storage(msg.into())
    }

    /// Build a `Validation` error
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// True for `NotFound`
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// True for failures of the persistence layer (`Storage`, `Io`, `Serialization`)
    ///
    /// Callers use this to fall back to cached data instead of failing hard.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Error::Storage(_) | Error::Io(_) | Error::Serialization(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
