//! Core types for Fieldbook
//!
//! This crate defines the foundational types used throughout the system:
//! - Value: closed set of field value types
//! - Timestamp: microsecond time with ISO-8601 wire form
//! - Document: id + fields + creation/update stamps
//! - Error: error type hierarchy
//! - IdGenerator: collision-resistant id minting
//! - Clock: injectable time source

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clock;
pub mod document;
pub mod error;
pub mod id;
pub mod timestamp;
pub mod value;

pub use clock::{system_clock, Clock, ManualClock, SharedClock, SystemClock};
pub use document::{fields_from_json, to_fields, validate_fields, Document, RESERVED_FIELDS};
pub use error::{Error, Result};
pub use id::IdGenerator;
pub use timestamp::Timestamp;
pub use value::{Fields, Value, ValueKind, TIMESTAMP_TAG};
