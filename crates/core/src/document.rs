//! Document: a single record in a collection
//!
//! ## Wire Form
//!
//! A document serializes to one flat JSON object:
//!
//! ```json
//! { "id": "0190c3...", "title": "Day 1", "mood": "good",
//!   "createdAt": "2024-03-01T09:30:00.000000Z",
//!   "updatedAt": "2024-03-01T09:30:00.000000Z" }
//! ```
//!
//! The names `id`, `createdAt` and `updatedAt` are therefore reserved and may
//! not appear as user fields. Queries can still filter and sort on them.
//! Field values may not use `$timestamp` as a map key, and timestamps must
//! have an ISO-8601 form, so every stored value reads back unchanged.

use std::borrow::Cow;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::timestamp::Timestamp;
use crate::value::{Fields, Value, TIMESTAMP_TAG};

/// Field names owned by the document envelope
pub const RESERVED_FIELDS: [&str; 3] = ["id", "createdAt", "updatedAt"];

/// A stored document
///
/// The `id` never changes after creation. Callers always receive clones; the
/// store keeps the only authoritative copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique id within the collection
    pub id: String,
    /// User data
    #[serde(flatten)]
    pub fields: Fields,
    /// Creation time
    #[serde(rename = "createdAt")]
    pub created_at: Timestamp,
    /// Last modification time
    #[serde(rename = "updatedAt")]
    pub updated_at: Timestamp,
}

impl Document {
    /// Create a document stamped at `now`
    pub fn new(id: impl Into<String>, fields: Fields, now: Timestamp) -> Self {
        Document {
            id: id.into(),
            fields,
            created_at: now,
            updated_at: now,
        }
    }

    /// Top-level field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Resolve a dotted field path (`address.city`)
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = self.fields.get(segments.next()?)?;
        first.lookup(segments)
    }

    /// Resolve a field path for querying
    ///
    /// Like [`Document::get_path`], but the envelope names `id`, `createdAt`
    /// and `updatedAt` resolve to the document's metadata.
    pub fn resolve(&self, path: &str) -> Option<Cow<'_, Value>> {
        match path {
            "id" => Some(Cow::Owned(Value::String(self.id.clone()))),
            "createdAt" => Some(Cow::Owned(Value::Timestamp(self.created_at))),
            "updatedAt" => Some(Cow::Owned(Value::Timestamp(self.updated_at))),
            _ => self.get_path(path).map(Cow::Borrowed),
        }
    }

    /// Shallow merge of `partial` into the top-level fields
    pub fn merge(&mut self, partial: Fields, now: Timestamp) {
        self.fields.extend(partial);
        self.updated_at = now;
    }

    /// Replace all fields, keeping id and creation time
    pub fn replace(&mut self, fields: Fields, now: Timestamp) {
        self.fields = fields;
        self.updated_at = now;
    }

    /// Deserialize the user fields into a typed struct
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T> {
        let json = serde_json::to_value(&self.fields)?;
        Ok(serde_json::from_value(json)?)
    }
}

/// Reject field sets that collide with the envelope, break path lookup, or
/// would not survive the JSON wire form
pub fn validate_fields(fields: &Fields) -> Result<()> {
    for (name, value) in fields {
        if name.is_empty() {
            return Err(Error::validation("field names must not be empty"));
        }
        if RESERVED_FIELDS.contains(&name.as_str()) || name == TIMESTAMP_TAG {
            return Err(Error::validation(format!("field name '{}' is reserved", name)));
        }
        if name.contains('.') {
            return Err(Error::validation(format!(
                "top-level field name '{}' must not contain '.'",
                name
            )));
        }
        validate_value(name, value)?;
    }
    Ok(())
}

// A nested `$timestamp` key would read back as a timestamp, and a timestamp
// without an ISO form would read back as a map.
fn validate_value(path: &str, value: &Value) -> Result<()> {
    match value {
        Value::Timestamp(ts) => ts.to_iso().map(drop).map_err(|_| {
            Error::validation(format!(
                "field '{}': timestamp {}us is out of range",
                path,
                ts.as_micros()
            ))
        }),
        Value::Array(items) => items.iter().try_for_each(|item| validate_value(path, item)),
        Value::Map(map) => {
            for (key, nested) in map {
                if key == TIMESTAMP_TAG {
                    return Err(Error::validation(format!(
                        "field '{}': map key '{}' is reserved",
                        path, TIMESTAMP_TAG
                    )));
                }
                validate_value(&format!("{}.{}", path, key), nested)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Build fields from a JSON object
pub fn fields_from_json(json: serde_json::Value) -> Result<Fields> {
    match Value::from(json) {
        Value::Map(m) => Ok(m),
        other => Err(Error::validation(format!(
            "document data must be an object, got {}",
            other.type_name()
        ))),
    }
}

/// Build fields from any serializable struct
pub fn to_fields<T: Serialize>(data: &T) -> Result<Fields> {
    fields_from_json(serde_json::to_value(data)?)
}
