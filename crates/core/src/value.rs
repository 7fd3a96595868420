//! Value types for Fieldbook
//!
//! ## Canonical Value Model
//!
//! Document fields hold exactly one of eight variants:
//! - Null, Bool, Int, Float, String, Timestamp, Array, Map
//!
//! ### Type Rules
//!
//! - No implicit coercions between strings, booleans and numbers
//! - `Int` and `Float` are both "number": `Int(5) == Float(5.0)`
//! - Float uses IEEE-754 equality: `NaN != NaN`, `-0.0 == 0.0`
//! - Ordering exists only within a kind: numbers, strings, timestamps, booleans
//!
//! ## Wire Form
//!
//! Values serialize to plain JSON. `Timestamp` is the one variant with no
//! native JSON type; it is written as `{"$timestamp": "<ISO-8601>"}` and read
//! back into `Value::Timestamp`.

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::timestamp::Timestamp;

/// Tag used for timestamp values in JSON
pub const TIMESTAMP_TAG: &str = "$timestamp";

/// Top-level document fields
pub type Fields = BTreeMap<String, Value>;

/// Canonical field value
#[derive(Debug, Clone)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point (IEEE-754)
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Point in time
    Timestamp(Timestamp),
    /// Ordered list of values
    Array(Vec<Value>),
    /// Nested map with string keys
    Map(BTreeMap<String, Value>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            _ => false,
        }
    }
}

/// Ordering class of a value
///
/// Two values can be ordered only when they share a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Null
    Null,
    /// Bool
    Bool,
    /// Int or Float
    Number,
    /// String
    String,
    /// Timestamp
    Timestamp,
    /// Array
    Array,
    /// Map
    Map,
}

impl ValueKind {
    /// Whether values of this kind have a natural ordering
    pub fn is_ordered(self) -> bool {
        matches!(
            self,
            ValueKind::Bool | ValueKind::Number | ValueKind::String | ValueKind::Timestamp
        )
    }
}

impl Value {
    /// Get the type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::String(_) => "String",
            Value::Timestamp(_) => "Timestamp",
            Value::Array(_) => "Array",
            Value::Map(_) => "Map",
        }
    }

    /// Ordering class
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) | Value::Float(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Timestamp(_) => ValueKind::Timestamp,
            Value::Array(_) => ValueKind::Array,
            Value::Map(_) => ValueKind::Map,
        }
    }

    /// True when both values share an ordered kind
    pub fn is_comparable_with(&self, other: &Value) -> bool {
        let kind = self.kind();
        kind.is_ordered() && kind == other.kind()
    }

    /// Natural ordering within a kind
    ///
    /// Returns `None` for values of different kinds, unordered kinds, or
    /// when a float comparison involves NaN.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Get as i64 if this is an Int value
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as &str if this is a String value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the timestamp if this is a Timestamp value
    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            Value::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    /// Get as &[Value] if this is an Array value
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Get as a map if this is a Map value
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Resolve a dotted path through nested maps
    ///
    /// `["address", "city"]` on `{address: {city: "Lima"}}` yields `"Lima"`.
    pub fn lookup<'a, I>(&self, path: I) -> Option<&Value>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut current = self;
        for segment in path {
            current = current.as_map()?.get(segment)?;
        }
        Some(current)
    }
}

// ============================================================================
// From implementations for ergonomic API usage
// ============================================================================

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<Timestamp> for Value {
    fn from(t: Timestamp) -> Self {
        Value::Timestamp(t)
    }
}

// ============================================================================
// serde_json interop
// ============================================================================

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                // u64 beyond i64 range degrades to float
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(arr) => Value::Array(arr.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(obj) => {
                if obj.len() == 1 {
                    if let Some(serde_json::Value::String(iso)) = obj.get(TIMESTAMP_TAG) {
                        if let Ok(ts) = Timestamp::parse_iso(iso) {
                            return Value::Timestamp(ts);
                        }
                    }
                }
                Value::Map(obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            // JSON has no NaN/Infinity
            Value::Float(f) if !f.is_finite() => serializer.serialize_unit(),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Timestamp(t) => {
                let iso = t.to_iso().map_err(serde::ser::Error::custom)?;
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(TIMESTAMP_TAG, &iso)?;
                map.end()
            }
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(m) => {
                let mut map = serializer.serialize_map(Some(m.len()))?;
                for (k, v) in m {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}
