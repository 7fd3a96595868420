//! Microsecond-precision timestamp type
//!
//! Timestamps are stored as microseconds since Unix epoch
//! (1970-01-01 00:00:00 UTC) and rendered on the wire as ISO-8601 / RFC 3339
//! strings with microsecond precision, e.g. `2024-03-01T09:30:00.000000Z`.
//!
//! ## Usage
//!
//! Never expose raw arithmetic. Use explicit constructors:
//!
//! ```
//! use fieldbook_core::Timestamp;
//!
//! let now = Timestamp::now();
//! let from_secs = Timestamp::from_secs(1000);
//! let parsed = Timestamp::parse_iso("1970-01-01T00:16:40Z").unwrap();
//! assert_eq!(from_secs, parsed);
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::{Error, Result};

/// Microsecond-precision timestamp
///
/// ## Invariants
///
/// - Timestamps are always non-negative (u64)
/// - Timestamps are comparable and orderable chronologically
/// - The zero timestamp represents Unix epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Unix epoch (1970-01-01 00:00:00 UTC)
    pub const EPOCH: Timestamp = Timestamp(0);

    /// Create a timestamp for the current moment
    ///
    /// Returns epoch if the system clock is before Unix epoch.
    pub fn now() -> Self {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Timestamp(duration.as_micros() as u64)
    }

    /// Create a timestamp from microseconds since epoch
    #[inline]
    pub const fn from_micros(micros: u64) -> Self {
        Timestamp(micros)
    }

    /// Create a timestamp from milliseconds since epoch
    #[inline]
    pub const fn from_millis(millis: u64) -> Self {
        Timestamp(millis.saturating_mul(1_000))
    }

    /// Create a timestamp from seconds since epoch
    #[inline]
    pub const fn from_secs(secs: u64) -> Self {
        Timestamp(secs.saturating_mul(1_000_000))
    }

    /// Get microseconds since Unix epoch
    #[inline]
    pub const fn as_micros(&self) -> u64 {
        self.0
    }

    /// Get milliseconds since Unix epoch (truncates)
    #[inline]
    pub const fn as_millis(&self) -> u64 {
        self.0 / 1_000
    }

    /// Get seconds since Unix epoch (truncates)
    #[inline]
    pub const fn as_secs(&self) -> u64 {
        self.0 / 1_000_000
    }

    /// Compute duration since an earlier timestamp
    ///
    /// Returns `None` if `earlier` is actually later than `self`.
    pub fn duration_since(&self, earlier: Timestamp) -> Option<Duration> {
        self.0.checked_sub(earlier.0).map(Duration::from_micros)
    }

    /// Add a duration, saturating at `u64::MAX` microseconds
    pub fn saturating_add(&self, duration: Duration) -> Self {
        Timestamp(self.0.saturating_add(duration.as_micros() as u64))
    }

    /// Subtract a duration, saturating at `Timestamp::EPOCH`
    pub fn saturating_sub(&self, duration: Duration) -> Self {
        Timestamp(self.0.saturating_sub(duration.as_micros() as u64))
    }

    /// Check if this timestamp is before another
    #[inline]
    pub fn is_before(&self, other: Timestamp) -> bool {
        self.0 < other.0
    }

    /// Render as an ISO-8601 string in UTC
    ///
    /// # Errors
    ///
    /// `Error::Serialization` for instants past the end of the calendar
    /// range (about year 262000); they have no ISO-8601 form.
    pub fn to_iso(&self) -> Result<String> {
        i64::try_from(self.0)
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_micros)
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Micros, true))
            .ok_or_else(|| {
                Error::Serialization(format!(
                    "timestamp {}us is beyond the representable calendar range",
                    self.0
                ))
            })
    }

    /// Parse an ISO-8601 / RFC 3339 string
    pub fn parse_iso(s: &str) -> Result<Self> {
        let dt = DateTime::parse_from_rfc3339(s)
            .map_err(|e| Error::Serialization(format!("invalid timestamp '{}': {}", s, e)))?;
        let micros = dt.timestamp_micros();
        u64::try_from(micros)
            .map(Timestamp)
            .map_err(|_| Error::Serialization(format!("timestamp before epoch: '{}'", s)))
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Timestamp::EPOCH
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.to_iso() {
            Ok(iso) => f.write_str(&iso),
            Err(_) => write!(f, "{}us", self.0),
        }
    }
}

impl From<Duration> for Timestamp {
    /// Create from duration since epoch
    fn from(duration: Duration) -> Self {
        Timestamp::from_micros(duration.as_micros() as u64)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let iso = self.to_iso().map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&iso)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Timestamp::parse_iso(&s).map_err(serde::de::Error::custom)
    }
}
