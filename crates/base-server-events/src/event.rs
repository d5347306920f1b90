//! The persisted event record.
//!
//! An [`ApiEvent`] is written exactly once, when a configured route handler
//! completes, and is never mutated afterwards. The on-disk JSON object
//! carries exactly seven keys: `timestamp`, `route`, `method`, `input`,
//! `output`, `status`, `success`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Returns `true` when `status` is in the `2xx` range.
///
/// Callers compute `success` with this at the call site; the store keeps
/// whatever value it is handed.
pub const fn is_success_status(status: u16) -> bool {
    status >= 200 && status < 300
}

/// The request/response envelope handed to [`crate::EventStore::append`].
///
/// Everything except the timestamp, which the store stamps at append time.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    /// The logical route path that was invoked.
    pub route: String,
    /// The HTTP verb.
    pub method: String,
    /// Request body or query parameters.
    pub input: Map<String, Value>,
    /// Response payload.
    pub output: Map<String, Value>,
    /// HTTP status code returned to the client.
    pub status: u16,
    /// Whether the call succeeded, as decided by the caller.
    pub success: bool,
}

impl NewEvent {
    /// Attach the creation instant, producing the persisted record.
    pub fn stamp(self, timestamp: DateTime<Utc>) -> ApiEvent {
        ApiEvent {
            timestamp,
            route: self.route,
            method: self.method,
            input: self.input,
            output: self.output,
            status: self.status,
            success: self.success,
        }
    }
}

/// One persisted record of a handled API call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEvent {
    /// Event-creation instant (UTC).
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
    /// The logical route path that was invoked.
    pub route: String,
    /// The HTTP verb.
    pub method: String,
    /// Request body or query parameters.
    pub input: Map<String, Value>,
    /// Response payload.
    pub output: Map<String, Value>,
    /// HTTP status code returned to the client.
    pub status: u16,
    /// Whether the call succeeded.
    pub success: bool,
}

/// Serde adapter for [`ApiEvent::timestamp`].
///
/// Writes a naive ISO-8601 UTC string with microsecond precision
/// (`2025-01-31T12:00:00.000123`). Reads that form with or without the
/// fractional part, and RFC 3339 strings with an explicit offset.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    const WRITE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";
    const READ_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

    /// Serialize a timestamp as a naive UTC ISO-8601 string.
    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&ts.format(WRITE_FORMAT))
    }

    /// Deserialize a timestamp written by [`serialize`] or as RFC 3339.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp: {raw}")))
    }

    /// Parse either accepted timestamp form.
    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, READ_FORMAT)
            .ok()
            .map(|naive| naive.and_utc())
    }
}
