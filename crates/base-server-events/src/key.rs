//! Sortable unit keys.
//!
//! A key is the event's creation instant rendered as fractional
//! seconds-since-epoch, followed by a per-store sequence number:
//!
//! ```text
//! 1738324800.000123-000042
//! ^^^^^^^^^^ ^^^^^^ ^^^^^^
//! seconds    micros sequence
//! ```
//!
//! Seconds are zero-padded to ten digits and micros to six, so plain
//! lexicographic order equals chronological order. The sequence breaks
//! ties between appends that land in the same microsecond.

use std::fmt;

use chrono::{DateTime, Utc};

/// File extension used for persisted units.
pub const UNIT_EXTENSION: &str = "json";

/// Sequence numbers wrap at this value to keep the suffix six digits wide.
const SEQUENCE_MODULUS: u64 = 1_000_000;

/// The storage key of a single persisted unit.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnitKey(String);

impl UnitKey {
    /// Build the key for an event created at `at` with sequence `sequence`.
    pub fn for_instant(at: DateTime<Utc>, sequence: u64) -> Self {
        let secs = at.timestamp();
        let micros = at.timestamp_subsec_micros();
        let seq = sequence.wrapping_rem(SEQUENCE_MODULUS);
        Self(format!("{secs:010}.{micros:06}-{seq:06}"))
    }

    /// Wrap an existing key, e.g. a file stem found in the storage area.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The file name this key is persisted under.
    pub fn file_name(&self) -> String {
        format!("{}.{UNIT_EXTENSION}", self.0)
    }
}

impl fmt::Display for UnitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
