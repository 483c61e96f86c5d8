//! Tag data model shared between the reader engine and its consumers
//!
//! Field names are serialized in camelCase so the JSON matches what the
//! handheld and dashboard clients already consume.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single deduplicated tag observation
///
/// Immutable once created; the tag store keeps the first record seen for
/// each `tag_id` and never updates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagRecord {
    /// EPC rendered as uppercase hexadecimal
    pub tag_id: String,
    /// When the tag was first read
    pub read_time: DateTime<Utc>,
    /// Received signal strength (dBm, more negative is weaker)
    pub rssi: i32,
    /// Antenna that reported the tag
    pub antenna_port: String,
}

impl TagRecord {
    /// Create a record stamped with the current time
    pub fn new(tag_id: impl Into<String>, rssi: i32, antenna_port: impl Into<String>) -> Self {
        Self {
            tag_id: tag_id.into(),
            read_time: Utc::now(),
            rssi,
            antenna_port: antenna_port.into(),
        }
    }

    /// Override the read time (used when the source supplies its own timestamp)
    pub fn with_read_time(mut self, read_time: DateTime<Utc>) -> Self {
        self.read_time = read_time;
        self
    }
}

/// Read-only projection of the tag counter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagCounterSnapshot {
    pub current_count: usize,
    pub threshold_value: u32,
    /// `current_count >= threshold_value`
    pub threshold_reached: bool,
    /// Tags in insertion order
    pub tags: Vec<TagRecord>,
}
