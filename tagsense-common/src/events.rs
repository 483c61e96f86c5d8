//! Event types for the TagSense event system
//!
//! Provides the TagEvent enum and the EventBus used to fan events out to
//! every current subscriber (SSE clients, in-process listeners, tests).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::models::TagRecord;

/// TagSense event types
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
/// The engine publishes them in the same order its internal state changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum TagEvent {
    /// Reading session started or stopped
    ReadingStatusChanged {
        is_reading: bool,
        timestamp: DateTime<Utc>,
    },

    /// A tag not seen before in this session was stored
    TagRead {
        tag: TagRecord,
        timestamp: DateTime<Utc>,
    },

    /// Running count after a new tag was stored
    TagCountChanged {
        count: usize,
        timestamp: DateTime<Utc>,
    },

    /// Count landed exactly on the configured threshold
    ThresholdReached {
        count: usize,
        timestamp: DateTime<Utc>,
    },

    /// Threshold value updated by an operator
    ThresholdChanged {
        threshold: u32,
        timestamp: DateTime<Utc>,
    },

    /// Outbound threshold notification was accepted by the remote endpoint
    NotificationSent {
        message: String,
        timestamp: DateTime<Utc>,
    },
}

impl TagEvent {
    pub fn reading_status_changed(is_reading: bool) -> Self {
        Self::ReadingStatusChanged {
            is_reading,
            timestamp: Utc::now(),
        }
    }

    pub fn tag_read(tag: TagRecord) -> Self {
        Self::TagRead {
            tag,
            timestamp: Utc::now(),
        }
    }

    pub fn tag_count_changed(count: usize) -> Self {
        Self::TagCountChanged {
            count,
            timestamp: Utc::now(),
        }
    }

    pub fn threshold_reached(count: usize) -> Self {
        Self::ThresholdReached {
            count,
            timestamp: Utc::now(),
        }
    }

    pub fn threshold_changed(threshold: u32) -> Self {
        Self::ThresholdChanged {
            threshold,
            timestamp: Utc::now(),
        }
    }

    pub fn notification_sent(message: impl Into<String>) -> Self {
        Self::NotificationSent {
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    /// Event name used for the SSE `event:` field
    pub fn event_name(&self) -> &'static str {
        match self {
            TagEvent::ReadingStatusChanged { .. } => "ReadingStatusChanged",
            TagEvent::TagRead { .. } => "TagRead",
            TagEvent::TagCountChanged { .. } => "TagCountChanged",
            TagEvent::ThresholdReached { .. } => "ThresholdReached",
            TagEvent::ThresholdChanged { .. } => "ThresholdChanged",
            TagEvent::NotificationSent { .. } => "NotificationSent",
        }
    }
}

/// Central event distribution bus
///
/// Wraps a broadcast channel. Delivery is best-effort: slow subscribers lag
/// and lose the oldest events, and publishing with no subscribers is not an
/// error for callers using [`EventBus::emit_lossy`].
pub struct EventBus {
    tx: broadcast::Sender<TagEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Examples
    ///
    /// ```
    /// use tagsense_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(100);
    /// assert_eq!(event_bus.capacity(), 100);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<TagEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: TagEvent) -> Result<usize, broadcast::error::SendError<TagEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    ///
    /// # Examples
    ///
    /// ```
    /// use tagsense_common::events::{EventBus, TagEvent};
    ///
    /// let event_bus = EventBus::new(16);
    /// event_bus.emit_lossy(TagEvent::tag_count_changed(3));
    /// ```
    pub fn emit_lossy(&self, event: TagEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
