//! Session lifecycle state and the status projection served to clients

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Reading session lifecycle
///
/// `Idle → Connecting → Active → Stopping → Idle`. Polling runs only while
/// `Active`; device failures never leave `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Idle,
    Connecting,
    Active,
    Stopping,
}

impl SessionState {
    pub fn is_active(self) -> bool {
        self == SessionState::Active
    }
}

/// Where the current session's tags come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Physical (or simulated) reader through the adapter
    Device,
    /// Synthetic generator after the reader could not be opened
    Fallback,
}

/// Point-in-time view of the session
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub is_reading: bool,
    pub state: SessionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    pub timestamp: DateTime<Utc>,
}
