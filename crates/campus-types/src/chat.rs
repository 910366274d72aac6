//! Chat message envelope and persisted history record.
//!
//! [`ChatMessage`] is the wire envelope fanned out to every connected client:
//!
//! ```json
//! {"type":"message","content":"hello","senderId":1,"timestamp":"2024-05-01T09:30:00Z"}
//! ```
//!
//! [`HistoryRecord`] is the same shape plus the store-assigned `id`, returned
//! by the history endpoint.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::session::UserId;

/// Discriminator carried by every broadcast chat message.
pub const MESSAGE_TYPE: &str = "message";

/// Broadcast envelope. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
    pub sender_id: UserId,
    /// Capture time, whole seconds, serialized as RFC 3339.
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Build a `"message"` envelope stamped with the current time.
    pub fn new(content: impl Into<String>, sender_id: UserId) -> Self {
        Self::at(content, sender_id, Utc::now())
    }

    /// Build a `"message"` envelope with an explicit capture time.
    pub fn at(content: impl Into<String>, sender_id: UserId, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind: MESSAGE_TYPE.to_string(),
            content: content.into(),
            sender_id,
            timestamp: timestamp.trunc_subsecs(0),
        }
    }
}

/// A chat message as stored by the history store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
    pub sender_id: UserId,
    pub timestamp: DateTime<Utc>,
}

impl HistoryRecord {
    pub fn from_message(id: i64, message: ChatMessage) -> Self {
        Self {
            id,
            kind: message.kind,
            content: message.content,
            sender_id: message.sender_id,
            timestamp: message.timestamp,
        }
    }
}
