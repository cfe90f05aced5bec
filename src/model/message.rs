//! Chat Message Data Structure
//!
//! Represents a message in a conversation. Messages are immutable after
//! creation except for their delivery status, which only ever moves
//! forward (`sent -> delivered -> seen`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Delivery status of a message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    /// Persisted and broadcast to the room
    Sent,
    /// Acknowledged by the recipient's client
    Delivered,
    /// Read by the recipient
    Seen,
}

impl Default for MessageStatus {
    fn default() -> Self {
        MessageStatus::Sent
    }
}

impl MessageStatus {
    /// String form used for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Sent => "sent",
            MessageStatus::Delivered => "delivered",
            MessageStatus::Seen => "seen",
        }
    }

    /// Parse from the database string form; unknown values fall back to
    /// `Sent` rather than failing the row.
    pub fn from_str(s: &str) -> Self {
        match s {
            "delivered" => MessageStatus::Delivered,
            "seen" => MessageStatus::Seen,
            _ => MessageStatus::Sent,
        }
    }

    /// Position in the forward-only progression. Transitions must never
    /// decrease this.
    pub fn rank(&self) -> u8 {
        match self {
            MessageStatus::Sent => 0,
            MessageStatus::Delivered => 1,
            MessageStatus::Seen => 2,
        }
    }
}

/// Represents a chat message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// Unique message ID
    pub id: Uuid,
    /// Conversation this message belongs to
    pub conversation_id: Uuid,
    /// Participant who sent the message
    pub sender: String,
    /// Message content
    pub content: String,
    /// Delivery status
    #[serde(default)]
    pub status: MessageStatus,
    /// When the message was created; defines ordering within a conversation
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Create a new message in `sent` state.
    pub fn new(conversation_id: Uuid, sender: &str, content: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            conversation_id,
            sender: sender.to_string(),
            content: content.to_string(),
            status: MessageStatus::Sent,
            created_at: Utc::now(),
        }
    }
}

/// Request body for POST /messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub conversation_id: Uuid,
    pub sender: String,
    pub content: String,
}
