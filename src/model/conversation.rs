//! Conversation Data Structure
//!
//! A conversation is the single row representing an unordered pair of
//! participants. The pair is normalized before it ever reaches storage,
//! which is what makes the storage-level uniqueness constraint
//! order-independent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

/// An unordered participant pair in normalized (lexicographic) form.
///
/// Construction is the only validation point for participant pairs:
/// identifiers are trimmed, must be non-empty, and must differ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantPair {
    lo: String,
    hi: String,
}

impl ParticipantPair {
    pub fn new(a: &str, b: &str) -> Result<Self, ApiError> {
        let a = a.trim();
        let b = b.trim();
        if a.is_empty() || b.is_empty() {
            return Err(ApiError::invalid_participants(
                "participant identifiers must be non-empty",
            ));
        }
        if a == b {
            return Err(ApiError::invalid_participants(
                "a conversation needs two distinct participants",
            ));
        }
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        Ok(Self {
            lo: lo.to_string(),
            hi: hi.to_string(),
        })
    }

    pub fn lo(&self) -> &str {
        &self.lo
    }

    pub fn hi(&self) -> &str {
        &self.hi
    }
}

/// Represents a 1:1 conversation between two participants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Conversation {
    /// Unique conversation ID
    pub id: Uuid,
    /// The two participants, in normalized order
    pub participants: Vec<String>,
    /// Content of the most recent message (display-only cache)
    pub last_message: String,
    /// When the conversation was created
    pub created_at: DateTime<Utc>,
    /// Advances whenever a message is appended; orders the conversation list
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Create a fresh conversation for a normalized pair.
    pub fn new(pair: &ParticipantPair) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            participants: vec![pair.lo().to_string(), pair.hi().to_string()],
            last_message: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Check whether a participant belongs to this conversation.
    pub fn has_participant(&self, participant: &str) -> bool {
        self.participants.iter().any(|p| p == participant)
    }

    /// The peer of `participant`, if `participant` is a member.
    pub fn other_participant(&self, participant: &str) -> Option<&str> {
        if !self.has_participant(participant) {
            return None;
        }
        self.participants
            .iter()
            .map(String::as_str)
            .find(|p| *p != participant)
    }
}

/// Request to create (or fetch) the conversation for a pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateConversationRequest {
    pub participant_a: String,
    pub participant_b: String,
}
