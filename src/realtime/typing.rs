//! Typing-Indicator State
//!
//! Tracks which (conversation, participant) pairs are currently typing.
//! Set semantics: the first `typing` signal flips idle -> typing and is
//! worth broadcasting, repeats while already typing are not. The server
//! never expires entries on its own; the sending client's debounce or a
//! disconnect ends them.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

#[derive(Clone, Default)]
pub struct TypingRegistry {
    active: Arc<Mutex<HashSet<(Uuid, String)>>>,
}

impl TypingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// idle -> typing. Returns true when this was an actual transition
    /// (i.e. the caller should broadcast `user_typing`).
    pub fn start(&self, conversation_id: Uuid, participant: &str) -> bool {
        self.active
            .lock()
            .unwrap()
            .insert((conversation_id, participant.to_string()))
    }

    /// typing -> idle. Returns true when this was an actual transition
    /// (i.e. the caller should broadcast `user_stop_typing`).
    pub fn stop(&self, conversation_id: Uuid, participant: &str) -> bool {
        self.active
            .lock()
            .unwrap()
            .remove(&(conversation_id, participant.to_string()))
    }

    pub fn is_typing(&self, conversation_id: Uuid, participant: &str) -> bool {
        self.active
            .lock()
            .unwrap()
            .contains(&(conversation_id, participant.to_string()))
    }
}
