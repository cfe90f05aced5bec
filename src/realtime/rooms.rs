//! Room Membership Manager
//!
//! Each conversation gets its own lazily-created broadcast channel; the
//! channel IS the room. A connection "joins" a room by subscribing, and
//! membership disappears with the subscription when the connection
//! closes. Scoping delivery to the room's channel is the correctness
//! boundary keeping 1:1 conversations private from each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use uuid::Uuid;

use crate::model::ServerEvent;

/// Capacity of each room's broadcast channel.
const ROOM_CAPACITY: usize = 256;

/// An event scoped to one conversation's room.
///
/// `origin` is the connection id the event came from; subscribers skip
/// events whose origin is their own connection (typing indicators are
/// never echoed back). Server-originated events carry `None` and reach
/// every room member.
#[derive(Debug, Clone)]
pub struct RoomEvent {
    pub origin: Option<Uuid>,
    pub event: ServerEvent,
}

/// Per-conversation broadcast channels.
#[derive(Clone, Default)]
pub struct RoomRegistry {
    channels: Arc<Mutex<HashMap<Uuid, broadcast::Sender<RoomEvent>>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a connection to a conversation's room.
    pub fn subscribe(&self, conversation_id: Uuid) -> broadcast::Receiver<RoomEvent> {
        let mut channels = self.channels.lock().unwrap();
        channels
            .entry(conversation_id)
            .or_insert_with(|| broadcast::channel(ROOM_CAPACITY).0)
            .subscribe()
    }

    /// Broadcast an event to a conversation's room.
    ///
    /// Returns the number of subscribers reached; an empty room is a
    /// no-op, not an error.
    pub fn broadcast(
        &self,
        conversation_id: Uuid,
        origin: Option<Uuid>,
        event: ServerEvent,
    ) -> usize {
        let sender = {
            let channels = self.channels.lock().unwrap();
            channels.get(&conversation_id).cloned()
        };
        match sender {
            Some(sender) => sender.send(RoomEvent { origin, event }).unwrap_or(0),
            None => 0,
        }
    }

    /// Drop channels whose rooms have emptied.
    pub fn cleanup_idle(&self) {
        self.channels
            .lock()
            .unwrap()
            .retain(|_, sender| sender.receiver_count() > 0);
    }

    /// Number of connections currently in a room.
    pub fn subscriber_count(&self, conversation_id: Uuid) -> usize {
        self.channels
            .lock()
            .unwrap()
            .get(&conversation_id)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }
}
