//! Presence Registry
//!
//! Process-wide map of live connections to participant identifiers. A
//! participant is online while at least one connection maps to it, so a
//! second device keeps the participant online when the first disconnects.
//!
//! The registry only mutates state and reports snapshots; broadcasting
//! the `online_users` event is the session layer's job.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

/// Connection-indexed presence state.
#[derive(Clone, Default)]
pub struct PresenceRegistry {
    connections: Arc<Mutex<HashMap<Uuid, String>>>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate a connection with a participant and return the online
    /// snapshot after the change.
    ///
    /// Re-announcing on the same connection (or announcing an already
    /// online participant from another device) still returns a snapshot:
    /// every `user_online` triggers a broadcast, matching the protocol.
    pub fn mark_online(&self, connection_id: Uuid, participant: &str) -> Vec<String> {
        let mut connections = self.connections.lock().unwrap();
        connections.insert(connection_id, participant.to_string());
        Self::snapshot(&connections)
    }

    /// Drop a connection's association. Returns the updated snapshot when
    /// the connection was registered, `None` for never-identified
    /// connections (no broadcast needed for those).
    pub fn mark_offline(&self, connection_id: Uuid) -> Option<Vec<String>> {
        let mut connections = self.connections.lock().unwrap();
        connections.remove(&connection_id)?;
        Some(Self::snapshot(&connections))
    }

    /// Current online participants.
    pub fn list_online(&self) -> Vec<String> {
        Self::snapshot(&self.connections.lock().unwrap())
    }

    fn snapshot(connections: &HashMap<Uuid, String>) -> Vec<String> {
        let mut users: Vec<String> = connections.values().cloned().collect();
        users.sort();
        users.dedup();
        users
    }
}
