//! parley - a minimal real-time 1:1 chat backend.
//!
//! An axum HTTP + WebSocket server that persists conversations and
//! messages in SQLite and relays real-time events between connected
//! clients: presence, room-scoped message delivery, typing indicators,
//! and read receipts.
//!
//! # Module Structure
//!
//! - **`model`** - domain types: conversations (with the normalized
//!   participant pair), messages and their delivery status, and the
//!   tagged-JSON wire protocol
//! - **`messaging`** - conversation/message SQL, the shared
//!   persist-then-broadcast delivery unit, and the REST handlers
//! - **`realtime`** - the relay: presence registry, per-conversation
//!   rooms, typing state, and the WebSocket session loop
//! - **`auth`** - OTP phone login and JWT session tokens
//! - **`server`** - configuration, shared state, initialization
//! - **`routes`** - router assembly
//! - **`error`** - the error taxonomy and its HTTP conversion
//!
//! # Invariants
//!
//! Three properties hold everywhere:
//!
//! 1. At most one conversation exists per unordered participant pair,
//!    enforced by a storage-level UNIQUE constraint over the normalized
//!    pair (creation races retry the lookup instead of failing).
//! 2. A message's status only moves forward (`sent -> delivered ->
//!    seen`), and each transition is broadcast at most once.
//! 3. Conversation-scoped events are delivered only to connections
//!    joined to that conversation's room.

pub mod auth;
pub mod error;
pub mod messaging;
pub mod model;
pub mod realtime;
pub mod routes;
pub mod server;
