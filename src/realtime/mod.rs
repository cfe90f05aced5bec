//! Real-time relay.
//!
//! The relay mediates all live events between connected clients:
//!
//! - **`presence`** - process-wide online-participant registry
//! - **`rooms`** - per-conversation delivery scopes (broadcast channels)
//! - **`typing`** - ephemeral typing-indicator state
//! - **`session`** - the WebSocket connection loop and event dispatch
//!
//! The relay owns no timers. The only time-based behavior in the
//! protocol, the typing debounce, is client-owned; the relay forwards
//! typing signals and synthesizes the stop-typing broadcast when a
//! connection disconnects mid-composition.

pub mod presence;
pub mod rooms;
pub mod session;
pub mod typing;

pub use presence::PresenceRegistry;
pub use rooms::{RoomEvent, RoomRegistry};
pub use session::{apply_client_event, disconnect_cleanup, Session};
pub use typing::TypingRegistry;
