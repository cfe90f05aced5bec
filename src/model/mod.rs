//! Domain types shared by the REST and relay surfaces.
//!
//! - `conversation` - conversations and the normalized participant pair
//! - `message` - messages and their delivery status
//! - `event` - the real-time wire protocol (client and server events)

pub mod conversation;
pub mod event;
pub mod message;

pub use conversation::{Conversation, ParticipantPair};
pub use event::{ClientEvent, ServerEvent};
pub use message::{Message, MessageStatus};
