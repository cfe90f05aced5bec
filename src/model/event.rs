//! Real-time wire protocol.
//!
//! Events are JSON objects tagged with a `type` field, e.g.
//!
//! ```json
//! {"type":"typing","conversation_id":"...","participant":"111"}
//! ```
//!
//! `ClientEvent` is what a connection may send; `ServerEvent` is what the
//! relay emits. Malformed or unknown frames are dropped by the session
//! loop; there is no error event on this channel.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::message::{Message, MessageStatus};

/// Events accepted from a client connection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Announce which participant this connection belongs to.
    UserOnline { participant: String },

    /// Join a conversation room; scoped events for that conversation will
    /// be delivered to this connection from now on.
    JoinConversation { conversation_id: Uuid },

    /// Send a message, addressed either by conversation id or by peer
    /// identifier (the latter resolves or creates the conversation).
    SendMessage {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        conversation_id: Option<Uuid>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        receiver: Option<String>,
        sender: String,
        content: String,
    },

    /// Report that this connection's participant has read a message.
    MessageSeen { message_id: Uuid },

    /// The participant started composing in a conversation.
    Typing {
        conversation_id: Uuid,
        participant: String,
    },

    /// The participant stopped composing (explicit stop; the inactivity
    /// debounce lives client-side).
    StopTyping { conversation_id: Uuid },
}

/// Events emitted by the relay.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Full snapshot of online participants; sent to every connection on
    /// each presence change.
    OnlineUsers { users: Vec<String> },

    /// A message was created in a conversation this connection joined.
    ReceiveMessage { message: Message },

    /// A message's delivery status advanced.
    MessageStatusUpdate {
        message_id: Uuid,
        status: MessageStatus,
    },

    /// A peer is composing; never echoed to the originating connection.
    UserTyping {
        conversation_id: Uuid,
        participant: String,
    },

    /// A peer stopped composing (explicitly or by disconnecting).
    UserStopTyping { conversation_id: Uuid },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::message::Message;

    #[test]
    fn test_client_event_tag_names() {
        let event: ClientEvent =
            serde_json::from_str(r#"{"type":"user_online","participant":"111"}"#).unwrap();
        assert_eq!(
            event,
            ClientEvent::UserOnline {
                participant: "111".to_string()
            }
        );
    }

    #[test]
    fn test_send_message_by_receiver() {
        let event: ClientEvent = serde_json::from_str(
            r#"{"type":"send_message","receiver":"222","sender":"111","content":"hi"}"#,
        )
        .unwrap();
        match event {
            ClientEvent::SendMessage {
                conversation_id,
                receiver,
                sender,
                content,
            } => {
                assert!(conversation_id.is_none());
                assert_eq!(receiver.as_deref(), Some("222"));
                assert_eq!(sender, "111");
                assert_eq!(content, "hi");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_server_event_round_trip() {
        let message = Message::new(Uuid::new_v4(), "111", "hi");
        let event = ServerEvent::ReceiveMessage { message };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"receive_message\""));
        let back: ServerEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }

    #[test]
    fn test_status_update_payload() {
        let event = ServerEvent::MessageStatusUpdate {
            message_id: Uuid::nil(),
            status: MessageStatus::Seen,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"message_status_update\""));
        assert!(json.contains("\"status\":\"seen\""));
    }

    #[test]
    fn test_unknown_event_type_is_an_error() {
        let result = serde_json::from_str::<ClientEvent>(r#"{"type":"shrug"}"#);
        assert!(result.is_err());
    }
}
