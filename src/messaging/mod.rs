//! Messaging: conversations and messages.
//!
//! `db` holds the SQL; `handlers` the REST surface. The delivery helpers
//! below are the single persist-then-broadcast unit shared by the REST
//! and relay paths, so both surfaces behave identically: a message is
//! never broadcast unless it (and the conversation summary update)
//! committed, and every committed message is offered to the room.

pub mod db;
pub mod handlers;

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::ApiError;
use crate::model::{Message, ServerEvent};
use crate::realtime::RoomRegistry;

/// Persist a message in an existing conversation and broadcast it to the
/// conversation's room.
pub async fn deliver_message(
    pool: &SqlitePool,
    rooms: &RoomRegistry,
    conversation_id: Uuid,
    sender: &str,
    content: &str,
) -> Result<Message, ApiError> {
    let message = db::store_message(pool, conversation_id, sender, content).await?;
    let reached = rooms.broadcast(
        message.conversation_id,
        None,
        ServerEvent::ReceiveMessage {
            message: message.clone(),
        },
    );
    tracing::debug!(
        "[Messaging] message {} delivered to {} room member(s)",
        message.id,
        reached
    );
    Ok(message)
}

/// Like [`deliver_message`] but addressed by peer: resolves (or creates)
/// the conversation for the pair first.
pub async fn deliver_message_between(
    pool: &SqlitePool,
    rooms: &RoomRegistry,
    sender: &str,
    receiver: &str,
    content: &str,
) -> Result<Message, ApiError> {
    let conversation = db::resolve_conversation(pool, sender, receiver).await?;
    deliver_message(pool, rooms, conversation.id, sender, content).await
}
