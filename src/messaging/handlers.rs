//! Messaging HTTP Handlers
//!
//! The REST surface over conversations and messages:
//!
//! - `POST /conversations` - find-or-create the conversation for a pair
//! - `GET /conversations/{participant}` - a participant's conversations,
//!   most recently active first
//! - `GET /messages/{conversation_id}` - a conversation's messages in
//!   creation order
//! - `POST /messages` - persist and broadcast a message (for clients
//!   without an open real-time channel)

use axum::{
    extract::{Path, State},
    Json,
};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::ApiError;
use crate::model::conversation::CreateConversationRequest;
use crate::model::message::SendMessageRequest;
use crate::model::{Conversation, Message};
use crate::realtime::RoomRegistry;

use super::db;

/// Create or fetch the conversation for a participant pair.
pub async fn create_conversation(
    State(pool): State<SqlitePool>,
    Json(request): Json<CreateConversationRequest>,
) -> Result<Json<Conversation>, ApiError> {
    let conversation =
        db::resolve_conversation(&pool, &request.participant_a, &request.participant_b).await?;
    Ok(Json(conversation))
}

/// List a participant's conversations.
pub async fn list_conversations(
    State(pool): State<SqlitePool>,
    Path(participant): Path<String>,
) -> Result<Json<Vec<Conversation>>, ApiError> {
    let conversations = db::list_conversations_for_participant(&pool, &participant).await?;
    Ok(Json(conversations))
}

/// List a conversation's messages.
pub async fn list_messages(
    State(pool): State<SqlitePool>,
    Path(conversation_id): Path<Uuid>,
) -> Result<Json<Vec<Message>>, ApiError> {
    if db::get_conversation(&pool, conversation_id).await?.is_none() {
        return Err(ApiError::not_found("unknown conversation"));
    }
    let messages = db::list_messages_for_conversation(&pool, conversation_id).await?;
    Ok(Json(messages))
}

/// Persist a message and broadcast it to the conversation's room.
pub async fn send_message(
    State(pool): State<SqlitePool>,
    State(rooms): State<RoomRegistry>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<Message>, ApiError> {
    let message = super::deliver_message(
        &pool,
        &rooms,
        request.conversation_id,
        &request.sender,
        &request.content,
    )
    .await?;
    Ok(Json(message))
}
