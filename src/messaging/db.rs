//! Database operations for conversations and messages.
//!
//! All SQL for the messaging domain lives here. UUIDs are stored as TEXT,
//! timestamps as RFC3339 TEXT.

use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::error::ApiError;
use crate::model::{Conversation, Message, MessageStatus, ParticipantPair};

fn parse_timestamp(raw: &str) -> chrono::DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn conversation_from_row(row: &sqlx::sqlite::SqliteRow) -> Conversation {
    Conversation {
        id: Uuid::parse_str(row.get::<String, _>("id").as_str()).unwrap_or_default(),
        participants: vec![
            row.get::<String, _>("participant_lo"),
            row.get::<String, _>("participant_hi"),
        ],
        last_message: row.get("last_message"),
        created_at: parse_timestamp(row.get::<String, _>("created_at").as_str()),
        updated_at: parse_timestamp(row.get::<String, _>("updated_at").as_str()),
    }
}

fn message_from_row(row: &sqlx::sqlite::SqliteRow) -> Message {
    Message {
        id: Uuid::parse_str(row.get::<String, _>("id").as_str()).unwrap_or_default(),
        conversation_id: Uuid::parse_str(row.get::<String, _>("conversation_id").as_str())
            .unwrap_or_default(),
        sender: row.get("sender"),
        content: row.get("content"),
        status: MessageStatus::from_str(row.get::<String, _>("status").as_str()),
        created_at: parse_timestamp(row.get::<String, _>("created_at").as_str()),
    }
}

/// Look up the conversation for a normalized pair.
pub async fn find_conversation_by_pair(
    pool: &SqlitePool,
    pair: &ParticipantPair,
) -> Result<Option<Conversation>, ApiError> {
    let row = sqlx::query(
        r#"
        SELECT id, participant_lo, participant_hi, last_message, created_at, updated_at
        FROM conversations
        WHERE participant_lo = ? AND participant_hi = ?
        "#,
    )
    .bind(pair.lo())
    .bind(pair.hi())
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(conversation_from_row))
}

/// Get a conversation by id.
pub async fn get_conversation(
    pool: &SqlitePool,
    conversation_id: Uuid,
) -> Result<Option<Conversation>, ApiError> {
    let row = sqlx::query(
        r#"
        SELECT id, participant_lo, participant_hi, last_message, created_at, updated_at
        FROM conversations
        WHERE id = ?
        "#,
    )
    .bind(conversation_id.to_string())
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(conversation_from_row))
}

/// Find or create the single conversation for a participant pair.
///
/// The UNIQUE constraint over the normalized pair is the arbiter under
/// concurrency: when two connections race to create the same pair's
/// conversation, the loser's INSERT fails with a uniqueness violation and
/// the winner's row is returned instead. The race never surfaces to the
/// caller.
pub async fn resolve_conversation(
    pool: &SqlitePool,
    participant_a: &str,
    participant_b: &str,
) -> Result<Conversation, ApiError> {
    let pair = ParticipantPair::new(participant_a, participant_b)?;

    if let Some(existing) = find_conversation_by_pair(pool, &pair).await? {
        return Ok(existing);
    }

    let conversation = Conversation::new(&pair);
    let result = sqlx::query(
        r#"
        INSERT INTO conversations (id, participant_lo, participant_hi, last_message, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(conversation.id.to_string())
    .bind(pair.lo())
    .bind(pair.hi())
    .bind(&conversation.last_message)
    .bind(conversation.created_at.to_rfc3339())
    .bind(conversation.updated_at.to_rfc3339())
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(conversation),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            tracing::debug!(
                "[Messaging] lost conversation-creation race for ({}, {}), reusing winner",
                pair.lo(),
                pair.hi()
            );
            find_conversation_by_pair(pool, &pair)
                .await?
                .ok_or_else(|| ApiError::not_found("conversation disappeared after creation race"))
        }
        Err(e) => Err(e.into()),
    }
}

/// List a participant's conversations, most recently active first.
pub async fn list_conversations_for_participant(
    pool: &SqlitePool,
    participant: &str,
) -> Result<Vec<Conversation>, ApiError> {
    let rows = sqlx::query(
        r#"
        SELECT id, participant_lo, participant_hi, last_message, created_at, updated_at
        FROM conversations
        WHERE participant_lo = ? OR participant_hi = ?
        ORDER BY updated_at DESC
        "#,
    )
    .bind(participant)
    .bind(participant)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(conversation_from_row).collect())
}

/// Persist a new message and update the owning conversation's summary.
///
/// Both writes happen in one transaction: no message row exists without
/// the conversation's `last_message`/`updated_at` reflecting it, and vice
/// versa. The caller broadcasts only after this returns Ok.
pub async fn store_message(
    pool: &SqlitePool,
    conversation_id: Uuid,
    sender: &str,
    content: &str,
) -> Result<Message, ApiError> {
    let sender = sender.trim();
    if sender.is_empty() {
        return Err(ApiError::invalid_message("sender must be non-empty"));
    }
    if content.trim().is_empty() {
        return Err(ApiError::invalid_message("content must be non-empty"));
    }

    let conversation = get_conversation(pool, conversation_id)
        .await?
        .ok_or_else(|| ApiError::not_found("unknown conversation"))?;
    if !conversation.has_participant(sender) {
        return Err(ApiError::invalid_message(
            "sender is not a participant of this conversation",
        ));
    }

    let message = Message::new(conversation_id, sender, content);

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO messages (id, conversation_id, sender, content, status, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(message.id.to_string())
    .bind(message.conversation_id.to_string())
    .bind(&message.sender)
    .bind(&message.content)
    .bind(message.status.as_str())
    .bind(message.created_at.to_rfc3339())
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        UPDATE conversations SET last_message = ?, updated_at = ? WHERE id = ?
        "#,
    )
    .bind(&message.content)
    .bind(message.created_at.to_rfc3339())
    .bind(message.conversation_id.to_string())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(message)
}

/// Get a message by id.
pub async fn get_message(
    pool: &SqlitePool,
    message_id: Uuid,
) -> Result<Option<Message>, ApiError> {
    let row = sqlx::query(
        r#"
        SELECT id, conversation_id, sender, content, status, created_at
        FROM messages
        WHERE id = ?
        "#,
    )
    .bind(message_id.to_string())
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(message_from_row))
}

/// List a conversation's messages in creation order.
pub async fn list_messages_for_conversation(
    pool: &SqlitePool,
    conversation_id: Uuid,
) -> Result<Vec<Message>, ApiError> {
    // rowid breaks ties between messages created in the same instant.
    let rows = sqlx::query(
        r#"
        SELECT id, conversation_id, sender, content, status, created_at
        FROM messages
        WHERE conversation_id = ?
        ORDER BY created_at ASC, rowid ASC
        "#,
    )
    .bind(conversation_id.to_string())
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(message_from_row).collect())
}

/// Advance a message to `seen` on behalf of `observer`.
///
/// Returns the updated message when this call performed the transition,
/// `None` when nothing happened: unknown message, already seen, or the
/// observer is the message's own sender (a sender cannot mark its own
/// message seen). The `None` cases must not produce a broadcast.
pub async fn mark_message_seen(
    pool: &SqlitePool,
    message_id: Uuid,
    observer: &str,
) -> Result<Option<Message>, ApiError> {
    let Some(message) = get_message(pool, message_id).await? else {
        tracing::debug!("[Messaging] mark_seen for unknown message {}", message_id);
        return Ok(None);
    };

    if message.sender == observer {
        tracing::debug!(
            "[Messaging] sender {} tried to mark its own message {} seen",
            observer,
            message_id
        );
        return Ok(None);
    }

    if message.status == MessageStatus::Seen {
        return Ok(None);
    }

    // The guard clause makes the transition idempotent under races: of two
    // concurrent observers, exactly one sees rows_affected == 1.
    let updated = sqlx::query(
        r#"
        UPDATE messages SET status = ? WHERE id = ? AND status != ?
        "#,
    )
    .bind(MessageStatus::Seen.as_str())
    .bind(message_id.to_string())
    .bind(MessageStatus::Seen.as_str())
    .execute(pool)
    .await?;

    if updated.rows_affected() == 0 {
        return Ok(None);
    }

    Ok(Some(Message {
        status: MessageStatus::Seen,
        ..message
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::config::connect_memory_database;

    #[tokio::test]
    async fn test_resolve_is_order_independent() {
        let pool = connect_memory_database().await.unwrap();

        let first = resolve_conversation(&pool, "111", "222").await.unwrap();
        let second = resolve_conversation(&pool, "222", "111").await.unwrap();
        assert_eq!(first.id, second.id);

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM conversations")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count.0, 1);
    }

    #[tokio::test]
    async fn test_resolve_rejects_invalid_pairs() {
        let pool = connect_memory_database().await.unwrap();

        assert!(resolve_conversation(&pool, "111", "111").await.is_err());
        assert!(resolve_conversation(&pool, "", "222").await.is_err());
    }

    #[tokio::test]
    async fn test_ingest_updates_conversation_summary() {
        let pool = connect_memory_database().await.unwrap();
        let conversation = resolve_conversation(&pool, "111", "222").await.unwrap();

        let message = store_message(&pool, conversation.id, "111", "hi")
            .await
            .unwrap();
        assert_eq!(message.status, MessageStatus::Sent);

        let reloaded = get_conversation(&pool, conversation.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.last_message, "hi");
        assert!(reloaded.updated_at >= conversation.updated_at);
    }

    #[tokio::test]
    async fn test_ingest_rejects_empty_content() {
        let pool = connect_memory_database().await.unwrap();
        let conversation = resolve_conversation(&pool, "111", "222").await.unwrap();

        let result = store_message(&pool, conversation.id, "111", "   ").await;
        assert!(matches!(result, Err(ApiError::InvalidMessage { .. })));

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM messages")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count.0, 0);
    }

    #[tokio::test]
    async fn test_ingest_rejects_non_participant_sender() {
        let pool = connect_memory_database().await.unwrap();
        let conversation = resolve_conversation(&pool, "111", "222").await.unwrap();

        let result = store_message(&pool, conversation.id, "999", "hi").await;
        assert!(matches!(result, Err(ApiError::InvalidMessage { .. })));
    }

    #[tokio::test]
    async fn test_ingest_unknown_conversation() {
        let pool = connect_memory_database().await.unwrap();

        let result = store_message(&pool, Uuid::new_v4(), "111", "hi").await;
        assert!(matches!(result, Err(ApiError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_mark_seen_is_idempotent() {
        let pool = connect_memory_database().await.unwrap();
        let conversation = resolve_conversation(&pool, "111", "222").await.unwrap();
        let message = store_message(&pool, conversation.id, "111", "hi")
            .await
            .unwrap();

        let first = mark_message_seen(&pool, message.id, "222").await.unwrap();
        assert_eq!(first.unwrap().status, MessageStatus::Seen);

        let second = mark_message_seen(&pool, message.id, "222").await.unwrap();
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn test_mark_seen_rejects_sender() {
        let pool = connect_memory_database().await.unwrap();
        let conversation = resolve_conversation(&pool, "111", "222").await.unwrap();
        let message = store_message(&pool, conversation.id, "111", "hi")
            .await
            .unwrap();

        let outcome = mark_message_seen(&pool, message.id, "111").await.unwrap();
        assert!(outcome.is_none());

        let reloaded = get_message(&pool, message.id).await.unwrap().unwrap();
        assert_eq!(reloaded.status, MessageStatus::Sent);
    }

    #[tokio::test]
    async fn test_mark_seen_unknown_message_is_noop() {
        let pool = connect_memory_database().await.unwrap();
        let outcome = mark_message_seen(&pool, Uuid::new_v4(), "222").await.unwrap();
        assert!(outcome.is_none());
    }

    #[tokio::test]
    async fn test_message_listing_order() {
        let pool = connect_memory_database().await.unwrap();
        let conversation = resolve_conversation(&pool, "111", "222").await.unwrap();

        store_message(&pool, conversation.id, "111", "one")
            .await
            .unwrap();
        store_message(&pool, conversation.id, "222", "two")
            .await
            .unwrap();
        store_message(&pool, conversation.id, "111", "three")
            .await
            .unwrap();

        let messages = list_messages_for_conversation(&pool, conversation.id)
            .await
            .unwrap();
        let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn test_conversation_listing_sorted_by_activity() {
        let pool = connect_memory_database().await.unwrap();
        let older = resolve_conversation(&pool, "111", "222").await.unwrap();
        let newer = resolve_conversation(&pool, "111", "333").await.unwrap();

        store_message(&pool, older.id, "111", "first").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store_message(&pool, newer.id, "111", "second")
            .await
            .unwrap();

        let conversations = list_conversations_for_participant(&pool, "111")
            .await
            .unwrap();
        assert_eq!(conversations.len(), 2);
        assert_eq!(conversations[0].id, newer.id);
        assert_eq!(conversations[1].id, older.id);

        // "222" sees only its own conversation.
        let peer_view = list_conversations_for_participant(&pool, "222")
            .await
            .unwrap();
        assert_eq!(peer_view.len(), 1);
        assert_eq!(peer_view[0].id, older.id);
    }

    #[tokio::test]
    async fn test_concurrent_resolve_creates_one_row() {
        let pool = connect_memory_database().await.unwrap();

        let (a, b) = tokio::join!(
            resolve_conversation(&pool, "111", "222"),
            resolve_conversation(&pool, "222", "111"),
        );
        assert_eq!(a.unwrap().id, b.unwrap().id);

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM conversations")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count.0, 1);
    }
}
