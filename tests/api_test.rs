//! REST API integration tests.

use axum_test::TestServer;
use pretty_assertions::assert_eq;
use serde_json::json;

use parley::model::{Conversation, Message, MessageStatus};
use parley::routes::create_router;
use parley::server::config::connect_memory_database;
use parley::server::state::AppState;

async fn create_test_state() -> AppState {
    let pool = connect_memory_database()
        .await
        .expect("failed to open in-memory database");
    AppState::new(pool)
}

async fn create_test_server(state: AppState) -> TestServer {
    TestServer::new(create_router(state)).unwrap()
}

#[tokio::test]
async fn test_create_conversation_is_order_independent() {
    let state = create_test_state().await;
    let server = create_test_server(state).await;

    let first: Conversation = server
        .post("/conversations")
        .json(&json!({"participant_a": "111", "participant_b": "222"}))
        .await
        .json();

    let second: Conversation = server
        .post("/conversations")
        .json(&json!({"participant_a": "222", "participant_b": "111"}))
        .await
        .json();

    assert_eq!(first.id, second.id);
    assert_eq!(first.participants, vec!["111", "222"]);

    let listed: Vec<Conversation> = server.get("/conversations/111").await.json();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn test_create_conversation_rejects_identical_participants() {
    let state = create_test_state().await;
    let server = create_test_server(state).await;

    let response = server
        .post("/conversations")
        .json(&json!({"participant_a": "111", "participant_b": "111"}))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], 400);
    assert!(body["error"].as_str().unwrap().contains("distinct"));
}

#[tokio::test]
async fn test_send_and_list_messages() {
    let state = create_test_state().await;
    let server = create_test_server(state).await;

    let conversation: Conversation = server
        .post("/conversations")
        .json(&json!({"participant_a": "111", "participant_b": "222"}))
        .await
        .json();

    let message: Message = server
        .post("/messages")
        .json(&json!({
            "conversation_id": conversation.id,
            "sender": "111",
            "content": "hi"
        }))
        .await
        .json();

    assert_eq!(message.sender, "111");
    assert_eq!(message.content, "hi");
    assert_eq!(message.status, MessageStatus::Sent);

    let messages: Vec<Message> = server
        .get(&format!("/messages/{}", conversation.id))
        .await
        .json();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].id, message.id);

    // The conversation summary reflects the message.
    let listed: Vec<Conversation> = server.get("/conversations/222").await.json();
    assert_eq!(listed[0].last_message, "hi");
}

#[tokio::test]
async fn test_conversations_sorted_by_recent_activity() {
    let state = create_test_state().await;
    let server = create_test_server(state).await;

    let older: Conversation = server
        .post("/conversations")
        .json(&json!({"participant_a": "111", "participant_b": "222"}))
        .await
        .json();
    let newer: Conversation = server
        .post("/conversations")
        .json(&json!({"participant_a": "111", "participant_b": "333"}))
        .await
        .json();

    server
        .post("/messages")
        .json(&json!({"conversation_id": older.id, "sender": "111", "content": "one"}))
        .await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    server
        .post("/messages")
        .json(&json!({"conversation_id": newer.id, "sender": "111", "content": "two"}))
        .await;

    let listed: Vec<Conversation> = server.get("/conversations/111").await.json();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, newer.id);
    assert_eq!(listed[1].id, older.id);
}

#[tokio::test]
async fn test_message_rejections() {
    let state = create_test_state().await;
    let server = create_test_server(state).await;

    let conversation: Conversation = server
        .post("/conversations")
        .json(&json!({"participant_a": "111", "participant_b": "222"}))
        .await
        .json();

    // Empty content.
    let response = server
        .post("/messages")
        .json(&json!({"conversation_id": conversation.id, "sender": "111", "content": "  "}))
        .await;
    assert_eq!(response.status_code(), 400);

    // Sender outside the conversation.
    let response = server
        .post("/messages")
        .json(&json!({"conversation_id": conversation.id, "sender": "999", "content": "hi"}))
        .await;
    assert_eq!(response.status_code(), 400);

    // Unknown conversation.
    let response = server
        .post("/messages")
        .json(&json!({"conversation_id": uuid::Uuid::new_v4(), "sender": "111", "content": "hi"}))
        .await;
    assert_eq!(response.status_code(), 404);

    // Nothing was persisted by any of the rejected requests.
    let messages: Vec<Message> = server
        .get(&format!("/messages/{}", conversation.id))
        .await
        .json();
    assert!(messages.is_empty());
}

#[tokio::test]
async fn test_list_messages_unknown_conversation_is_404() {
    let state = create_test_state().await;
    let server = create_test_server(state).await;

    let response = server
        .get(&format!("/messages/{}", uuid::Uuid::new_v4()))
        .await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_otp_login_flow() {
    let state = create_test_state().await;
    let server = create_test_server(state.clone()).await;

    let response = server
        .post("/auth/request")
        .json(&json!({"phone_number": "111"}))
        .await;
    assert_eq!(response.status_code(), 200);

    // The mock gateway only logs the code; issue one directly for the
    // verification step.
    let code = state.otp.issue("111");

    let wrong = server
        .post("/auth/verify")
        .json(&json!({"phone_number": "111", "otp": "999999"}))
        .await;
    assert_eq!(wrong.status_code(), 401);

    let response = server
        .post("/auth/verify")
        .json(&json!({"phone_number": "111", "otp": code}))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["is_new_user"], true);
    assert_eq!(body["user"]["phone_number"], "111");

    let claims =
        parley::auth::sessions::verify_token(body["token"].as_str().unwrap()).unwrap();
    assert_eq!(claims.phone_number, "111");

    // Second login with a fresh code: same user, not new anymore.
    let code = state.otp.issue("111");
    let response = server
        .post("/auth/verify")
        .json(&json!({"phone_number": "111", "otp": code}))
        .await;
    let again: serde_json::Value = response.json();
    assert_eq!(again["is_new_user"], false);
    assert_eq!(again["user"]["id"], body["user"]["id"]);
}

#[tokio::test]
async fn test_auth_request_requires_phone_number() {
    let state = create_test_state().await;
    let server = create_test_server(state).await;

    let response = server
        .post("/auth/request")
        .json(&json!({"phone_number": "  "}))
        .await;
    assert_eq!(response.status_code(), 400);
}
