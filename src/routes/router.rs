//! Router Configuration
//!
//! Assembles all HTTP routes into a single Axum router:
//!
//! - `GET /ws` - WebSocket upgrade for the real-time relay
//! - `POST /conversations`, `GET /conversations/{participant}` -
//!   conversation identity and listing
//! - `GET /messages/{conversation_id}`, `POST /messages` - message
//!   history and REST-path sending
//! - `POST /auth/request`, `POST /auth/verify` - OTP login

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::handlers::{request_otp, verify_otp};
use crate::messaging::handlers::{
    create_conversation, list_conversations, list_messages, send_message,
};
use crate::realtime::session::ws_handler;
use crate::server::state::AppState;

/// Create the Axum router with all routes configured.
pub fn create_router(app_state: AppState) -> Router<()> {
    Router::new()
        .route("/ws", axum::routing::get(ws_handler))
        .route(
            "/conversations",
            axum::routing::post(create_conversation),
        )
        .route(
            "/conversations/{participant}",
            axum::routing::get(list_conversations),
        )
        .route(
            "/messages/{conversation_id}",
            axum::routing::get(list_messages),
        )
        .route("/messages", axum::routing::post(send_message))
        .route("/auth/request", axum::routing::post(request_otp))
        .route("/auth/verify", axum::routing::post(verify_otp))
        .layer(TraceLayer::new_for_http())
        .fallback(|| async { "404 Not Found" })
        .with_state(app_state)
}
