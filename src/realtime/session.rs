//! WebSocket session loop and event dispatch.
//!
//! One task per connection. Incoming frames are parsed into
//! [`ClientEvent`]s and dispatched; outgoing events funnel through a
//! per-connection mpsc outbox drained by a dedicated send task, so room
//! forwarders and the presence feed never write to the socket directly.
//!
//! Everything here is fire-and-forget: malformed frames and rejected
//! events are logged and dropped, and nothing a single connection does
//! can take down the relay or other connections.

use std::collections::{HashMap, HashSet};

use axum::{
    extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
    extract::State,
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::ApiError;
use crate::messaging;
use crate::model::{ClientEvent, ServerEvent};
use crate::server::state::AppState;

/// Per-connection bookkeeping.
///
/// Lives on the connection's task; all cross-connection state is in
/// [`AppState`]. The outbox is the only way events reach this
/// connection's socket.
pub struct Session {
    pub connection_id: Uuid,
    /// Identity announced via `user_online`, if any.
    pub participant: Option<String>,
    joined: HashSet<Uuid>,
    /// Conversations this connection is actively typing in, with the
    /// identity used, so disconnect can synthesize the stop signals.
    typing_in: HashMap<Uuid, String>,
    outbox: mpsc::UnboundedSender<ServerEvent>,
    room_tasks: Vec<JoinHandle<()>>,
}

impl Session {
    pub fn new(outbox: mpsc::UnboundedSender<ServerEvent>) -> Self {
        Self {
            connection_id: Uuid::new_v4(),
            participant: None,
            joined: HashSet::new(),
            typing_in: HashMap::new(),
            outbox,
            room_tasks: Vec::new(),
        }
    }
}

/// Handle the WebSocket upgrade (GET /ws).
pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

/// Serve one WebSocket connection until it closes.
pub async fn handle_connection(socket: WebSocket, state: AppState) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (outbox_tx, mut outbox_rx) = mpsc::unbounded_channel::<ServerEvent>();
    let mut session = Session::new(outbox_tx.clone());

    tracing::debug!("[Relay] connection {} opened", session.connection_id);

    // Every connection receives presence snapshots, identified or not.
    let mut presence_rx = state.presence_tx.subscribe();
    let presence_outbox = outbox_tx.clone();
    let presence_task = tokio::spawn(async move {
        loop {
            match presence_rx.recv().await {
                Ok(event) => {
                    if presence_outbox.send(event).is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("[Relay] presence feed lagged, skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    // Drain the outbox onto the socket.
    let send_task = tokio::spawn(async move {
        while let Some(event) = outbox_rx.recv().await {
            let payload = match serde_json::to_string(&event) {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::error!("[Relay] failed to serialize event: {:?}", e);
                    continue;
                }
            };
            if ws_tx.send(WsMessage::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(frame)) = ws_rx.next().await {
        match frame {
            WsMessage::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => apply_client_event(&state, &mut session, event).await,
                Err(e) => {
                    tracing::debug!("[Relay] dropped malformed frame: {}", e);
                }
            },
            WsMessage::Close(_) => break,
            _ => {}
        }
    }

    presence_task.abort();
    disconnect_cleanup(&state, &mut session);
    send_task.abort();
}

/// Dispatch one client event against the shared state.
///
/// Separated from the socket loop so the protocol can be driven directly
/// in tests.
pub async fn apply_client_event(state: &AppState, session: &mut Session, event: ClientEvent) {
    match event {
        ClientEvent::UserOnline { participant } => {
            let participant = participant.trim().to_string();
            if participant.is_empty() {
                tracing::debug!("[Relay] dropped user_online with empty participant");
                return;
            }
            let users = state.presence.mark_online(session.connection_id, &participant);
            session.participant = Some(participant);
            let _ = state.presence_tx.send(ServerEvent::OnlineUsers { users });
        }

        ClientEvent::JoinConversation { conversation_id } => {
            join_room(state, session, conversation_id);
        }

        ClientEvent::SendMessage {
            conversation_id,
            receiver,
            sender,
            content,
        } => {
            let result = match (conversation_id, receiver) {
                (Some(conversation_id), _) => {
                    messaging::deliver_message(
                        &state.db,
                        &state.rooms,
                        conversation_id,
                        &sender,
                        &content,
                    )
                    .await
                }
                (None, Some(receiver)) => {
                    messaging::deliver_message_between(
                        &state.db,
                        &state.rooms,
                        &sender,
                        &receiver,
                        &content,
                    )
                    .await
                }
                (None, None) => Err(ApiError::invalid_message(
                    "send_message needs a conversation_id or a receiver",
                )),
            };
            if let Err(e) = result {
                tracing::debug!("[Relay] dropped send_message: {}", e);
            }
        }

        ClientEvent::MessageSeen { message_id } => {
            let Some(observer) = session.participant.clone() else {
                tracing::debug!("[Relay] dropped message_seen from unidentified connection");
                return;
            };
            match messaging::db::mark_message_seen(&state.db, message_id, &observer).await {
                Ok(Some(message)) => {
                    state.rooms.broadcast(
                        message.conversation_id,
                        None,
                        ServerEvent::MessageStatusUpdate {
                            message_id: message.id,
                            status: message.status,
                        },
                    );
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!("[Relay] dropped message_seen: {}", e);
                }
            }
        }

        ClientEvent::Typing {
            conversation_id,
            participant,
        } => {
            if state.typing.start(conversation_id, &participant) {
                session
                    .typing_in
                    .insert(conversation_id, participant.clone());
                state.rooms.broadcast(
                    conversation_id,
                    Some(session.connection_id),
                    ServerEvent::UserTyping {
                        conversation_id,
                        participant,
                    },
                );
            }
        }

        ClientEvent::StopTyping { conversation_id } => {
            if let Some(participant) = session.typing_in.remove(&conversation_id) {
                if state.typing.stop(conversation_id, &participant) {
                    state.rooms.broadcast(
                        conversation_id,
                        None,
                        ServerEvent::UserStopTyping { conversation_id },
                    );
                }
            }
        }
    }
}

/// Subscribe the connection to a conversation's room and start forwarding
/// its events into the outbox. Joining twice is a no-op.
fn join_room(state: &AppState, session: &mut Session, conversation_id: Uuid) {
    if !session.joined.insert(conversation_id) {
        return;
    }

    let mut room_rx = state.rooms.subscribe(conversation_id);
    let outbox = session.outbox.clone();
    let connection_id = session.connection_id;

    let task = tokio::spawn(async move {
        loop {
            match room_rx.recv().await {
                Ok(room_event) => {
                    // Typing indicators are never echoed to their origin.
                    if room_event.origin == Some(connection_id) {
                        continue;
                    }
                    if outbox.send(room_event.event).is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        "[Relay] room {} feed lagged for connection {}, skipped {} events",
                        conversation_id,
                        connection_id,
                        skipped
                    );
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
    session.room_tasks.push(task);
}

/// Tear down a connection's footprint in the shared state.
///
/// Synthesizes `user_stop_typing` for every conversation the connection
/// was composing in (a disconnected peer must not leave a stuck typing
/// indicator) and withdraws its presence entry.
pub fn disconnect_cleanup(state: &AppState, session: &mut Session) {
    for task in session.room_tasks.drain(..) {
        task.abort();
    }

    for (conversation_id, participant) in session.typing_in.drain() {
        if state.typing.stop(conversation_id, &participant) {
            state.rooms.broadcast(
                conversation_id,
                None,
                ServerEvent::UserStopTyping { conversation_id },
            );
        }
    }

    if let Some(users) = state.presence.mark_offline(session.connection_id) {
        let _ = state.presence_tx.send(ServerEvent::OnlineUsers { users });
    }

    tracing::debug!("[Relay] connection {} closed", session.connection_id);
}
