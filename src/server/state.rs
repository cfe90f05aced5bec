//! Application State Management
//!
//! `AppState` is the central state container: the database pool, the
//! relay's shared registries (presence, rooms, typing), the process-wide
//! presence broadcast channel, and the pending-OTP store.
//!
//! All of it is cheap to clone and thread-safe: the registries wrap
//! `Arc<Mutex<_>>` internally, the pool and broadcast sender are
//! shareable by design. The `FromRef` implementations let handlers
//! extract just the piece they need instead of the whole state.

use axum::extract::FromRef;
use sqlx::SqlitePool;
use tokio::sync::broadcast;

use crate::auth::OtpStore;
use crate::model::ServerEvent;
use crate::realtime::{PresenceRegistry, RoomRegistry, TypingRegistry};

/// Capacity of the process-wide presence broadcast channel.
const PRESENCE_CAPACITY: usize = 1000;

#[derive(Clone)]
pub struct AppState {
    /// SQLite connection pool; the durable store for users,
    /// conversations, and messages.
    pub db: SqlitePool,

    /// Who is online, indexed by connection.
    pub presence: PresenceRegistry,

    /// Per-conversation delivery scopes.
    pub rooms: RoomRegistry,

    /// Ephemeral typing-indicator state.
    pub typing: TypingRegistry,

    /// Process-wide channel for `online_users` snapshots; every
    /// connection subscribes at open.
    pub presence_tx: broadcast::Sender<ServerEvent>,

    /// Pending one-time login codes.
    pub otp: OtpStore,
}

impl AppState {
    pub fn new(db: SqlitePool) -> Self {
        let (presence_tx, _) = broadcast::channel(PRESENCE_CAPACITY);
        Self {
            db,
            presence: PresenceRegistry::new(),
            rooms: RoomRegistry::new(),
            typing: TypingRegistry::new(),
            presence_tx,
            otp: OtpStore::new(),
        }
    }
}

/// Lets handlers that only read or write the store take
/// `State<SqlitePool>` instead of the whole `AppState`.
impl FromRef<AppState> for SqlitePool {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.db.clone()
    }
}

/// Lets broadcasting handlers take `State<RoomRegistry>` alongside the
/// pool.
impl FromRef<AppState> for RoomRegistry {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.rooms.clone()
    }
}

/// Lets the auth surface reach the pending-code store directly.
impl FromRef<AppState> for OtpStore {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.otp.clone()
    }
}
