//! Server Initialization
//!
//! Builds the application: connect the database, assemble the shared
//! state, configure the router.

use axum::Router;
use sqlx::SqlitePool;

use crate::routes::router::create_router;
use crate::server::config::connect_database;
use crate::server::state::AppState;

/// Create the application with the configured database.
pub async fn create_app() -> Result<Router, sqlx::Error> {
    let pool = connect_database().await?;
    Ok(create_app_with_pool(pool))
}

/// Create the application over an existing pool.
///
/// Tests use this with an in-memory database; see
/// [`crate::server::config::connect_memory_database`].
pub fn create_app_with_pool(pool: SqlitePool) -> Router {
    let state = AppState::new(pool);
    create_router(state)
}
