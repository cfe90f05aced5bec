//! Server Configuration
//!
//! Environment-driven configuration and database pool construction.
//! Unlike optional integrations, the database is mandatory: a chat
//! backend that cannot persist messages has nothing to relay, so
//! connection failures at startup are fatal to `main`.

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

/// Connect to the configured database and prepare the schema.
///
/// Reads `DATABASE_URL`; defaults to a local `parley.db` file created on
/// demand.
pub async fn connect_database() -> Result<SqlitePool, sqlx::Error> {
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite:parley.db?mode=rwc".to_string());

    tracing::info!("Connecting to database at {}", database_url);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    sqlx::query("PRAGMA journal_mode=WAL").execute(&pool).await?;
    sqlx::query("PRAGMA synchronous=NORMAL").execute(&pool).await?;
    sqlx::query("PRAGMA foreign_keys=ON").execute(&pool).await?;

    init_schema(&pool).await?;

    tracing::info!("Database ready");
    Ok(pool)
}

/// In-memory database for tests.
///
/// Capped at one connection: every handle must see the same `:memory:`
/// database, and separate pooled connections would each get their own.
pub async fn connect_memory_database() -> Result<SqlitePool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    sqlx::query("PRAGMA foreign_keys=ON").execute(&pool).await?;
    init_schema(&pool).await?;

    Ok(pool)
}

/// Create the schema if it does not exist yet.
///
/// The UNIQUE constraint over the normalized participant pair is load-
/// bearing: it is what guarantees at most one conversation per pair even
/// when two connections race to create it.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            phone_number TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS conversations (
            id TEXT PRIMARY KEY,
            participant_lo TEXT NOT NULL,
            participant_hi TEXT NOT NULL,
            last_message TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE (participant_lo, participant_hi)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS messages (
            id TEXT PRIMARY KEY,
            conversation_id TEXT NOT NULL REFERENCES conversations (id),
            sender TEXT NOT NULL,
            content TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'sent',
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_messages_conversation_created
        ON messages (conversation_id, created_at)
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
