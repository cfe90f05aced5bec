//! User records and their database operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::error::ApiError;

/// A registered user, identified by phone number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub phone_number: String,
    /// Optional display name; empty until the user sets one.
    pub name: String,
    pub created_at: DateTime<Utc>,
}

fn user_from_row(row: &sqlx::sqlite::SqliteRow) -> User {
    User {
        id: Uuid::parse_str(row.get::<String, _>("id").as_str()).unwrap_or_default(),
        phone_number: row.get("phone_number"),
        name: row.get("name"),
        created_at: chrono::DateTime::parse_from_rfc3339(
            row.get::<String, _>("created_at").as_str(),
        )
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now()),
    }
}

/// Get a user by phone number.
pub async fn get_user_by_phone(
    pool: &SqlitePool,
    phone_number: &str,
) -> Result<Option<User>, ApiError> {
    let row = sqlx::query(
        r#"
        SELECT id, phone_number, name, created_at
        FROM users
        WHERE phone_number = ?
        "#,
    )
    .bind(phone_number)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(user_from_row))
}

/// Find the user for a phone number, creating the row on first login.
///
/// Returns the user and whether it was just created. The UNIQUE
/// constraint on `phone_number` settles concurrent first logins the same
/// way the conversation resolver settles pair races.
pub async fn find_or_create_user(
    pool: &SqlitePool,
    phone_number: &str,
) -> Result<(User, bool), ApiError> {
    if let Some(existing) = get_user_by_phone(pool, phone_number).await? {
        return Ok((existing, false));
    }

    let user = User {
        id: Uuid::new_v4(),
        phone_number: phone_number.to_string(),
        name: String::new(),
        created_at: Utc::now(),
    };

    let result = sqlx::query(
        r#"
        INSERT INTO users (id, phone_number, name, created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(user.id.to_string())
    .bind(&user.phone_number)
    .bind(&user.name)
    .bind(user.created_at.to_rfc3339())
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok((user, true)),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            let existing = get_user_by_phone(pool, phone_number)
                .await?
                .ok_or_else(|| ApiError::not_found("user disappeared after creation race"))?;
            Ok((existing, false))
        }
        Err(e) => Err(e.into()),
    }
}
