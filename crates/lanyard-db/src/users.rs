use crate::{DbError, DbPool};
use chrono::{DateTime, Utc};

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub full_name: Option<String>,
    pub role: String,
    pub blocked: bool,
    pub created_at: DateTime<Utc>,
}

pub async fn get_user_by_id(pool: &DbPool, id: i64) -> Result<Option<UserRow>, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, email, full_name, role, blocked, created_at FROM users WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Fetch the account for an authenticated subject, creating it on first
/// sight. The first account ever created is promoted to ADMIN inside the
/// same transaction so concurrent first logins cannot both win; everyone
/// after that starts as STAFF.
pub async fn get_or_create_user(
    pool: &DbPool,
    id: i64,
    email: &str,
    full_name: Option<&str>,
) -> Result<UserRow, DbError> {
    if let Some(existing) = get_user_by_id(pool, id).await? {
        return Ok(existing);
    }

    let normalized_email = normalize_email(email);
    let mut tx = pool.begin().await?;
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(&mut *tx)
        .await?;
    let role = if count == 0 { "ADMIN" } else { "STAFF" };

    let row = sqlx::query_as::<_, UserRow>(
        "INSERT INTO users (id, email, full_name, role)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT (id) DO UPDATE SET email = excluded.email
         RETURNING id, email, full_name, role, blocked, created_at",
    )
    .bind(id)
    .bind(normalized_email)
    .bind(full_name)
    .bind(role)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(row)
}

pub async fn set_role(pool: &DbPool, id: i64, role: &str) -> Result<UserRow, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "UPDATE users SET role = ?2 WHERE id = ?1
         RETURNING id, email, full_name, role, blocked, created_at",
    )
    .bind(id)
    .bind(role)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;
    Ok(row)
}

pub async fn set_blocked(pool: &DbPool, id: i64, blocked: bool) -> Result<(), DbError> {
    let result = sqlx::query("UPDATE users SET blocked = ?2 WHERE id = ?1")
        .bind(id)
        .bind(blocked)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

pub async fn list_users(pool: &DbPool) -> Result<Vec<UserRow>, DbError> {
    let rows = sqlx::query_as::<_, UserRow>(
        "SELECT id, email, full_name, role, blocked, created_at FROM users ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
