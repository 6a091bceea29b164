use crate::{DbError, DbPool};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuditEntryRow {
    pub id: i64,
    pub actor_id: i64,
    pub action: String,
    pub target_id: Option<i64>,
    pub allowed: bool,
    pub detail: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Record a role-guard decision. Written for grants and denials alike so
/// the trail shows who tried what, not only who succeeded.
pub async fn create_entry(
    pool: &DbPool,
    id: i64,
    actor_id: i64,
    action: &str,
    target_id: Option<i64>,
    allowed: bool,
    detail: Option<&str>,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO audit_log (id, actor_id, action, target_id, allowed, detail)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(id)
    .bind(actor_id)
    .bind(action)
    .bind(target_id)
    .bind(allowed)
    .bind(detail)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn entries_for_actor(
    pool: &DbPool,
    actor_id: i64,
    limit: i64,
) -> Result<Vec<AuditEntryRow>, DbError> {
    let rows = sqlx::query_as::<_, AuditEntryRow>(
        "SELECT id, actor_id, action, target_id, allowed, detail, created_at
         FROM audit_log WHERE actor_id = ?1
         ORDER BY id DESC LIMIT ?2",
    )
    .bind(actor_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
