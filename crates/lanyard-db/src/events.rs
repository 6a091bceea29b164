use crate::{DbError, DbPool};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EventRow {
    pub id: i64,
    pub name: String,
    pub location: String,
    pub description: Option<String>,
    pub event_date: DateTime<Utc>,
    pub status: String,
    pub created_by: i64,
    pub diploma_template_path: Option<String>,
    pub diploma_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Optional fields for a partial event update. `None` leaves the stored
/// value untouched.
#[derive(Debug, Clone, Default)]
pub struct EventPatch<'a> {
    pub name: Option<&'a str>,
    pub location: Option<&'a str>,
    pub description: Option<&'a str>,
    pub event_date: Option<DateTime<Utc>>,
    pub status: Option<&'a str>,
    pub diploma_enabled: Option<bool>,
}

pub async fn create_event(
    pool: &DbPool,
    id: i64,
    name: &str,
    location: &str,
    description: Option<&str>,
    event_date: DateTime<Utc>,
    created_by: i64,
) -> Result<EventRow, DbError> {
    let row = sqlx::query_as::<_, EventRow>(
        "INSERT INTO events (id, name, location, description, event_date, created_by)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         RETURNING id, name, location, description, event_date, status, created_by,
                   diploma_template_path, diploma_enabled, created_at, updated_at",
    )
    .bind(id)
    .bind(name)
    .bind(location)
    .bind(description)
    .bind(event_date)
    .bind(created_by)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn get_event(pool: &DbPool, id: i64) -> Result<Option<EventRow>, DbError> {
    let row = sqlx::query_as::<_, EventRow>(
        "SELECT id, name, location, description, event_date, status, created_by,
                diploma_template_path, diploma_enabled, created_at, updated_at
         FROM events WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn list_events(pool: &DbPool) -> Result<Vec<EventRow>, DbError> {
    let rows = sqlx::query_as::<_, EventRow>(
        "SELECT id, name, location, description, event_date, status, created_by,
                diploma_template_path, diploma_enabled, created_at, updated_at
         FROM events ORDER BY event_date DESC",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn update_event(
    pool: &DbPool,
    id: i64,
    patch: EventPatch<'_>,
) -> Result<EventRow, DbError> {
    let row = sqlx::query_as::<_, EventRow>(
        "UPDATE events SET
             name = COALESCE(?2, name),
             location = COALESCE(?3, location),
             description = COALESCE(?4, description),
             event_date = COALESCE(?5, event_date),
             status = COALESCE(?6, status),
             diploma_enabled = COALESCE(?7, diploma_enabled),
             updated_at = datetime('now')
         WHERE id = ?1
         RETURNING id, name, location, description, event_date, status, created_by,
                   diploma_template_path, diploma_enabled, created_at, updated_at",
    )
    .bind(id)
    .bind(patch.name)
    .bind(patch.location)
    .bind(patch.description)
    .bind(patch.event_date)
    .bind(patch.status)
    .bind(patch.diploma_enabled)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;
    Ok(row)
}

pub async fn set_diploma_template(
    pool: &DbPool,
    id: i64,
    template_path: &str,
) -> Result<EventRow, DbError> {
    let row = sqlx::query_as::<_, EventRow>(
        "UPDATE events SET
             diploma_template_path = ?2,
             diploma_enabled = 1,
             updated_at = datetime('now')
         WHERE id = ?1
         RETURNING id, name, location, description, event_date, status, created_by,
                   diploma_template_path, diploma_enabled, created_at, updated_at",
    )
    .bind(id)
    .bind(template_path)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;
    Ok(row)
}

/// Delete an event; attendee and staff rows cascade.
pub async fn delete_event(pool: &DbPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM events WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

pub async fn get_staff_ids(pool: &DbPool, event_id: i64) -> Result<Vec<i64>, DbError> {
    let ids: Vec<i64> =
        sqlx::query_scalar("SELECT user_id FROM event_staff WHERE event_id = ?1 ORDER BY user_id")
            .bind(event_id)
            .fetch_all(pool)
            .await?;
    Ok(ids)
}

pub async fn is_staff(pool: &DbPool, event_id: i64, user_id: i64) -> Result<bool, DbError> {
    let found: Option<i64> =
        sqlx::query_scalar("SELECT 1 FROM event_staff WHERE event_id = ?1 AND user_id = ?2")
            .bind(event_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
    Ok(found.is_some())
}

/// Replace the staff assignment set for an event in one transaction.
pub async fn set_staff_ids(
    pool: &DbPool,
    event_id: i64,
    user_ids: &[i64],
) -> Result<(), DbError> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM event_staff WHERE event_id = ?1")
        .bind(event_id)
        .execute(&mut *tx)
        .await?;
    for user_id in user_ids {
        sqlx::query(
            "INSERT INTO event_staff (event_id, user_id) VALUES (?1, ?2)
             ON CONFLICT DO NOTHING",
        )
        .bind(event_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_pool() -> DbPool {
        let pool = crate::create_pool("sqlite::memory:", 1).await.unwrap();
        crate::run_migrations(&pool).await.unwrap();
        pool
    }

    async fn setup_organizer(pool: &DbPool) -> i64 {
        crate::users::get_or_create_user(pool, 1, "org@example.com", Some("Org"))
            .await
            .unwrap();
        1
    }

    fn sample_date() -> DateTime<Utc> {
        "2026-09-12T18:00:00Z".parse().unwrap()
    }

    #[tokio::test]
    async fn create_event_starts_as_draft() {
        let pool = test_pool().await;
        let creator = setup_organizer(&pool).await;
        let event = create_event(
            &pool,
            10,
            "Graduation",
            "Main Hall",
            Some("Annual ceremony"),
            sample_date(),
            creator,
        )
        .await
        .unwrap();
        assert_eq!(event.status, "DRAFT");
        assert!(!event.diploma_enabled);
        assert!(event.diploma_template_path.is_none());
    }

    #[tokio::test]
    async fn update_event_patches_only_provided_fields() {
        let pool = test_pool().await;
        let creator = setup_organizer(&pool).await;
        create_event(&pool, 10, "Graduation", "Main Hall", None, sample_date(), creator)
            .await
            .unwrap();

        let patch = EventPatch {
            status: Some("PUBLISHED"),
            ..EventPatch::default()
        };
        let updated = update_event(&pool, 10, patch).await.unwrap();
        assert_eq!(updated.status, "PUBLISHED");
        assert_eq!(updated.name, "Graduation");
        assert_eq!(updated.location, "Main Hall");
    }

    #[tokio::test]
    async fn update_missing_event_is_not_found() {
        let pool = test_pool().await;
        let err = update_event(&pool, 999, EventPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound));
    }

    #[tokio::test]
    async fn staff_assignment_round_trip() {
        let pool = test_pool().await;
        let creator = setup_organizer(&pool).await;
        crate::users::get_or_create_user(&pool, 2, "staff@example.com", None)
            .await
            .unwrap();
        create_event(&pool, 10, "Expo", "Hall B", None, sample_date(), creator)
            .await
            .unwrap();

        set_staff_ids(&pool, 10, &[1, 2]).await.unwrap();
        assert_eq!(get_staff_ids(&pool, 10).await.unwrap(), vec![1, 2]);
        assert!(is_staff(&pool, 10, 2).await.unwrap());
        assert!(!is_staff(&pool, 10, 3).await.unwrap());

        // Replacing shrinks the set.
        set_staff_ids(&pool, 10, &[2]).await.unwrap();
        assert_eq!(get_staff_ids(&pool, 10).await.unwrap(), vec![2]);
    }

    #[tokio::test]
    async fn delete_event_cascades_to_staff() {
        let pool = test_pool().await;
        let creator = setup_organizer(&pool).await;
        create_event(&pool, 10, "Expo", "Hall B", None, sample_date(), creator)
            .await
            .unwrap();
        set_staff_ids(&pool, 10, &[1]).await.unwrap();

        delete_event(&pool, 10).await.unwrap();
        assert!(get_event(&pool, 10).await.unwrap().is_none());
        assert!(get_staff_ids(&pool, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn set_diploma_template_enables_diplomas() {
        let pool = test_pool().await;
        let creator = setup_organizer(&pool).await;
        create_event(&pool, 10, "Expo", "Hall B", None, sample_date(), creator)
            .await
            .unwrap();
        let updated = set_diploma_template(&pool, 10, "diplomas/10.pdf").await.unwrap();
        assert!(updated.diploma_enabled);
        assert_eq!(updated.diploma_template_path.as_deref(), Some("diplomas/10.pdf"));
    }
}
