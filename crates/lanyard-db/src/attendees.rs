use crate::{DbError, DbPool};
use chrono::{DateTime, Utc};

/// One atomic commit may carry at most this many inserts. Mirrors the
/// backend's 500-operation ceiling with one slot of headroom.
pub const INSERT_OPS_PER_COMMIT: usize = 499;

/// Commit cap for ticket-flag updates after an invitation run. Kept
/// distinct from the ingestion cap on purpose.
pub const TICKET_FLAG_OPS_PER_COMMIT: usize = 400;

/// Upper bound on rows returned by the attendee search endpoint.
pub const SEARCH_LIMIT: i64 = 15;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AttendeeRow {
    pub id: i64,
    pub event_id: i64,
    pub email: String,
    pub name: String,
    pub rut: Option<String>,
    pub checked_in: bool,
    pub check_in_time: Option<DateTime<Utc>>,
    pub checked_in_by_id: Option<i64>,
    pub checked_in_by_email: Option<String>,
    pub ticket_sent: bool,
    pub diploma_sent: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A record accepted from an uploaded attendee list, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttendee {
    pub email: String,
    pub name: String,
    pub rut: Option<String>,
}

/// What a batched insert actually did: rows written and atomic commits
/// issued. `commits` is always `ceil(rows / INSERT_OPS_PER_COMMIT)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub rows: usize,
    pub commits: usize,
}

const ATTENDEE_COLUMNS: &str = "id, event_id, email, name, rut, checked_in, check_in_time, \
     checked_in_by_id, checked_in_by_email, ticket_sent, diploma_sent, created_at, updated_at";

fn select_attendees(where_clause: &str) -> String {
    format!("SELECT {ATTENDEE_COLUMNS} FROM attendees WHERE {where_clause}")
}

/// Insert attendee records in commit groups of at most
/// [`INSERT_OPS_PER_COMMIT`] operations. Groups commit sequentially; the
/// first failure propagates and groups already committed stay committed.
/// There is deliberately no cross-group atomicity.
pub async fn insert_batched(
    pool: &DbPool,
    event_id: i64,
    records: &[NewAttendee],
    mut next_id: impl FnMut() -> i64,
) -> Result<BatchReport, DbError> {
    let mut report = BatchReport::default();

    for group in records.chunks(INSERT_OPS_PER_COMMIT) {
        let mut tx = pool.begin().await?;
        for record in group {
            sqlx::query(
                "INSERT INTO attendees (id, event_id, email, name, rut)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .bind(next_id())
            .bind(event_id)
            .bind(&record.email)
            .bind(&record.name)
            .bind(&record.rut)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        report.rows += group.len();
        report.commits += 1;
        tracing::debug!(event_id, rows = group.len(), "attendee batch committed");
    }

    Ok(report)
}

pub async fn get_attendee(pool: &DbPool, id: i64) -> Result<Option<AttendeeRow>, DbError> {
    let row = sqlx::query_as::<_, AttendeeRow>(&select_attendees("id = ?1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn list_for_event(pool: &DbPool, event_id: i64) -> Result<Vec<AttendeeRow>, DbError> {
    let rows = sqlx::query_as::<_, AttendeeRow>(&format!(
        "{} ORDER BY name",
        select_attendees("event_id = ?1")
    ))
    .bind(event_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Case-insensitive substring search over name, email and rut, capped at
/// [`SEARCH_LIMIT`] rows. `%` and `_` in the query are escaped so they
/// match literally.
pub async fn search(
    pool: &DbPool,
    event_id: i64,
    query: &str,
) -> Result<Vec<AttendeeRow>, DbError> {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    let pattern = format!("%{}%", escaped.to_lowercase());

    let rows = sqlx::query_as::<_, AttendeeRow>(&format!(
        "{} AND (LOWER(name) LIKE ?2 ESCAPE '\\'
              OR LOWER(email) LIKE ?2 ESCAPE '\\'
              OR LOWER(COALESCE(rut, '')) LIKE ?2 ESCAPE '\\')
         ORDER BY name LIMIT ?3",
        select_attendees("event_id = ?1")
    ))
    .bind(event_id)
    .bind(pattern)
    .bind(SEARCH_LIMIT)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Flip an attendee to checked-in, recording when and by whom. Returns
/// `None` when the row is missing or was already checked in; the caller
/// distinguishes the two by fetching the row. The conditional update makes
/// the transition single-shot even under concurrent scans.
pub async fn mark_checked_in(
    pool: &DbPool,
    attendee_id: i64,
    actor_id: i64,
    actor_email: &str,
) -> Result<Option<AttendeeRow>, DbError> {
    let row = sqlx::query_as::<_, AttendeeRow>(&format!(
        "UPDATE attendees SET
             checked_in = 1,
             check_in_time = datetime('now'),
             checked_in_by_id = ?2,
             checked_in_by_email = ?3,
             updated_at = datetime('now')
         WHERE id = ?1 AND checked_in = 0
         RETURNING {ATTENDEE_COLUMNS}"
    ))
    .bind(attendee_id)
    .bind(actor_id)
    .bind(actor_email)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Attendees still owed an invitation email.
pub async fn pending_tickets(pool: &DbPool, event_id: i64) -> Result<Vec<AttendeeRow>, DbError> {
    let rows = sqlx::query_as::<_, AttendeeRow>(&format!(
        "{} ORDER BY id",
        select_attendees("event_id = ?1 AND ticket_sent = 0")
    ))
    .bind(event_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Attendees eligible for a diploma: physically checked in and not yet
/// sent one.
pub async fn pending_diplomas(pool: &DbPool, event_id: i64) -> Result<Vec<AttendeeRow>, DbError> {
    let rows = sqlx::query_as::<_, AttendeeRow>(&format!(
        "{} ORDER BY id",
        select_attendees("event_id = ?1 AND checked_in = 1 AND diploma_sent = 0")
    ))
    .bind(event_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Persist ticket_sent for the given attendees in commit groups of at most
/// [`TICKET_FLAG_OPS_PER_COMMIT`] updates, sequentially, first failure
/// aborts the remainder.
pub async fn mark_tickets_sent(pool: &DbPool, ids: &[i64]) -> Result<BatchReport, DbError> {
    let mut report = BatchReport::default();

    for group in ids.chunks(TICKET_FLAG_OPS_PER_COMMIT) {
        let mut tx = pool.begin().await?;
        for id in group {
            sqlx::query(
                "UPDATE attendees SET ticket_sent = 1, updated_at = datetime('now')
                 WHERE id = ?1",
            )
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        report.rows += group.len();
        report.commits += 1;
    }

    Ok(report)
}

/// Diploma-sent updates are issued one at a time, right after each
/// successful delivery.
pub async fn mark_diploma_sent(pool: &DbPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE attendees SET diploma_sent = 1, updated_at = datetime('now') WHERE id = ?1",
    )
    .bind(id)
    .execute(pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// (total, checked_in) counters for one event.
pub async fn count_stats(pool: &DbPool, event_id: i64) -> Result<(i64, i64), DbError> {
    let counts: (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COALESCE(SUM(checked_in), 0) FROM attendees WHERE event_id = ?1",
    )
    .bind(event_id)
    .fetch_one(pool)
    .await?;
    Ok(counts)
}

/// Scans per staff member, grouped on the recorded actor email, busiest
/// first.
pub async fn staff_scan_counts(
    pool: &DbPool,
    event_id: i64,
) -> Result<Vec<(String, i64)>, DbError> {
    let rows: Vec<(String, i64)> = sqlx::query_as(
        "SELECT checked_in_by_email, COUNT(*) AS scans
         FROM attendees
         WHERE event_id = ?1 AND checked_in = 1 AND checked_in_by_email IS NOT NULL
         GROUP BY checked_in_by_email
         ORDER BY scans DESC, checked_in_by_email",
    )
    .bind(event_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_pool() -> DbPool {
        let pool = crate::create_pool("sqlite::memory:", 1).await.unwrap();
        crate::run_migrations(&pool).await.unwrap();
        pool
    }

    async fn setup_event(pool: &DbPool) -> i64 {
        crate::users::get_or_create_user(pool, 1, "org@example.com", None)
            .await
            .unwrap();
        crate::events::create_event(
            pool,
            10,
            "Expo",
            "Hall B",
            None,
            "2026-09-12T18:00:00Z".parse().unwrap(),
            1,
        )
        .await
        .unwrap();
        10
    }

    fn records(n: usize) -> Vec<NewAttendee> {
        (0..n)
            .map(|i| NewAttendee {
                email: format!("a{i}@example.com"),
                name: format!("Attendee {i}"),
                rut: None,
            })
            .collect()
    }

    fn sequential_ids() -> impl FnMut() -> i64 {
        let mut next = 1000;
        move || {
            next += 1;
            next
        }
    }

    #[tokio::test]
    async fn insert_batched_splits_at_the_commit_cap() {
        let pool = test_pool().await;
        let event_id = setup_event(&pool).await;

        // 499 rows -> 1 commit, 500 -> 2, 998 -> 2, 999 -> 3.
        for (n, expected_commits) in [(499usize, 1usize), (500, 2), (998, 2), (999, 3)] {
            sqlx::query("DELETE FROM attendees").execute(&pool).await.unwrap();
            let report = insert_batched(&pool, event_id, &records(n), sequential_ids())
                .await
                .unwrap();
            assert_eq!(report.rows, n);
            assert_eq!(report.commits, expected_commits, "n = {n}");
            let (total, _) = count_stats(&pool, event_id).await.unwrap();
            assert_eq!(total as usize, n);
        }
    }

    #[tokio::test]
    async fn insert_batched_empty_input_commits_nothing() {
        let pool = test_pool().await;
        let event_id = setup_event(&pool).await;
        let report = insert_batched(&pool, event_id, &[], sequential_ids())
            .await
            .unwrap();
        assert_eq!(report, BatchReport::default());
    }

    #[tokio::test]
    async fn mark_checked_in_is_single_shot() {
        let pool = test_pool().await;
        let event_id = setup_event(&pool).await;
        insert_batched(&pool, event_id, &records(1), sequential_ids())
            .await
            .unwrap();

        let first = mark_checked_in(&pool, 1001, 1, "org@example.com")
            .await
            .unwrap()
            .expect("first check-in succeeds");
        assert!(first.checked_in);
        assert!(first.check_in_time.is_some());
        assert_eq!(first.checked_in_by_email.as_deref(), Some("org@example.com"));

        let second = mark_checked_in(&pool, 1001, 2, "other@example.com")
            .await
            .unwrap();
        assert!(second.is_none());

        // The stored record still carries the first actor.
        let stored = get_attendee(&pool, 1001).await.unwrap().unwrap();
        assert_eq!(stored.checked_in_by_id, Some(1));
        assert_eq!(stored.check_in_time, first.check_in_time);
    }

    #[tokio::test]
    async fn search_is_capped_and_case_insensitive() {
        let pool = test_pool().await;
        let event_id = setup_event(&pool).await;
        insert_batched(&pool, event_id, &records(30), sequential_ids())
            .await
            .unwrap();

        let all = search(&pool, event_id, "ATTENDEE").await.unwrap();
        assert_eq!(all.len() as i64, SEARCH_LIMIT);

        let one = search(&pool, event_id, "a7@example").await.unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].name, "Attendee 7");
    }

    #[tokio::test]
    async fn search_matches_rut_and_escapes_wildcards() {
        let pool = test_pool().await;
        let event_id = setup_event(&pool).await;
        let special = vec![
            NewAttendee {
                email: "x@example.com".into(),
                name: "Ximena".into(),
                rut: Some("12.345.678-9".into()),
            },
            NewAttendee {
                email: "y@example.com".into(),
                name: "100% Sure".into(),
                rut: None,
            },
        ];
        insert_batched(&pool, event_id, &special, sequential_ids())
            .await
            .unwrap();

        let by_rut = search(&pool, event_id, "12.345").await.unwrap();
        assert_eq!(by_rut.len(), 1);
        assert_eq!(by_rut[0].name, "Ximena");

        // A literal percent only matches the row containing one.
        let by_percent = search(&pool, event_id, "100%").await.unwrap();
        assert_eq!(by_percent.len(), 1);
        assert_eq!(by_percent[0].name, "100% Sure");
    }

    #[tokio::test]
    async fn pending_queries_partition_by_flags() {
        let pool = test_pool().await;
        let event_id = setup_event(&pool).await;
        insert_batched(&pool, event_id, &records(4), sequential_ids())
            .await
            .unwrap();

        mark_tickets_sent(&pool, &[1001]).await.unwrap();
        mark_checked_in(&pool, 1002, 1, "org@example.com").await.unwrap();
        mark_checked_in(&pool, 1003, 1, "org@example.com").await.unwrap();
        mark_diploma_sent(&pool, 1003).await.unwrap();

        let tickets = pending_tickets(&pool, event_id).await.unwrap();
        let ticket_ids: Vec<i64> = tickets.iter().map(|a| a.id).collect();
        assert_eq!(ticket_ids, vec![1002, 1003, 1004]);

        // Only checked-in without a diploma: 1002.
        let diplomas = pending_diplomas(&pool, event_id).await.unwrap();
        let diploma_ids: Vec<i64> = diplomas.iter().map(|a| a.id).collect();
        assert_eq!(diploma_ids, vec![1002]);
    }

    #[tokio::test]
    async fn mark_tickets_sent_batches_at_four_hundred() {
        let pool = test_pool().await;
        let event_id = setup_event(&pool).await;
        insert_batched(&pool, event_id, &records(401), sequential_ids())
            .await
            .unwrap();

        let ids: Vec<i64> = (1001..=1401).collect();
        let report = mark_tickets_sent(&pool, &ids).await.unwrap();
        assert_eq!(report.rows, 401);
        assert_eq!(report.commits, 2);

        let remaining = pending_tickets(&pool, event_id).await.unwrap();
        assert!(remaining.is_empty());
    }

    #[tokio::test]
    async fn staff_scan_counts_order_busiest_first() {
        let pool = test_pool().await;
        let event_id = setup_event(&pool).await;
        insert_batched(&pool, event_id, &records(5), sequential_ids())
            .await
            .unwrap();

        for id in [1001, 1002, 1003] {
            mark_checked_in(&pool, id, 2, "busy@example.com").await.unwrap();
        }
        mark_checked_in(&pool, 1004, 3, "calm@example.com").await.unwrap();

        let counts = staff_scan_counts(&pool, event_id).await.unwrap();
        assert_eq!(
            counts,
            vec![
                ("busy@example.com".to_string(), 3),
                ("calm@example.com".to_string(), 1),
            ]
        );
    }

    #[tokio::test]
    async fn count_stats_tracks_checked_in() {
        let pool = test_pool().await;
        let event_id = setup_event(&pool).await;
        insert_batched(&pool, event_id, &records(4), sequential_ids())
            .await
            .unwrap();
        mark_checked_in(&pool, 1001, 1, "org@example.com").await.unwrap();

        let (total, checked_in) = count_stats(&pool, event_id).await.unwrap();
        assert_eq!((total, checked_in), (4, 1));
    }
}
