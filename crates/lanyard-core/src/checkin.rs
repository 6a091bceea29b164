use lanyard_db::attendees::AttendeeRow;
use lanyard_db::DbPool;
use lanyard_models::CheckInStatus;

use crate::error::CoreError;
use crate::roles::{ensure_event_staff, Actor};

#[derive(Debug)]
pub struct CheckInResult {
    pub status: CheckInStatus,
    pub attendee: AttendeeRow,
}

/// Door check-in. Preconditions: the event exists, the attendee exists and
/// belongs to that event, and the actor is allowed at that door. The
/// transition itself is single-shot; a repeat scan reports
/// `already_checked_in` with the stored record untouched.
pub async fn check_in(
    pool: &DbPool,
    event_id: i64,
    attendee_id: i64,
    actor: &Actor,
) -> Result<CheckInResult, CoreError> {
    lanyard_db::events::get_event(pool, event_id)
        .await?
        .ok_or(CoreError::NotFound)?;

    ensure_event_staff(pool, event_id, actor).await?;

    let attendee = lanyard_db::attendees::get_attendee(pool, attendee_id)
        .await?
        .ok_or(CoreError::NotFound)?;
    if attendee.event_id != event_id {
        // Attendee ids are global; an id from another event is a client bug.
        return Err(CoreError::BadRequest(
            "attendee does not belong to this event".into(),
        ));
    }

    match lanyard_db::attendees::mark_checked_in(pool, attendee_id, actor.id, &actor.email).await? {
        Some(updated) => {
            tracing::info!(event_id, attendee_id, actor = actor.id, "attendee checked in");
            Ok(CheckInResult {
                status: CheckInStatus::CheckedIn,
                attendee: updated,
            })
        }
        None => {
            // Lost the race or a repeat scan; report the stored state.
            let stored = lanyard_db::attendees::get_attendee(pool, attendee_id)
                .await?
                .ok_or(CoreError::NotFound)?;
            Ok(CheckInResult {
                status: CheckInStatus::AlreadyCheckedIn,
                attendee: stored,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;
    use lanyard_models::Role;

    fn admin() -> Actor {
        Actor {
            id: 1,
            email: "org@example.com".into(),
            role: Role::Admin,
        }
    }

    fn staff(id: i64) -> Actor {
        Actor {
            id,
            email: format!("staff{id}@example.com"),
            role: Role::Staff,
        }
    }

    #[tokio::test]
    async fn first_check_in_transitions_and_records_actor() {
        let pool = testutil::pool_with_event(10).await;
        let ids = testutil::seed_attendees(&pool, 10, 1).await;

        let result = check_in(&pool, 10, ids[0], &admin()).await.unwrap();
        assert_eq!(result.status, CheckInStatus::CheckedIn);
        assert!(result.attendee.checked_in);
        assert_eq!(result.attendee.checked_in_by_id, Some(1));
        assert_eq!(
            result.attendee.checked_in_by_email.as_deref(),
            Some("org@example.com")
        );
    }

    #[tokio::test]
    async fn second_check_in_is_a_tagged_noop() {
        let pool = testutil::pool_with_event(10).await;
        let ids = testutil::seed_attendees(&pool, 10, 1).await;

        let first = check_in(&pool, 10, ids[0], &admin()).await.unwrap();
        let second = check_in(&pool, 10, ids[0], &admin()).await.unwrap();
        assert_eq!(second.status, CheckInStatus::AlreadyCheckedIn);
        assert_eq!(second.attendee.check_in_time, first.attendee.check_in_time);
        assert_eq!(second.attendee.checked_in_by_id, Some(1));
    }

    #[tokio::test]
    async fn unassigned_staff_is_forbidden() {
        let pool = testutil::pool_with_event(10).await;
        let ids = testutil::seed_attendees(&pool, 10, 1).await;
        lanyard_db::users::get_or_create_user(&pool, 2, "staff2@example.com", None)
            .await
            .unwrap();

        let err = check_in(&pool, 10, ids[0], &staff(2)).await.unwrap_err();
        assert!(matches!(err, CoreError::Forbidden));

        // Assignment flips the outcome.
        lanyard_db::events::set_staff_ids(&pool, 10, &[2]).await.unwrap();
        let result = check_in(&pool, 10, ids[0], &staff(2)).await.unwrap();
        assert_eq!(result.status, CheckInStatus::CheckedIn);
    }

    #[tokio::test]
    async fn attendee_from_another_event_is_rejected() {
        let pool = testutil::pool_with_event(10).await;
        let ids = testutil::seed_attendees(&pool, 10, 1).await;
        lanyard_db::events::create_event(
            &pool,
            20,
            "Other",
            "Hall C",
            None,
            "2026-10-01T18:00:00Z".parse().unwrap(),
            1,
        )
        .await
        .unwrap();

        let err = check_in(&pool, 20, ids[0], &admin()).await.unwrap_err();
        assert!(matches!(err, CoreError::BadRequest(_)));
    }

    #[tokio::test]
    async fn missing_event_or_attendee_is_not_found() {
        let pool = testutil::pool_with_event(10).await;
        let err = check_in(&pool, 99, 1001, &admin()).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound));

        let err = check_in(&pool, 10, 9999, &admin()).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound));
    }
}
