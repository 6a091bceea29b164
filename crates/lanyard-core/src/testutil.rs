use lanyard_db::attendees::NewAttendee;
use lanyard_db::DbPool;

/// Fresh in-memory database with one organizer (id 1, ADMIN by first-user
/// promotion) and one event owned by them.
pub async fn pool_with_event(event_id: i64) -> DbPool {
    let pool = lanyard_db::create_pool("sqlite::memory:", 1).await.unwrap();
    lanyard_db::run_migrations(&pool).await.unwrap();
    lanyard_db::users::get_or_create_user(&pool, 1, "org@example.com", Some("Org"))
        .await
        .unwrap();
    lanyard_db::events::create_event(
        &pool,
        event_id,
        "Expo",
        "Hall B",
        None,
        "2026-09-12T18:00:00Z".parse().unwrap(),
        1,
    )
    .await
    .unwrap();
    pool
}

pub async fn seed_attendees(pool: &DbPool, event_id: i64, n: usize) -> Vec<i64> {
    let records: Vec<NewAttendee> = (0..n)
        .map(|i| NewAttendee {
            email: format!("a{i}@example.com"),
            name: format!("Attendee {i}"),
            rut: None,
        })
        .collect();
    let mut next = 1000;
    lanyard_db::attendees::insert_batched(pool, event_id, &records, || {
        next += 1;
        next
    })
    .await
    .unwrap();
    (1001..=1000 + n as i64).collect()
}

/// Minimal one-page PDF usable as a diploma template in tests.
pub fn sample_template() -> Vec<u8> {
    crate::diploma::blank_template(612.0, 792.0)
}
