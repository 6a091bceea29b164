use lanyard_db::DbPool;
use lanyard_models::{EventStats, StaffScanCount};

use crate::error::CoreError;

/// Attendance counters for one event. Always computed from the attendee
/// table, never cached.
pub async fn event_stats(pool: &DbPool, event_id: i64) -> Result<EventStats, CoreError> {
    lanyard_db::events::get_event(pool, event_id)
        .await?
        .ok_or(CoreError::NotFound)?;
    let (total, checked_in) = lanyard_db::attendees::count_stats(pool, event_id).await?;
    Ok(EventStats::new(total, checked_in))
}

/// Scan counts per staff member, busiest scanner first. Attendees checked
/// in before the scanner email was recorded are excluded.
pub async fn staff_leaderboard(
    pool: &DbPool,
    event_id: i64,
) -> Result<Vec<StaffScanCount>, CoreError> {
    lanyard_db::events::get_event(pool, event_id)
        .await?
        .ok_or(CoreError::NotFound)?;
    let rows = lanyard_db::attendees::staff_scan_counts(pool, event_id).await?;
    Ok(rows
        .into_iter()
        .map(|(staff_email, scans)| StaffScanCount { staff_email, scans })
        .collect())
}
