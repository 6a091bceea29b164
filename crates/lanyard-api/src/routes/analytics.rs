use axum::{
    extract::{Path, State},
    Json,
};
use futures_util::future::join_all;
use lanyard_core::AppState;
use lanyard_models::StaffScanCount;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::AuthUser;

/// Who scanned how many badges, busiest first.
pub async fn staff_leaderboard(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(event_id): Path<i64>,
) -> Result<Json<Vec<StaffScanCount>>, ApiError> {
    let board = lanyard_core::stats::staff_leaderboard(&state.db, event_id).await?;
    Ok(Json(board))
}

/// Attendance stats for every event, gathered concurrently. One query pair
/// per event with no cap; fine at the event counts this deployment sees.
pub async fn events_overview(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<Vec<Value>>, ApiError> {
    let events = lanyard_db::events::list_events(&state.db).await?;

    let lookups = events.iter().map(|event| {
        let db = state.db.clone();
        let event_id = event.id;
        async move { lanyard_core::stats::event_stats(&db, event_id).await }
    });
    let results = join_all(lookups).await;

    let mut overview = Vec::with_capacity(events.len());
    for (event, stats) in events.iter().zip(results) {
        let stats = stats?;
        overview.push(json!({
            "event_id": event.id,
            "name": event.name,
            "event_date": event.event_date.to_rfc3339(),
            "status": event.status,
            "stats": stats,
        }));
    }
    Ok(Json(overview))
}
