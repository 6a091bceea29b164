use axum::{
    extract::{Multipart, Path, Query, State},
    Json,
};
use lanyard_core::AppState;
use lanyard_db::attendees::AttendeeRow;
use lanyard_models::{Attendee, EventStats};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::{AdminUser, AuthUser};

pub(crate) fn attendee_model(row: AttendeeRow) -> Attendee {
    Attendee {
        id: row.id,
        event_id: row.event_id,
        email: row.email,
        name: row.name,
        rut: row.rut,
        checked_in: row.checked_in,
        check_in_time: row.check_in_time,
        checked_in_by_id: row.checked_in_by_id,
        checked_in_by_email: row.checked_in_by_email,
        ticket_sent: row.ticket_sent,
        diploma_sent: row.diploma_sent,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

/// Pull the first file field out of a multipart upload.
pub(crate) async fn first_file(multipart: &mut Multipart) -> Result<Vec<u8>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        if field.file_name().is_some() || field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(e.to_string()))?;
            return Ok(bytes.to_vec());
        }
    }
    Err(ApiError::BadRequest("missing file field".into()))
}

pub async fn upload_attendees(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(event_id): Path<i64>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let bytes = first_file(&mut multipart).await?;
    let summary = lanyard_core::ingest::ingest_attendees(&state.db, event_id, &bytes).await?;
    Ok(Json(json!({
        "accepted": summary.accepted,
        "message": summary.message,
    })))
}

pub async fn list_attendees(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(event_id): Path<i64>,
) -> Result<Json<Vec<Attendee>>, ApiError> {
    lanyard_db::events::get_event(&state.db, event_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    let rows = lanyard_db::attendees::list_for_event(&state.db, event_id).await?;
    Ok(Json(rows.into_iter().map(attendee_model).collect()))
}

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

pub async fn search_attendees(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(event_id): Path<i64>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Attendee>>, ApiError> {
    lanyard_db::events::get_event(&state.db, event_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    if query.q.trim().is_empty() {
        return Err(ApiError::BadRequest("missing query parameter q".into()));
    }
    let rows = lanyard_db::attendees::search(&state.db, event_id, query.q.trim()).await?;
    Ok(Json(rows.into_iter().map(attendee_model).collect()))
}

pub async fn attendee_stats(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(event_id): Path<i64>,
) -> Result<Json<EventStats>, ApiError> {
    let stats = lanyard_core::stats::event_stats(&state.db, event_id).await?;
    Ok(Json(stats))
}

#[derive(Deserialize)]
pub struct CheckInRequest {
    pub attendee_id: i64,
}

/// Door scan. Staff must be assigned to the event; admins always pass.
pub async fn check_in(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(event_id): Path<i64>,
    Json(body): Json<CheckInRequest>,
) -> Result<Json<Value>, ApiError> {
    let result =
        lanyard_core::checkin::check_in(&state.db, event_id, body.attendee_id, &auth.actor)
            .await?;
    Ok(Json(json!({
        "status": result.status,
        "attendee": attendee_model(result.attendee),
    })))
}
