use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use lanyard_core::{AppState, WORKER_ID};
use lanyard_db::events::{EventPatch, EventRow};
use lanyard_db::DbPool;
use lanyard_models::{DispatchOutcome, Event, EventStatus};
use serde::Deserialize;

use crate::error::ApiError;
use crate::middleware::{AdminUser, AuthUser};

const MAX_EVENT_NAME_LEN: usize = 100;
const MAX_EVENT_LOCATION_LEN: usize = 200;
const MAX_EVENT_DESCRIPTION_LEN: usize = 1000;

pub(crate) async fn event_model(pool: &DbPool, row: EventRow) -> Result<Event, ApiError> {
    let staff_ids = lanyard_db::events::get_staff_ids(pool, row.id).await?;
    Ok(Event {
        id: row.id,
        name: row.name,
        location: row.location,
        description: row.description,
        event_date: row.event_date,
        status: EventStatus::parse(&row.status).unwrap_or(EventStatus::Draft),
        created_by: row.created_by,
        staff_ids,
        diploma_template_path: row.diploma_template_path,
        diploma_enabled: row.diploma_enabled,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn validate_text(name: &str, location: &str, description: Option<&str>) -> Result<(), ApiError> {
    if name.trim().is_empty() || name.len() > MAX_EVENT_NAME_LEN {
        return Err(ApiError::BadRequest(
            "Event name must be 1-100 characters".into(),
        ));
    }
    if location.trim().is_empty() || location.len() > MAX_EVENT_LOCATION_LEN {
        return Err(ApiError::BadRequest(
            "Location must be 1-200 characters".into(),
        ));
    }
    if description.is_some_and(|d| d.len() > MAX_EVENT_DESCRIPTION_LEN) {
        return Err(ApiError::BadRequest("Description too long".into()));
    }
    Ok(())
}

/// Staff ids come straight from the client; reject unknown accounts
/// before they hit the foreign key.
async fn validate_staff_ids(pool: &DbPool, staff_ids: &[i64]) -> Result<(), ApiError> {
    for id in staff_ids {
        if lanyard_db::users::get_user_by_id(pool, *id).await?.is_none() {
            return Err(ApiError::BadRequest(format!("unknown staff user id {id}")));
        }
    }
    Ok(())
}

#[derive(Deserialize)]
pub struct CreateEventRequest {
    pub name: String,
    pub location: String,
    pub description: Option<String>,
    pub event_date: DateTime<Utc>,
    #[serde(default)]
    pub staff_ids: Vec<i64>,
}

pub async fn create_event(
    State(state): State<AppState>,
    admin: AdminUser,
    Json(body): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<Event>), ApiError> {
    validate_text(&body.name, &body.location, body.description.as_deref())?;
    validate_staff_ids(&state.db, &body.staff_ids).await?;

    let event_id = lanyard_util::snowflake::generate(WORKER_ID);
    let row = lanyard_db::events::create_event(
        &state.db,
        event_id,
        body.name.trim(),
        body.location.trim(),
        body.description.as_deref(),
        body.event_date,
        admin.actor.id,
    )
    .await?;
    if !body.staff_ids.is_empty() {
        lanyard_db::events::set_staff_ids(&state.db, event_id, &body.staff_ids).await?;
    }

    tracing::info!(event_id, actor = admin.actor.id, "event created");
    Ok((StatusCode::CREATED, Json(event_model(&state.db, row).await?)))
}

pub async fn list_events(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<Vec<Event>>, ApiError> {
    let rows = lanyard_db::events::list_events(&state.db).await?;
    let mut events = Vec::with_capacity(rows.len());
    for row in rows {
        events.push(event_model(&state.db, row).await?);
    }
    Ok(Json(events))
}

pub async fn get_event(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(event_id): Path<i64>,
) -> Result<Json<Event>, ApiError> {
    let row = lanyard_db::events::get_event(&state.db, event_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(event_model(&state.db, row).await?))
}

#[derive(Deserialize)]
pub struct UpdateEventRequest {
    pub name: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub event_date: Option<DateTime<Utc>>,
    pub status: Option<String>,
    pub diploma_enabled: Option<bool>,
    pub staff_ids: Option<Vec<i64>>,
}

pub async fn update_event(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(event_id): Path<i64>,
    Json(body): Json<UpdateEventRequest>,
) -> Result<Json<Event>, ApiError> {
    if let Some(ref name) = body.name {
        if name.trim().is_empty() || name.len() > MAX_EVENT_NAME_LEN {
            return Err(ApiError::BadRequest(
                "Event name must be 1-100 characters".into(),
            ));
        }
    }
    if let Some(ref location) = body.location {
        if location.trim().is_empty() || location.len() > MAX_EVENT_LOCATION_LEN {
            return Err(ApiError::BadRequest(
                "Location must be 1-200 characters".into(),
            ));
        }
    }
    if body
        .description
        .as_deref()
        .is_some_and(|d| d.len() > MAX_EVENT_DESCRIPTION_LEN)
    {
        return Err(ApiError::BadRequest("Description too long".into()));
    }
    let status = match body.status.as_deref() {
        Some(raw) => Some(
            EventStatus::parse(raw)
                .ok_or_else(|| ApiError::BadRequest("Invalid status".into()))?,
        ),
        None => None,
    };

    let patch = EventPatch {
        name: body.name.as_deref().map(str::trim),
        location: body.location.as_deref().map(str::trim),
        description: body.description.as_deref(),
        event_date: body.event_date,
        status: status.map(EventStatus::as_str),
        diploma_enabled: body.diploma_enabled,
    };
    if let Some(ref staff_ids) = body.staff_ids {
        validate_staff_ids(&state.db, staff_ids).await?;
    }
    let row = lanyard_db::events::update_event(&state.db, event_id, patch).await?;
    if let Some(ref staff_ids) = body.staff_ids {
        lanyard_db::events::set_staff_ids(&state.db, event_id, staff_ids).await?;
    }

    tracing::info!(event_id, actor = admin.actor.id, "event updated");
    Ok(Json(event_model(&state.db, row).await?))
}

pub async fn delete_event(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(event_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    lanyard_db::events::delete_event(&state.db, event_id).await?;
    tracing::info!(event_id, actor = admin.actor.id, "event deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Kick off the invitation run for every attendee still owed a ticket.
pub async fn send_invitations(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(event_id): Path<i64>,
) -> Result<Json<DispatchOutcome>, ApiError> {
    let event = lanyard_db::events::get_event(&state.db, event_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    let outcome = lanyard_core::dispatch::send_invitations(
        &state.db,
        state.mailer.as_ref(),
        &event,
        state.config.public_url.as_deref(),
    )
    .await?;
    Ok(Json(outcome))
}
