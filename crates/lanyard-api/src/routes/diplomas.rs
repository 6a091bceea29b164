use std::path::Path as FsPath;

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use lanyard_core::{AppState, DIPLOMA_PREVIEW_NAME};
use lanyard_models::{DispatchOutcome, Event};

use crate::error::ApiError;
use crate::middleware::{AdminUser, AuthUser};
use crate::routes::attendees::first_file;
use crate::routes::events::event_model;

fn template_relative_path(event_id: i64) -> String {
    format!("diplomas/{event_id}.pdf")
}

/// Store an uploaded PDF as the event's diploma template and enable
/// diploma dispatch for it.
pub async fn upload_template(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(event_id): Path<i64>,
    mut multipart: Multipart,
) -> Result<Json<Event>, ApiError> {
    lanyard_db::events::get_event(&state.db, event_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let bytes = first_file(&mut multipart).await?;
    if !bytes.starts_with(b"%PDF-") {
        return Err(ApiError::BadRequest("template must be a PDF".into()));
    }

    let relative = template_relative_path(event_id);
    let full = FsPath::new(&state.config.storage_path).join(&relative);
    if let Some(parent) = full.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ApiError::Internal(e.into()))?;
    }
    tokio::fs::write(&full, &bytes)
        .await
        .map_err(|e| ApiError::Internal(e.into()))?;

    let row = lanyard_db::events::set_diploma_template(&state.db, event_id, &relative).await?;
    tracing::info!(event_id, actor = admin.actor.id, "diploma template stored");
    Ok(Json(event_model(&state.db, row).await?))
}

/// Render the stored template with a placeholder name.
pub async fn preview_diploma(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(event_id): Path<i64>,
) -> Result<Response, ApiError> {
    let event = lanyard_db::events::get_event(&state.db, event_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    let template =
        lanyard_core::dispatch::load_template(&state.config.storage_path, &event).await?;
    let pdf = lanyard_core::diploma::render_diploma(&template, DIPLOMA_PREVIEW_NAME)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/pdf")],
        pdf,
    )
        .into_response())
}

pub async fn send_batch(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(event_id): Path<i64>,
) -> Result<Json<DispatchOutcome>, ApiError> {
    let event = lanyard_db::events::get_event(&state.db, event_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    if !event.diploma_enabled {
        return Err(ApiError::BadRequest(
            "diplomas are not enabled for this event".into(),
        ));
    }
    let outcome = lanyard_core::dispatch::send_diplomas(
        &state.db,
        state.mailer.as_ref(),
        &event,
        &state.config.storage_path,
    )
    .await?;
    Ok(Json(outcome))
}
