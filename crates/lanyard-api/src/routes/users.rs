use axum::{extract::State, Json};
use lanyard_core::AppState;
use lanyard_db::users::UserRow;
use lanyard_models::{Role, User};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::AuthUser;

fn user_model(row: UserRow) -> User {
    User {
        id: row.id,
        email: row.email,
        full_name: row.full_name,
        role: Role::parse(&row.role),
        blocked: row.blocked,
        created_at: row.created_at,
    }
}

pub async fn get_me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<User>, ApiError> {
    let row = lanyard_db::users::get_user_by_id(&state.db, auth.actor.id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(user_model(row)))
}

/// Bootstrap helper: promote the caller to ADMIN. Kept for single-operator
/// deployments where the first-login promotion was missed.
pub async fn make_me_admin(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Value>, ApiError> {
    let row = lanyard_db::users::set_role(&state.db, auth.actor.id, Role::Admin.as_str()).await?;
    tracing::warn!(user = auth.actor.id, "self-promotion to admin");
    Ok(Json(json!({
        "message": "role updated",
        "user": user_model(row),
    })))
}
