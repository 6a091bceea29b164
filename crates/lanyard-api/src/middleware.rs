use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use lanyard_core::roles::Actor;
use lanyard_core::{AppState, WORKER_ID};
use lanyard_models::Role;

use crate::error::ApiError;

/// Any authenticated caller. Validates the bearer token, lazily upserts
/// the account row (first account ever becomes ADMIN) and rejects blocked
/// users. Guards read the stored role, never the token claim.
pub struct AuthUser {
    pub actor: Actor,
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())?
        .strip_prefix("Bearer ")
}

async fn authenticate(parts: &Parts, state: &AppState) -> Result<Actor, ApiError> {
    let token = bearer_token(parts).ok_or(ApiError::Unauthorized)?;
    let claims = lanyard_core::auth::validate_token(token, &state.config.jwt_secret)
        .map_err(|_| ApiError::Unauthorized)?;

    let user = lanyard_db::users::get_or_create_user(
        &state.db,
        claims.sub,
        &claims.email,
        claims.name.as_deref(),
    )
    .await?;
    if user.blocked {
        return Err(ApiError::Forbidden);
    }

    Ok(Actor {
        id: user.id,
        email: user.email,
        role: Role::parse(&user.role),
    })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let actor = authenticate(parts, state).await?;
        Ok(AuthUser { actor })
    }
}

/// Extractor for admin-only routes. Every decision, grant or denial, lands
/// in the audit log.
pub struct AdminUser {
    pub actor: Actor,
}

async fn audit(state: &AppState, actor: &Actor, parts: &Parts, allowed: bool) {
    let action = format!("{} {}", parts.method, parts.uri.path());
    let detail = (!allowed).then(|| format!("role {}", actor.role));
    let result = lanyard_db::audit_log::create_entry(
        &state.db,
        lanyard_util::snowflake::generate(WORKER_ID),
        actor.id,
        &action,
        None,
        allowed,
        detail.as_deref(),
    )
    .await;
    if let Err(e) = result {
        // The guard decision stands even when the trail write fails.
        tracing::error!(error = %e, "audit log write failed");
    }
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let actor = authenticate(parts, state).await?;
        let allowed = lanyard_core::roles::require_role(actor.role, &[Role::Admin]).is_ok();
        audit(state, &actor, parts, allowed).await;
        if !allowed {
            return Err(ApiError::Forbidden);
        }
        Ok(AdminUser { actor })
    }
}
