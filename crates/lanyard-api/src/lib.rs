pub mod error;
pub mod middleware;
pub mod routes;

use axum::routing::{get, post};
use axum::Router;
use lanyard_core::AppState;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Assemble the full HTTP surface over the shared application state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health::health))
        .route(
            "/events",
            get(routes::events::list_events).post(routes::events::create_event),
        )
        .route(
            "/events/{event_id}",
            get(routes::events::get_event)
                .patch(routes::events::update_event)
                .delete(routes::events::delete_event),
        )
        .route(
            "/events/{event_id}/invitations",
            post(routes::events::send_invitations),
        )
        .route(
            "/events/{event_id}/attendees",
            get(routes::attendees::list_attendees),
        )
        .route(
            "/events/{event_id}/attendees/upload",
            post(routes::attendees::upload_attendees),
        )
        .route(
            "/events/{event_id}/attendees/search",
            get(routes::attendees::search_attendees),
        )
        .route(
            "/events/{event_id}/attendees/stats",
            get(routes::attendees::attendee_stats),
        )
        .route(
            "/events/{event_id}/attendees/check-in",
            post(routes::attendees::check_in),
        )
        .route(
            "/events/{event_id}/diplomas/upload",
            post(routes::diplomas::upload_template),
        )
        .route(
            "/events/{event_id}/diplomas/preview",
            get(routes::diplomas::preview_diploma),
        )
        .route(
            "/events/{event_id}/diplomas/send-batch",
            post(routes::diplomas::send_batch),
        )
        .route(
            "/analytics/events",
            get(routes::analytics::events_overview),
        )
        .route(
            "/analytics/events/{event_id}/staff",
            get(routes::analytics::staff_leaderboard),
        )
        .route(
            "/users/me",
            get(routes::users::get_me),
        )
        .route(
            "/users/make-me-admin",
            post(routes::users::make_me_admin),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
