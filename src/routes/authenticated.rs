use crate::{AppState, auth::require, gate::RouteRequirement, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Pages any signed-in user may open, whatever their role. The gate still resolves the
/// identity on every request; it just never redirects these for role reasons.
pub fn authenticated_routes(state: &AppState) -> Router<AppState> {
    let router = Router::<AppState>::new()
        // GET /dashboard
        // Role-based redirect: consultants to /my-engagement, everyone else to /portfolio.
        .route("/dashboard", get(handlers::dashboard))
        // GET /engagement/{engagement_id}
        .route("/engagement/{engagement_id}", get(handlers::engagement_detail))
        // GET /pulse/{engagement_id}/{pulse_id}
        // Viewing an existing pulse is open to leads and admins as well.
        .route(
            "/pulse/{engagement_id}/{pulse_id}",
            get(handlers::existing_pulse),
        );

    require(router, state, RouteRequirement::any_authenticated())
}
