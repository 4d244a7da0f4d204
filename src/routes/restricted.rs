use crate::{AppState, auth::require, gate::RouteRequirement, handlers, models::Role};
use axum::{Router, routing::get};

/// Restricted Router Module
///
/// Role-gated pages. Each group carries its own requirement, so the groups are built as
/// separate routers and merged.
pub fn restricted_routes(state: &AppState) -> Router<AppState> {
    // Consultant pages: their own engagement dashboard and the weekly pulse form.
    let consultant = Router::<AppState>::new()
        .route("/my-engagement", get(handlers::my_engagement))
        .route("/pulse/{engagement_id}", get(handlers::new_pulse));

    // Portfolio overview for leads and admins.
    let portfolio = Router::<AppState>::new().route("/portfolio", get(handlers::portfolio));

    // Client / engagement / user management.
    let admin = Router::<AppState>::new().route("/admin", get(handlers::admin_setup));

    Router::new()
        .merge(require(
            consultant,
            state,
            RouteRequirement::roles([Role::Consultant]),
        ))
        .merge(require(
            portfolio,
            state,
            RouteRequirement::roles([Role::Lead, Role::Admin]),
        ))
        .merge(require(admin, state, RouteRequirement::roles([Role::Admin])))
}
