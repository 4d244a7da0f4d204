use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints that never go through the session gate: the landing page and the sign-in /
/// sign-out flow that writes and clears the visitor's credential.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // GET /
        // Landing page with the sign-in link.
        .route("/", get(handlers::landing))
        // GET /auth/login
        // Redirect to the external sign-in provider.
        .route("/auth/login", get(handlers::sign_in))
        // GET /auth/callback?session_id=...
        // Provider return point: session exchange, then hand-off to the gate.
        .route("/auth/callback", get(handlers::auth_callback))
        // POST /auth/logout
        // No GET route: logout must not be reachable from a cross-site link.
        .route("/auth/logout", post(handlers::logout))
}
