use axum::{
    Router,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

use crate::{
    AppState,
    gate::{Destination, GateOutcome, RouteRequirement},
    models::User,
};

/// CurrentUser
///
/// The resolved, role-checked identity of the request, provided by the `session_gate`
/// layer. Pages take it as a typed input instead of re-verifying anything themselves.
///
/// Only available behind `require`; used anywhere else the extractor redirects to the
/// public entry point.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| Redirect::to(Destination::SignIn.path()))
    }
}

/// State carried by one `session_gate` layer: the shared app state plus the requirement
/// of the routes it wraps.
#[derive(Clone)]
pub struct GateLayerState {
    app: AppState,
    requirement: Arc<RouteRequirement>,
}

/// require
///
/// Puts every route of `router` behind the session gate with the given requirement.
/// Applied as a `route_layer`, so unmatched paths still reach the fallback.
pub fn require(
    router: Router<AppState>,
    state: &AppState,
    requirement: RouteRequirement,
) -> Router<AppState> {
    let layer_state = GateLayerState {
        app: state.clone(),
        requirement: Arc::new(requirement),
    };
    router.route_layer(middleware::from_fn_with_state(layer_state, session_gate))
}

/// session_gate
///
/// Middleware form of the gate. Resolves the visitor from their cookie jar, then either
/// runs the page with `CurrentUser` in the request extensions or answers with a redirect.
/// Storage changes made during resolution (refresh or clear) ride along on the response
/// in both cases.
pub async fn session_gate(
    State(gate): State<GateLayerState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let mut store = gate.app.browser_store(jar);
    let outcome = gate
        .app
        .gate()
        .evaluate(&gate.requirement, None, &mut store)
        .await;
    let jar = store.into_jar();

    match outcome {
        GateOutcome::Authorized(user) => {
            request.extensions_mut().insert(CurrentUser(user));
            (jar, next.run(request).await).into_response()
        }
        GateOutcome::Redirected { to, .. } => (jar, Redirect::to(to.path())).into_response(),
    }
}
