use crate::{
    AppConfig, AppState,
    auth::CurrentUser,
    credentials::{Credential, CredentialStore},
    error::ExchangeError,
    gate::{Destination, GateOutcome, RouteRequirement, home_for_role},
    models::{CallbackParams, LandingView, Page, PageView},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    response::Redirect,
};
use axum_extra::extract::cookie::CookieJar;

// --- Public Pages ---

/// landing
///
/// [Public Route] Entry point and sign-in page. Carries the provider URL and, for
/// returning visitors, the cached identity (display only, never used for authorization).
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Landing page", body = LandingView))
)]
pub async fn landing(State(state): State<AppState>, jar: CookieJar) -> Json<LandingView> {
    let store = state.browser_store(jar);

    Json(LandingView {
        page: Page::Landing,
        sign_in_url: state.config.sign_in_redirect(),
        returning_user: store.cached_user(),
    })
}

/// sign_in
///
/// [Public Route] Sends the visitor to the external sign-in provider, which comes back
/// to `/auth/callback` with a `session_id`.
#[utoipa::path(
    get,
    path = "/auth/login",
    responses((status = 303, description = "Redirect to the sign-in provider"))
)]
pub async fn sign_in(State(config): State<AppConfig>) -> Redirect {
    Redirect::to(&config.sign_in_redirect())
}

// --- Auth Flow ---

/// auth_callback
///
/// [Public Route] Completes sign-in. Exchanges the provider's `session_id` for a session
/// token, persists the credential and user, then hands the user straight to the gate for
/// the dashboard, so the first redirect needs no identity round-trip.
///
/// Any failure sends the visitor back to `/`.
#[utoipa::path(
    get,
    path = "/auth/callback",
    params(CallbackParams),
    responses((status = 303, description = "Redirect to the role's home, or to / on failure"))
)]
pub async fn auth_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> (CookieJar, Redirect) {
    let exchange = match params.session_id.filter(|id| !id.is_empty()) {
        Some(session_id) => state.backend.exchange_session(&session_id).await,
        None => Err(ExchangeError::MissingSessionId),
    };

    let exchange = match exchange {
        Ok(exchange) => exchange,
        Err(e) => {
            tracing::warn!(error = %e, "Sign-in callback failed");
            return (jar, Redirect::to(Destination::SignIn.path()));
        }
    };

    tracing::info!(user_id = %exchange.user.user_id, role = %exchange.user.role, "Signed in");

    let mut store = state.browser_store(jar);
    store.store_credential(&Credential::for_mode(
        state.config.auth_mode,
        exchange.session_token,
    ));
    store.remember(&exchange.user);

    let outcome = state
        .gate()
        .evaluate(
            &RouteRequirement::any_authenticated(),
            Some(exchange.user),
            &mut store,
        )
        .await;

    let to = match outcome {
        GateOutcome::Authorized(user) => home_for_role(user.role),
        GateOutcome::Redirected { to, .. } => to,
    };

    (store.into_jar(), Redirect::to(to.path()))
}

/// logout
///
/// [Public Route] Invalidates the backend session (best effort) and clears the visitor's
/// storage. Always ends on `/`.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 303, description = "Logged out, redirect to /"))
)]
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Redirect) {
    let mut store = state.browser_store(jar);

    if let Some(credential) = store.credential() {
        if let Err(e) = state.backend.logout(&credential).await {
            tracing::warn!(error = %e, "Backend logout failed, clearing local session anyway");
        }
    }
    store.clear();

    (store.into_jar(), Redirect::to(Destination::SignIn.path()))
}

// --- Protected Pages ---

/// dashboard
///
/// [Authenticated Route] Generic post-login destination. Routes the user onward to
/// their role's home.
#[utoipa::path(
    get,
    path = "/dashboard",
    responses((status = 303, description = "Redirect to the role's home"))
)]
pub async fn dashboard(CurrentUser(user): CurrentUser) -> Redirect {
    Redirect::to(home_for_role(user.role).path())
}

/// my_engagement
///
/// [Consultant Route] The consultant's own engagements and weekly pulses.
#[utoipa::path(
    get,
    path = "/my-engagement",
    responses((status = 200, description = "Consultant dashboard", body = PageView))
)]
pub async fn my_engagement(CurrentUser(user): CurrentUser) -> Json<PageView> {
    Json(PageView::new(Page::ConsultantDashboard, user))
}

/// portfolio
///
/// [Lead/Admin Route] Portfolio-wide health overview.
#[utoipa::path(
    get,
    path = "/portfolio",
    responses((status = 200, description = "Portfolio dashboard", body = PageView))
)]
pub async fn portfolio(CurrentUser(user): CurrentUser) -> Json<PageView> {
    Json(PageView::new(Page::PortfolioDashboard, user))
}

#[utoipa::path(
    get,
    path = "/engagement/{engagement_id}",
    params(("engagement_id" = String, Path, description = "Engagement ID")),
    responses((status = 200, description = "Engagement detail", body = PageView))
)]
pub async fn engagement_detail(
    CurrentUser(user): CurrentUser,
    Path(engagement_id): Path<String>,
) -> Json<PageView> {
    Json(PageView::new(Page::EngagementDetail, user).with_engagement(engagement_id))
}

/// new_pulse
///
/// [Consultant Route] Weekly pulse form for an engagement.
#[utoipa::path(
    get,
    path = "/pulse/{engagement_id}",
    params(("engagement_id" = String, Path, description = "Engagement ID")),
    responses((status = 200, description = "New pulse form", body = PageView))
)]
pub async fn new_pulse(
    CurrentUser(user): CurrentUser,
    Path(engagement_id): Path<String>,
) -> Json<PageView> {
    Json(PageView::new(Page::PulseForm, user).with_engagement(engagement_id))
}

/// existing_pulse
///
/// [Authenticated Route] An already submitted pulse. Leads and admins open these from the
/// portfolio, so no role restriction applies here.
#[utoipa::path(
    get,
    path = "/pulse/{engagement_id}/{pulse_id}",
    params(
        ("engagement_id" = String, Path, description = "Engagement ID"),
        ("pulse_id" = String, Path, description = "Pulse ID")
    ),
    responses((status = 200, description = "Existing pulse", body = PageView))
)]
pub async fn existing_pulse(
    CurrentUser(user): CurrentUser,
    Path((engagement_id, pulse_id)): Path<(String, String)>,
) -> Json<PageView> {
    Json(
        PageView::new(Page::PulseForm, user)
            .with_engagement(engagement_id)
            .with_pulse(pulse_id),
    )
}

/// admin_setup
///
/// [Admin Route] Client, engagement and user management.
#[utoipa::path(
    get,
    path = "/admin",
    responses((status = 200, description = "Admin setup", body = PageView))
)]
pub async fn admin_setup(CurrentUser(user): CurrentUser) -> Json<PageView> {
    Json(PageView::new(Page::AdminSetup, user))
}

/// Unknown paths land on the entry point.
pub async fn fallback() -> Redirect {
    Redirect::to(Destination::SignIn.path())
}
