use axum::{
    extract::FromRef,
    http::HeaderName,
    Router,
};
use axum_extra::extract::cookie::CookieJar;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Session gate and the pieces it is built from.
pub mod auth;
pub mod backend;
pub mod credentials;
pub mod error;
pub mod gate;

// Pages, payloads and configuration.
pub mod config;
pub mod handlers;
pub mod models;

// Module for routing segregation (Public, Authenticated, Restricted).
pub mod routes;
use routes::{authenticated, public, restricted};

// --- Public Re-exports ---

pub use backend::{BackendState, HttpIdentityBackend, IdentityBackend, MockIdentityBackend};
pub use config::AppConfig;
pub use gate::SessionGate;

/// ApiDoc
///
/// OpenAPI document for the shell's pages and auth flow, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::landing, handlers::sign_in, handlers::auth_callback, handlers::logout,
        handlers::dashboard, handlers::my_engagement, handlers::portfolio,
        handlers::engagement_detail, handlers::new_pulse, handlers::existing_pulse,
        handlers::admin_setup
    ),
    components(
        schemas(
            models::User, models::Role, models::Page, models::PageView, models::LandingView,
            models::SessionExchangeRequest,
        )
    ),
    tags(
        (name = "engagement-pulse", description = "Engagement Pulse web shell")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared, cheaply cloneable container for everything a request needs: the backend
/// client and the immutable configuration.
#[derive(Clone)]
pub struct AppState {
    /// Backend Layer: identity checks, session exchange and logout.
    pub backend: BackendState,
    /// Configuration: the loaded, immutable environment configuration.
    pub config: AppConfig,
}

impl AppState {
    /// A session gate over this state's backend.
    pub fn gate(&self) -> SessionGate {
        SessionGate::new(self.backend.clone())
    }

    /// The visitor's persistent storage, configured for this deployment's credential
    /// mechanism.
    pub fn browser_store(&self, jar: CookieJar) -> credentials::BrowserStore {
        credentials::BrowserStore::new(jar, self.config.auth_mode, self.config.secure_cookies())
    }
}

// --- Axum FromRef Extractor Implementations ---

// Lets handlers that only need configuration take `State<AppConfig>`.
impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the page routes, the session gate layers and the observability stack.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public pages and the sign-in / sign-out flow.
        .merge(public::public_routes())
        // Any authenticated user.
        .merge(authenticated::authenticated_routes(&state))
        // Role-gated pages.
        .merge(restricted::restricted_routes(&state))
        // Unknown paths go back to the entry point.
        .fallback(handlers::fallback)
        .with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span per request, tagged with the `x-request-id` so every log line of a request
/// (including the gate's decision) can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
