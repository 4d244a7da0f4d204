use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use engagement_pulse::{
    HttpIdentityBackend, IdentityBackend,
    credentials::Credential,
    error::{AuthError, ExchangeError},
    models::Role,
};
use serde_json::{Value, json};
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::net::TcpListener;

// --- Fake Backend ---

fn user_json() -> Value {
    json!({
        "user_id": "user_9b2d41c0aa17",
        "name": "Sam Okafor",
        "email": "sam@example.com",
        "picture": null,
        "role": "ADMIN",
        "is_active": true,
        "created_at": "2025-02-03T08:00:00+00:00",
        "updated_at": "2025-02-03T08:00:00+00:00"
    })
}

/// Accepts "good" either as a bearer token or as the session cookie, like the real
/// backend's cookie-then-header lookup.
async fn fake_me(headers: HeaderMap) -> Response {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    let cookie = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').any(|pair| pair.trim() == "session_token=good"))
        .unwrap_or(false);

    if bearer == Some("good") || cookie {
        Json(user_json()).into_response()
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Not authenticated"}))).into_response()
    }
}

async fn fake_session(Json(body): Json<Value>) -> Response {
    match body["session_id"].as_str() {
        Some("sid-cookie") => (
            [(
                header::SET_COOKIE,
                "session_token=from-cookie; HttpOnly; Path=/; SameSite=none; Secure; Max-Age=604800",
            )],
            Json(user_json()),
        )
            .into_response(),
        Some("sid-body") => {
            let mut user = user_json();
            user["session_token"] = json!("from-body");
            Json(user).into_response()
        }
        Some("sid-none") => Json(user_json()).into_response(),
        _ => (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Invalid session"}))).into_response(),
    }
}

/// Session tokens the fake backend was asked to delete, read from the `Cookie` header
/// only, like the real backend's logout.
type LoggedOut = Arc<Mutex<Vec<String>>>;

async fn fake_logout(State(logged_out): State<LoggedOut>, headers: HeaderMap) -> Json<Value> {
    let token = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            v.split(';')
                .find_map(|pair| pair.trim().strip_prefix("session_token="))
        })
        .map(str::to_string);

    if let Some(token) = token {
        logged_out.lock().unwrap().push(token);
    }
    Json(json!({"message": "Logged out"}))
}

async fn spawn_backend() -> String {
    spawn_backend_recording_logouts().await.0
}

async fn spawn_backend_recording_logouts() -> (String, LoggedOut) {
    let logged_out = LoggedOut::default();
    let router = Router::new()
        .route("/api/auth/me", get(fake_me))
        .route("/api/auth/session", post(fake_session))
        .route("/api/auth/logout", post(fake_logout))
        .with_state(logged_out.clone());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (format!("http://127.0.0.1:{}", port), logged_out)
}

fn client(base_url: &str) -> HttpIdentityBackend {
    HttpIdentityBackend::new(base_url, Duration::from_secs(5)).unwrap()
}

// --- Identity Check ---

#[tokio::test]
async fn test_who_am_i_with_bearer_token() {
    let backend = client(&spawn_backend().await);

    let user = backend
        .who_am_i(&Credential::Bearer("good".to_string()))
        .await
        .unwrap();

    assert_eq!(user.user_id, "user_9b2d41c0aa17");
    assert_eq!(user.role, Role::Admin);
}

#[tokio::test]
async fn test_who_am_i_with_relayed_cookie() {
    let backend = client(&spawn_backend().await);

    let user = backend
        .who_am_i(&Credential::Cookie("good".to_string()))
        .await
        .unwrap();

    assert_eq!(user.email, "sam@example.com");
}

#[tokio::test]
async fn test_who_am_i_rejected_credential() {
    let backend = client(&spawn_backend().await);

    let result = backend
        .who_am_i(&Credential::Bearer("expired".to_string()))
        .await;

    assert_eq!(result, Err(AuthError::InvalidCredential(401)));
}

#[tokio::test]
async fn test_who_am_i_unreachable_backend() {
    // Reserve a port, then free it so nothing is listening.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let backend = client(&format!("http://127.0.0.1:{}", port));
    let result = backend.who_am_i(&Credential::Bearer("good".to_string())).await;

    assert!(matches!(result, Err(AuthError::NetworkFailure(_))));
}

// --- Session Exchange ---

#[tokio::test]
async fn test_exchange_reads_token_from_set_cookie() {
    let backend = client(&spawn_backend().await);

    let exchange = backend.exchange_session("sid-cookie").await.unwrap();

    assert_eq!(exchange.session_token, "from-cookie");
    assert_eq!(exchange.user.name, "Sam Okafor");
}

#[tokio::test]
async fn test_exchange_prefers_token_in_body() {
    let backend = client(&spawn_backend().await);

    let exchange = backend.exchange_session("sid-body").await.unwrap();

    assert_eq!(exchange.session_token, "from-body");
}

#[tokio::test]
async fn test_exchange_without_any_token_fails() {
    let backend = client(&spawn_backend().await);

    let result = backend.exchange_session("sid-none").await;

    assert_eq!(result, Err(ExchangeError::MissingCredential));
}

#[tokio::test]
async fn test_exchange_rejected_session_id() {
    let backend = client(&spawn_backend().await);

    let result = backend.exchange_session("forged").await;

    assert_eq!(result, Err(ExchangeError::Rejected(401)));
}

// --- Logout ---

#[tokio::test]
async fn test_logout_relays_session_cookie() {
    let (base_url, logged_out) = spawn_backend_recording_logouts().await;
    let backend = client(&base_url);

    let result = backend.logout(&Credential::Cookie("good".to_string())).await;

    assert!(result.is_ok());
    assert_eq!(*logged_out.lock().unwrap(), vec!["good".to_string()]);
}

#[tokio::test]
async fn test_logout_in_bearer_mode_still_ends_backend_session() {
    let (base_url, logged_out) = spawn_backend_recording_logouts().await;
    let backend = client(&base_url);

    let result = backend.logout(&Credential::Bearer("tok-live".to_string())).await;

    assert!(result.is_ok());
    assert_eq!(*logged_out.lock().unwrap(), vec!["tok-live".to_string()]);
}
