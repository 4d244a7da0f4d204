use async_trait::async_trait;
use axum_extra::extract::cookie::Cookie;
use reqwest::{RequestBuilder, StatusCode, header};
use serde::Deserialize;
use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use crate::{
    credentials::{Credential, SESSION_COOKIE},
    error::{AuthError, BackendError, ExchangeError},
    models::{SessionExchange, SessionExchangeRequest, User},
};

// 1. IdentityBackend Contract
/// IdentityBackend
///
/// The slice of the Engagement Pulse backend the shell depends on. Implemented over HTTP
/// in production and by `MockIdentityBackend` in tests, so the gate and the handlers never
/// see the transport.
#[async_trait]
pub trait IdentityBackend: Send + Sync {
    /// "Who am I": resolves the credential to the acting user.
    /// Any non-200 answer or transport failure is an `AuthError`.
    async fn who_am_i(&self, credential: &Credential) -> Result<User, AuthError>;

    /// Trades the sign-in provider's short-lived session id for a user and a long-lived
    /// session token.
    async fn exchange_session(&self, session_id: &str) -> Result<SessionExchange, ExchangeError>;

    /// Invalidates the server-side session behind the credential.
    async fn logout(&self, credential: &Credential) -> Result<(), BackendError>;
}

/// BackendState
///
/// The concrete type used to share backend access across the application state.
pub type BackendState = Arc<dyn IdentityBackend>;

// 2. The Real Implementation (HTTP)
/// HttpIdentityBackend
///
/// Talks to the backend's `/api/auth/*` endpoints with reqwest. The credential decides
/// how it is presented: bearer header or relayed session cookie.
#[derive(Clone)]
pub struct HttpIdentityBackend {
    client: reqwest::Client,
    base_url: String,
}

/// Body of a successful exchange: the user representation, optionally carrying the
/// session token inline.
#[derive(Deserialize)]
struct ExchangeBody {
    #[serde(flatten)]
    user: User,
    #[serde(default)]
    session_token: Option<String>,
}

impl HttpIdentityBackend {
    /// new
    ///
    /// Builds the HTTP client. `base_url` is the backend origin without the `/api` prefix.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }
}

/// Attaches the credential the way its mechanism requires.
fn with_credential(request: RequestBuilder, credential: &Credential) -> RequestBuilder {
    match credential {
        Credential::Bearer(token) => request.bearer_auth(token),
        Credential::Cookie(token) => {
            request.header(header::COOKIE, format!("{}={}", SESSION_COOKIE, token))
        }
    }
}

/// Pulls the backend's `session_token` out of its `Set-Cookie` headers.
fn session_token_from_headers(headers: &header::HeaderMap) -> Option<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|raw| Cookie::parse(raw.to_string()).ok())
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

#[async_trait]
impl IdentityBackend for HttpIdentityBackend {
    async fn who_am_i(&self, credential: &Credential) -> Result<User, AuthError> {
        let response = with_credential(self.client.get(self.url("/auth/me")), credential)
            .send()
            .await
            .map_err(|e| AuthError::NetworkFailure(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(AuthError::InvalidCredential(status.as_u16()));
        }

        response
            .json::<User>()
            .await
            .map_err(|e| AuthError::NetworkFailure(e.to_string()))
    }

    async fn exchange_session(&self, session_id: &str) -> Result<SessionExchange, ExchangeError> {
        let response = self
            .client
            .post(self.url("/auth/session"))
            .json(&SessionExchangeRequest {
                session_id: session_id.to_string(),
            })
            .send()
            .await
            .map_err(|e| ExchangeError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExchangeError::Rejected(status.as_u16()));
        }

        // Read the cookie before the body consumes the response.
        let cookie_token = session_token_from_headers(response.headers());

        let body = response
            .json::<ExchangeBody>()
            .await
            .map_err(|e| ExchangeError::Transport(e.to_string()))?;

        let session_token = body
            .session_token
            .filter(|token| !token.is_empty())
            .or(cookie_token)
            .ok_or(ExchangeError::MissingCredential)?;

        Ok(SessionExchange {
            user: body.user,
            session_token,
        })
    }

    async fn logout(&self, credential: &Credential) -> Result<(), BackendError> {
        // The backend only deletes the session it finds in the `session_token` cookie,
        // whatever mechanism the deployment uses for identity checks.
        let mut request = self
            .client
            .post(self.url("/auth/logout"))
            .header(header::COOKIE, format!("{}={}", SESSION_COOKIE, credential.token()));
        if let Credential::Bearer(token) = credential {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status(status.as_u16()));
        }
        Ok(())
    }
}

// 3. The Mock Implementation (For Tests)
/// MockIdentityBackend
///
/// In-memory backend: a table of accepted session tokens, a table of exchangeable session
/// ids, and counters so tests can assert how many identity checks actually happened.
#[derive(Default)]
pub struct MockIdentityBackend {
    /// session token -> user
    sessions: HashMap<String, User>,
    /// session id -> (session token, user)
    pending_exchanges: HashMap<String, (String, User)>,
    /// When true, every call fails as if the backend were unreachable.
    pub offline: bool,
    identity_calls: AtomicUsize,
    logged_out: Mutex<Vec<String>>,
}

impl MockIdentityBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    /// Accepts `token` as a valid credential for `user`.
    pub fn with_session(mut self, token: &str, user: User) -> Self {
        self.sessions.insert(token.to_string(), user);
        self
    }

    /// Makes `session_id` exchangeable for `token`, which then also resolves to `user`.
    pub fn with_pending_exchange(mut self, session_id: &str, token: &str, user: User) -> Self {
        self.pending_exchanges
            .insert(session_id.to_string(), (token.to_string(), user.clone()));
        self.sessions.insert(token.to_string(), user);
        self
    }

    /// Number of `who_am_i` calls served so far.
    pub fn identity_calls(&self) -> usize {
        self.identity_calls.load(Ordering::SeqCst)
    }

    /// Tokens passed to `logout`, in call order.
    pub fn logged_out(&self) -> Vec<String> {
        self.logged_out
            .lock()
            .map(|tokens| tokens.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl IdentityBackend for MockIdentityBackend {
    async fn who_am_i(&self, credential: &Credential) -> Result<User, AuthError> {
        self.identity_calls.fetch_add(1, Ordering::SeqCst);

        if self.offline {
            return Err(AuthError::NetworkFailure("mock backend offline".to_string()));
        }

        self.sessions
            .get(credential.token())
            .cloned()
            .ok_or(AuthError::InvalidCredential(401))
    }

    async fn exchange_session(&self, session_id: &str) -> Result<SessionExchange, ExchangeError> {
        if self.offline {
            return Err(ExchangeError::Transport("mock backend offline".to_string()));
        }

        self.pending_exchanges
            .get(session_id)
            .map(|(token, user)| SessionExchange {
                user: user.clone(),
                session_token: token.clone(),
            })
            .ok_or(ExchangeError::Rejected(401))
    }

    async fn logout(&self, credential: &Credential) -> Result<(), BackendError> {
        if self.offline {
            return Err(BackendError::Transport("mock backend offline".to_string()));
        }

        if let Ok(mut tokens) = self.logged_out.lock() {
            tokens.push(credential.token().to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn session_token_is_read_from_set_cookie() {
        let mut headers = header::HeaderMap::new();
        headers.append(
            header::SET_COOKIE,
            HeaderValue::from_static("other=1; Path=/"),
        );
        headers.append(
            header::SET_COOKIE,
            HeaderValue::from_static(
                "session_token=abc123; HttpOnly; Secure; SameSite=none; Path=/; Max-Age=604800",
            ),
        );

        assert_eq!(session_token_from_headers(&headers), Some("abc123".to_string()));
    }

    #[test]
    fn missing_session_cookie_yields_none() {
        let headers = header::HeaderMap::new();
        assert_eq!(session_token_from_headers(&headers), None);
    }
}
