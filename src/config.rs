use axum::http::HeaderValue;
use std::{env, time::Duration};

/// AppConfig
///
/// Holds the shell's entire configuration state. Immutable once loaded and shared
/// through `AppState` via `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls cookie hardening and log format.
    pub env: Env,
    // Base URL of the Engagement Pulse backend (the `/api` prefix is appended per call).
    pub backend_url: String,
    // Which credential mechanism this deployment uses.
    pub auth_mode: AuthMode,
    // Externally visible origin of this shell, used to build the sign-in callback URL.
    pub public_url: String,
    // External sign-in provider entry point.
    pub sign_in_url: String,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // Upper bound for a single backend round-trip.
    pub backend_timeout: Duration,
}

/// Env
///
/// Defines the runtime context.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

/// AuthMode
///
/// The credential mechanism of a deployment. Exactly one is active; the session gate
/// is unaware of which.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AuthMode {
    /// Bearer token kept in the visitor's storage and sent as `Authorization: Bearer`.
    Bearer,
    /// Backend-issued `session_token` cookie relayed to the backend as-is.
    Cookie,
}

impl AuthMode {
    /// Parses the `AUTH_MODE` value. Unknown values fall back to `Bearer`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "cookie" => AuthMode::Cookie,
            _ => AuthMode::Bearer,
        }
    }
}

const LOCAL_BACKEND_URL: &str = "http://localhost:8001";
const DEFAULT_PUBLIC_URL: &str = "http://localhost:3000";
const DEFAULT_SIGN_IN_URL: &str = "https://auth.emergentagent.com/";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 10;

impl Default for AppConfig {
    /// default
    ///
    /// Test-safe configuration that never touches the process environment.
    fn default() -> Self {
        Self {
            env: Env::Local,
            backend_url: LOCAL_BACKEND_URL.to_string(),
            auth_mode: AuthMode::Bearer,
            public_url: DEFAULT_PUBLIC_URL.to_string(),
            sign_in_url: DEFAULT_SIGN_IN_URL.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            backend_timeout: Duration::from_secs(DEFAULT_BACKEND_TIMEOUT_SECS),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables.
    ///
    /// # Panics
    /// Panics in production when `BACKEND_URL` is not set, so the shell never starts
    /// pointing at a development backend. Panics in any environment when `SIGN_IN_URL`
    /// cannot be sent as a redirect header.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let backend_url = match env {
            Env::Production => {
                env::var("BACKEND_URL").expect("FATAL: BACKEND_URL must be set in production.")
            }
            Env::Local => env::var("BACKEND_URL").unwrap_or_else(|_| LOCAL_BACKEND_URL.to_string()),
        };

        let auth_mode = env::var("AUTH_MODE")
            .map(|raw| AuthMode::parse(&raw))
            .unwrap_or(AuthMode::Bearer);

        // Sent verbatim as a `Location` header on every sign-in redirect.
        let sign_in_url = env::var("SIGN_IN_URL").unwrap_or_else(|_| DEFAULT_SIGN_IN_URL.to_string());
        HeaderValue::from_str(&sign_in_url)
            .expect("FATAL: SIGN_IN_URL must be a valid header value.");

        let backend_timeout = env::var("BACKEND_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
            .unwrap_or(DEFAULT_BACKEND_TIMEOUT_SECS);

        Self {
            env,
            backend_url: backend_url.trim_end_matches('/').to_string(),
            auth_mode,
            public_url: env::var("PUBLIC_URL")
                .unwrap_or_else(|_| DEFAULT_PUBLIC_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            sign_in_url,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            backend_timeout: Duration::from_secs(backend_timeout),
        }
    }

    /// Cookies carry the `Secure` attribute outside local development.
    pub fn secure_cookies(&self) -> bool {
        self.env == Env::Production
    }

    /// The provider URL the landing page sends visitors to, with the callback encoded
    /// as the `redirect` parameter.
    pub fn sign_in_redirect(&self) -> String {
        let callback = format!("{}/auth/callback", self.public_url);
        let separator = if self.sign_in_url.contains('?') { '&' } else { '?' };
        format!(
            "{}{}redirect={}",
            self.sign_in_url,
            separator,
            urlencoding::encode(&callback)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_mode_parsing() {
        assert_eq!(AuthMode::parse("cookie"), AuthMode::Cookie);
        assert_eq!(AuthMode::parse(" COOKIE "), AuthMode::Cookie);
        assert_eq!(AuthMode::parse("bearer"), AuthMode::Bearer);
        assert_eq!(AuthMode::parse("anything"), AuthMode::Bearer);
    }

    #[test]
    fn sign_in_redirect_encodes_callback() {
        let config = AppConfig::default();
        assert_eq!(
            config.sign_in_redirect(),
            "https://auth.emergentagent.com/?redirect=http%3A%2F%2Flocalhost%3A3000%2Fauth%2Fcallback"
        );
    }

    #[test]
    fn sign_in_redirect_appends_to_existing_query() {
        let config = AppConfig {
            sign_in_url: "https://sso.example.com/start?tenant=acme".to_string(),
            ..AppConfig::default()
        };
        assert!(config.sign_in_redirect().starts_with("https://sso.example.com/start?tenant=acme&redirect="));
    }
}
