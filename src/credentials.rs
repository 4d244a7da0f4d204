use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

use crate::{config::AuthMode, models::User};

/// Bearer token cookie (bearer deployments).
pub const TOKEN_COOKIE: &str = "pulse_token";
/// Cached user cookie, URL-encoded JSON.
pub const USER_COOKIE: &str = "pulse_user";
/// Backend session cookie (cookie deployments). Name matches the backend's own cookie.
pub const SESSION_COOKIE: &str = "session_token";

const CREDENTIAL_TTL_DAYS: i64 = 7;

/// Credential
///
/// What the backend client attaches to an identity check. The variant is decided by the
/// deployment's `AuthMode`, never by the gate.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    Bearer(String),
    Cookie(String),
}

impl Credential {
    /// Wraps a backend-issued session token in the mechanism of the given mode.
    pub fn for_mode(mode: AuthMode, token: String) -> Self {
        match mode {
            AuthMode::Bearer => Credential::Bearer(token),
            AuthMode::Cookie => Credential::Cookie(token),
        }
    }

    pub fn token(&self) -> &str {
        match self {
            Credential::Bearer(token) | Credential::Cookie(token) => token,
        }
    }
}

// Tokens stay out of logs.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credential::Bearer(_) => f.write_str("Credential::Bearer(..)"),
            Credential::Cookie(_) => f.write_str("Credential::Cookie(..)"),
        }
    }
}

/// CredentialStore
///
/// The visitor's persistent client-side storage: one credential plus an optimistic copy
/// of the last resolved user. Written by the auth flows (callback, logout) and by the
/// gate itself (refresh on success, clear on rejection).
pub trait CredentialStore {
    /// The credential to present on the next identity check, if any.
    fn credential(&self) -> Option<Credential>;

    /// The last user written by `remember`. Stale by definition.
    fn cached_user(&self) -> Option<User>;

    fn store_credential(&mut self, credential: &Credential);

    fn remember(&mut self, user: &User);

    /// Drops both the credential and the cached user.
    fn clear(&mut self);
}

/// BrowserStore
///
/// `CredentialStore` over the visitor's cookie jar. Reads come from the request cookies;
/// writes accumulate in the jar and reach the browser as `Set-Cookie` headers once the
/// jar is returned as part of the response.
#[derive(Debug, Clone)]
pub struct BrowserStore {
    jar: CookieJar,
    mode: AuthMode,
    secure: bool,
}

impl BrowserStore {
    pub fn new(jar: CookieJar, mode: AuthMode, secure: bool) -> Self {
        Self { jar, mode, secure }
    }

    /// Hands back the jar, including every pending cookie change.
    pub fn into_jar(self) -> CookieJar {
        self.jar
    }

    fn persistent_cookie(&self, name: &'static str, value: String) -> Cookie<'static> {
        Cookie::build((name, value))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(Duration::days(CREDENTIAL_TTL_DAYS))
            .build()
    }

    fn credential_cookie_name(&self) -> &'static str {
        match self.mode {
            AuthMode::Bearer => TOKEN_COOKIE,
            AuthMode::Cookie => SESSION_COOKIE,
        }
    }
}

impl CredentialStore for BrowserStore {
    fn credential(&self) -> Option<Credential> {
        self.jar
            .get(self.credential_cookie_name())
            .map(|c| c.value().to_string())
            .filter(|token| !token.is_empty())
            .map(|token| Credential::for_mode(self.mode, token))
    }

    fn cached_user(&self) -> Option<User> {
        let cookie = self.jar.get(USER_COOKIE)?;
        let decoded = urlencoding::decode(cookie.value()).ok()?;
        serde_json::from_str(&decoded).ok()
    }

    fn store_credential(&mut self, credential: &Credential) {
        let name = match credential {
            Credential::Bearer(_) => TOKEN_COOKIE,
            Credential::Cookie(_) => SESSION_COOKIE,
        };
        let cookie = self.persistent_cookie(name, credential.token().to_string());
        self.jar = self.jar.clone().add(cookie);
    }

    fn remember(&mut self, user: &User) {
        let Ok(json) = serde_json::to_string(user) else {
            return;
        };
        let cookie = self.persistent_cookie(USER_COOKIE, urlencoding::encode(&json).into_owned());
        self.jar = self.jar.clone().add(cookie);
    }

    fn clear(&mut self) {
        let mut jar = self.jar.clone();
        for name in [TOKEN_COOKIE, USER_COOKIE, SESSION_COOKIE] {
            if jar.get(name).is_some() {
                jar = jar.remove(Cookie::build((name, "")).path("/"));
            }
        }
        self.jar = jar;
    }
}

/// In-process `CredentialStore` for exercising the gate without a cookie jar.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub(crate) struct MemoryStore {
    credential: Option<Credential>,
    user: Option<User>,
}

#[cfg(test)]
impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_credential(credential: Credential) -> Self {
        Self {
            credential: Some(credential),
            user: None,
        }
    }
}

#[cfg(test)]
impl CredentialStore for MemoryStore {
    fn credential(&self) -> Option<Credential> {
        self.credential.clone()
    }

    fn cached_user(&self) -> Option<User> {
        self.user.clone()
    }

    fn store_credential(&mut self, credential: &Credential) {
        self.credential = Some(credential.clone());
    }

    fn remember(&mut self, user: &User) {
        self.user = Some(user.clone());
    }

    fn clear(&mut self) {
        self.credential = None;
        self.user = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn user() -> User {
        User {
            user_id: "user_1".to_string(),
            name: "Ana; Lima".to_string(),
            email: "ana@example.com".to_string(),
            role: Role::Consultant,
            is_active: true,
            picture: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn bearer_store_reads_token_cookie_only() {
        let jar = CookieJar::new()
            .add(Cookie::new(TOKEN_COOKIE, "tok"))
            .add(Cookie::new(SESSION_COOKIE, "sess"));
        let store = BrowserStore::new(jar, AuthMode::Bearer, false);
        assert_eq!(store.credential(), Some(Credential::Bearer("tok".to_string())));
    }

    #[test]
    fn cookie_store_reads_session_cookie_only() {
        let jar = CookieJar::new().add(Cookie::new(TOKEN_COOKIE, "tok"));
        let store = BrowserStore::new(jar, AuthMode::Cookie, false);
        assert_eq!(store.credential(), None);
    }

    #[test]
    fn empty_token_is_no_credential() {
        let jar = CookieJar::new().add(Cookie::new(TOKEN_COOKIE, ""));
        let store = BrowserStore::new(jar, AuthMode::Bearer, false);
        assert_eq!(store.credential(), None);
    }

    #[test]
    fn remembered_user_survives_cookie_encoding() {
        let mut store = BrowserStore::new(CookieJar::new(), AuthMode::Bearer, false);
        store.remember(&user());

        let jar = store.clone().into_jar();
        let raw = jar.get(USER_COOKIE).unwrap();
        assert!(!raw.value().contains(';'));
        assert_eq!(store.cached_user(), Some(user()));
    }

    #[test]
    fn garbage_user_cookie_is_ignored() {
        let jar = CookieJar::new().add(Cookie::new(USER_COOKIE, "%7Bnot-json"));
        let store = BrowserStore::new(jar, AuthMode::Bearer, false);
        assert_eq!(store.cached_user(), None);
    }

    #[test]
    fn clear_drops_credential_and_user() {
        let jar = CookieJar::new().add(Cookie::new(TOKEN_COOKIE, "tok"));
        let mut store = BrowserStore::new(jar, AuthMode::Bearer, false);
        store.remember(&user());

        store.clear();

        assert_eq!(store.credential(), None);
        assert_eq!(store.cached_user(), None);
    }

    #[test]
    fn memory_store_round_trip() {
        let mut store = MemoryStore::with_credential(Credential::Cookie("s".to_string()));
        store.remember(&user());
        assert!(store.cached_user().is_some());

        store.clear();
        assert_eq!(store.credential(), None);
        assert_eq!(store.cached_user(), None);
    }

    #[test]
    fn credential_debug_hides_token() {
        let rendered = format!("{:?}", Credential::Bearer("secret".to_string()));
        assert!(!rendered.contains("secret"));
    }
}
