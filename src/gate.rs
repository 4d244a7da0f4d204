//! Session gate: resolves who the visitor is, then decides whether a protected page
//! renders or the visitor is sent elsewhere.
//!
//! Resolution happens once per protected request (no caching across requests), with at
//! most one identity round-trip. A user handed off by the sign-in callback skips that
//! round-trip entirely.

use crate::{
    backend::BackendState,
    credentials::CredentialStore,
    error::AuthError,
    models::{Role, User},
};

/// RouteRequirement
///
/// Static per-route declaration of who may see a page. An empty role set means "any
/// authenticated user".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteRequirement {
    allowed: Vec<Role>,
}

impl RouteRequirement {
    pub fn any_authenticated() -> Self {
        Self::default()
    }

    pub fn roles(roles: impl IntoIterator<Item = Role>) -> Self {
        let mut allowed: Vec<Role> = Vec::new();
        for role in roles {
            if !allowed.contains(&role) {
                allowed.push(role);
            }
        }
        Self { allowed }
    }

    pub fn allowed(&self) -> &[Role] {
        &self.allowed
    }

    pub fn admits(&self, role: Role) -> bool {
        self.allowed.is_empty() || self.allowed.contains(&role)
    }
}

/// Where a redirected visitor ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// Public entry point (`/`).
    SignIn,
    /// `/my-engagement`
    ConsultantHome,
    /// `/portfolio`
    PortfolioHome,
}

impl Destination {
    pub fn path(&self) -> &'static str {
        match self {
            Destination::SignIn => "/",
            Destination::ConsultantHome => "/my-engagement",
            Destination::PortfolioHome => "/portfolio",
        }
    }
}

/// Fixed role -> home mapping. Anything other than a consultant lands on the portfolio.
pub fn home_for_role(role: Role) -> Destination {
    match role {
        Role::Consultant => Destination::ConsultantHome,
        Role::Lead | Role::Admin => Destination::PortfolioHome,
    }
}

/// Session
///
/// Outcome of authentication for a single protected request. The user exists exactly
/// when the session is authenticated; the error exists exactly when it is not.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Session {
    #[default]
    Unresolved,
    Authenticated(User),
    Unauthenticated(AuthError),
}

impl Session {
    /// Authorization for a resolved session. `None` while still unresolved: the caller
    /// keeps showing its loading state.
    pub fn authorize(&self, requirement: &RouteRequirement) -> Option<GateOutcome> {
        match self {
            Session::Unresolved => None,
            Session::Unauthenticated(error) => Some(GateOutcome::Redirected {
                to: Destination::SignIn,
                reason: RedirectReason::Unauthenticated(error.clone()),
            }),
            Session::Authenticated(user) if requirement.admits(user.role) => {
                Some(GateOutcome::Authorized(user.clone()))
            }
            Session::Authenticated(user) => Some(GateOutcome::Redirected {
                to: home_for_role(user.role),
                reason: RedirectReason::RoleMismatch { role: user.role },
            }),
        }
    }
}

/// Why a visitor was redirected instead of seeing the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectReason {
    Unauthenticated(AuthError),
    /// Valid user, wrong page. Not an error: the visitor is relocated to their own home.
    RoleMismatch { role: Role },
}

/// GateOutcome
///
/// Terminal decision for a protected request.
#[derive(Debug, Clone, PartialEq)]
pub enum GateOutcome {
    Authorized(User),
    Redirected {
        to: Destination,
        reason: RedirectReason,
    },
}

/// SessionGate
///
/// Stateless apart from the backend handle; cheap to clone into every request.
/// Duplicate evaluations of the same request are harmless: each one recomputes the same
/// outcome and rewrites the same storage.
#[derive(Clone)]
pub struct SessionGate {
    backend: BackendState,
}

impl SessionGate {
    pub fn new(backend: BackendState) -> Self {
        Self { backend }
    }

    /// Resolution path for a user handed off by a previous navigation step.
    /// No network call.
    pub fn resolve_handoff(user: User) -> Session {
        Session::Authenticated(user)
    }

    /// resolve
    ///
    /// Drives `Unresolved` to a terminal state.
    ///
    /// - hand-off present: authenticated immediately;
    /// - no credential in storage: unauthenticated, storage cleared;
    /// - otherwise one identity check. Success refreshes the cached user, any failure
    ///   clears storage so later requests do not retry stale data.
    pub async fn resolve<S>(&self, handoff: Option<User>, store: &mut S) -> Session
    where
        S: CredentialStore + ?Sized,
    {
        if let Some(user) = handoff {
            return Self::resolve_handoff(user);
        }

        let Some(credential) = store.credential() else {
            store.clear();
            return Session::Unauthenticated(AuthError::NoCredential);
        };

        match self.backend.who_am_i(&credential).await {
            Ok(user) => {
                store.remember(&user);
                Session::Authenticated(user)
            }
            Err(error) => {
                store.clear();
                Session::Unauthenticated(error)
            }
        }
    }

    /// evaluate
    ///
    /// Resolve, then authorize against the route's requirement.
    pub async fn evaluate<S>(
        &self,
        requirement: &RouteRequirement,
        handoff: Option<User>,
        store: &mut S,
    ) -> GateOutcome
    where
        S: CredentialStore + ?Sized,
    {
        let session = self.resolve(handoff, store).await;
        let outcome = match session.authorize(requirement) {
            Some(outcome) => outcome,
            // resolve never returns Unresolved
            None => GateOutcome::Redirected {
                to: Destination::SignIn,
                reason: RedirectReason::Unauthenticated(AuthError::NoCredential),
            },
        };

        match &outcome {
            GateOutcome::Authorized(user) => {
                tracing::debug!(user_id = %user.user_id, role = %user.role, "session gate: authorized");
            }
            GateOutcome::Redirected {
                to,
                reason: RedirectReason::Unauthenticated(error),
            } => {
                tracing::info!(kind = error.kind(), error = %error, to = to.path(), "session gate: unauthenticated");
            }
            GateOutcome::Redirected {
                to,
                reason: RedirectReason::RoleMismatch { role },
            } => {
                tracing::info!(%role, required = ?requirement.allowed(), to = to.path(), "session gate: role mismatch");
            }
        }

        outcome
    }
}
