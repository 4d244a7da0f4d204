use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

// --- Identity Schemas (Owned by the Backend) ---

/// Role
///
/// The RBAC field carried by every user. Serialized exactly as the backend emits it
/// (`"CONSULTANT"`, `"LEAD"`, `"ADMIN"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum Role {
    Consultant,
    Lead,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Consultant => "CONSULTANT",
            Role::Lead => "LEAD",
            Role::Admin => "ADMIN",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User
///
/// The acting user's identity record as returned by the backend's identity endpoint
/// (`GET /api/auth/me`). The shell only ever holds a read-only, possibly stale copy;
/// the role is treated as fixed for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct User {
    // Backend identifier, e.g. "user_3f9a0c21b7de".
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default = "default_active")]
    pub is_active: bool,
    // Avatar reference supplied by the sign-in provider.
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    #[ts(type = "string | null")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    #[ts(type = "string | null")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

// --- Auth Flow Payloads ---

/// SessionExchangeRequest
///
/// Body of `POST /api/auth/session`: trades the short-lived `session_id` handed to
/// the callback by the sign-in provider for a long-lived credential.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SessionExchangeRequest {
    pub session_id: String,
}

/// SessionExchange
///
/// Result of a successful session exchange: the resolved user plus the credential
/// the visitor must present on every later identity check.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionExchange {
    pub user: User,
    pub session_token: String,
}

/// CallbackParams
///
/// Query parameters accepted by `/auth/callback`.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct CallbackParams {
    pub session_id: Option<String>,
}

// --- Page Schemas (Output) ---

/// Page
///
/// Identifies which page of the application a view belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Page {
    Landing,
    ConsultantDashboard,
    PortfolioDashboard,
    EngagementDetail,
    PulseForm,
    AdminSetup,
}

/// PageView
///
/// What a protected page receives once the gate has let the request through.
/// `user` is always a resolved, role-checked identity.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct PageView {
    pub page: Page,
    pub user: User,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engagement_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pulse_id: Option<String>,
}

impl PageView {
    pub fn new(page: Page, user: User) -> Self {
        Self {
            page,
            user,
            engagement_id: None,
            pulse_id: None,
        }
    }

    pub fn with_engagement(mut self, engagement_id: String) -> Self {
        self.engagement_id = Some(engagement_id);
        self
    }

    pub fn with_pulse(mut self, pulse_id: String) -> Self {
        self.pulse_id = Some(pulse_id);
        self
    }
}

/// LandingView
///
/// Public entry point. `returning_user` is the optimistically cached identity, if any;
/// it is never trusted for authorization.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LandingView {
    pub page: Page,
    pub sign_in_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub returning_user: Option<User>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_parses_backend_representation() {
        let json = r#"{
            "user_id": "user_3f9a0c21b7de",
            "name": "Dana Reyes",
            "email": "dana@example.com",
            "picture": null,
            "role": "LEAD",
            "is_active": true,
            "created_at": "2025-01-06T09:15:00.123456+00:00",
            "updated_at": "2025-01-06T09:15:00+00:00"
        }"#;

        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.role, Role::Lead);
        assert!(user.created_at.is_some());
    }

    #[test]
    fn user_tolerates_missing_optional_fields() {
        let json = r#"{"user_id":"u1","name":"A","email":"a@x.io","role":"CONSULTANT"}"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert!(user.is_active);
        assert_eq!(user.picture, None);
    }

    #[test]
    fn unknown_role_is_rejected() {
        let json = r#"{"user_id":"u1","name":"A","email":"a@x.io","role":"SUPERUSER"}"#;
        assert!(serde_json::from_str::<User>(json).is_err());
    }
}
