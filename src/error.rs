/// AuthError
///
/// Why an identity check ended in `Unauthenticated`. Every variant leads to the same
/// visitor-facing outcome (redirect to the public entry point); the kind is kept only
/// for diagnostic logging.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Nothing to check: the visitor's storage holds no usable credential.
    #[error("no credential present")]
    NoCredential,

    /// The backend performed the check and rejected the credential.
    #[error("credential rejected with status {0}")]
    InvalidCredential(u16),

    /// The check could not complete (transport error, undecodable body).
    #[error("identity check failed: {0}")]
    NetworkFailure(String),
}

impl AuthError {
    /// Short stable label used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoCredential => "no_credential",
            Self::InvalidCredential(_) => "invalid_credential",
            Self::NetworkFailure(_) => "network_failure",
        }
    }
}

/// ExchangeError
///
/// Failures of the sign-in callback's session exchange.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExchangeError {
    #[error("missing session id")]
    MissingSessionId,

    #[error("session exchange rejected with status {0}")]
    Rejected(u16),

    #[error("session exchange returned no credential")]
    MissingCredential,

    #[error("session exchange failed: {0}")]
    Transport(String),
}

/// BackendError
///
/// Failure of a backend call that is neither an identity check nor an exchange
/// (currently only logout).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("backend responded with status {0}")]
    Status(u16),

    #[error("backend unreachable: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}
