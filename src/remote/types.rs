//! Provider-neutral session, event, and error types.
//!
//! Every remote call returns a tagged `Result` whose error carries an
//! explicit [`ErrorKind`], so callers can match exhaustively instead of
//! probing a loosely shaped response body.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// ERROR
// =============================================================================

/// Stable machine-readable code plus a retry hint for user-facing errors.
pub trait ErrorCode: fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

/// Classification of a failed remote or local operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The service endpoint or anonymous key is not configured.
    ConfigurationMissing,
    /// Email/password pair rejected by the identity service.
    InvalidCredentials,
    /// One-time code is wrong, already used, or expired.
    CodeExpiredOrInvalid,
    /// Input rejected locally before any remote call.
    Validation,
    /// The call did not complete within its bound.
    Timeout,
    /// Any other network or service failure, passed through verbatim.
    Service,
}

/// Error returned by every [`RemoteService`](super::RemoteService) call.
///
/// `message` is the text shown to the user; for service failures it is the
/// service's own wording.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ServiceError {
    pub kind: ErrorKind,
    pub message: String,
    /// HTTP status when the failure came from a response, if any.
    pub status: Option<u16>,
}

impl ServiceError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), status: None }
    }

    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn configuration_missing() -> Self {
        Self::new(
            ErrorKind::ConfigurationMissing,
            "identity service is not configured; set SUPABASE_URL and SUPABASE_ANON_KEY",
        )
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn timeout() -> Self {
        Self::new(ErrorKind::Timeout, "the request timed out; please try again")
    }

    pub fn service(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Service, message)
    }

    pub fn session_missing() -> Self {
        Self::service("auth session missing")
    }
}

impl ErrorCode for ServiceError {
    fn error_code(&self) -> &'static str {
        match self.kind {
            ErrorKind::ConfigurationMissing => "E_CONFIGURATION_MISSING",
            ErrorKind::InvalidCredentials => "E_INVALID_CREDENTIALS",
            ErrorKind::CodeExpiredOrInvalid => "E_CODE_EXPIRED_OR_INVALID",
            ErrorKind::Validation => "E_VALIDATION",
            ErrorKind::Timeout => "E_TIMEOUT",
            ErrorKind::Service => "E_SERVICE",
        }
    }

    fn retryable(&self) -> bool {
        match self.kind {
            ErrorKind::Timeout => true,
            ErrorKind::Service => matches!(self.status, None | Some(429 | 500..=599)),
            _ => false,
        }
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// Identity attached to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// Client-side copy of a session issued by the identity service.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix seconds after which the access token is no longer accepted.
    pub expires_at: Option<u64>,
    pub user: AuthUser,
}

impl Session {
    #[must_use]
    pub fn user_id(&self) -> Uuid {
        self.user.id
    }

    #[must_use]
    pub fn email(&self) -> &str {
        self.user.email.as_deref().unwrap_or("")
    }

    /// True when the token expires within `margin_secs` of `now`.
    #[must_use]
    pub fn expires_within(&self, now: u64, margin_secs: u64) -> bool {
        self.expires_at.is_some_and(|at| at <= now.saturating_add(margin_secs))
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

/// Current time as seconds since Unix epoch.
#[must_use]
pub fn now_secs() -> u64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    dur.as_secs()
}

// =============================================================================
// AUTH EVENTS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEventKind {
    SignedIn,
    SignedOut,
    TokenRefreshed,
    PasswordRecovery,
}

/// Pushed by the service whenever its held session changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthEvent {
    pub kind: AuthEventKind,
    pub session: Option<Session>,
}

impl AuthEvent {
    #[must_use]
    pub fn new(kind: AuthEventKind, session: Option<Session>) -> Self {
        Self { kind, session }
    }
}

// =============================================================================
// CALL OPTIONS
// =============================================================================

/// Options for requesting a one-time sign-in code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OtpOptions {
    /// Whether the service may create an account for an unknown email.
    pub create_user: bool,
}

