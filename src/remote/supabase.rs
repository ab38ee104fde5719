//! Supabase-compatible HTTP client.
//!
//! Auth calls go to the GoTrue endpoints under `/auth/v1`, saved-article rows
//! and the account-deletion procedure go through PostgREST under `/rest/v1`.
//! The client owns the session the way the vendor SDK does: it installs,
//! persists, refreshes, and clears it, and broadcasts an [`AuthEvent`] for
//! every change. Response parsing lives in pure functions for testability.

use reqwest::{Method, RequestBuilder};
use serde::Deserialize;
use tokio::sync::{RwLock, broadcast};
use uuid::Uuid;

use super::session_store::SessionStore;
use super::types::{AuthEvent, AuthEventKind, AuthUser, ErrorCode, ErrorKind, OtpOptions, ServiceError, Session, now_secs};
use super::{AUTH_EVENT_CAPACITY, RemoteService};
use crate::config::ServiceConfig;

/// Refresh the access token when it expires within this many seconds.
const REFRESH_MARGIN_SECS: u64 = 30;
const SAVED_ARTICLE_COLUMN: &str = "post_id";
const SAVED_USER_COLUMN: &str = "user_id";

// =============================================================================
// CLIENT
// =============================================================================

pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    saved_table: String,
    delete_account_rpc: String,
    session: RwLock<Option<Session>>,
    events: broadcast::Sender<AuthEvent>,
    store: Option<SessionStore>,
}

impl SupabaseClient {
    /// Build the client and restore a persisted session, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: ServiceConfig) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeouts.request())
            .connect_timeout(config.timeouts.connect())
            .build()
            .map_err(|e| ServiceError::service(format!("HTTP client build failed: {e}")))?;

        let store = config.session_file.map(SessionStore::new);
        let restored = store.as_ref().and_then(SessionStore::load);
        if let Some(session) = &restored {
            tracing::info!(user_id = %session.user_id(), "restored persisted session");
        }

        let (events, _) = broadcast::channel(AUTH_EVENT_CAPACITY);
        Ok(Self {
            http,
            base_url: config.url,
            anon_key: config.anon_key,
            saved_table: config.saved_table,
            delete_account_rpc: config.delete_account_rpc,
            session: RwLock::new(restored),
            events,
            store,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Exchange the held refresh token for a new session.
    ///
    /// # Errors
    ///
    /// Fails when no session is held or the service rejects the token.
    pub async fn refresh_session(&self) -> Result<Session, ServiceError> {
        let refresh_token = self
            .session
            .read()
            .await
            .as_ref()
            .map(|s| s.refresh_token.clone())
            .ok_or_else(ServiceError::session_missing)?;

        let req = self
            .request(Method::POST, &self.auth_url("token"), None)
            .query(&[("grant_type", "refresh_token")])
            .json(&serde_json::json!({ "refresh_token": refresh_token }));
        let body = self.execute(req).await?;
        let session = parse_session(&body, now_secs())?;
        self.install(session.clone(), AuthEventKind::TokenRefreshed).await;
        Ok(session)
    }

    /// Establish a session from a confirmation or recovery redirect URL.
    ///
    /// Recovery links emit [`AuthEventKind::PasswordRecovery`]; any other
    /// link type emits [`AuthEventKind::SignedIn`].
    ///
    /// # Errors
    ///
    /// Fails when the link carries an error, lacks tokens, or the token is
    /// rejected when fetching the user.
    pub async fn session_from_redirect(&self, url: &str) -> Result<Session, ServiceError> {
        let tokens = parse_redirect(url)?;
        let req = self.request(Method::GET, &self.auth_url("user"), Some(&tokens.access_token));
        let body = self.execute(req).await?;
        let user = parse_user(&body)?;

        let session = Session {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_at: tokens.expires_at,
            user,
        };
        let kind = if tokens.link_type.as_deref() == Some("recovery") {
            AuthEventKind::PasswordRecovery
        } else {
            AuthEventKind::SignedIn
        };
        self.install(session.clone(), kind).await;
        Ok(session)
    }

    // -------------------------------------------------------------------------
    // request plumbing
    // -------------------------------------------------------------------------

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url)
    }

    fn rest_url(&self, path: &str) -> String {
        format!("{}/rest/v1/{path}", self.base_url)
    }

    fn request(&self, method: Method, url: &str, bearer: Option<&str>) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer.unwrap_or(self.anon_key.as_str()))
    }

    async fn execute(&self, req: RequestBuilder) -> Result<String, ServiceError> {
        let response = req.send().await.map_err(transport_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport_error)?;

        if !(200..300).contains(&status) {
            let err = parse_error(status, &body);
            tracing::debug!(status, code = err.error_code(), "identity service returned error");
            return Err(err);
        }
        Ok(body)
    }

    /// Current session with a fresh access token, or `session_missing`.
    async fn live_session(&self) -> Result<Session, ServiceError> {
        self.get_session().await?.ok_or_else(ServiceError::session_missing)
    }

    // -------------------------------------------------------------------------
    // session lifecycle
    // -------------------------------------------------------------------------

    async fn install(&self, session: Session, kind: AuthEventKind) {
        self.persist(Some(&session));
        *self.session.write().await = Some(session.clone());
        tracing::info!(user_id = %session.user_id(), event = ?kind, "session installed");
        self.emit(AuthEvent::new(kind, Some(session)));
    }

    async fn clear(&self) {
        self.persist(None);
        *self.session.write().await = None;
        tracing::info!("session cleared");
        self.emit(AuthEvent::new(AuthEventKind::SignedOut, None));
    }

    fn persist(&self, session: Option<&Session>) {
        let Some(store) = &self.store else {
            return;
        };
        let result = match session {
            Some(session) => store.save(session),
            None => store.clear(),
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, path = %store.path().display(), "session persistence failed");
        }
    }

    fn emit(&self, event: AuthEvent) {
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }
}

#[async_trait::async_trait]
impl RemoteService for SupabaseClient {
    async fn get_session(&self) -> Result<Option<Session>, ServiceError> {
        let current = self.session.read().await.clone();
        let Some(session) = current else {
            return Ok(None);
        };
        if !session.expires_within(now_secs(), REFRESH_MARGIN_SECS) {
            return Ok(Some(session));
        }

        match self.refresh_session().await {
            Ok(session) => Ok(Some(session)),
            Err(e) if e.retryable() => Err(e),
            Err(e) => {
                tracing::warn!(error = %e, "session refresh rejected; signing out");
                self.clear().await;
                Ok(None)
            }
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, ServiceError> {
        let req = self
            .request(Method::POST, &self.auth_url("token"), None)
            .query(&[("grant_type", "password")])
            .json(&serde_json::json!({ "email": email, "password": password }));
        let body = self.execute(req).await?;
        let session = parse_session(&body, now_secs())?;
        self.install(session.clone(), AuthEventKind::SignedIn).await;
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str, redirect_to: &str) -> Result<(), ServiceError> {
        let req = self
            .request(Method::POST, &self.auth_url("signup"), None)
            .query(&[("redirect_to", redirect_to)])
            .json(&serde_json::json!({ "email": email, "password": password }));
        let body = self.execute(req).await?;

        // With email confirmation disabled the service signs the user in directly.
        if let Ok(session) = parse_session(&body, now_secs()) {
            self.install(session, AuthEventKind::SignedIn).await;
        }
        Ok(())
    }

    async fn sign_in_with_otp(&self, email: &str, options: OtpOptions) -> Result<(), ServiceError> {
        let req = self
            .request(Method::POST, &self.auth_url("otp"), None)
            .json(&serde_json::json!({ "email": email, "create_user": options.create_user }));
        self.execute(req).await?;
        Ok(())
    }

    async fn verify_otp(&self, email: &str, code: &str) -> Result<Session, ServiceError> {
        let req = self
            .request(Method::POST, &self.auth_url("verify"), None)
            .json(&serde_json::json!({ "type": "email", "email": email, "token": code }));
        let body = self.execute(req).await?;
        let session = parse_session(&body, now_secs())?;
        self.install(session.clone(), AuthEventKind::SignedIn).await;
        Ok(session)
    }

    async fn request_password_reset(&self, email: &str, redirect_to: &str) -> Result<(), ServiceError> {
        let req = self
            .request(Method::POST, &self.auth_url("recover"), None)
            .query(&[("redirect_to", redirect_to)])
            .json(&serde_json::json!({ "email": email }));
        self.execute(req).await?;
        Ok(())
    }

    async fn update_password(&self, new_password: &str) -> Result<(), ServiceError> {
        let session = self.live_session().await?;
        let req = self
            .request(Method::PUT, &self.auth_url("user"), Some(&session.access_token))
            .json(&serde_json::json!({ "password": new_password }));
        self.execute(req).await?;
        Ok(())
    }

    async fn sign_out(&self) {
        let held = self.session.read().await.clone();
        if let Some(session) = held {
            let req = self.request(Method::POST, &self.auth_url("logout"), Some(&session.access_token));
            if let Err(e) = self.execute(req).await {
                tracing::warn!(error = %e, "remote sign-out failed; clearing local session anyway");
            }
        }
        self.clear().await;
    }

    async fn select_saved_article_ids(&self, user_id: Uuid) -> Result<Vec<String>, ServiceError> {
        let session = self.live_session().await?;
        let user_filter = format!("eq.{user_id}");
        let req = self
            .request(Method::GET, &self.rest_url(&self.saved_table), Some(&session.access_token))
            .query(&[("select", SAVED_ARTICLE_COLUMN), (SAVED_USER_COLUMN, user_filter.as_str())]);
        let body = self.execute(req).await?;
        parse_saved_ids(&body)
    }

    async fn insert_saved_article(&self, user_id: Uuid, article_id: &str) -> Result<(), ServiceError> {
        let session = self.live_session().await?;
        let req = self
            .request(Method::POST, &self.rest_url(&self.saved_table), Some(&session.access_token))
            .header("Prefer", "return=minimal")
            .json(&serde_json::json!([{ "user_id": user_id, "post_id": article_id }]));
        self.execute(req).await?;
        Ok(())
    }

    async fn delete_saved_article(&self, user_id: Uuid, article_id: &str) -> Result<(), ServiceError> {
        let session = self.live_session().await?;
        let user_filter = format!("eq.{user_id}");
        let article_filter = format!("eq.{article_id}");
        let req = self
            .request(Method::DELETE, &self.rest_url(&self.saved_table), Some(&session.access_token))
            .query(&[
                (SAVED_USER_COLUMN, user_filter.as_str()),
                (SAVED_ARTICLE_COLUMN, article_filter.as_str()),
            ]);
        self.execute(req).await?;
        Ok(())
    }

    async fn delete_account(&self, user_id: Uuid) -> Result<(), ServiceError> {
        let session = self.live_session().await?;
        if session.user_id() != user_id {
            return Err(ServiceError::validation("only the signed-in account can be deleted"));
        }

        let user_filter = format!("eq.{user_id}");
        let rows = self
            .request(Method::DELETE, &self.rest_url(&self.saved_table), Some(&session.access_token))
            .query(&[(SAVED_USER_COLUMN, user_filter.as_str())]);
        self.execute(rows).await?;

        let rpc = self
            .request(
                Method::POST,
                &self.rest_url(&format!("rpc/{}", self.delete_account_rpc)),
                Some(&session.access_token),
            )
            .json(&serde_json::json!({}));
        self.execute(rpc).await?;

        tracing::info!(%user_id, "account deleted");
        self.clear().await;
        Ok(())
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: Option<u64>,
    expires_at: Option<u64>,
    user: AuthUser,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ErrorBody {
    msg: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
    error_code: Option<String>,
}

/// Tokens carried in the fragment of a confirmation/recovery redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RedirectTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: Option<u64>,
    pub link_type: Option<String>,
}

// =============================================================================
// PARSING
// =============================================================================

fn transport_error(e: reqwest::Error) -> ServiceError {
    if e.is_timeout() {
        ServiceError::timeout()
    } else {
        ServiceError::service(format!("network error: {e}"))
    }
}

pub(crate) fn parse_session(json: &str, now: u64) -> Result<Session, ServiceError> {
    let token: TokenResponse = serde_json::from_str(json)
        .map_err(|e| ServiceError::service(format!("unexpected session response: {e}")))?;
    let expires_at = token
        .expires_at
        .or_else(|| token.expires_in.map(|secs| now.saturating_add(secs)));
    Ok(Session {
        access_token: token.access_token,
        refresh_token: token.refresh_token,
        expires_at,
        user: token.user,
    })
}

pub(crate) fn parse_user(json: &str) -> Result<AuthUser, ServiceError> {
    serde_json::from_str(json).map_err(|e| ServiceError::service(format!("unexpected user response: {e}")))
}

/// Read `[{"post_id": ..}]` rows. Numeric ids are accepted and stringified.
pub(crate) fn parse_saved_ids(json: &str) -> Result<Vec<String>, ServiceError> {
    let rows: Vec<serde_json::Value> = serde_json::from_str(json)
        .map_err(|e| ServiceError::service(format!("unexpected saved-articles response: {e}")))?;
    rows.iter()
        .map(|row| match row.get(SAVED_ARTICLE_COLUMN) {
            Some(serde_json::Value::String(id)) => Ok(id.clone()),
            Some(serde_json::Value::Number(id)) => Ok(id.to_string()),
            _ => Err(ServiceError::service(format!("saved-article row without {SAVED_ARTICLE_COLUMN}"))),
        })
        .collect()
}

/// Map an error response to a [`ServiceError`], keeping the service's wording.
pub(crate) fn parse_error(status: u16, body: &str) -> ServiceError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .msg
        .or(parsed.message)
        .or(parsed.error_description)
        .or(parsed.error)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("request failed with status {status}"));

    let code = parsed.error_code.as_deref().unwrap_or_default();
    let lowered = message.to_ascii_lowercase();
    let kind = if code == "invalid_credentials" || lowered.contains("invalid login credentials") {
        ErrorKind::InvalidCredentials
    } else if code == "otp_expired" || lowered.contains("expired or is invalid") {
        ErrorKind::CodeExpiredOrInvalid
    } else {
        ErrorKind::Service
    };

    ServiceError::new(kind, message).with_status(status)
}

/// Extract session tokens from a redirect URL fragment.
pub(crate) fn parse_redirect(url: &str) -> Result<RedirectTokens, ServiceError> {
    let parsed = reqwest::Url::parse(url).map_err(|e| ServiceError::validation(format!("invalid redirect URL: {e}")))?;
    let fragment = parsed.fragment().unwrap_or_default();
    // Reuse the query parser for the `k=v&..` fragment.
    let carrier = reqwest::Url::parse(&format!("http://redirect.invalid/?{fragment}"))
        .map_err(|e| ServiceError::validation(format!("invalid redirect fragment: {e}")))?;

    let mut access_token = None;
    let mut refresh_token = None;
    let mut expires_at = None;
    let mut expires_in = None;
    let mut link_type = None;
    let mut error = None;
    for (key, value) in carrier.query_pairs() {
        match key.as_ref() {
            "access_token" => access_token = Some(value.into_owned()),
            "refresh_token" => refresh_token = Some(value.into_owned()),
            "expires_at" => expires_at = value.parse::<u64>().ok(),
            "expires_in" => expires_in = value.parse::<u64>().ok(),
            "type" => link_type = Some(value.into_owned()),
            "error_description" => error = Some(value.into_owned()),
            "error" if error.is_none() => error = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(message) = error {
        return Err(ServiceError::new(ErrorKind::CodeExpiredOrInvalid, message));
    }
    let (Some(access_token), Some(refresh_token)) = (access_token, refresh_token) else {
        return Err(ServiceError::validation("redirect URL carries no session"));
    };
    let expires_at = expires_at.or_else(|| expires_in.map(|secs| now_secs().saturating_add(secs)));
    Ok(RedirectTokens { access_token, refresh_token, expires_at, link_type })
}

#[cfg(test)]
#[path = "supabase_test.rs"]
mod tests;
