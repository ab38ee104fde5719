//! Remote identity & storage service adapter.
//!
//! DESIGN
//! ======
//! All persistence and authentication live in a hosted service. The rest of
//! the crate only sees the [`RemoteService`] trait; [`connect`] picks the
//! HTTP client when configuration is present and the [`UnavailableService`]
//! otherwise, so a missing endpoint degrades to descriptive errors instead of
//! a crash.

pub mod session_store;
pub mod supabase;
pub mod types;
pub mod unavailable;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use uuid::Uuid;

use crate::config::{ConfigError, ServiceConfig};
pub use supabase::SupabaseClient;
pub use types::{AuthEvent, AuthEventKind, AuthUser, ErrorCode, ErrorKind, OtpOptions, ServiceError, Session};
pub use unavailable::UnavailableService;

/// Capacity of the auth-event channel; slow subscribers resync on lag.
pub(crate) const AUTH_EVENT_CAPACITY: usize = 16;

/// Operations the blog needs from the hosted service.
#[async_trait::async_trait]
pub trait RemoteService: Send + Sync {
    /// Current session, if any. Absence is not an error.
    async fn get_session(&self) -> Result<Option<Session>, ServiceError>;

    /// Subscribe to auth events. Dropping the receiver unsubscribes.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, ServiceError>;

    async fn sign_up(&self, email: &str, password: &str, redirect_to: &str) -> Result<(), ServiceError>;

    async fn sign_in_with_otp(&self, email: &str, options: OtpOptions) -> Result<(), ServiceError>;

    async fn verify_otp(&self, email: &str, code: &str) -> Result<Session, ServiceError>;

    async fn request_password_reset(&self, email: &str, redirect_to: &str) -> Result<(), ServiceError>;

    async fn update_password(&self, new_password: &str) -> Result<(), ServiceError>;

    /// Drop the held session. Remote revocation failures are logged, not returned.
    async fn sign_out(&self);

    async fn select_saved_article_ids(&self, user_id: Uuid) -> Result<Vec<String>, ServiceError>;

    async fn insert_saved_article(&self, user_id: Uuid, article_id: &str) -> Result<(), ServiceError>;

    async fn delete_saved_article(&self, user_id: Uuid, article_id: &str) -> Result<(), ServiceError>;

    /// Remove the account. Saved rows are deleted before the identity record.
    async fn delete_account(&self, user_id: Uuid) -> Result<(), ServiceError>;
}

/// Build the service for a (possibly missing) configuration.
pub fn connect(config: Result<ServiceConfig, ConfigError>) -> Arc<dyn RemoteService> {
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "identity service not configured; running in unavailable mode");
            return Arc::new(UnavailableService::new());
        }
    };
    match SupabaseClient::new(config) {
        Ok(client) => {
            tracing::info!(url = client.base_url(), "identity service client initialized");
            Arc::new(client)
        }
        Err(e) => {
            tracing::warn!(error = %e, "identity service client failed to build; running in unavailable mode");
            Arc::new(UnavailableService::new())
        }
    }
}

/// Await `fut` for at most `limit`, mapping expiry to [`ErrorKind::Timeout`].
pub async fn bounded<T, F>(limit: Duration, fut: F) -> Result<T, ServiceError>
where
    F: Future<Output = Result<T, ServiceError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(ServiceError::timeout()),
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
