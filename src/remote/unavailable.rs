//! Service used when no endpoint is configured.
//!
//! Every call fails with [`ErrorKind::ConfigurationMissing`](super::ErrorKind)
//! so the front-end keeps working in a read-only "demo" mode.

use tokio::sync::broadcast;
use uuid::Uuid;

use super::types::{AuthEvent, OtpOptions, ServiceError, Session};
use super::{AUTH_EVENT_CAPACITY, RemoteService};

pub struct UnavailableService {
    // Held so subscribers see an open channel rather than an immediate close.
    events: broadcast::Sender<AuthEvent>,
}

impl UnavailableService {
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(AUTH_EVENT_CAPACITY);
        Self { events }
    }
}

impl Default for UnavailableService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl RemoteService for UnavailableService {
    async fn get_session(&self) -> Result<Option<Session>, ServiceError> {
        Err(ServiceError::configuration_missing())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    async fn sign_in_with_password(&self, _email: &str, _password: &str) -> Result<Session, ServiceError> {
        Err(ServiceError::configuration_missing())
    }

    async fn sign_up(&self, _email: &str, _password: &str, _redirect_to: &str) -> Result<(), ServiceError> {
        Err(ServiceError::configuration_missing())
    }

    async fn sign_in_with_otp(&self, _email: &str, _options: OtpOptions) -> Result<(), ServiceError> {
        Err(ServiceError::configuration_missing())
    }

    async fn verify_otp(&self, _email: &str, _code: &str) -> Result<Session, ServiceError> {
        Err(ServiceError::configuration_missing())
    }

    async fn request_password_reset(&self, _email: &str, _redirect_to: &str) -> Result<(), ServiceError> {
        Err(ServiceError::configuration_missing())
    }

    async fn update_password(&self, _new_password: &str) -> Result<(), ServiceError> {
        Err(ServiceError::configuration_missing())
    }

    async fn sign_out(&self) {
        tracing::debug!("sign-out ignored: identity service unavailable");
    }

    async fn select_saved_article_ids(&self, _user_id: Uuid) -> Result<Vec<String>, ServiceError> {
        Err(ServiceError::configuration_missing())
    }

    async fn insert_saved_article(&self, _user_id: Uuid, _article_id: &str) -> Result<(), ServiceError> {
        Err(ServiceError::configuration_missing())
    }

    async fn delete_saved_article(&self, _user_id: Uuid, _article_id: &str) -> Result<(), ServiceError> {
        Err(ServiceError::configuration_missing())
    }

    async fn delete_account(&self, _user_id: Uuid) -> Result<(), ServiceError> {
        Err(ServiceError::configuration_missing())
    }
}

#[cfg(test)]
#[path = "unavailable_test.rs"]
mod tests;
