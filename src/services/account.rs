//! Account settings panel: change password and delete account.
//!
//! A recovery link opens the panel in recovery mode, where the only thing
//! the reader can do is set a new password. Closing the panel or a
//! successful update leaves recovery mode.

use std::time::Duration;

use zeroize::Zeroizing;

use super::auth_flow::FlowMessage;
use super::credentials::validate_password;
use crate::remote::{RemoteService, ServiceError, Session, bounded};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountSettings {
    open: bool,
    recovery: bool,
    message: Option<FlowMessage>,
}

impl AccountSettings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self) {
        self.open = true;
        self.message = None;
    }

    /// Open in recovery mode, as after following a password-reset link.
    pub fn open_recovery(&mut self) {
        self.open();
        self.recovery = true;
    }

    pub fn close(&mut self) {
        self.open = false;
        self.recovery = false;
        self.message = None;
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    #[must_use]
    pub fn in_recovery(&self) -> bool {
        self.recovery
    }

    #[must_use]
    pub fn message(&self) -> Option<&FlowMessage> {
        self.message.as_ref()
    }

    /// Set a new password for the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a short password (no remote call), or
    /// the service's error. The panel's message mirrors the result.
    pub async fn update_password(
        &mut self,
        remote: &dyn RemoteService,
        new_password: &str,
        limit: Duration,
    ) -> Result<(), ServiceError> {
        let password = Zeroizing::new(new_password.to_owned());
        let result = match validate_password(&password) {
            Ok(()) => bounded(limit, remote.update_password(&password)).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                tracing::info!(recovery = self.recovery, "password updated");
                self.recovery = false;
                self.message = Some(FlowMessage::Success("Password updated.".into()));
                Ok(())
            }
            Err(e) => {
                self.message = Some(FlowMessage::Error(e.message.clone()));
                Err(e)
            }
        }
    }

    /// Permanently delete the signed-in account and its saved articles.
    ///
    /// # Errors
    ///
    /// Fails without a remote call when the panel is in recovery mode, when
    /// `confirmed` is false, or without a session. Otherwise returns the
    /// service's error.
    pub async fn delete_account(
        &mut self,
        remote: &dyn RemoteService,
        session: Option<&Session>,
        confirmed: bool,
        limit: Duration,
    ) -> Result<(), ServiceError> {
        let result = match (self.recovery, confirmed, session) {
            (true, _, _) => Err(ServiceError::validation("set a new password before managing the account")),
            (false, false, _) => Err(ServiceError::validation("account deletion must be confirmed")),
            (false, true, None) => Err(ServiceError::session_missing()),
            (false, true, Some(session)) => bounded(limit, remote.delete_account(session.user_id())).await,
        };

        match result {
            Ok(()) => {
                tracing::info!("account deleted");
                self.close();
                Ok(())
            }
            Err(e) => {
                self.message = Some(FlowMessage::Error(e.message.clone()));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
#[path = "account_test.rs"]
mod tests;
