//! Authentication flow controller for the sign-in / sign-up view.
//!
//! DESIGN
//! ======
//! Three steps: `Credentials` (initial), `OneTimeCodeAwaiting`, and
//! `ForgotPassword`. A login never ends at the password check: after the
//! service accepts the password the controller signs out again and asks for
//! a one-time code, so a password-only session is never observable as
//! "logged in". Registration is a separate action and skips the code step.
//!
//! CONCURRENCY
//! ===========
//! `AuthFlow` is a cheap clonable handle over shared state. The lock is never
//! held across an await: a submit marks the flow in flight, releases the lock
//! for the remote call, then applies the result only if the flow is still
//! mounted and no step transition happened in between. Late responses after
//! the view unmounts are discarded.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use zeroize::Zeroizing;

use super::credentials::{Credentials, normalize_code, normalize_email};
use crate::config::SiteConfig;
use crate::remote::{ErrorKind, OtpOptions, RemoteService, ServiceError, Session, bounded};

// =============================================================================
// STATE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStep {
    Credentials,
    OneTimeCodeAwaiting,
    ForgotPassword,
}

/// Which form the credentials step is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormIntent {
    Login,
    Register,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowMessage {
    Error(String),
    Success(String),
}

impl FlowMessage {
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Error(text) | Self::Success(text) => text,
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// Everything the auth view renders.
#[derive(Clone)]
pub struct AuthFlowState {
    pub step: FlowStep,
    pub intent: FormIntent,
    pub email: String,
    password: Zeroizing<String>,
    pub code: String,
    pub message: Option<FlowMessage>,
    pub in_flight: bool,
}

impl AuthFlowState {
    fn new(intent: FormIntent) -> Self {
        Self {
            step: FlowStep::Credentials,
            intent,
            email: String::new(),
            password: Zeroizing::new(String::new()),
            code: String::new(),
            message: None,
            in_flight: false,
        }
    }

    /// The email cannot change once a code was sent to it.
    #[must_use]
    pub fn email_locked(&self) -> bool {
        self.step == FlowStep::OneTimeCodeAwaiting
    }

    #[must_use]
    pub fn has_password(&self) -> bool {
        !self.password.is_empty()
    }
}

impl fmt::Debug for AuthFlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthFlowState")
            .field("step", &self.step)
            .field("intent", &self.intent)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("code", &self.code)
            .field("message", &self.message)
            .field("in_flight", &self.in_flight)
            .finish()
    }
}

/// Result of a submit that reached a decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome {
    /// Stayed on the current step; the state's message holds the reason.
    Failed(ErrorKind),
    /// Password accepted, session dropped, code sent; now awaiting the code.
    CodeSent,
    /// Account created; the caller should leave the auth view.
    Registered,
    /// Code verified; the service now holds this session.
    Authenticated(Session),
    /// Reset requested and the notice shown; `delivered` is false when the
    /// service reported an error.
    ResetRequested { delivered: bool },
}

/// Misuse of the controller, as opposed to a failed remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    #[error("another request is already in progress")]
    Busy,
    #[error("action not available in the {0:?} step")]
    WrongStep(FlowStep),
    #[error("email cannot change after a code was requested")]
    EmailLocked,
    #[error("auth view is no longer active")]
    Unmounted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowSettings {
    /// Target for confirmation and recovery links.
    pub redirect_to: String,
    /// How long the reset notice stays before returning to credentials.
    pub reset_notice: Duration,
    /// Bound on each remote call.
    pub call_timeout: Duration,
}

impl From<&SiteConfig> for FlowSettings {
    fn from(site: &SiteConfig) -> Self {
        Self { redirect_to: site.site_url.clone(), reset_notice: site.reset_notice, call_timeout: site.call_timeout }
    }
}

// =============================================================================
// CONTROLLER
// =============================================================================

struct Inner {
    state: AuthFlowState,
    mounted: bool,
    /// Bumped on every step change and on unmount.
    epoch: u64,
    /// Bumped when a reset request starts; only the latest one may end its
    /// notice by returning to credentials.
    notice: u64,
}

impl Inner {
    fn transition(&mut self, step: FlowStep) {
        self.state.step = step;
        self.epoch += 1;
    }
}

#[derive(Clone)]
pub struct AuthFlow {
    remote: Arc<dyn RemoteService>,
    settings: FlowSettings,
    inner: Arc<Mutex<Inner>>,
}

impl AuthFlow {
    /// Create a flow in the `Credentials` step, as when the auth view mounts.
    #[must_use]
    pub fn mount(remote: Arc<dyn RemoteService>, intent: FormIntent, settings: FlowSettings) -> Self {
        let inner = Inner { state: AuthFlowState::new(intent), mounted: true, epoch: 0, notice: 0 };
        Self { remote, settings, inner: Arc::new(Mutex::new(inner)) }
    }

    /// Detach the flow from its view; any outstanding response is discarded.
    pub fn unmount(&self) {
        let mut inner = self.lock();
        inner.mounted = false;
        inner.epoch += 1;
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.lock().mounted
    }

    #[must_use]
    pub fn snapshot(&self) -> AuthFlowState {
        self.lock().state.clone()
    }

    #[must_use]
    pub fn step(&self) -> FlowStep {
        self.lock().state.step
    }

    // -------------------------------------------------------------------------
    // field edits and local transitions
    // -------------------------------------------------------------------------

    pub fn set_email(&self, email: &str) -> Result<(), FlowError> {
        let mut inner = self.editable()?;
        if inner.state.email_locked() {
            return Err(FlowError::EmailLocked);
        }
        inner.state.email = email.to_owned();
        Ok(())
    }

    pub fn set_password(&self, password: &str) -> Result<(), FlowError> {
        let mut inner = self.editable()?;
        inner.state.password = Zeroizing::new(password.to_owned());
        Ok(())
    }

    pub fn set_code(&self, code: &str) -> Result<(), FlowError> {
        let mut inner = self.editable_in(FlowStep::OneTimeCodeAwaiting)?;
        inner.state.code = code.to_owned();
        Ok(())
    }

    /// Toggle between the login and registration forms.
    pub fn switch_intent(&self, intent: FormIntent) -> Result<(), FlowError> {
        let mut inner = self.editable_in(FlowStep::Credentials)?;
        inner.state.intent = intent;
        inner.state.message = None;
        Ok(())
    }

    pub fn choose_forgot_password(&self) -> Result<(), FlowError> {
        let mut inner = self.editable_in(FlowStep::Credentials)?;
        inner.state.message = None;
        inner.transition(FlowStep::ForgotPassword);
        Ok(())
    }

    /// Return to `Credentials`, clearing code and messages but keeping the email.
    pub fn back(&self) -> Result<(), FlowError> {
        let mut inner = self.editable()?;
        inner.state.code.clear();
        inner.state.message = None;
        inner.transition(FlowStep::Credentials);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // submits
    // -------------------------------------------------------------------------

    /// Submit the form for the current step.
    ///
    /// # Errors
    ///
    /// [`FlowError::Busy`] while another call is outstanding and
    /// [`FlowError::Unmounted`] when the view went away. Remote and
    /// validation failures are reported as [`FlowOutcome::Failed`].
    pub async fn submit(&self) -> Result<FlowOutcome, FlowError> {
        match self.step() {
            FlowStep::Credentials => self.submit_credentials().await,
            FlowStep::OneTimeCodeAwaiting => self.submit_code().await,
            FlowStep::ForgotPassword => self.submit_password_reset().await,
        }
    }

    async fn submit_credentials(&self) -> Result<FlowOutcome, FlowError> {
        let (epoch, (email, password, intent)) = self.begin(FlowStep::Credentials, |s| {
            (s.email.clone(), s.password.clone(), s.intent)
        })?;
        let creds = match Credentials::try_from_parts(&email, &password) {
            Ok(creds) => creds,
            Err(e) => return self.fail(epoch, e),
        };

        match intent {
            FormIntent::Register => self.register(epoch, creds).await,
            FormIntent::Login => self.login(epoch, creds).await,
        }
    }

    async fn register(&self, epoch: u64, creds: Credentials) -> Result<FlowOutcome, FlowError> {
        let limit = self.settings.call_timeout;
        let result = bounded(
            limit,
            self.remote.sign_up(creds.email(), creds.password(), &self.settings.redirect_to),
        )
        .await;
        if let Err(e) = result {
            return self.fail(epoch, e);
        }

        tracing::info!("registration submitted");
        self.finish(epoch, |inner| {
            inner.state.email = creds.email().to_owned();
            inner.state.password = Zeroizing::new(String::new());
            inner.state.intent = FormIntent::Login;
            inner.state.message = Some(FlowMessage::Success(
                "Registration successful. Check your inbox to confirm your email, then sign in.".into(),
            ));
        })?;
        Ok(FlowOutcome::Registered)
    }

    async fn login(&self, epoch: u64, creds: Credentials) -> Result<FlowOutcome, FlowError> {
        let limit = self.settings.call_timeout;
        if let Err(e) = bounded(limit, self.remote.sign_in_with_password(creds.email(), creds.password())).await {
            return self.fail(epoch, e);
        }

        // The password alone must not leave a usable session behind. Not
        // bounded here: cancelling it midway could skip the local clear.
        self.remote.sign_out().await;

        let otp = OtpOptions { create_user: false };
        if let Err(e) = bounded(limit, self.remote.sign_in_with_otp(creds.email(), otp)).await {
            return self.fail(epoch, e);
        }

        tracing::info!("password accepted; one-time code requested");
        let email = creds.email().to_owned();
        self.finish(epoch, |inner| {
            inner.state.message = Some(FlowMessage::Success(format!("We sent a one-time code to {email}.")));
            inner.state.email = email;
            inner.state.password = Zeroizing::new(String::new());
            inner.state.code.clear();
            inner.transition(FlowStep::OneTimeCodeAwaiting);
        })?;
        Ok(FlowOutcome::CodeSent)
    }

    async fn submit_code(&self) -> Result<FlowOutcome, FlowError> {
        let (epoch, (email, code)) =
            self.begin(FlowStep::OneTimeCodeAwaiting, |s| (s.email.clone(), s.code.clone()))?;
        let Some(code) = normalize_code(&code) else {
            return self.fail(epoch, ServiceError::validation("enter the 6-digit code from your email"));
        };

        let session = match bounded(self.settings.call_timeout, self.remote.verify_otp(&email, &code)).await {
            Ok(session) => session,
            Err(e) => return self.fail(epoch, e),
        };

        tracing::info!(user_id = %session.user_id(), "one-time code verified");
        self.finish(epoch, |inner| {
            inner.state.code.clear();
            inner.state.message = Some(FlowMessage::Success("Signed in.".into()));
        })?;
        Ok(FlowOutcome::Authenticated(session))
    }

    async fn submit_password_reset(&self) -> Result<FlowOutcome, FlowError> {
        let (epoch, email) = self.begin(FlowStep::ForgotPassword, |s| s.email.clone())?;
        let notice = {
            let mut inner = self.lock();
            inner.notice += 1;
            inner.notice
        };
        let Some(email) = normalize_email(&email) else {
            return self.fail(epoch, ServiceError::validation("enter a valid email address"));
        };

        let result = bounded(
            self.settings.call_timeout,
            self.remote.request_password_reset(&email, &self.settings.redirect_to),
        )
        .await;
        let delivered = result.is_ok();
        let message = match result {
            Ok(()) => FlowMessage::Success("Password reset link sent. Check your inbox.".into()),
            Err(e) => {
                tracing::info!(code = ?e.kind, "password reset request failed");
                FlowMessage::Error(e.message)
            }
        };
        self.finish(epoch, |inner| inner.state.message = Some(message))?;

        tokio::time::sleep(self.settings.reset_notice).await;

        let mut inner = self.lock();
        if !inner.mounted {
            tracing::debug!("reset notice ended after the flow was unmounted");
            return Err(FlowError::Unmounted);
        }
        // A newer request owns the form until its own notice ends.
        if inner.epoch == epoch && inner.notice == notice && !inner.state.in_flight {
            inner.transition(FlowStep::Credentials);
        }
        Ok(FlowOutcome::ResetRequested { delivered })
    }

    // -------------------------------------------------------------------------
    // helpers
    // -------------------------------------------------------------------------

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn editable(&self) -> Result<MutexGuard<'_, Inner>, FlowError> {
        let inner = self.lock();
        if !inner.mounted {
            return Err(FlowError::Unmounted);
        }
        if inner.state.in_flight {
            return Err(FlowError::Busy);
        }
        Ok(inner)
    }

    fn editable_in(&self, step: FlowStep) -> Result<MutexGuard<'_, Inner>, FlowError> {
        let inner = self.editable()?;
        if inner.state.step != step {
            return Err(FlowError::WrongStep(inner.state.step));
        }
        Ok(inner)
    }

    /// Mark the flow in flight and read what the call needs.
    fn begin<T>(&self, step: FlowStep, read: impl FnOnce(&AuthFlowState) -> T) -> Result<(u64, T), FlowError> {
        let mut inner = self.editable_in(step)?;
        inner.state.in_flight = true;
        inner.state.message = None;
        Ok((inner.epoch, read(&inner.state)))
    }

    /// Apply a call's result if the flow is still the one that issued it.
    fn finish(&self, epoch: u64, apply: impl FnOnce(&mut Inner)) -> Result<(), FlowError> {
        let mut inner = self.lock();
        if !inner.mounted || inner.epoch != epoch {
            // Only one call is ever in flight, so the flag is this call's.
            if inner.mounted {
                inner.state.in_flight = false;
            }
            tracing::debug!("discarding auth response for an inactive flow");
            return Err(FlowError::Unmounted);
        }
        inner.state.in_flight = false;
        apply(&mut inner);
        Ok(())
    }

    fn fail(&self, epoch: u64, err: ServiceError) -> Result<FlowOutcome, FlowError> {
        let kind = err.kind;
        self.finish(epoch, |inner| inner.state.message = Some(FlowMessage::Error(err.message)))?;
        Ok(FlowOutcome::Failed(kind))
    }
}

#[cfg(test)]
#[path = "auth_flow_test.rs"]
mod tests;
