//! Application state for one reader.
//!
//! DESIGN
//! ======
//! `AppState` is the single owner of the session, saved set, current view,
//! category, account panel, and the mounted auth flow. It subscribes to the
//! remote service's auth events when created; queued events collapse to the
//! latest session when drained. A subscriber that falls behind drops its
//! backlog and asks the service for the current session instead.
//!
//! Session changes always go through [`AppState::set_session`], which clears
//! the saved set synchronously when the user changes and then refetches it.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;

use crate::articles::{self, Article};
use crate::catalog::{self, Category, ViewMode};
use crate::config::SiteConfig;
use crate::remote::{AuthEvent, AuthEventKind, RemoteService, ServiceError, Session, bounded};
use crate::services::account::AccountSettings;
use crate::services::auth_flow::{AuthFlow, FlowOutcome, FlowSettings};
use crate::services::saved::{SaveError, SavedArticles, ToggleOutcome};
use crate::view::{self, RouteError, View};

pub struct AppState {
    remote: Arc<dyn RemoteService>,
    site: SiteConfig,
    events: broadcast::Receiver<AuthEvent>,
    session: Option<Session>,
    auth_loading: bool,
    saved: SavedArticles,
    view: View,
    category: Category,
    auth_flow: Option<AuthFlow>,
    account: AccountSettings,
    /// Blocking alert the reader must acknowledge.
    alert: Option<String>,
}

impl AppState {
    /// Subscribe to auth events and start on the home view, logged out until
    /// [`bootstrap`](Self::bootstrap) runs.
    #[must_use]
    pub fn new(remote: Arc<dyn RemoteService>, site: SiteConfig) -> Self {
        let events = remote.subscribe();
        Self {
            remote,
            site,
            events,
            session: None,
            auth_loading: true,
            saved: SavedArticles::new(),
            view: View::Home,
            category: Category::All,
            auth_flow: None,
            account: AccountSettings::new(),
            alert: None,
        }
    }

    // =========================================================================
    // accessors
    // =========================================================================

    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.session.is_some()
    }

    /// True until the startup session check finishes.
    #[must_use]
    pub fn auth_loading(&self) -> bool {
        self.auth_loading
    }

    #[must_use]
    pub fn saved(&self) -> &SavedArticles {
        &self.saved
    }

    #[must_use]
    pub fn view(&self) -> &View {
        &self.view
    }

    #[must_use]
    pub fn category(&self) -> &Category {
        &self.category
    }

    #[must_use]
    pub fn auth_flow(&self) -> Option<&AuthFlow> {
        self.auth_flow.as_ref()
    }

    #[must_use]
    pub fn account(&self) -> &AccountSettings {
        &self.account
    }

    #[must_use]
    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    /// Dismiss the pending alert, returning its text.
    pub fn acknowledge_alert(&mut self) -> Option<String> {
        self.alert.take()
    }

    // =========================================================================
    // session
    // =========================================================================

    /// Ask the service for the current session once. A missing session or a
    /// failed check both leave the reader logged out.
    pub async fn bootstrap(&mut self) {
        let session = match bounded(self.site.call_timeout, self.remote.get_session()).await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "startup session check failed; continuing logged out");
                None
            }
        };
        self.set_session(session).await;
        self.auth_loading = false;
        self.drain_auth_events().await;
    }

    /// Replace the held session. A different user clears the saved set
    /// before the new user's ids are fetched.
    pub async fn set_session(&mut self, session: Option<Session>) {
        if self.session == session {
            return;
        }
        let owner = session.as_ref().map(Session::user_id);
        self.session = session;

        if self.saved.reset_for(owner) {
            tracing::debug!(user_id = ?owner, "saved set cleared for session change");
        }
        if owner.is_none() {
            self.account.close();
            if self.view == View::Saved {
                self.enter(View::Home);
            }
            return;
        }
        if let Err(e) = self.saved.refresh(self.remote.as_ref(), self.site.call_timeout).await {
            tracing::warn!(error = %e, "saved articles fetch failed");
        }
    }

    pub async fn apply_auth_event(&mut self, event: AuthEvent) {
        tracing::debug!(kind = ?event.kind, "auth event");
        self.set_session(event.session).await;
        if event.kind == AuthEventKind::PasswordRecovery {
            self.account.open_recovery();
        }
    }

    /// Consume every queued auth event and apply the latest session. A
    /// sign-in immediately followed by a sign-out (the password step of a
    /// login) therefore never reaches the rest of the state. Returns how many
    /// events were consumed.
    pub async fn drain_auth_events(&mut self) -> usize {
        let mut latest = None;
        let mut recovery = false;
        let mut seen = 0;
        loop {
            match self.events.try_recv() {
                Ok(event) => {
                    recovery |= event.kind == AuthEventKind::PasswordRecovery;
                    latest = Some(event);
                    seen += 1;
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "auth events lagged; resynchronizing session");
                    self.events = self.events.resubscribe();
                    latest = None;
                    self.resync().await;
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }

        if let Some(event) = latest {
            self.apply_auth_event(event).await;
        }
        if recovery && self.session.is_some() {
            self.account.open_recovery();
        }
        seen
    }

    async fn resync(&mut self) {
        match bounded(self.site.call_timeout, self.remote.get_session()).await {
            Ok(session) => self.set_session(session).await,
            Err(e) => tracing::warn!(error = %e, "session resync failed"),
        }
    }

    /// Sign out and clear local state. Remote failures are only logged.
    pub async fn logout(&mut self) {
        if tokio::time::timeout(self.site.call_timeout, self.remote.sign_out()).await.is_err() {
            tracing::warn!("sign-out timed out; clearing local session anyway");
        }
        self.set_session(None).await;
    }

    // =========================================================================
    // navigation & catalog
    // =========================================================================

    /// Move to `requested`, mounting or unmounting the auth flow as needed.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::UnknownArticle`] and leaves the view unchanged
    /// when the article does not exist.
    pub fn navigate(&mut self, requested: View) -> Result<&View, RouteError> {
        let target = view::resolve(requested, self.is_signed_in())?;
        self.enter(target);
        Ok(&self.view)
    }

    fn enter(&mut self, target: View) {
        if let Some(flow) = self.auth_flow.take() {
            flow.unmount();
        }
        if let Some(intent) = target.auth_intent() {
            let settings = FlowSettings::from(&self.site);
            self.auth_flow = Some(AuthFlow::mount(Arc::clone(&self.remote), intent, settings));
        }
        tracing::debug!(view = %target, "navigate");
        self.view = target;
    }

    pub fn select_category(&mut self, category: Category) {
        self.category = category;
    }

    /// Articles for the current view: saved ones on the saved view, the
    /// selected category otherwise.
    #[must_use]
    pub fn visible_articles(&self) -> Vec<&'static Article> {
        let mode = if self.view == View::Saved { ViewMode::Saved } else { ViewMode::Browse };
        catalog::filter(articles::catalog(), &self.category, mode, self.saved.ids())
    }

    /// React to a finished auth-flow submit.
    pub async fn handle_flow_outcome(&mut self, outcome: &FlowOutcome) {
        match outcome {
            FlowOutcome::Authenticated(session) => {
                self.set_session(Some(session.clone())).await;
                self.enter(View::Home);
            }
            FlowOutcome::Registered => self.enter(View::Home),
            FlowOutcome::Failed(_) | FlowOutcome::CodeSent | FlowOutcome::ResetRequested { .. } => {}
        }
    }

    // =========================================================================
    // saved articles
    // =========================================================================

    /// Save or unsave an article. Failures raise a blocking alert; without a
    /// session the reader is also sent to the login view.
    ///
    /// # Errors
    ///
    /// Returns the [`SaveError`] after recording the alert.
    pub async fn toggle_save(&mut self, article_id: &str) -> Result<ToggleOutcome, SaveError> {
        let result = self
            .saved
            .toggle(self.remote.as_ref(), self.session.as_ref(), article_id, self.site.call_timeout)
            .await;
        match &result {
            Ok(_) => {}
            Err(SaveError::LoginRequired) => {
                self.alert = Some("Please sign in to save articles.".to_owned());
                self.enter(View::Login);
            }
            Err(SaveError::Remote(e)) => {
                tracing::warn!(error = %e, article_id, "saved-set update failed");
                self.alert = Some(format!("Could not update saved articles: {}", e.message));
            }
        }
        result
    }

    // =========================================================================
    // account settings
    // =========================================================================

    /// # Errors
    ///
    /// Returns a missing-session error when nobody is signed in.
    pub fn open_settings(&mut self) -> Result<(), ServiceError> {
        if self.session.is_none() {
            return Err(ServiceError::session_missing());
        }
        self.account.open();
        Ok(())
    }

    pub fn close_settings(&mut self) {
        self.account.close();
    }

    /// # Errors
    ///
    /// See [`AccountSettings::update_password`].
    pub async fn update_password(&mut self, new_password: &str) -> Result<(), ServiceError> {
        self.account.update_password(self.remote.as_ref(), new_password, self.site.call_timeout).await
    }

    /// Delete the account, then drop the session and return home.
    ///
    /// # Errors
    ///
    /// See [`AccountSettings::delete_account`].
    pub async fn delete_account(&mut self, confirmed: bool) -> Result<(), ServiceError> {
        self.account
            .delete_account(self.remote.as_ref(), self.session.as_ref(), confirmed, self.site.call_timeout)
            .await?;
        self.set_session(None).await;
        self.enter(View::Home);
        Ok(())
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
