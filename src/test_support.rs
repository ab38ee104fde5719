//! Shared fixtures for unit tests: sample sessions and a scripted
//! in-memory [`RemoteService`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Notify, broadcast};
use uuid::Uuid;

use crate::remote::types::now_secs;
use crate::remote::{
    AUTH_EVENT_CAPACITY, AuthEvent, AuthEventKind, AuthUser, ErrorKind, OtpOptions, RemoteService, ServiceError, Session,
};

pub const EMAIL: &str = "reader@example.com";
pub const PASSWORD: &str = "correct-horse";
pub const CODE: &str = "123456";

pub fn session(email: &str) -> Session {
    session_for(&AuthUser { id: Uuid::new_v4(), email: Some(email.to_owned()) })
}

pub fn session_for(user: &AuthUser) -> Session {
    Session {
        access_token: format!("access-{}", user.id),
        refresh_token: format!("refresh-{}", user.id),
        expires_at: Some(now_secs() + 3600),
        user: user.clone(),
    }
}

// =========================================================================
// MockRemote
// =========================================================================

/// Scripted remote: accepts [`PASSWORD`] and [`CODE`] for [`EMAIL`], keeps
/// saved rows in memory, and records every call by method name.
pub struct MockRemote {
    user: AuthUser,
    session: Mutex<Option<Session>>,
    events: broadcast::Sender<AuthEvent>,
    calls: Mutex<Vec<&'static str>>,
    failures: Mutex<HashMap<&'static str, ServiceError>>,
    rows: Mutex<Vec<(Uuid, String)>>,
    gates: Mutex<HashMap<&'static str, Arc<Notify>>>,
    otp_requests: Mutex<Vec<(Option<Session>, OtpOptions)>>,
}

impl MockRemote {
    pub fn new() -> Arc<Self> {
        let (events, _) = broadcast::channel(AUTH_EVENT_CAPACITY);
        Arc::new(Self {
            user: AuthUser { id: Uuid::new_v4(), email: Some(EMAIL.to_owned()) },
            session: Mutex::new(None),
            events,
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
            rows: Mutex::new(Vec::new()),
            gates: Mutex::new(HashMap::new()),
            otp_requests: Mutex::new(Vec::new()),
        })
    }

    pub fn user(&self) -> &AuthUser {
        &self.user
    }

    pub fn user_id(&self) -> Uuid {
        self.user.id
    }

    /// Make every later call to `method` fail with `err`.
    pub fn fail(&self, method: &'static str, err: ServiceError) {
        self.failures.lock().unwrap().insert(method, err);
    }

    pub fn recover(&self, method: &'static str) {
        self.failures.lock().unwrap().remove(method);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn current_session(&self) -> Option<Session> {
        self.session.lock().unwrap().clone()
    }

    /// Install a session as if the service had issued it, emitting `kind`.
    pub fn establish(&self, kind: AuthEventKind) -> Session {
        let session = session_for(&self.user);
        *self.session.lock().unwrap() = Some(session.clone());
        let _ = self.events.send(AuthEvent::new(kind, Some(session.clone())));
        session
    }

    pub fn seed_saved(&self, user_id: Uuid, article_id: &str) {
        self.rows.lock().unwrap().push((user_id, article_id.to_owned()));
    }

    pub fn saved_for(&self, user_id: Uuid) -> Vec<String> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter(|(owner, _)| *owner == user_id)
            .map(|(_, id)| id.clone())
            .collect()
    }

    /// Hold later calls to `method` until the returned notifier fires.
    pub fn gate(&self, method: &'static str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates.lock().unwrap().insert(method, Arc::clone(&gate));
        gate
    }

    /// Session held at the moment each one-time code was requested.
    pub fn otp_requests(&self) -> Vec<(Option<Session>, OtpOptions)> {
        self.otp_requests.lock().unwrap().clone()
    }

    fn enter(&self, method: &'static str) -> Result<(), ServiceError> {
        self.calls.lock().unwrap().push(method);
        match self.failures.lock().unwrap().get(method) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn pass(&self, method: &'static str) {
        let gate = self.gates.lock().unwrap().get(method).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }

    fn sign_in(&self) -> Session {
        self.establish(AuthEventKind::SignedIn)
    }
}

#[async_trait::async_trait]
impl RemoteService for MockRemote {
    async fn get_session(&self) -> Result<Option<Session>, ServiceError> {
        self.enter("get_session")?;
        Ok(self.current_session())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, ServiceError> {
        self.enter("sign_in_with_password")?;
        if email != EMAIL || password != PASSWORD {
            return Err(ServiceError::new(ErrorKind::InvalidCredentials, "Invalid login credentials"));
        }
        Ok(self.sign_in())
    }

    async fn sign_up(&self, _email: &str, _password: &str, _redirect_to: &str) -> Result<(), ServiceError> {
        self.enter("sign_up")
    }

    async fn sign_in_with_otp(&self, _email: &str, options: OtpOptions) -> Result<(), ServiceError> {
        self.enter("sign_in_with_otp")?;
        self.otp_requests.lock().unwrap().push((self.current_session(), options));
        Ok(())
    }

    async fn verify_otp(&self, email: &str, code: &str) -> Result<Session, ServiceError> {
        self.enter("verify_otp")?;
        self.pass("verify_otp").await;
        if email != EMAIL || code != CODE {
            return Err(ServiceError::new(ErrorKind::CodeExpiredOrInvalid, "Token has expired or is invalid"));
        }
        Ok(self.sign_in())
    }

    async fn request_password_reset(&self, _email: &str, _redirect_to: &str) -> Result<(), ServiceError> {
        self.enter("request_password_reset")?;
        self.pass("request_password_reset").await;
        Ok(())
    }

    async fn update_password(&self, _new_password: &str) -> Result<(), ServiceError> {
        self.enter("update_password")?;
        if self.current_session().is_none() {
            return Err(ServiceError::session_missing());
        }
        Ok(())
    }

    async fn sign_out(&self) {
        self.calls.lock().unwrap().push("sign_out");
        *self.session.lock().unwrap() = None;
        let _ = self.events.send(AuthEvent::new(AuthEventKind::SignedOut, None));
    }

    async fn select_saved_article_ids(&self, user_id: Uuid) -> Result<Vec<String>, ServiceError> {
        self.enter("select_saved_article_ids")?;
        Ok(self.saved_for(user_id))
    }

    async fn insert_saved_article(&self, user_id: Uuid, article_id: &str) -> Result<(), ServiceError> {
        self.enter("insert_saved_article")?;
        self.seed_saved(user_id, article_id);
        Ok(())
    }

    async fn delete_saved_article(&self, user_id: Uuid, article_id: &str) -> Result<(), ServiceError> {
        self.enter("delete_saved_article")?;
        self.rows
            .lock()
            .unwrap()
            .retain(|(owner, id)| !(*owner == user_id && id == article_id));
        Ok(())
    }

    async fn delete_account(&self, user_id: Uuid) -> Result<(), ServiceError> {
        self.enter("delete_account")?;
        self.rows.lock().unwrap().retain(|(owner, _)| *owner != user_id);
        *self.session.lock().unwrap() = None;
        let _ = self.events.send(AuthEvent::new(AuthEventKind::SignedOut, None));
        Ok(())
    }
}
