//! Saved-article set for the signed-in reader.
//!
//! DESIGN
//! ======
//! The set belongs to exactly one user. Switching owner clears it before
//! anything is fetched, and a fetch result for an owner that is no longer
//! current is dropped. Local state changes only after the remote write
//! succeeds, so a failed toggle leaves the set exactly as it was.

use std::collections::HashSet;
use std::time::Duration;

use uuid::Uuid;

use crate::remote::{ErrorCode, RemoteService, ServiceError, Session, bounded};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SaveError {
    #[error("sign in to save articles")]
    LoginRequired,
    #[error(transparent)]
    Remote(#[from] ServiceError),
}

impl ErrorCode for SaveError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::LoginRequired => "E_LOGIN_REQUIRED",
            Self::Remote(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::LoginRequired => false,
            Self::Remote(e) => e.retryable(),
        }
    }
}

/// What a successful toggle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Saved,
    Removed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SavedArticles {
    owner: Option<Uuid>,
    ids: HashSet<String>,
}

impl SavedArticles {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn owner(&self) -> Option<Uuid> {
        self.owner
    }

    #[must_use]
    pub fn ids(&self) -> &HashSet<String> {
        &self.ids
    }

    #[must_use]
    pub fn contains(&self, article_id: &str) -> bool {
        self.ids.contains(article_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Point the set at `owner`. Returns true when the owner changed, in
    /// which case the previous user's ids are already gone.
    pub fn reset_for(&mut self, owner: Option<Uuid>) -> bool {
        if self.owner == owner {
            return false;
        }
        self.owner = owner;
        self.ids.clear();
        true
    }

    pub fn clear(&mut self) {
        self.reset_for(None);
    }

    /// Install fetched ids if `owner` is still current. Returns whether the
    /// result was applied.
    pub fn apply_fetch(&mut self, owner: Uuid, ids: Vec<String>) -> bool {
        if self.owner != Some(owner) {
            tracing::debug!(%owner, "discarding saved-set fetch for a previous user");
            return false;
        }
        self.ids = ids.into_iter().collect();
        true
    }

    /// Refetch the ids for the current owner. No owner means nothing to do.
    ///
    /// # Errors
    ///
    /// Returns the remote error; the set keeps whatever it held before.
    pub async fn refresh(&mut self, remote: &dyn RemoteService, limit: Duration) -> Result<(), ServiceError> {
        let Some(owner) = self.owner else {
            return Ok(());
        };
        let ids = bounded(limit, remote.select_saved_article_ids(owner)).await?;
        tracing::debug!(%owner, count = ids.len(), "saved articles fetched");
        self.apply_fetch(owner, ids);
        Ok(())
    }

    /// Save `article_id` if absent, remove it if present.
    ///
    /// # Errors
    ///
    /// [`SaveError::LoginRequired`] without a session, otherwise the remote
    /// error. The set is unchanged on any error.
    pub async fn toggle(
        &mut self,
        remote: &dyn RemoteService,
        session: Option<&Session>,
        article_id: &str,
        limit: Duration,
    ) -> Result<ToggleOutcome, SaveError> {
        let user_id = session.map(Session::user_id).ok_or(SaveError::LoginRequired)?;
        self.reset_for(Some(user_id));

        if self.ids.contains(article_id) {
            bounded(limit, remote.delete_saved_article(user_id, article_id)).await?;
            self.ids.remove(article_id);
            tracing::info!(%user_id, article_id, "article removed from saved");
            Ok(ToggleOutcome::Removed)
        } else {
            bounded(limit, remote.insert_saved_article(user_id, article_id)).await?;
            self.ids.insert(article_id.to_owned());
            tracing::info!(%user_id, article_id, "article saved");
            Ok(ToggleOutcome::Saved)
        }
    }
}

#[cfg(test)]
#[path = "saved_test.rs"]
mod tests;
