//! Top-level views and the rules for reaching them.

use std::fmt;
use std::str::FromStr;

use crate::articles;
use crate::services::auth_flow::FormIntent;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Home,
    Article(String),
    About,
    Login,
    Register,
    Saved,
}

impl View {
    /// The auth form this view mounts, if any.
    #[must_use]
    pub fn auth_intent(&self) -> Option<FormIntent> {
        match self {
            Self::Login => Some(FormIntent::Login),
            Self::Register => Some(FormIntent::Register),
            _ => None,
        }
    }

    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".to_owned(),
            Self::Article(id) => format!("/article/{id}"),
            Self::About => "/about".to_owned(),
            Self::Login => "/login".to_owned(),
            Self::Register => "/register".to_owned(),
            Self::Saved => "/saved".to_owned(),
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    #[error("no article with id {0}")]
    UnknownArticle(String),
    #[error("no view at {0}")]
    UnknownPath(String),
}

impl FromStr for View {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_end_matches('/');
        Ok(match trimmed {
            "" => Self::Home,
            "/about" => Self::About,
            "/login" => Self::Login,
            "/register" => Self::Register,
            "/saved" => Self::Saved,
            other => match other.strip_prefix("/article/") {
                Some(id) if !id.is_empty() && !id.contains('/') => Self::Article(id.to_owned()),
                _ => return Err(RouteError::UnknownPath(s.to_owned())),
            },
        })
    }
}

/// Where a request for `requested` actually lands.
///
/// Unknown articles are rejected. The saved list needs a session and
/// falls back to the login view without one.
///
/// # Errors
///
/// Returns [`RouteError::UnknownArticle`] for an id not in the catalog.
pub fn resolve(requested: View, signed_in: bool) -> Result<View, RouteError> {
    match requested {
        View::Article(id) if articles::find(&id).is_none() => Err(RouteError::UnknownArticle(id)),
        View::Saved if !signed_in => Ok(View::Login),
        other => Ok(other),
    }
}

#[cfg(test)]
#[path = "view_test.rs"]
mod tests;
