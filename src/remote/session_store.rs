//! JSON file persistence for the current session.
//!
//! Lets a restarted front-end recover the previous sign-in. Load failures are
//! logged and treated as "no session"; a corrupt file never blocks startup.

use std::fs::OpenOptions;
use std::io::{self, Write};
#[cfg(unix)]
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};

use super::types::Session;

#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted session, if present and well-formed.
    #[must_use]
    pub fn load(&self) -> Option<Session> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(error = %e, path = %self.path.display(), "session file unreadable");
                return None;
            }
        };
        match serde_json::from_str::<Session>(&raw) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!(error = %e, path = %self.path.display(), "session file corrupt; ignoring");
                None
            }
        }
    }

    /// Write the session. On Unix the file is readable by its owner only,
    /// including when it already existed with wider permissions.
    pub fn save(&self, session: &Session) -> io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(session).map_err(io::Error::other)?;

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);
        let mut file = options.open(&self.path)?;
        #[cfg(unix)]
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        file.write_all(json.as_bytes())
    }

    pub fn clear(&self) -> io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

#[cfg(test)]
#[path = "session_store_test.rs"]
mod tests;
