//! Persisted session (bearer token + display name).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const SESSION_FILE: &str = "session.json";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("could not determine a config directory")]
    NoConfigDir,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub display_name: String,
}

/// Owns the current session and its on-disk copy.
///
/// Created once at startup and handed to whoever needs it; written only on
/// login and logout.
#[derive(Debug)]
pub struct SessionStore {
    path: PathBuf,
    current: Option<Session>,
}

impl SessionStore {
    /// Load the persisted session from `path`. A missing or unreadable file
    /// means "no session".
    pub fn init(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let current = match read_session(&path) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(path = %path.display(), "ignoring unreadable session: {e}");
                None
            }
        };
        Self { path, current }
    }

    /// Open the store at `~/.config/linktui/session.json`.
    pub fn open_default() -> Result<Self, SessionError> {
        let dir = crate::config::config_dir().ok_or(SessionError::NoConfigDir)?;
        Ok(Self::init(dir.join(SESSION_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn set_session(
        &mut self,
        token: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Result<(), SessionError> {
        let session = Session {
            token: token.into(),
            display_name: display_name.into(),
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&session)?)?;

        self.current = Some(session);
        Ok(())
    }

    pub fn get_session(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    /// Forget the session in memory and on disk.
    pub fn clear_session(&mut self) -> Result<(), SessionError> {
        self.current = None;
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn read_session(path: &Path) -> Result<Option<Session>, SessionError> {
    if !path.exists() {
        return Ok(None);
    }
    let json = std::fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&json)?))
}
