//! Persisted login session.
//!
//! Holds the bearer token, username and role returned by the login
//! endpoint. Stored as a small JSON file in the data directory, readable
//! only by the owner on Unix.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::model::LoginResponse;

/// Session storage errors.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt session file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Where a user lands after logging in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Landing {
    /// Admin console.
    AdminConsole,
    /// Public catalog.
    Catalog,
}

/// Credentials kept between invocations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque bearer token.
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default)]
    pub username: Option<String>,

    /// Role string as sent by the server (e.g. `ROLE_ADMIN`).
    #[serde(default)]
    pub role: Option<String>,
}

impl Session {
    /// Session from a login response. Missing fields stay unset.
    pub fn from_login(response: &LoginResponse) -> Self {
        Self {
            token: response.token.clone(),
            username: response.username.clone(),
            role: response.effective_role().map(str::to_string),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }

    pub fn is_admin(&self) -> bool {
        self.role.as_deref().is_some_and(is_admin_role)
    }

    pub fn landing(&self) -> Landing {
        if self.is_admin() {
            Landing::AdminConsole
        } else {
            Landing::Catalog
        }
    }
}

/// Any role whose uppercased form mentions `ADMIN`.
pub fn is_admin_role(role: &str) -> bool {
    role.to_uppercase().contains("ADMIN")
}

/// File-backed session storage.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Store at an explicit file path.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store at `session.json` inside `data_dir`.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(session_path(data_dir))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored session. A missing file is an empty session.
    pub fn load(&self) -> Result<Session, SessionError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Session::default()),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_slice(&bytes).map_err(|source| SessionError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Persist `session`, replacing what was stored.
    pub fn save(&self, session: &Session) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_vec_pretty(session)?;

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.path)?;

        // `mode` only applies on creation; tighten a file left by older versions.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600))?;
        }
        file.write_all(&json)?;

        debug!(path = %self.path.display(), "Session saved");
        Ok(())
    }

    /// Forget the whole session (logout, account deletion).
    pub fn clear(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "Session cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Drop only the token, keeping username and role (expired session).
    pub fn clear_token(&self) -> Result<(), SessionError> {
        let mut session = self.load()?;
        if session.token.take().is_some() {
            self.save(&session)?;
        }
        Ok(())
    }
}

/// Session file inside a data directory.
pub fn session_path(data_dir: &Path) -> PathBuf {
    data_dir.join("session.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn admin_session() -> Session {
        Session {
            token: Some("tok".to_string()),
            username: Some("root".to_string()),
            role: Some("ROLE_ADMIN".to_string()),
        }
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let store = SessionStore::in_dir(&temp.path().join("nested"));

        store.save(&admin_session()).unwrap();
        let loaded = store.load().unwrap();

        assert_eq!(loaded, admin_session());
        assert!(loaded.is_authenticated());
    }

    #[test]
    fn test_missing_file_is_empty_session() {
        let temp = TempDir::new().unwrap();
        let store = SessionStore::in_dir(temp.path());

        let session = store.load().unwrap();
        assert_eq!(session, Session::default());
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_clear() {
        let temp = TempDir::new().unwrap();
        let store = SessionStore::in_dir(temp.path());

        store.save(&admin_session()).unwrap();
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), Session::default());

        // Clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_clear_token_keeps_identity() {
        let temp = TempDir::new().unwrap();
        let store = SessionStore::in_dir(temp.path());

        store.save(&admin_session()).unwrap();
        store.clear_token().unwrap();

        let session = store.load().unwrap();
        assert_eq!(session.token, None);
        assert_eq!(session.username.as_deref(), Some("root"));
    }

    #[test]
    fn test_corrupt_file() {
        let temp = TempDir::new().unwrap();
        let store = SessionStore::in_dir(temp.path());
        fs::write(store.path(), b"{not json").unwrap();

        assert!(matches!(store.load(), Err(SessionError::Corrupt { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let store = SessionStore::in_dir(temp.path());
        store.save(&admin_session()).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_existing_file_is_tightened() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let store = SessionStore::in_dir(temp.path());
        fs::write(store.path(), b"{}").unwrap();
        fs::set_permissions(store.path(), fs::Permissions::from_mode(0o644)).unwrap();

        store.save(&admin_session()).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(store.load().unwrap(), admin_session());
    }

    #[test]
    fn test_admin_role_and_landing() {
        assert!(is_admin_role("ROLE_ADMIN"));
        assert!(is_admin_role("admin"));
        assert!(!is_admin_role("ROLE_USER"));

        assert_eq!(admin_session().landing(), Landing::AdminConsole);
        assert_eq!(Session::default().landing(), Landing::Catalog);
    }

    #[test]
    fn test_from_login_uses_roles_list() {
        let response = LoginResponse {
            token: Some("t".to_string()),
            username: Some("anna".to_string()),
            role: None,
            roles: vec!["ROLE_USER".to_string()],
        };

        let session = Session::from_login(&response);
        assert_eq!(session.role.as_deref(), Some("ROLE_USER"));
        assert!(!session.is_admin());
    }
}
