//! Client configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::catalog::source::DEFAULT_VOLUMES_URL;
use crate::session::SessionStore;

/// Backend used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Language restriction applied to public catalog queries.
pub const DEFAULT_LANGUAGE: &str = "it";

/// Configuration for a SmartLibrary client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the SmartLibrary API (no trailing slash).
    pub api_url: String,

    /// Directory holding the persisted session.
    pub data_dir: PathBuf,

    /// Browse the public book-search API instead of the backend catalog.
    pub public_catalog: bool,

    /// Public `volumes` endpoint.
    pub volumes_url: String,

    /// Language restriction for public catalog queries.
    pub language: String,

    /// Per-request timeout.
    pub timeout: Duration,

    /// Alternate admin route prefix tried once after a 403 (e.g. `/api/admin`).
    pub admin_fallback_prefix: Option<String>,
}

impl ClientConfig {
    /// Create a config for `api_url` with default settings.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: normalize_base(api_url.into()),
            data_dir: default_data_dir(),
            public_catalog: false,
            volumes_url: DEFAULT_VOLUMES_URL.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            timeout: DEFAULT_TIMEOUT,
            admin_fallback_prefix: None,
        }
    }

    pub fn with_data_dir(mut self, data_dir: PathBuf) -> Self {
        self.data_dir = data_dir;
        self
    }

    pub fn with_public_catalog(mut self, enabled: bool) -> Self {
        self.public_catalog = enabled;
        self
    }

    pub fn with_volumes_url(mut self, url: impl Into<String>) -> Self {
        self.volumes_url = url.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enable the single retry under `prefix` when an admin route answers 403.
    pub fn with_admin_fallback(mut self, prefix: impl Into<String>) -> Self {
        self.admin_fallback_prefix = Some(normalize_base(prefix.into()));
        self
    }

    /// Session store inside the data directory.
    pub fn session_store(&self) -> SessionStore {
        SessionStore::in_dir(&self.data_dir)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

/// Platform data directory for SmartLibrary state.
pub fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("org", "smartlibrary", "smartlibrary")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".smartlibrary"))
}

fn normalize_base(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_removed() {
        let config = ClientConfig::new("http://example.org/ ").with_admin_fallback("/api/admin/");
        assert_eq!(config.api_url, "http://example.org");
        assert_eq!(config.admin_fallback_prefix.as_deref(), Some("/api/admin"));
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert!(!config.public_catalog);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.admin_fallback_prefix, None);
    }

    #[test]
    fn test_session_store_lives_in_data_dir() {
        let config = ClientConfig::default().with_data_dir(PathBuf::from("/tmp/sl-test"));
        assert_eq!(config.session_store().path(), PathBuf::from("/tmp/sl-test/session.json"));
    }
}
