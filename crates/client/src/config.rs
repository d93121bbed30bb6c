// Local configuration for the client engine.
//
// Global config: `~/.ragdesk/config.toml`
// `RAGDESK_API_URL` overrides `api_url` when set.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::security::write_private_file;

pub const API_URL_ENV: &str = "RAGDESK_API_URL";

const DEFAULT_API_URL: &str = "http://localhost:8000/api";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
/// Default spacing between document status refreshes.
const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;
const MIN_POLL_INTERVAL_MS: u64 = 250;
const MAX_POLL_INTERVAL_MS: u64 = 60_000;
const DEFAULT_MAX_FILE_SIZE_MB: u64 = 20;
const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &["pdf", "txt", "md", "docx"];

/// Root directory for ragdesk state: `~/.ragdesk/`.
pub fn global_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".ragdesk"))
}

/// Path to the global config file: `~/.ragdesk/config.toml`.
pub fn global_config_path() -> Option<PathBuf> {
    global_dir().map(|d| d.join("config.toml"))
}

/// Default location of the persisted session: `~/.ragdesk/session.json`.
pub fn default_session_path() -> Option<PathBuf> {
    global_dir().map(|d| d.join("session.json"))
}

// ── Client config ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the remote API, including the `/api` prefix.
    pub api_url: String,
    /// Per-request timeout. Chat answers can take a while.
    pub request_timeout_secs: u64,
    /// Spacing between document status refreshes while indexing.
    pub poll_interval_ms: u64,
    pub session: SessionConfig,
    pub upload: UploadConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            session: SessionConfig::default(),
            upload: UploadConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Load from `~/.ragdesk/config.toml` and apply environment overrides.
    /// Returns defaults if the file doesn't exist or can't be parsed.
    pub fn load() -> Self {
        global_config_path()
            .and_then(|p| Self::load_from(&p).ok())
            .unwrap_or_default()
            .with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Load from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Save to a specific path (creates parent directories, owner-only).
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        write_private_file(path, contents.as_bytes())?;
        Ok(())
    }

    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(API_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.api_url = url.trim().to_string();
        }
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Poll interval clamped to [250ms, 60s].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.clamp(MIN_POLL_INTERVAL_MS, MAX_POLL_INTERVAL_MS))
    }
}

// ── Session persistence ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionBackend {
    /// JSON file with owner-only permissions.
    #[default]
    File,
    /// OS keychain entry.
    Keyring,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SessionConfig {
    pub backend: SessionBackend,
    /// Overrides `~/.ragdesk/session.json` for the file backend.
    pub path: Option<PathBuf>,
}

// ── Upload limits ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UploadConfig {
    /// Lowercase extensions without the dot.
    pub allowed_extensions: Vec<String>,
    pub max_file_size_mb: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            max_file_size_mb: DEFAULT_MAX_FILE_SIZE_MB,
        }
    }
}

// ── Errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
