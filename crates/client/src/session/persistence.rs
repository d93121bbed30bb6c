// Durable storage for the signed-in session.
//
// The record is `{token, user}` as JSON, kept either in an owner-only file
// or in the OS keychain. Access goes through `SessionPersistence` so the
// store can be exercised against memory in tests.

use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use ragdesk_common::types::UserProfile;

use crate::config::{default_session_path, SessionBackend, SessionConfig};
use crate::security::write_private_file;

const KEYRING_SERVICE: &str = "com.ragdesk.client";
const KEYRING_ACCOUNT: &str = "session";

/// Platforms with a native keyring store enabled in the manifest. Elsewhere
/// `keyring` falls back to a per-entry mock that persists nothing.
const KEYCHAIN_SUPPORTED: bool =
    cfg!(any(target_os = "linux", target_os = "macos", target_os = "windows"));

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersistedSession {
    pub token: String,
    pub user: UserProfile,
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("session file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("session record is corrupt: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("keychain error: {0}")]
    Keyring(#[from] keyring::Error),
    #[error("no location for the session file (home directory unknown)")]
    NoLocation,
    #[error("no OS keychain on this platform; use the file session backend")]
    KeyringUnavailable,
}

pub trait SessionPersistence: Send + Sync {
    /// `Ok(None)` when nothing has been stored.
    fn load(&self) -> Result<Option<PersistedSession>, PersistenceError>;
    fn save(&self, session: &PersistedSession) -> Result<(), PersistenceError>;
    /// Clearing an empty store succeeds.
    fn clear(&self) -> Result<(), PersistenceError>;
}

/// Build the backend selected in config.
pub fn from_config(config: &SessionConfig) -> Result<Box<dyn SessionPersistence>, PersistenceError> {
    match config.backend {
        SessionBackend::File => {
            let path =
                config.path.clone().or_else(default_session_path).ok_or(PersistenceError::NoLocation)?;
            Ok(Box::new(FilePersistence::new(path)))
        }
        SessionBackend::Keyring if KEYCHAIN_SUPPORTED => Ok(Box::new(KeyringPersistence::new())),
        SessionBackend::Keyring => Err(PersistenceError::KeyringUnavailable),
    }
}

// ── File ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct FilePersistence {
    path: PathBuf,
}

impl FilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl SessionPersistence for FilePersistence {
    fn load(&self) -> Result<Option<PersistedSession>, PersistenceError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error.into()),
        };
        Ok(Some(serde_json::from_str(&contents)?))
    }

    fn save(&self, session: &PersistedSession) -> Result<(), PersistenceError> {
        let serialized = serde_json::to_vec_pretty(session)?;
        write_private_file(&self.path, &serialized)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), PersistenceError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }
}

// ── Keychain ───────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct KeyringPersistence {
    service: String,
    account: String,
}

impl KeyringPersistence {
    pub fn new() -> Self {
        Self::with_account(KEYRING_SERVICE, KEYRING_ACCOUNT)
    }

    pub fn with_account(service: impl Into<String>, account: impl Into<String>) -> Self {
        Self { service: service.into(), account: account.into() }
    }

    fn entry(&self) -> Result<keyring::Entry, PersistenceError> {
        Ok(keyring::Entry::new(&self.service, &self.account)?)
    }
}

impl Default for KeyringPersistence {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionPersistence for KeyringPersistence {
    fn load(&self) -> Result<Option<PersistedSession>, PersistenceError> {
        match self.entry()?.get_password() {
            Ok(serialized) => Ok(Some(serde_json::from_str(&serialized)?)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    fn save(&self, session: &PersistedSession) -> Result<(), PersistenceError> {
        let serialized = serde_json::to_string(session)?;
        self.entry()?.set_password(&serialized)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), PersistenceError> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(error) => Err(error.into()),
        }
    }
}

// ── Memory ─────────────────────────────────────────────────────────

/// In-process store. Used for one-shot sessions and tests.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    value: Mutex<Option<String>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with a raw record, valid or not.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self { value: Mutex::new(Some(raw.into())) }
    }
}

impl SessionPersistence for MemoryPersistence {
    fn load(&self) -> Result<Option<PersistedSession>, PersistenceError> {
        let value = self.value.lock().unwrap_or_else(PoisonError::into_inner);
        match value.as_deref() {
            Some(raw) => Ok(Some(serde_json::from_str(raw)?)),
            None => Ok(None),
        }
    }

    fn save(&self, session: &PersistedSession) -> Result<(), PersistenceError> {
        let serialized = serde_json::to_string(session)?;
        *self.value.lock().unwrap_or_else(PoisonError::into_inner) = Some(serialized);
        Ok(())
    }

    fn clear(&self) -> Result<(), PersistenceError> {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}
