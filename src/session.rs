//! Persisted login session.
//!
//! The session is two keys, `token` and `user` (a JSON [`UserProfile`]).
//! They live in the OS keychain under the `tormentus` service unless a
//! session file is configured, in which case a small JSON document is used
//! instead. `TORMENTUS_TOKEN` / `TORMENTUS_USER` override whatever is stored.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::TormentusError;
use crate::models::market::UserProfile;

/// Keychain service name used for all stored session keys.
const SERVICE: &str = "tormentus";

/// Keys making up a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionKey {
    Token,
    User,
}

impl SessionKey {
    /// Returns the keychain entry identifier.
    pub fn keyring_id(self) -> &'static str {
        match self {
            Self::Token => "token",
            Self::User => "user",
        }
    }

    /// Returns the environment variable that overrides this key.
    pub fn env_var(self) -> &'static str {
        match self {
            Self::Token => "TORMENTUS_TOKEN",
            Self::User => "TORMENTUS_USER",
        }
    }

    pub const ALL: [SessionKey; 2] = [Self::Token, Self::User];
}

/// The loaded session. Without a token the dashboard is read-only.
#[derive(Debug, Default)]
pub struct Session {
    pub token: Option<Zeroizing<String>>,
    pub user: Option<UserProfile>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

/// On-disk layout of the session file.
#[derive(Debug, Default, Deserialize)]
struct SessionFile {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    user: Option<String>,
}

/// Where the session keys are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStore {
    Keychain,
    File(PathBuf),
}

impl SessionStore {
    /// Picks the file store when a path is configured, the keychain otherwise.
    pub fn from_config(session_file: Option<&Path>) -> Self {
        match session_file {
            Some(path) => Self::File(path.to_path_buf()),
            None => Self::Keychain,
        }
    }

    /// Loads the session, applying environment overrides.
    ///
    /// A stored `user` that is not valid JSON is logged and ignored.
    pub fn load(&self) -> Session {
        let token = env_value(SessionKey::Token).or_else(|| self.read(SessionKey::Token));
        let user = env_value(SessionKey::User)
            .or_else(|| self.read(SessionKey::User))
            .and_then(|raw| match serde_json::from_str::<UserProfile>(&raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!(error = %e, "ignoring unreadable stored user profile");
                    None
                }
            });
        debug!(
            authenticated = token.is_some(),
            has_user = user.is_some(),
            "loaded session"
        );
        Session { token, user }
    }

    /// Removes every stored session key (logout).
    ///
    /// # Errors
    ///
    /// Returns an error if an existing entry cannot be deleted.
    pub fn clear(&self) -> crate::Result<()> {
        match self {
            Self::Keychain => {
                for key in SessionKey::ALL {
                    keychain_delete(key)?;
                }
            }
            Self::File(path) => match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(TormentusError::Io(format!(
                        "failed to remove {}: {e}",
                        path.display()
                    )));
                }
            },
        }
        info!("session cleared");
        Ok(())
    }

    fn read(&self, key: SessionKey) -> Option<Zeroizing<String>> {
        match self {
            Self::Keychain => keychain_get(key),
            Self::File(path) => {
                let file = read_file(path)?;
                let value = match key {
                    SessionKey::Token => file.token,
                    SessionKey::User => file.user,
                };
                value.filter(|v| !v.is_empty()).map(Zeroizing::new)
            }
        }
    }
}

fn env_value(key: SessionKey) -> Option<Zeroizing<String>> {
    std::env::var(key.env_var())
        .ok()
        .filter(|v| !v.is_empty())
        .map(Zeroizing::new)
}

fn keychain_get(key: SessionKey) -> Option<Zeroizing<String>> {
    let entry = keyring::Entry::new(SERVICE, key.keyring_id()).ok()?;
    match entry.get_password() {
        Ok(value) => Some(Zeroizing::new(value)),
        Err(keyring::Error::NoEntry) => None,
        Err(e) => {
            warn!(key = key.keyring_id(), error = %e, "failed to read keychain entry");
            None
        }
    }
}

fn keychain_delete(key: SessionKey) -> crate::Result<()> {
    let entry = keyring::Entry::new(SERVICE, key.keyring_id())
        .map_err(|e| TormentusError::Keyring(format!("keyring entry error: {e}")))?;
    match entry.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(TormentusError::Keyring(format!(
            "failed to delete keychain entry {}: {e}",
            key.keyring_id()
        ))),
    }
}

fn read_file(path: &Path) -> Option<SessionFile> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read session file");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(file) => Some(file),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "session file is not valid JSON");
            None
        }
    }
}
