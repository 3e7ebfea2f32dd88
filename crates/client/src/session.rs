//! Session store: the single source of truth for "am I signed in" and
//! "who am I, as last known".
//!
//! The session is an explicit context object. Clone it and hand the clones to
//! whatever needs it (the gateway, the bootstrap logic, views); all clones
//! share the same backing store.
//!
//! Persisted layout: two independent keys, [`TOKEN_KEY`] holding the raw
//! bearer string and [`USER_KEY`] holding the JSON user record. Either may be
//! missing on its own; reads treat that as absent.

use std::sync::{Arc, Mutex};

use thiserror::Error;

use ecowiser_auth::UserProfile;

use crate::storage::{KeyValueStore, MemoryStore, StorageError};

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("failed to serialize user profile: {0}")]
    Serialize(String),
}

/// Point-in-time copy of the session.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<UserProfile>,
}

#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
    /// Serialises writers so that check-then-write helpers stay atomic.
    writer: Arc<Mutex<()>>,
}

impl core::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionStore")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

/// Shorten a token for log output.
pub(crate) fn redact(token: &str) -> String {
    let head: String = token.chars().take(6).collect();
    format!("{head}…")
}

impl SessionStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            storage,
            writer: Arc::new(Mutex::new(())),
        }
    }

    /// Session backed by a fresh [`MemoryStore`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    fn write_guard(&self) -> std::sync::MutexGuard<'_, ()> {
        // The guarded unit carries no state, so a poisoned lock is still usable.
        self.writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Persist a token and (optionally) the user it belongs to.
    ///
    /// Overwrites whatever was stored before. The token is opaque and not
    /// validated. Passing `None` for the user removes any stale cached profile.
    /// If either write fails both keys are removed, so a new token is never
    /// left paired with an older profile.
    pub fn set_session(&self, token: &str, user: Option<&UserProfile>) -> Result<(), SessionError> {
        let _guard = self.write_guard();
        let written = self
            .storage
            .set(TOKEN_KEY, token)
            .map_err(SessionError::from)
            .and_then(|()| self.write_user(user));
        if let Err(err) = written {
            tracing::warn!("failed to store session, dropping it: {err}");
            self.remove_all();
            return Err(err);
        }
        tracing::info!(token = %redact(token), has_user = user.is_some(), "session established");
        Ok(())
    }

    /// Current token, or `None` when anonymous. Never fails.
    pub fn token(&self) -> Option<String> {
        match self.storage.get(TOKEN_KEY) {
            Ok(token) => token,
            Err(err) => {
                tracing::warn!("failed to read session token, treating as absent: {err}");
                None
            }
        }
    }

    /// Last known profile, or `None`. Never fails; an unreadable record counts as absent.
    pub fn user(&self) -> Option<UserProfile> {
        let raw = match self.storage.get(USER_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!("failed to read cached user, treating as absent: {err}");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(err) => {
                tracing::warn!("cached user record is not valid JSON profile: {err}");
                None
            }
        }
    }

    pub fn snapshot(&self) -> Session {
        Session {
            token: self.token(),
            user: self.user(),
        }
    }

    /// Whether a non-empty token is present. Does not check validity or expiry.
    pub fn is_authenticated(&self) -> bool {
        self.token().is_some_and(|t| !t.is_empty())
    }

    /// Replace the cached profile, leaving the token untouched.
    pub fn replace_user(&self, user: &UserProfile) -> Result<(), SessionError> {
        let _guard = self.write_guard();
        self.write_user(Some(user))
    }

    /// Replace the cached profile only if the session still holds `token`.
    ///
    /// A response that was requested with a token that has since been cleared
    /// (or replaced by a new login) must not write into the current session.
    /// Returns whether the profile was written.
    pub fn replace_user_if_current(
        &self,
        token: Option<&str>,
        user: &UserProfile,
    ) -> Result<bool, SessionError> {
        let _guard = self.write_guard();
        let current = self.token();
        match (current.as_deref(), token) {
            (Some(current), Some(sent)) if !current.is_empty() && current == sent => {
                self.write_user(Some(user))?;
                Ok(true)
            }
            _ => {
                tracing::debug!("discarding profile from a request made under a different session");
                Ok(false)
            }
        }
    }

    /// Remove token and user. Idempotent; storage failures are logged, not raised.
    pub fn clear(&self) {
        let _guard = self.write_guard();
        self.remove_all();
        tracing::debug!("session cleared");
    }

    fn remove_all(&self) {
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(err) = self.storage.remove(key) {
                tracing::warn!(key, "failed to remove session entry: {err}");
            }
        }
    }

    fn write_user(&self, user: Option<&UserProfile>) -> Result<(), SessionError> {
        match user {
            Some(user) => {
                let raw = serde_json::to_string(user)
                    .map_err(|e| SessionError::Serialize(e.to_string()))?;
                self.storage.set(USER_KEY, &raw)?;
            }
            None => self.storage.remove(USER_KEY)?,
        }
        Ok(())
    }
}
