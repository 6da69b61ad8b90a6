//! Persisted (token, user) session.
//!
//! SYSTEM CONTEXT
//! ==============
//! Written by the auth facade on login/signup/logout and cleared by the
//! gateway's forced logout on a 401. Every read goes to durable storage, so a
//! fresh process sees exactly what the previous one left behind.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use super::storage::{Storage, StorageError};
use crate::net::types::User;

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

/// The client-held authenticated identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user: User,
}

pub struct SessionStore {
    storage: Box<dyn Storage>,
}

impl SessionStore {
    #[must_use]
    pub fn new(storage: impl Storage + 'static) -> Self {
        Self { storage: Box::new(storage) }
    }

    /// Persist token and user in one storage update.
    ///
    /// # Errors
    ///
    /// Returns an error if the user cannot be encoded or storage rejects the write.
    pub fn save(&self, token: &str, user: &User) -> Result<(), StorageError> {
        let user_json = serde_json::to_string(user).map_err(|e| StorageError::Encode(e.to_string()))?;
        self.storage.set_all(&[(TOKEN_KEY, token), (USER_KEY, &user_json)])
    }

    /// Return the last saved session, or `None`.
    ///
    /// A half-written or unparsable session is cleared and reported as absent.
    #[must_use]
    pub fn load(&self) -> Option<Session> {
        let token = self.read(TOKEN_KEY);
        let user_raw = self.read(USER_KEY);

        match (token, user_raw) {
            (None, None) => None,
            (Some(token), Some(raw)) if !token.is_empty() => match serde_json::from_str::<User>(&raw) {
                Ok(user) => Some(Session { token, user }),
                Err(e) => {
                    tracing::warn!(error = %e, "stored user is malformed; clearing session");
                    self.heal();
                    None
                }
            },
            (token, _) => {
                let has_token = token.is_some_and(|t| !t.is_empty());
                tracing::warn!(has_token, "stored session is incomplete; clearing session");
                self.heal();
                None
            }
        }
    }

    /// The stored bearer token, if any. Does not validate the user entry.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.read(TOKEN_KEY).filter(|t| !t.is_empty())
    }

    /// Remove both session entries.
    ///
    /// # Errors
    ///
    /// Returns an error if storage rejects the removal.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.storage.remove_all(&[TOKEN_KEY, USER_KEY])
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.storage.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "session storage read failed");
                None
            }
        }
    }

    fn heal(&self) {
        if let Err(e) = self.clear() {
            tracing::warn!(error = %e, "failed to clear invalid session");
        }
    }
}
