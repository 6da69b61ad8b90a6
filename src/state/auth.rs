//! Auth-session state for the current client user.
//!
//! SYSTEM CONTEXT
//! ==============
//! The only owner of login/signup/logout. Route guards and the CLI read the
//! phase from here and never touch session storage directly.
//!
//! DESIGN
//! ======
//! `init` hydrates synchronously from the session store. Until it has run the
//! phase is `Uninitialized`/`Loading`, which consumers treat as "do not render
//! protected content and do not redirect yet". The gateway's auth-expired
//! event is the only state change outside an explicit user action.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use crate::net::api::ApiClient;
use crate::net::error::ApiError;
use crate::net::types::{AuthResponse, LoginRequest, SignupRequest, User};

/// Lifecycle of the client's authenticated identity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AuthPhase {
    #[default]
    Uninitialized,
    Loading,
    Authenticated(User),
    Anonymous,
}

impl AuthPhase {
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated(user) => Some(user),
            Self::Uninitialized | Self::Loading | Self::Anonymous => None,
        }
    }

    /// True until hydration has settled.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Uninitialized | Self::Loading)
    }
}

pub struct AuthService {
    api: Arc<ApiClient>,
    phase: Arc<Mutex<AuthPhase>>,
    submitting: AtomicBool,
}

impl AuthService {
    /// Create the facade and subscribe it to the gateway's auth-expired event.
    #[must_use]
    pub fn new(api: Arc<ApiClient>) -> Self {
        let phase = Arc::new(Mutex::new(AuthPhase::Uninitialized));
        let expired: Weak<Mutex<AuthPhase>> = Arc::downgrade(&phase);
        api.on_auth_expired(move || {
            if let Some(phase) = expired.upgrade() {
                *phase.lock().unwrap_or_else(PoisonError::into_inner) = AuthPhase::Anonymous;
            }
        });
        Self { api, phase, submitting: AtomicBool::new(false) }
    }

    #[must_use]
    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    /// Hydrate from the session store and settle in `Authenticated` or `Anonymous`.
    pub fn init(&self) -> AuthPhase {
        self.set_phase(AuthPhase::Loading);
        let next = match self.api.session().load() {
            Some(session) => {
                tracing::debug!(user_id = %session.user.id, "session restored");
                AuthPhase::Authenticated(session.user)
            }
            None => AuthPhase::Anonymous,
        };
        self.set_phase(next.clone());
        next
    }

    /// Log in and persist the returned session.
    ///
    /// # Errors
    ///
    /// Propagates the gateway error unmodified; returns
    /// [`ApiError::RequestInFlight`] if another login/signup is pending, or
    /// [`ApiError::Storage`] if the session cannot be saved.
    pub async fn login(&self, credentials: &LoginRequest) -> Result<User, ApiError> {
        let _submit = SubmitGuard::acquire(&self.submitting)?;
        let response = self.api.login(credentials).await?;
        self.establish(response)
    }

    /// Create an account and persist the returned session.
    ///
    /// # Errors
    ///
    /// Same as [`AuthService::login`].
    pub async fn signup(&self, profile: &SignupRequest) -> Result<User, ApiError> {
        let _submit = SubmitGuard::acquire(&self.submitting)?;
        let response = self.api.signup(profile).await?;
        self.establish(response)
    }

    /// Clear the session and become `Anonymous`. No backend call.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Storage`] if the session file could not be removed;
    /// the in-memory phase is `Anonymous` either way.
    pub fn logout(&self) -> Result<(), ApiError> {
        self.set_phase(AuthPhase::Anonymous);
        self.api.session().clear()?;
        tracing::info!("logged out");
        Ok(())
    }

    #[must_use]
    pub fn phase(&self) -> AuthPhase {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.phase().is_loading()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.phase().user().is_some()
    }

    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.phase().user().cloned()
    }

    fn establish(&self, response: AuthResponse) -> Result<User, ApiError> {
        self.api.session().save(&response.token, &response.user)?;
        tracing::info!(user_id = %response.user.id, "session established");
        self.set_phase(AuthPhase::Authenticated(response.user.clone()));
        Ok(response.user)
    }

    fn set_phase(&self, next: AuthPhase) {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner) = next;
    }
}

/// Holds the single submission slot; released on drop, including when the
/// pending future is abandoned.
struct SubmitGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> SubmitGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, ApiError> {
        if flag.swap(true, Ordering::AcqRel) {
            return Err(ApiError::RequestInFlight);
        }
        Ok(Self { flag })
    }
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
