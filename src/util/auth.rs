//! Shared route-guard decision.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every protected command applies the same rule: wait while hydration is
//! pending, render when a user is present, otherwise send the user to login.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use crate::state::auth::AuthPhase;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteGuard {
    /// Hydration has not settled; render nothing and do not redirect.
    Wait,
    Render,
    RedirectToLogin,
}

#[must_use]
pub fn route_guard(phase: &AuthPhase) -> RouteGuard {
    match phase {
        AuthPhase::Uninitialized | AuthPhase::Loading => RouteGuard::Wait,
        AuthPhase::Authenticated(_) => RouteGuard::Render,
        AuthPhase::Anonymous => RouteGuard::RedirectToLogin,
    }
}

/// True only once hydration has settled without a user.
#[must_use]
pub fn should_redirect_unauth(phase: &AuthPhase) -> bool {
    route_guard(phase) == RouteGuard::RedirectToLogin
}
