//! Auth-gated view wrappers
//!
//! States: Checking while auth is loading, Denied (redirect) when the
//! session is absent or the role does not match, Authorized otherwise.
//! Denied states redirect and render nothing; Checking suppresses children
//! unconditionally until auth resolves.

use std::collections::HashSet;

use motorsouk_shared::{Session, UserRole};

/// Authentication state of the current tab
#[derive(Debug, Clone)]
pub enum AuthStatus {
    /// Auth is still resolving; nothing may render yet
    Loading,
    Unauthenticated,
    Authenticated(Session),
}

impl AuthStatus {
    pub fn session(&self) -> Option<&Session> {
        match self {
            AuthStatus::Authenticated(session) => Some(session),
            _ => None,
        }
    }
}

/// Client-side navigation targets for denied access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Dashboard,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Dashboard => "/dashboard",
        }
    }
}

/// Outcome of evaluating a guard against the current auth status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Auth unresolved; render nothing, redirect nowhere
    Checking,
    /// Render the wrapped view
    Allow,
    /// Render nothing and navigate away
    Redirect(Route),
}

/// Wrapper for views that require authentication and, optionally, a role
#[derive(Debug, Clone, Default)]
pub struct RouteGuard {
    require_auth: bool,
    allowed_roles: Option<HashSet<UserRole>>,
}

impl RouteGuard {
    /// Guard requiring only an authenticated session
    pub fn protected() -> Self {
        Self {
            require_auth: true,
            allowed_roles: None,
        }
    }

    pub fn require_auth(mut self, required: bool) -> Self {
        self.require_auth = required;
        self
    }

    /// Restrict to a role set; implies an authenticated session
    pub fn allow_roles(mut self, roles: impl IntoIterator<Item = UserRole>) -> Self {
        self.allowed_roles = Some(roles.into_iter().collect());
        self.require_auth = true;
        self
    }

    /// Evaluate against the current auth status. Pure; called again on
    /// every auth transition.
    pub fn evaluate(&self, auth: &AuthStatus) -> GuardDecision {
        match auth {
            AuthStatus::Loading => GuardDecision::Checking,

            AuthStatus::Unauthenticated => {
                if self.require_auth {
                    tracing::debug!(redirect = Route::Home.path(), "Unauthenticated access denied");
                    GuardDecision::Redirect(Route::Home)
                } else {
                    GuardDecision::Allow
                }
            }

            AuthStatus::Authenticated(session) => match &self.allowed_roles {
                Some(roles) if !roles.contains(&session.role()) => {
                    tracing::debug!(
                        role = %session.role(),
                        redirect = Route::Dashboard.path(),
                        "Role not permitted for this view"
                    );
                    GuardDecision::Redirect(Route::Dashboard)
                }
                _ => GuardDecision::Allow,
            },
        }
    }
}

/// Wrapper for guest-only views (login, signup); an authenticated session
/// is sent to the dashboard instead
#[derive(Debug, Clone, Copy, Default)]
pub struct GuestGuard;

impl GuestGuard {
    pub fn evaluate(&self, auth: &AuthStatus) -> GuardDecision {
        match auth {
            AuthStatus::Loading => GuardDecision::Checking,
            AuthStatus::Unauthenticated => GuardDecision::Allow,
            AuthStatus::Authenticated(_) => GuardDecision::Redirect(Route::Dashboard),
        }
    }
}
