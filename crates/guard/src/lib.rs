//! Motorsouk Route Guards
//!
//! Auth-gated view wrappers for the marketplace client: a role-aware route
//! guard, a guest-only wrapper, and client-side access-token claims
//! inspection. Guard evaluation is a pure function of the current auth
//! status, so views re-evaluate it on every auth transition without
//! flashing the wrong content.

pub mod claims;
pub mod guard;

pub use claims::{decode_claims, session_from_token, TokenClaims};
pub use guard::{AuthStatus, GuardDecision, GuestGuard, Route, RouteGuard};
