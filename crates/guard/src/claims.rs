//! Client-side access-token claims inspection
//!
//! The client does not hold the signing key, so claims are read without
//! signature verification; the server re-validates every request. What the
//! client needs from the token is identity, role, and expiry.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use motorsouk_shared::{AuthUser, MarketError, Session, UserId, UserRole};

/// Clock skew tolerance when judging expiry
const EXPIRY_LEEWAY_SECS: i64 = 60;

/// Claims carried by a motorsouk access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user ID)
    pub sub: UserId,
    /// Account email
    pub email: Option<String>,
    /// Marketplace role
    pub role: Option<UserRole>,
    /// Issued at
    pub iat: Option<i64>,
    /// Expiration
    pub exp: i64,
}

impl TokenClaims {
    pub fn is_expired(&self) -> bool {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        self.exp + EXPIRY_LEEWAY_SECS <= now
    }
}

/// Decode the claims of an access token without verifying its signature.
///
/// Expiry is not enforced here; callers decide how to treat a stale token.
pub fn decode_claims(token: &str) -> Result<TokenClaims, MarketError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;

    decode::<TokenClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|e| MarketError::Auth(format!("Malformed access token: {}", e)))
}

/// Build a session from a stored access token.
///
/// Returns `Ok(None)` when the token is expired (treated as an absent
/// session, never an error) and `Err` when it is malformed or missing the
/// role claim.
pub fn session_from_token(token: &str) -> Result<Option<Session>, MarketError> {
    let claims = decode_claims(token)?;

    if claims.is_expired() {
        tracing::debug!(user_id = %claims.sub, "Stored access token expired");
        return Ok(None);
    }

    let role = claims
        .role
        .ok_or_else(|| MarketError::Auth("Access token missing role claim".to_string()))?;

    let user = AuthUser {
        id: claims.sub,
        email: claims.email.unwrap_or_default(),
        first_name: None,
        last_name: None,
        role,
    };

    Ok(Some(Session::new(user, token)))
}
