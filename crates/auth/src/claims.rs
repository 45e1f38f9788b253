//! Token claims model (transport-agnostic).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use buildmart_core::ActorId;

use crate::role::ActorRole;

/// The minimal set of claims expected once a token has been decoded and
/// verified by whatever transport/security layer is in use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthClaims {
    /// Subject / actor identifier.
    pub sub: ActorId,

    /// Role granted to the actor.
    pub role: ActorRole,

    pub issued_at: DateTime<Utc>,

    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token expired")]
    Expired,

    #[error("token issued in the future")]
    NotYetValid,

    #[error("token window is inverted (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

/// Deterministically validate claims against a clock.
///
/// Note: this validates the *claims* only. Signature verification and
/// decoding are intentionally outside this crate.
pub fn validate_claims(claims: &AuthClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn claims(issued: DateTime<Utc>, expires: DateTime<Utc>) -> AuthClaims {
        AuthClaims {
            sub: ActorId::new(),
            role: ActorRole::Customer,
            issued_at: issued,
            expires_at: expires,
        }
    }

    #[test]
    fn valid_window_passes() {
        let now = Utc::now();
        let c = claims(now - Duration::minutes(1), now + Duration::minutes(10));
        assert!(validate_claims(&c, now).is_ok());
    }

    #[test]
    fn expired_token_fails() {
        let now = Utc::now();
        let c = claims(now - Duration::minutes(20), now - Duration::minutes(1));
        assert_eq!(validate_claims(&c, now), Err(TokenValidationError::Expired));
    }

    #[test]
    fn future_issued_at_fails() {
        let now = Utc::now();
        let c = claims(now + Duration::minutes(5), now + Duration::minutes(10));
        assert_eq!(validate_claims(&c, now), Err(TokenValidationError::NotYetValid));
    }

    #[test]
    fn inverted_window_fails() {
        let now = Utc::now();
        let c = claims(now, now - Duration::minutes(10));
        assert_eq!(
            validate_claims(&c, now),
            Err(TokenValidationError::InvalidTimeWindow)
        );
    }
}
