//! Token validator seam.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::claims::{AuthClaims, TokenValidationError, validate_claims};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("unknown or malformed token")]
    Invalid,

    #[error(transparent)]
    Claims(#[from] TokenValidationError),
}

/// Validates a bearer token and yields its claims.
///
/// Production deployments plug in a real verifier behind this trait; the
/// in-memory implementation below backs dev and black-box tests.
pub trait TokenValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<AuthClaims, TokenError>;
}

/// Static token table for dev/test: opaque token string -> claims.
#[derive(Debug, Default)]
pub struct StaticTokenValidator {
    tokens: RwLock<HashMap<String, AuthClaims>>,
}

impl StaticTokenValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, token: impl Into<String>, claims: AuthClaims) {
        self.tokens
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token.into(), claims);
    }
}

impl TokenValidator for StaticTokenValidator {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<AuthClaims, TokenError> {
        let claims = self
            .tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(token)
            .cloned()
            .ok_or(TokenError::Invalid)?;
        validate_claims(&claims, now)?;
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::ActorRole;
    use buildmart_core::ActorId;
    use chrono::Duration;

    fn fresh_claims() -> AuthClaims {
        let now = Utc::now();
        AuthClaims {
            sub: ActorId::new(),
            role: ActorRole::Vendor,
            issued_at: now - Duration::minutes(1),
            expires_at: now + Duration::minutes(10),
        }
    }

    #[test]
    fn registered_token_validates() {
        let v = StaticTokenValidator::new();
        let claims = fresh_claims();
        v.register("tok-1", claims.clone());
        assert_eq!(v.validate("tok-1", Utc::now()).unwrap(), claims);
    }

    #[test]
    fn unknown_token_is_invalid() {
        let v = StaticTokenValidator::new();
        assert_eq!(v.validate("nope", Utc::now()), Err(TokenError::Invalid));
    }

    #[test]
    fn expired_claims_are_rejected() {
        let v = StaticTokenValidator::new();
        let mut claims = fresh_claims();
        claims.expires_at = Utc::now() - Duration::minutes(1);
        v.register("stale", claims);
        assert!(matches!(
            v.validate("stale", Utc::now()),
            Err(TokenError::Claims(TokenValidationError::Expired))
        ));
    }
}
