//! Bearer-token signing and verification.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use crate::{JwtClaims, Principal, TokenValidationError, validate_claims};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JwtError {
    #[error("malformed or badly signed token: {0}")]
    Invalid(String),

    #[error(transparent)]
    Claims(#[from] TokenValidationError),

    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Verifies bearer tokens and yields their claims.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, JwtError>;
}

/// HMAC-SHA256 validator (and issuer, for login flows and tests).
#[derive(Clone)]
pub struct Hs256JwtValidator {
    secret: Vec<u8>,
}

impl core::fmt::Debug for Hs256JwtValidator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256JwtValidator").finish_non_exhaustive()
    }
}

impl Hs256JwtValidator {
    pub fn new(secret: Vec<u8>) -> Self {
        Self { secret }
    }

    /// Sign claims for `principal`, valid from `now` for `ttl`.
    pub fn issue(&self, principal: &Principal, now: DateTime<Utc>, ttl: Duration) -> Result<String, JwtError> {
        let claims = JwtClaims::new(principal.id, principal.roles.clone(), now, now + ttl);
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.secret),
        )
        .map_err(|e| JwtError::Signing(e.to_string()))
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, JwtError> {
        // The time window is checked by `validate_claims` against the caller's clock.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = jsonwebtoken::decode::<JwtClaims>(
            token,
            &DecodingKey::from_secret(&self.secret),
            &validation,
        )
        .map_err(|e| JwtError::Invalid(e.to_string()))?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PrincipalId, Role};

    #[test]
    fn issue_then_validate() {
        let jwt = Hs256JwtValidator::new(b"test-secret".to_vec());
        let principal = Principal::new(PrincipalId::new(), vec![Role::admin()]);
        let now = Utc::now();

        let token = jwt.issue(&principal, now, Duration::minutes(10)).unwrap();
        let claims = jwt.validate(&token, now).unwrap();

        assert_eq!(claims.sub, principal.id);
        assert!(claims.principal().is_admin());
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let issuer = Hs256JwtValidator::new(b"one".to_vec());
        let verifier = Hs256JwtValidator::new(b"two".to_vec());
        let principal = Principal::new(PrincipalId::new(), vec![Role::user()]);
        let now = Utc::now();

        let token = issuer.issue(&principal, now, Duration::minutes(10)).unwrap();
        assert!(matches!(verifier.validate(&token, now), Err(JwtError::Invalid(_))));
    }

    #[test]
    fn expired_token_is_rejected() {
        let jwt = Hs256JwtValidator::new(b"test-secret".to_vec());
        let principal = Principal::new(PrincipalId::new(), vec![Role::user()]);
        let issued = Utc::now() - Duration::hours(2);

        let token = jwt.issue(&principal, issued, Duration::minutes(10)).unwrap();
        assert_eq!(
            jwt.validate(&token, Utc::now()),
            Err(JwtError::Claims(TokenValidationError::Expired))
        );
    }

    #[test]
    fn garbage_is_invalid() {
        let jwt = Hs256JwtValidator::new(b"test-secret".to_vec());
        assert!(matches!(jwt.validate("mock-token", Utc::now()), Err(JwtError::Invalid(_))));
    }
}
