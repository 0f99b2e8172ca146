//! Signed session tokens (HS256 JWT).
//!
//! A session is the only thing the dashboard authorizes on: if a request
//! carries a token that verifies and is inside its time window, it is let in.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use invoicedesk_core::UserId;

use crate::credentials::SignedInUser;

/// Session token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject: the signed-in user.
    pub sub: UserId,
    pub email: String,
    /// Issued-at (unix seconds).
    pub iat: i64,
    /// Expiration (unix seconds).
    pub exp: i64,
}

impl SessionClaims {
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.iat, 0).single()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("session has expired")]
    Expired,

    #[error("session not yet valid (issued in the future)")]
    NotYetValid,

    #[error("invalid session time window (exp <= iat)")]
    InvalidTimeWindow,

    #[error("malformed session token: {0}")]
    Malformed(String),

    #[error("failed to sign session token: {0}")]
    Signing(String),
}

/// Deterministically validate session claims against `now`.
pub fn validate_claims(claims: &SessionClaims, now: DateTime<Utc>) -> Result<(), SessionError> {
    if claims.exp <= claims.iat {
        return Err(SessionError::InvalidTimeWindow);
    }
    let now = now.timestamp();
    if now < claims.iat {
        return Err(SessionError::NotYetValid);
    }
    if now >= claims.exp {
        return Err(SessionError::Expired);
    }
    Ok(())
}

/// Anything that can turn a bearer token into verified claims.
pub trait SessionValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, SessionError>;
}

/// HS256 signing/verification keys plus the session lifetime.
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SessionKeys {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a signed token for a freshly signed-in user.
    pub fn issue(&self, user: &SignedInUser, now: DateTime<Utc>) -> Result<String, SessionError> {
        let expires = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| SessionError::Signing("session expiry out of range".to_string()))?;
        let claims = SessionClaims {
            sub: user.id,
            email: user.email.clone(),
            iat: now.timestamp(),
            exp: expires.timestamp(),
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| SessionError::Signing(e.to_string()))
    }
}

impl SessionValidator for SessionKeys {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, SessionError> {
        // Time checks run against the caller's clock in `validate_claims`.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        let data = jsonwebtoken::decode::<SessionClaims>(token, &self.decoding, &validation)
            .map_err(|e| SessionError::Malformed(e.to_string()))?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

impl core::fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionKeys").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> SignedInUser {
        SignedInUser {
            id: UserId::new(),
            name: "User".to_string(),
            email: "user@nextmail.com".to_string(),
        }
    }

    #[test]
    fn issued_token_validates_within_its_window() {
        let keys = SessionKeys::new(b"test-secret", Duration::minutes(10));
        let now = Utc::now();
        let user = user();

        let token = keys.issue(&user, now).unwrap();
        let claims = keys.validate(&token, now + Duration::minutes(5)).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, user.email);
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = SessionKeys::new(b"test-secret", Duration::minutes(10));
        let now = Utc::now();
        let token = keys.issue(&user(), now).unwrap();

        assert_eq!(keys.validate(&token, now + Duration::minutes(11)), Err(SessionError::Expired));
    }

    #[test]
    fn ttl_past_the_calendar_range_fails_to_issue() {
        let keys = SessionKeys::new(b"test-secret", Duration::MAX);
        let result = keys.issue(&user(), Utc::now());
        assert!(matches!(result, Err(SessionError::Signing(_))));
    }

    #[test]
    fn token_signed_with_another_secret_is_malformed() {
        let now = Utc::now();
        let token = SessionKeys::new(b"one", Duration::minutes(10)).issue(&user(), now).unwrap();
        let result = SessionKeys::new(b"two", Duration::minutes(10)).validate(&token, now);
        assert!(matches!(result, Err(SessionError::Malformed(_))));
    }

    #[test]
    fn claims_time_window_is_checked() {
        let now = Utc::now();
        let mut claims = SessionClaims {
            sub: UserId::new(),
            email: "a@b.co".to_string(),
            iat: now.timestamp(),
            exp: now.timestamp(),
        };
        assert_eq!(validate_claims(&claims, now), Err(SessionError::InvalidTimeWindow));

        claims.iat = now.timestamp() + 60;
        claims.exp = now.timestamp() + 120;
        assert_eq!(validate_claims(&claims, now), Err(SessionError::NotYetValid));
    }
}
