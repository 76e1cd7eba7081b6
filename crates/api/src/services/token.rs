//! Stateless session tokens.
//!
//! Sessions are HS256-signed JWTs carrying the user id and an embedded
//! expiry; nothing is persisted server-side. The tradeoff is that revocation
//! before natural expiry is impossible - logout only clears the client
//! cookie.

use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use bazaar_core::UserId;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "token";

/// Errors from token verification or issuance.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// Signature or payload is invalid.
    #[error("session token is invalid")]
    Invalid,

    /// Embedded expiry has elapsed.
    #[error("session token has expired")]
    Expired,

    /// Token could not be signed.
    #[error("failed to sign session token")]
    Signing,
}

/// Claims embedded in every session token.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// User id.
    sub: String,
    /// Issued-at (Unix timestamp, seconds).
    iat: i64,
    /// Expiry (Unix timestamp, seconds).
    exp: i64,
}

/// A freshly issued session token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// The signed token string.
    pub token: String,
    /// When the token expires.
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies session tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime: Duration,
}

impl TokenIssuer {
    /// Create an issuer from the signing secret and token lifetime.
    #[must_use]
    pub fn new(secret: &SecretString, lifetime: Duration) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            lifetime,
        }
    }

    /// Lifetime applied to issued tokens.
    #[must_use]
    pub const fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Issue a signed token for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if encoding fails.
    pub fn issue(&self, user_id: UserId) -> Result<IssuedToken, TokenError> {
        let now = Utc::now();
        let expires_at = now + self.lifetime;
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding)
            .map_err(|_| TokenError::Signing)?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Verify a token and return the user id it was issued for.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Expired` when the embedded expiry has elapsed
    /// (zero leeway), `TokenError::Invalid` for any other failure.
    pub fn verify(&self, token: &str) -> Result<UserId, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            }
        })?;

        UserId::parse(&data.claims.sub).map_err(|_| TokenError::Invalid)
    }

    /// Build the HTTP-only session cookie for an issued token.
    ///
    /// Cookie Max-Age matches the token lifetime, so both expire together.
    #[must_use]
    pub fn session_cookie(&self, issued: &IssuedToken) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, issued.token.clone()))
            .http_only(true)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(time::Duration::seconds(self.lifetime.num_seconds()))
            .build()
    }

    /// Build an already-expired session cookie (logout).
    #[must_use]
    pub fn expired_cookie() -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, ""))
            .http_only(true)
            .same_site(SameSite::Lax)
            .path("/")
            .expires(time::OffsetDateTime::UNIX_EPOCH)
            .build()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn secret() -> SecretString {
        SecretString::from("kY8vN2pQ7wX4mJ9dT3hF6bL1cR5gZ0aE")
    }

    #[test]
    fn test_issue_verify_roundtrip() {
        let issuer = TokenIssuer::new(&secret(), Duration::days(7));
        let user_id = UserId::generate();

        let issued = issuer.issue(user_id).unwrap();
        assert_eq!(issuer.verify(&issued.token).unwrap(), user_id);
        assert!(issued.expires_at > Utc::now());
    }

    #[test]
    fn test_expired_token_fails_with_expired() {
        let issuer = TokenIssuer::new(&secret(), Duration::seconds(-60));
        let issued = issuer.issue(UserId::generate()).unwrap();

        assert_eq!(issuer.verify(&issued.token), Err(TokenError::Expired));
    }

    #[test]
    fn test_wrong_secret_fails_with_invalid() {
        let issuer = TokenIssuer::new(&secret(), Duration::days(1));
        let issued = issuer.issue(UserId::generate()).unwrap();

        let other = TokenIssuer::new(
            &SecretString::from("qW3eR5tY7uI9oP1aS2dF4gH6jK8lZ0xC"),
            Duration::days(1),
        );
        assert_eq!(other.verify(&issued.token), Err(TokenError::Invalid));
    }

    #[test]
    fn test_garbage_token_fails_with_invalid() {
        let issuer = TokenIssuer::new(&secret(), Duration::days(1));
        assert_eq!(issuer.verify("not-a-token"), Err(TokenError::Invalid));
        assert_eq!(issuer.verify(""), Err(TokenError::Invalid));
    }

    #[test]
    fn test_session_cookie_attributes() {
        let issuer = TokenIssuer::new(&secret(), Duration::days(7));
        let issued = issuer.issue(UserId::generate()).unwrap();
        let cookie = issuer.session_cookie(&issued);

        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(
            cookie.max_age(),
            Some(time::Duration::seconds(Duration::days(7).num_seconds()))
        );
    }

    #[test]
    fn test_expired_cookie_clears_value() {
        let cookie = TokenIssuer::expired_cookie();
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "");
        assert_eq!(
            cookie.expires(),
            Some(time::OffsetDateTime::UNIX_EPOCH.into())
        );
    }
}
