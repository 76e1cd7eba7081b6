//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use bazaar_core::{Email, Role, UserId};

/// A user account (domain type).
///
/// The password is stored only as an argon2 hash and never leaves the
/// backend; responses use [`PublicUser`] instead.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Email address (unique across accounts).
    pub email: Email,
    /// Argon2 PHC-format password hash.
    pub password_hash: String,
    /// Permission level.
    pub role: Role,
    /// Hex sha256 of the outstanding password-reset token, if any.
    ///
    /// Present iff `reset_expires_at` is present; both are cleared when the
    /// token is consumed, rolled back, or replaced.
    pub reset_token_hash: Option<String>,
    /// Expiry of the outstanding password-reset token, if any.
    pub reset_expires_at: Option<DateTime<Utc>>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new customer account with a freshly generated ID.
    #[must_use]
    pub fn new(name: String, email: Email, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::generate(),
            name,
            email,
            password_hash,
            role: Role::Customer,
            reset_token_hash: None,
            reset_expires_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record an outstanding password-reset token.
    pub fn set_reset_token(&mut self, token_hash: String, expires_at: DateTime<Utc>) {
        self.reset_token_hash = Some(token_hash);
        self.reset_expires_at = Some(expires_at);
        self.touch();
    }

    /// Clear the outstanding password-reset token, if any.
    pub fn clear_reset_token(&mut self) {
        self.reset_token_hash = None;
        self.reset_expires_at = None;
        self.touch();
    }

    /// Returns true when the outstanding reset token is still usable at `now`.
    #[must_use]
    pub fn reset_token_usable(&self, now: DateTime<Utc>) -> bool {
        self.reset_expires_at.is_some_and(|expires| expires > now)
    }

    /// Bump the update timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// The response shape of a user.
///
/// Deliberately omits the password hash and reset-token fields.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: Email,
    /// Permission level.
    pub role: Role,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            created_at: user.created_at,
        }
    }
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self::from(&user)
    }
}
