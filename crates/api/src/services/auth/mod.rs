//! Authentication service.
//!
//! Credential handling: registration, login, password changes, and the
//! password-reset flow. Passwords are stored as argon2 hashes; reset tokens
//! are stored as sha256 hashes with a fixed expiry window and the raw token
//! is delivered by email exactly once.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};

use bazaar_core::{Email, UserId};

use crate::db::{Store, StoreError};
use crate::models::User;
use crate::services::email::Mailer;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Authentication service.
///
/// Borrows the injected store and mailer from application state for the
/// duration of one request.
pub struct AuthService<'a> {
    store: &'a dyn Store,
    mailer: &'a dyn Mailer,
    base_url: &'a str,
    reset_ttl: Duration,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub fn new(
        store: &'a dyn Store,
        mailer: &'a dyn Mailer,
        base_url: &'a str,
        reset_ttl: Duration,
    ) -> Self {
        Self {
            store,
            mailer,
            base_url,
            reset_ttl,
        }
    }

    // =========================================================================
    // Registration and login
    // =========================================================================

    /// Register a new customer account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;

        let password_hash = hash_password(password)?;
        let user = User::new(name.to_owned(), email, password_hash);

        self.store.create_user(&user).await.map_err(|e| match e {
            StoreError::Conflict(_) => AuthError::UserAlreadyExists,
            other => AuthError::Store(other),
        })?;

        Ok(user)
    }

    /// Login with email and password.
    ///
    /// Unknown accounts and wrong passwords are indistinguishable to the
    /// caller.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let user = self
            .store
            .find_user_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.store
            .find_user_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    // =========================================================================
    // Password and profile updates
    // =========================================================================

    /// Change the password of an authenticated user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::IncorrectPassword` if `old_password` doesn't verify.
    /// Returns `AuthError::PasswordMismatch` if the confirmation differs.
    /// Returns `AuthError::WeakPassword` if the new password is too short.
    pub async fn update_password(
        &self,
        mut user: User,
        old_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<User, AuthError> {
        if !verify_password(old_password, &user.password_hash) {
            return Err(AuthError::IncorrectPassword);
        }
        if new_password != confirm_password {
            return Err(AuthError::PasswordMismatch);
        }
        validate_password(new_password)?;

        user.password_hash = hash_password(new_password)?;
        user.touch();
        self.store.update_user(&user).await?;

        Ok(user)
    }

    /// Update name and email of an authenticated user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::UserAlreadyExists` if the email belongs to another
    /// account.
    pub async fn update_profile(
        &self,
        mut user: User,
        name: &str,
        email: &str,
    ) -> Result<User, AuthError> {
        user.name = name.to_owned();
        user.email = Email::parse(email)?;
        user.touch();

        self.store.update_user(&user).await.map_err(|e| match e {
            StoreError::Conflict(_) => AuthError::UserAlreadyExists,
            other => AuthError::Store(other),
        })?;

        Ok(user)
    }

    // =========================================================================
    // Password reset
    // =========================================================================

    /// Start a password reset for the account registered under `email`.
    ///
    /// Generates a random token, stores only its sha256 hash plus an expiry
    /// on the user, and emails the raw token inside a reset URL. If delivery
    /// fails the stored hash and expiry are cleared before the error
    /// surfaces.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` for an unknown email (no state is
    /// mutated). Returns `AuthError::EmailDelivery` when dispatch fails.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let email = Email::parse(email)?;
        let mut user = self
            .store
            .find_user_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let raw_token = generate_reset_token();
        let expires_at = Utc::now() + self.reset_ttl;
        user.set_reset_token(hash_reset_token(&raw_token), expires_at);
        self.store.update_user(&user).await?;

        let reset_url = format!(
            "{}/api/v1/password/reset/{raw_token}",
            self.base_url.trim_end_matches('/')
        );
        let body = format!(
            "Your password reset link:\n\n{reset_url}\n\nIf you did not request this email, please ignore it."
        );

        if let Err(e) = self
            .mailer
            .send(user.email.as_str(), "Bazaar Password Recovery", &body)
            .await
        {
            // Roll back so the dangling hash can't be presented later.
            user.clear_reset_token();
            self.store.update_user(&user).await?;
            tracing::warn!(email = %user.email, error = %e, "Reset email delivery failed");
            return Err(AuthError::EmailDelivery(e));
        }

        tracing::info!(email = %user.email, "Password reset email sent");
        Ok(())
    }

    /// Complete a password reset with the raw token from the emailed URL.
    ///
    /// A consumed or expired token can never succeed twice: the stored hash
    /// is cleared on success and the expiry is checked on every attempt.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidResetToken` when the token is unknown,
    /// consumed, or expired. Returns `AuthError::PasswordMismatch` when the
    /// confirmation differs.
    pub async fn reset_password(
        &self,
        raw_token: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<User, AuthError> {
        let token_hash = hash_reset_token(raw_token);
        let mut user = self
            .store
            .find_user_by_reset_hash(&token_hash)
            .await?
            .ok_or(AuthError::InvalidResetToken)?;

        if !user.reset_token_usable(Utc::now()) {
            return Err(AuthError::InvalidResetToken);
        }
        if new_password != confirm_password {
            return Err(AuthError::PasswordMismatch);
        }
        validate_password(new_password)?;

        user.password_hash = hash_password(new_password)?;
        user.clear_reset_token();
        self.store.update_user(&user).await?;

        Ok(user)
    }
}

// =============================================================================
// Password hashing
// =============================================================================

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id with a per-call random salt.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a stored hash.
///
/// Fails closed: a malformed stored hash verifies as false rather than
/// erroring.
fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

// =============================================================================
// Reset tokens
// =============================================================================

/// Generate a cryptographically random reset token (hex, 64 chars).
fn generate_reset_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    hex::encode(bytes)
}

/// Hash a raw reset token for at-rest storage and lookup.
fn hash_reset_token(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}
