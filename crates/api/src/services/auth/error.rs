//! Authentication error types.

use thiserror::Error;

use crate::db::StoreError;
use crate::services::email::EmailError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] bazaar_core::EmailError),

    /// Invalid credentials (wrong password or unknown account).
    #[error("invalid email or password")]
    InvalidCredentials,

    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// An account with this email already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// New password and confirmation differ.
    #[error("password does not match confirmation")]
    PasswordMismatch,

    /// Current password check failed on a password change.
    #[error("old password is incorrect")]
    IncorrectPassword,

    /// Reset token unknown, already consumed, or past its expiry.
    #[error("reset password token is invalid or has expired")]
    InvalidResetToken,

    /// Reset email could not be delivered (state rolled back).
    #[error("failed to send reset email: {0}")]
    EmailDelivery(#[from] EmailError),

    /// Store error.
    #[error("database error: {0}")]
    Store(#[from] StoreError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
