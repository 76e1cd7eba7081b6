//! Unified error handling.
//!
//! Every route handler returns `Result<T, AppError>`; this module is the only
//! place that maps typed errors onto HTTP statuses and the response envelope
//! `{ "success": false, "error": message }`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::StoreError;
use crate::services::auth::AuthError;
use crate::services::reviews::ReviewError;
use crate::services::token::TokenError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed request fields.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Caller is not authenticated.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Caller's role is not permitted.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Duplicate unique field.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Authentication operation failed.
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    /// Review operation failed.
    #[error("review error: {0}")]
    Review(#[from] ReviewError),

    /// Store operation failed.
    #[error("database error: {0}")]
    Store(#[from] StoreError),

    /// Token issuance failed.
    #[error("token error: {0}")]
    Token(#[from] TokenError),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<bazaar_core::IdError> for AppError {
    fn from(err: bazaar_core::IdError) -> Self {
        // The original backend maps malformed identifiers (CastError) to 400.
        Self::Validation(format!("Resource not found. Invalid: {err}"))
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Conflict(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::UserNotFound => StatusCode::NOT_FOUND,
                AuthError::UserAlreadyExists
                | AuthError::InvalidEmail(_)
                | AuthError::WeakPassword(_)
                | AuthError::PasswordMismatch
                | AuthError::IncorrectPassword
                | AuthError::InvalidResetToken => StatusCode::BAD_REQUEST,
                AuthError::EmailDelivery(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                AuthError::Store(e) => store_status(e),
            },
            Self::Review(err) => match err {
                ReviewError::InvalidRating => StatusCode::BAD_REQUEST,
                ReviewError::ProductNotFound => StatusCode::NOT_FOUND,
                ReviewError::Store(e) => store_status(e),
            },
            Self::Store(err) => store_status(err),
            Self::Token(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "Invalid email or password".to_owned(),
                AuthError::UserNotFound => "User not found".to_owned(),
                AuthError::UserAlreadyExists => {
                    "An account with this email already exists".to_owned()
                }
                AuthError::InvalidEmail(e) => format!("Invalid email address: {e}"),
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::PasswordMismatch => "Password does not match confirmation".to_owned(),
                AuthError::IncorrectPassword => "Old password is incorrect".to_owned(),
                AuthError::InvalidResetToken => {
                    "Reset password token is invalid or has expired".to_owned()
                }
                AuthError::EmailDelivery(_) => "Failed to send reset email".to_owned(),
                AuthError::Store(e) => store_message(e),
                AuthError::PasswordHash => "Internal server error".to_owned(),
            },
            Self::Review(err) => match err {
                ReviewError::InvalidRating => "Rating must be between 1 and 5".to_owned(),
                ReviewError::ProductNotFound => "Product not found".to_owned(),
                ReviewError::Store(e) => store_message(e),
            },
            Self::Store(err) => store_message(err),
            Self::Token(_) | Self::Internal(_) => "Internal server error".to_owned(),
            _ => self.message_text(),
        }
    }

    /// The bare message without the variant prefix.
    fn message_text(&self) -> String {
        match self {
            Self::Validation(msg)
            | Self::NotFound(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::Conflict(msg)
            | Self::Internal(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

fn store_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::NotFound => StatusCode::NOT_FOUND,
        // Duplicate unique field, like the original's duplicate-key handler.
        StoreError::Conflict(_) => StatusCode::BAD_REQUEST,
        StoreError::Database(_) | StoreError::DataCorruption(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn store_message(err: &StoreError) -> String {
    match err {
        StoreError::NotFound => "Resource not found".to_owned(),
        StoreError::Conflict(msg) => format!("Duplicate field: {msg}"),
        // Don't expose driver details to clients
        StoreError::Database(_) | StoreError::DataCorruption(_) => {
            "Internal server error".to_owned()
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request error");
        }

        let body = Json(json!({
            "success": false,
            "error": self.client_message(),
        }));

        (status, body).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_owned());
        assert_eq!(err.to_string(), "not found: product-123");

        let err = AppError::Validation("invalid input".to_owned());
        assert_eq!(err.to_string(), "validation error: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::Validation("test".to_owned())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::NotFound("test".to_owned())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_owned())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_owned())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::Conflict("test".to_owned())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_owned())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_auth_error_statuses() {
        assert_eq!(
            get_status(AuthError::InvalidCredentials.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AuthError::UserNotFound.into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AuthError::UserAlreadyExists.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AuthError::InvalidResetToken.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AuthError::PasswordHash.into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_review_error_statuses() {
        assert_eq!(
            get_status(ReviewError::InvalidRating.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(ReviewError::ProductNotFound.into()),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_store_conflict_maps_to_400() {
        assert_eq!(
            get_status(StoreError::Conflict("email".to_owned()).into()),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_malformed_id_maps_to_400() {
        let err: AppError = bazaar_core::IdError("bogus".to_owned()).into();
        assert_eq!(get_status(err), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_internal_message_is_not_leaked() {
        let err = AppError::Store(StoreError::Database("connection string leak".to_owned()));
        assert_eq!(err.client_message(), "Internal server error");
    }
}
