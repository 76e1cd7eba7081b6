//! Authentication extractors.
//!
//! The session guard runs as axum extractors: [`CurrentUser`] resolves the
//! caller's identity from the session cookie, [`RequireAdmin`] additionally
//! gates on the admin role. Identity resolution always runs before the role
//! check.

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;

use crate::error::AppError;
use crate::models::User;
use crate::services::token::{SESSION_COOKIE, TokenError};
use crate::state::AppState;

/// Extractor that requires an authenticated user.
///
/// Reads the session token from the `token` cookie, verifies it, and loads
/// the user from the store. Rejects with 401 when the cookie is missing, the
/// token is invalid or expired, or the user no longer exists.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(CurrentUser(user): CurrentUser) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(SESSION_COOKIE)
            .map(|c| c.value())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                AppError::Unauthorized("Please login to access this resource".to_owned())
            })?;

        let user_id = state.tokens().verify(token).map_err(|e| {
            AppError::Unauthorized(match e {
                TokenError::Expired => "Your session has expired, please login again".to_owned(),
                _ => "Invalid session token, please login again".to_owned(),
            })
        })?;

        // The token may outlive the account.
        let user = state
            .store()
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| {
                AppError::Unauthorized("Please login to access this resource".to_owned())
            })?;

        Ok(Self(user))
    }
}

/// Extractor that requires an authenticated admin.
///
/// Runs the [`CurrentUser`] guard first, then rejects with 403 when the
/// resolved role is not admin.
pub struct RequireAdmin(pub User);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        if !user.role.is_admin() {
            return Err(AppError::Forbidden(format!(
                "Role: {} is not allowed to access this resource",
                user.role
            )));
        }

        Ok(Self(user))
    }
}
