//! Authentication route handlers.
//!
//! Registration, login, logout, password reset, and profile management.
//! Successful credential operations re-issue the session token and set the
//! HTTP-only cookie alongside the JSON envelope.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::json;

use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::models::{PublicUser, User};
use crate::routes::require_field;
use crate::state::AppState;

// =============================================================================
// Body Types
// =============================================================================

/// Registration body.
#[derive(Debug, Deserialize)]
pub struct RegisterBody {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Login body.
#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Forgot-password body.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordBody {
    pub email: Option<String>,
}

/// Reset-password body.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordBody {
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

/// Password-change body.
#[derive(Debug, Deserialize)]
pub struct UpdatePasswordBody {
    pub old_password: Option<String>,
    pub new_password: Option<String>,
    pub confirm_password: Option<String>,
}

/// Profile-update body.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileBody {
    pub name: Option<String>,
    pub email: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Register a new account and log it in.
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<RegisterBody>,
) -> Result<Response> {
    let name = require_field(body.name, "Please enter name, email and password")?;
    let email = require_field(body.email, "Please enter name, email and password")?;
    let password = require_field(body.password, "Please enter name, email and password")?;

    let user = state.auth().register(&name, &email, &password).await?;

    tracing::info!(user_id = %user.id, "User registered");
    send_token(&state, jar, &user, StatusCode::CREATED)
}

/// Login with email and password.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<LoginBody>,
) -> Result<Response> {
    let email = require_field(body.email, "Please enter email and password")?;
    let password = require_field(body.password, "Please enter email and password")?;

    let user = state.auth().login(&email, &password).await?;

    send_token(&state, jar, &user, StatusCode::OK)
}

/// Logout by overwriting the session cookie with an already-expired value.
pub async fn logout(jar: CookieJar) -> Response {
    let jar = jar.add(crate::services::token::TokenIssuer::expired_cookie());

    (
        jar,
        Json(json!({
            "success": true,
            "message": "Logged Out",
        })),
    )
        .into_response()
}

/// Request a password reset email.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(body): Json<ForgotPasswordBody>,
) -> Result<Response> {
    let email = require_field(body.email, "Please enter an email address")?;

    state.auth().request_password_reset(&email).await?;

    Ok(Json(json!({
        "success": true,
        "message": format!("Email sent to {email} successfully"),
    }))
    .into_response())
}

/// Reset the password with the raw token from the emailed URL.
///
/// On success the caller is re-authenticated with a fresh session token.
pub async fn reset_password(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(token): Path<String>,
    Json(body): Json<ResetPasswordBody>,
) -> Result<Response> {
    let password = require_field(body.password, "Please enter password and confirmation")?;
    let confirm = require_field(
        body.confirm_password,
        "Please enter password and confirmation",
    )?;

    let user = state.auth().reset_password(&token, &password, &confirm).await?;

    tracing::info!(user_id = %user.id, "Password reset completed");
    send_token(&state, jar, &user, StatusCode::OK)
}

/// Current user details.
pub async fn me(CurrentUser(user): CurrentUser) -> Response {
    Json(json!({
        "success": true,
        "user": PublicUser::from(user),
    }))
    .into_response()
}

/// Change the current user's password.
pub async fn update_password(
    State(state): State<AppState>,
    jar: CookieJar,
    CurrentUser(user): CurrentUser,
    Json(body): Json<UpdatePasswordBody>,
) -> Result<Response> {
    let old = require_field(body.old_password, "Please enter old and new passwords")?;
    let new = require_field(body.new_password, "Please enter old and new passwords")?;
    let confirm = require_field(body.confirm_password, "Please enter old and new passwords")?;

    let user = state
        .auth()
        .update_password(user, &old, &new, &confirm)
        .await?;

    send_token(&state, jar, &user, StatusCode::OK)
}

/// Update the current user's name and email.
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<UpdateProfileBody>,
) -> Result<Response> {
    let name = body.name.unwrap_or_else(|| user.name.clone());
    let email = body
        .email
        .unwrap_or_else(|| user.email.as_str().to_owned());

    state.auth().update_profile(user, &name, &email).await?;

    Ok(Json(json!({ "success": true })).into_response())
}

// =============================================================================
// Helpers
// =============================================================================

/// Issue a session token for `user`, set the cookie, and reply with the
/// envelope used by every credential operation.
fn send_token(state: &AppState, jar: CookieJar, user: &User, status: StatusCode) -> Result<Response> {
    let issued = state.tokens().issue(user.id)?;
    let jar = jar.add(state.tokens().session_cookie(&issued));

    Ok((
        status,
        jar,
        Json(json!({
            "success": true,
            "token": issued.token,
            "user": PublicUser::from(user),
        })),
    )
        .into_response())
}
