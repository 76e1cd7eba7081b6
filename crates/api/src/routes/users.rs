//! Admin user-management route handlers.
//!
//! All handlers are gated on the admin role; the guard resolves identity
//! before the role check.

use axum::{
    Json,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;

use bazaar_core::{Role, UserId};

use crate::db::StoreError;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::PublicUser;
use crate::state::AppState;

/// Admin update body: any subset of name/email/role.
#[derive(Debug, Deserialize)]
pub struct UpdateUserBody {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

/// List all users.
pub async fn list(State(state): State<AppState>, RequireAdmin(_admin): RequireAdmin) -> Result<Response> {
    let users = state.store().list_users().await?;
    let users: Vec<PublicUser> = users.iter().map(PublicUser::from).collect();

    Ok(Json(json!({
        "success": true,
        "users": users,
    }))
    .into_response())
}

/// Get a single user.
pub async fn get_one(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Response> {
    let user_id = UserId::parse(&id)?;
    let user = state
        .store()
        .find_user_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User does not exist with Id: {id}")))?;

    Ok(Json(json!({
        "success": true,
        "user": PublicUser::from(&user),
    }))
    .into_response())
}

/// Update a user's name, email, or role.
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<String>,
    Json(body): Json<UpdateUserBody>,
) -> Result<Response> {
    let user_id = UserId::parse(&id)?;
    let mut user = state
        .store()
        .find_user_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User does not exist with Id: {id}")))?;

    if let Some(name) = body.name {
        user.name = name;
    }
    if let Some(email) = body.email {
        user.email = bazaar_core::Email::parse(&email)
            .map_err(|e| AppError::Validation(format!("Invalid email address: {e}")))?;
    }
    if let Some(role) = body.role {
        user.role = role
            .parse::<Role>()
            .map_err(|e| AppError::Validation(e.to_string()))?;
    }
    user.touch();

    state.store().update_user(&user).await?;

    Ok(Json(json!({ "success": true })).into_response())
}

/// Delete a user.
pub async fn remove(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Response> {
    let user_id = UserId::parse(&id)?;

    state.store().delete_user(user_id).await.map_err(|e| match e {
        StoreError::NotFound => AppError::NotFound(format!("User does not exist with Id: {id}")),
        other => AppError::Store(other),
    })?;

    Ok(Json(json!({
        "success": true,
        "message": "User deleted successfully",
    }))
    .into_response())
}
