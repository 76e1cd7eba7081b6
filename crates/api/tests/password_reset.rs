//! End-to-end tests of the password-reset flow.

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::json;

use bazaar_core::Email;

use bazaar_api::db::Store;
use common::spawn_app;

#[tokio::test]
async fn forgot_password_for_unknown_email_is_404_and_sends_nothing() {
    let app = spawn_app();

    let (status, _, body) = app
        .request(
            "POST",
            "/api/v1/password/forgot",
            None,
            Some(json!({ "email": "ghost@example.com" })),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!("User not found"));
    assert_eq!(app.mailer.sent_count(), 0);
}

#[tokio::test]
async fn forgot_password_stores_hash_and_emails_raw_token() {
    let app = spawn_app();
    app.register("Ada", "ada@example.com", "old password1").await;

    let (status, _, body) = app
        .request(
            "POST",
            "/api/v1/password/forgot",
            None,
            Some(json!({ "email": "ada@example.com" })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["message"],
        json!("Email sent to ada@example.com successfully")
    );
    assert_eq!(app.mailer.sent_count(), 1);

    let raw = app.mailer.last_reset_token().expect("reset URL in email");
    let user = app
        .store
        .find_user_by_email(&Email::parse("ada@example.com").unwrap())
        .await
        .unwrap()
        .unwrap();

    // Only the hash is at rest, and the window is open.
    let stored = user.reset_token_hash.expect("hash stored");
    assert_ne!(stored, raw);
    assert!(user.reset_expires_at.expect("expiry stored") > Utc::now());
}

#[tokio::test]
async fn reset_password_roundtrip_and_single_use() {
    let app = spawn_app();
    app.register("Ada", "ada@example.com", "old password1").await;
    app.request(
        "POST",
        "/api/v1/password/forgot",
        None,
        Some(json!({ "email": "ada@example.com" })),
    )
    .await;

    let raw = app.mailer.last_reset_token().expect("reset URL in email");

    let (status, cookie, body) = app
        .request(
            "PUT",
            &format!("/api/v1/password/reset/{raw}"),
            None,
            Some(json!({
                "password": "new password1",
                "confirm_password": "new password1",
            })),
        )
        .await;

    // Success re-authenticates the caller.
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert!(cookie.is_some());

    app.login("ada@example.com", "new password1").await;
    let (status, _, _) = app
        .request(
            "POST",
            "/api/v1/login",
            None,
            Some(json!({ "email": "ada@example.com", "password": "old password1" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // The consumed token can never succeed twice.
    let (status, _, body) = app
        .request(
            "PUT",
            &format!("/api/v1/password/reset/{raw}"),
            None,
            Some(json!({
                "password": "another pass1",
                "confirm_password": "another pass1",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        json!("Reset password token is invalid or has expired")
    );
}

#[tokio::test]
async fn reset_password_with_unknown_token_is_400() {
    let app = spawn_app();

    let (status, _, _) = app
        .request(
            "PUT",
            "/api/v1/password/reset/deadbeef",
            None,
            Some(json!({
                "password": "new password1",
                "confirm_password": "new password1",
            })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reset_password_mismatched_confirmation_is_400() {
    let app = spawn_app();
    app.register("Ada", "ada@example.com", "old password1").await;
    app.request(
        "POST",
        "/api/v1/password/forgot",
        None,
        Some(json!({ "email": "ada@example.com" })),
    )
    .await;
    let raw = app.mailer.last_reset_token().unwrap();

    let (status, _, body) = app
        .request(
            "PUT",
            &format!("/api/v1/password/reset/{raw}"),
            None,
            Some(json!({
                "password": "new password1",
                "confirm_password": "different1",
            })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Password does not match confirmation"));
}

#[tokio::test]
async fn reset_password_with_expired_token_is_400() {
    let app = spawn_app();
    app.register("Ada", "ada@example.com", "old password1").await;
    app.request(
        "POST",
        "/api/v1/password/forgot",
        None,
        Some(json!({ "email": "ada@example.com" })),
    )
    .await;
    let raw = app.mailer.last_reset_token().unwrap();

    // Age the stored expiry past the window.
    let mut user = app
        .store
        .find_user_by_email(&Email::parse("ada@example.com").unwrap())
        .await
        .unwrap()
        .unwrap();
    user.reset_expires_at = Some(Utc::now() - Duration::minutes(1));
    app.store.update_user(&user).await.unwrap();

    let (status, _, _) = app
        .request(
            "PUT",
            &format!("/api/v1/password/reset/{raw}"),
            None,
            Some(json!({
                "password": "new password1",
                "confirm_password": "new password1",
            })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn email_delivery_failure_rolls_back_and_is_500() {
    let app = spawn_app();
    app.register("Ada", "ada@example.com", "old password1").await;
    app.mailer
        .fail
        .store(true, std::sync::atomic::Ordering::SeqCst);

    let (status, _, body) = app
        .request(
            "POST",
            "/api/v1/password/forgot",
            None,
            Some(json!({ "email": "ada@example.com" })),
        )
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], json!(false));

    let user = app
        .store
        .find_user_by_email(&Email::parse("ada@example.com").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert!(user.reset_token_hash.is_none());
    assert!(user.reset_expires_at.is_none());
}
