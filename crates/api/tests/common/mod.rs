//! Shared helpers for integration tests.
//!
//! Builds the real router over the in-memory store and a recording mailer,
//! then drives it request-by-request through `tower::ServiceExt::oneshot`.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;

use bazaar_api::config::{Config, EmailConfig};
use bazaar_api::db::{MemoryStore, Store};
use bazaar_api::routes;
use bazaar_api::services::email::{EmailError, Mailer};
use bazaar_api::state::AppState;
use bazaar_core::{Email, Role};

/// A recorded outbound email.
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Recording mailer; can be flipped to fail delivery.
#[derive(Default)]
pub struct MockMailer {
    pub sent: Mutex<Vec<SentEmail>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), EmailError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(EmailError::Smtp("connection refused".to_owned()));
        }
        self.sent.lock().expect("mailer lock").push(SentEmail {
            to: to.to_owned(),
            subject: subject.to_owned(),
            body: body.to_owned(),
        });
        Ok(())
    }
}

impl MockMailer {
    /// Raw reset token from the URL in the most recent email.
    pub fn last_reset_token(&self) -> Option<String> {
        let sent = self.sent.lock().expect("mailer lock");
        let email = sent.last()?;
        email
            .body
            .lines()
            .find(|l| l.contains("/password/reset/"))
            .and_then(|l| l.rsplit('/').next())
            .map(ToOwned::to_owned)
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().expect("mailer lock").len()
    }
}

/// The application under test plus handles on its collaborators.
pub struct TestApp {
    pub app: Router,
    pub store: Arc<MemoryStore>,
    pub mailer: Arc<MockMailer>,
}

/// Configuration used by every integration test.
pub fn test_config() -> Config {
    Config {
        mongodb_uri: SecretString::from("mongodb://localhost:27017"),
        mongodb_database: "bazaar_test".to_owned(),
        host: "127.0.0.1".parse().expect("valid ip"),
        port: 0,
        base_url: "http://localhost:3000".to_owned(),
        jwt_secret: SecretString::from("kY8vN2pQ7wX4mJ9dT3hF6bL1cR5gZ0aE"),
        jwt_ttl_days: 7,
        reset_ttl_minutes: 30,
        email: EmailConfig {
            smtp_host: "smtp.test".to_owned(),
            smtp_port: 587,
            smtp_username: "mailer".to_owned(),
            smtp_password: SecretString::from("hunter2"),
            from_address: "noreply@bazaar.test".to_owned(),
        },
    }
}

/// Build the application over fresh collaborators.
pub fn spawn_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let mailer = Arc::new(MockMailer::default());
    let state = AppState::new(test_config(), store.clone(), mailer.clone());

    TestApp {
        app: routes::app(state),
        store,
        mailer,
    }
}

impl TestApp {
    /// Fire one request and return (status, session cookie pair if set, JSON body).
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Option<String>, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        };

        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("infallible app");

        let status = response.status();
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(ToOwned::to_owned);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        (status, set_cookie, json)
    }

    /// Register an account and return the session cookie pair.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> String {
        let (status, cookie, _) = self
            .request(
                "POST",
                "/api/v1/register",
                None,
                Some(serde_json::json!({
                    "name": name,
                    "email": email,
                    "password": password,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        cookie.expect("registration sets the session cookie")
    }

    /// Log in and return the session cookie pair.
    pub async fn login(&self, email: &str, password: &str) -> String {
        let (status, cookie, _) = self
            .request(
                "POST",
                "/api/v1/login",
                None,
                Some(serde_json::json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        cookie.expect("login sets the session cookie")
    }

    /// Flip an account to admin directly in the store.
    pub async fn promote_to_admin(&self, email: &str) {
        let email = Email::parse(email).expect("valid email");
        let mut user = self
            .store
            .find_user_by_email(&email)
            .await
            .expect("store")
            .expect("user exists");
        user.role = Role::Admin;
        self.store.update_user(&user).await.expect("store");
    }

    /// Register an admin account and return its session cookie pair.
    pub async fn register_admin(&self, email: &str, password: &str) -> String {
        let cookie = self.register("Admin", email, password).await;
        self.promote_to_admin(email).await;
        cookie
    }
}
