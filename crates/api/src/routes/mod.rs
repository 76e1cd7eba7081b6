//! HTTP route handlers.
//!
//! # Route Structure (under `/api/v1`)
//!
//! ```text
//! # Auth & profile
//! POST /register                - Register and log in
//! POST /login                   - Login
//! GET  /logout                  - Clear the session cookie
//! POST /password/forgot         - Request a password reset email
//! PUT  /password/reset/{token}  - Reset password with an emailed token
//! GET  /me                      - Current user (requires auth)
//! PUT  /password/update         - Change password (requires auth)
//! PUT  /me/update               - Update name/email (requires auth)
//!
//! # Admin user management (requires admin)
//! GET    /admin/users           - List users
//! GET    /admin/users/{id}      - Get one user
//! PUT    /admin/users/{id}      - Update name/email/role
//! DELETE /admin/users/{id}      - Delete a user
//!
//! # Products
//! GET    /products              - List products (keyword + page)
//! GET    /products/{id}         - Product detail
//! POST   /admin/products        - Create product (requires admin)
//! PUT    /admin/products/{id}   - Update product (requires admin)
//! DELETE /admin/products/{id}   - Delete product (requires admin)
//!
//! # Reviews
//! PUT    /reviews               - Create/update own review (requires auth)
//! GET    /reviews?id=           - List a product's reviews
//! DELETE /reviews?product_id=&id= - Delete a review (requires auth)
//! ```
//!
//! Top-level (outside `/api/v1`): `GET /health` liveness, `GET /health/ready`
//! readiness.

pub mod auth;
pub mod products;
pub mod users;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
};
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::state::AppState;

/// Create the `/api/v1` router.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Auth & profile
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/password/forgot", post(auth::forgot_password))
        .route("/password/reset/{token}", put(auth::reset_password))
        .route("/me", get(auth::me))
        .route("/password/update", put(auth::update_password))
        .route("/me/update", put(auth::update_profile))
        // Admin user management
        .route("/admin/users", get(users::list))
        .route(
            "/admin/users/{id}",
            get(users::get_one).put(users::update).delete(users::remove),
        )
        // Products
        .route("/products", get(products::list))
        .route("/products/{id}", get(products::get_one))
        .route("/admin/products", post(products::create))
        .route(
            "/admin/products/{id}",
            put(products::update).delete(products::remove),
        )
        // Reviews
        .route(
            "/reviews",
            put(products::upsert_review)
                .get(products::list_reviews)
                .delete(products::delete_review),
        )
}

/// Build the full application router.
#[must_use]
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api/v1", routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies store connectivity before returning OK.
/// Returns 503 Service Unavailable if the store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().ping().await {
        Ok(()) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Unwrap a required request-body field or fail with a 400.
pub(crate) fn require_field<T>(value: Option<T>, message: &str) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::Validation(message.to_owned()))
}
