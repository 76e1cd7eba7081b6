//! Bazaar API - e-commerce REST backend.
//!
//! Serves the `/api/v1` surface: product CRUD, user authentication
//! (registration, login, password reset), product reviews, and admin user
//! management.
//!
//! # Architecture
//!
//! - Axum web framework, JSON request/response envelopes
//! - MongoDB for users and products (injected behind the `Store` trait)
//! - Stateless HS256 session tokens delivered as an HTTP-only cookie
//! - SMTP (lettre) for password-reset email

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use secrecy::ExposeSecret;

use bazaar_api::config::Config;
use bazaar_api::db::MongoStore;
use bazaar_api::routes;
use bazaar_api::services::email::SmtpMailer;
use bazaar_api::state::AppState;

#[tokio::main]
async fn main() {
    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");

    // Initialize tracing with EnvFilter
    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "bazaar_api=info,tower_http=debug".into());

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    // Connect the document store
    let store = MongoStore::connect(
        config.mongodb_uri.expose_secret(),
        &config.mongodb_database,
    )
    .await
    .expect("Failed to connect to MongoDB");
    tracing::info!(database = %config.mongodb_database, "MongoDB connected");

    // SMTP mailer for the reset flow
    let mailer = SmtpMailer::new(&config.email).expect("Failed to configure SMTP mailer");

    // Build application state and router
    let state = AppState::new(config.clone(), Arc::new(store), Arc::new(mailer));
    let app = routes::app(state);

    // Start server
    let addr = config.socket_addr();
    tracing::info!("bazaar-api listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
