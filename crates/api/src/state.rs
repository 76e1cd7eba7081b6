//! Application state shared across handlers.

use std::sync::Arc;

use chrono::Duration;

use crate::config::Config;
use crate::db::Store;
use crate::services::auth::AuthService;
use crate::services::email::Mailer;
use crate::services::reviews::ReviewService;
use crate::services::token::TokenIssuer;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; carries the injected store and mailer
/// collaborators plus the token issuer and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    store: Arc<dyn Store>,
    mailer: Arc<dyn Mailer>,
    tokens: TokenIssuer,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: Config, store: Arc<dyn Store>, mailer: Arc<dyn Mailer>) -> Self {
        let tokens = TokenIssuer::new(&config.jwt_secret, Duration::days(config.jwt_ttl_days));

        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                mailer,
                tokens,
            }),
        }
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get a reference to the injected store.
    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.inner.store.as_ref()
    }

    /// Get a reference to the injected mailer.
    #[must_use]
    pub fn mailer(&self) -> &dyn Mailer {
        self.inner.mailer.as_ref()
    }

    /// Get a reference to the token issuer.
    #[must_use]
    pub fn tokens(&self) -> &TokenIssuer {
        &self.inner.tokens
    }

    /// Build an [`AuthService`] over the injected collaborators.
    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(
            self.store(),
            self.mailer(),
            &self.inner.config.base_url,
            Duration::minutes(self.inner.config.reset_ttl_minutes),
        )
    }

    /// Build a [`ReviewService`] over the injected store.
    #[must_use]
    pub fn reviews(&self) -> ReviewService<'_> {
        ReviewService::new(self.store())
    }
}
