//! Configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BAZAAR_MONGODB_URI` (or `MONGODB_URI`) - MongoDB connection string
//! - `BAZAAR_BASE_URL` - Public URL of the API (reset links are built on it)
//! - `BAZAAR_JWT_SECRET` - Session token signing secret (min 32 chars, high entropy)
//! - `SMTP_HOST` - SMTP relay host
//! - `SMTP_USERNAME` - SMTP username
//! - `SMTP_PASSWORD` - SMTP password
//! - `EMAIL_FROM` - Sender address for transactional email
//!
//! ## Optional
//! - `BAZAAR_HOST` - Bind address (default: 127.0.0.1)
//! - `BAZAAR_PORT` - Listen port (default: 3000)
//! - `BAZAAR_MONGODB_DATABASE` - Database name (default: bazaar)
//! - `BAZAAR_JWT_TTL_DAYS` - Session token lifetime in days (default: 7)
//! - `BAZAAR_RESET_TTL_MINUTES` - Reset token window in minutes (default: 30)
//! - `SMTP_PORT` - SMTP relay port (default: 587)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_JWT_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// MongoDB connection URI (contains credentials)
    pub mongodb_uri: SecretString,
    /// MongoDB database name
    pub mongodb_database: String,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the API
    pub base_url: String,
    /// Session token signing secret
    pub jwt_secret: SecretString,
    /// Session token lifetime in days
    pub jwt_ttl_days: i64,
    /// Reset token window in minutes
    pub reset_ttl_minutes: i64,
    /// SMTP configuration for transactional email
    pub email: EmailConfig,
}

/// SMTP configuration.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct EmailConfig {
    /// SMTP relay host
    pub smtp_host: String,
    /// SMTP relay port
    pub smtp_port: u16,
    /// SMTP username
    pub smtp_username: String,
    /// SMTP password
    pub smtp_password: SecretString,
    /// Sender address for outgoing email
    pub from_address: String,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the JWT secret fails validation (placeholder detection, entropy
    /// check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let mongodb_uri = get_mongodb_uri("BAZAAR_MONGODB_URI")?;
        let mongodb_database = get_env_or_default("BAZAAR_MONGODB_DATABASE", "bazaar");
        let host = get_env_or_default("BAZAAR_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("BAZAAR_HOST".to_owned(), e.to_string()))?;
        let port = get_env_or_default("BAZAAR_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("BAZAAR_PORT".to_owned(), e.to_string()))?;
        let base_url = get_required_env("BAZAAR_BASE_URL")?;
        url::Url::parse(&base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("BAZAAR_BASE_URL".to_owned(), e.to_string()))?;

        let jwt_secret = get_validated_secret("BAZAAR_JWT_SECRET")?;
        validate_jwt_secret(&jwt_secret, "BAZAAR_JWT_SECRET")?;
        let jwt_ttl_days = get_env_or_default("BAZAAR_JWT_TTL_DAYS", "7")
            .parse::<i64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("BAZAAR_JWT_TTL_DAYS".to_owned(), e.to_string())
            })?;
        let reset_ttl_minutes = get_env_or_default("BAZAAR_RESET_TTL_MINUTES", "30")
            .parse::<i64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("BAZAAR_RESET_TTL_MINUTES".to_owned(), e.to_string())
            })?;

        let email = EmailConfig::from_env()?;

        Ok(Self {
            mongodb_uri,
            mongodb_database,
            host,
            port,
            base_url,
            jwt_secret,
            jwt_ttl_days,
            reset_ttl_minutes,
            email,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl EmailConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            smtp_host: get_required_env("SMTP_HOST")?,
            smtp_port: get_env_or_default("SMTP_PORT", "587")
                .parse::<u16>()
                .map_err(|e| ConfigError::InvalidEnvVar("SMTP_PORT".to_owned(), e.to_string()))?,
            smtp_username: get_required_env("SMTP_USERNAME")?,
            smtp_password: get_required_secret("SMTP_PASSWORD")?,
            from_address: get_required_env("EMAIL_FROM")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_owned()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get MongoDB URI with fallback to generic `MONGODB_URI`.
fn get_mongodb_uri(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("MONGODB_URI") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_owned()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Validate that the JWT secret meets minimum length requirements.
fn validate_jwt_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_JWT_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_owned(),
            format!(
                "must be at least {} characters (got {})",
                MIN_JWT_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_owned(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real secrets like API keys have high entropy)
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_owned(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
