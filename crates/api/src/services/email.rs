//! Email delivery.
//!
//! The reset flow only needs `send(to, subject, body)`, so delivery sits
//! behind the [`Mailer`] trait; production uses SMTP via lettre and tests
//! inject a recording mock.

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType, transport::smtp::authentication::Credentials,
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(String),

    /// Failed to build the email message.
    #[error("failed to build message: {0}")]
    MessageBuild(String),

    /// Invalid sender or recipient address.
    #[error("invalid email address: {0}")]
    InvalidAddress(String),
}

/// Outbound email collaborator.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send a plain-text email.
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), EmailError>;
}

/// SMTP-backed [`Mailer`] for transactional email.
#[derive(Clone)]
pub struct SmtpMailer {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpMailer {
    /// Create a mailer from configuration.
    ///
    /// # Errors
    ///
    /// Returns `EmailError::Smtp` if the relay cannot be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, EmailError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_owned(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| EmailError::Smtp(e.to_string()))?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_owned()))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_owned())
            .map_err(|e| EmailError::MessageBuild(e.to_string()))?;

        self.mailer
            .send(email)
            .await
            .map_err(|e| EmailError::Smtp(e.to_string()))?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}
