//! Business services.
//!
//! Services hold the behavior between the HTTP glue and the store: credential
//! handling, session tokens, email dispatch, and review aggregation.

pub mod auth;
pub mod email;
pub mod reviews;
pub mod token;

pub use auth::{AuthError, AuthService};
pub use email::{EmailError, Mailer, SmtpMailer};
pub use reviews::{ReviewError, ReviewService};
pub use token::{IssuedToken, SESSION_COOKIE, TokenError, TokenIssuer};
