//! User role type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when parsing a [`Role`] from a string fails.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct RoleError(pub String);

/// Permission level of a user account.
///
/// Stored on the user record and embedded in admin-gate checks. The default
/// for newly registered accounts is [`Role::Customer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular shopper account.
    #[default]
    Customer,
    /// Administrator with access to user and product management.
    Admin,
}

impl Role {
    /// String form as stored in the database.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Admin => "admin",
        }
    }

    /// Returns true for administrator accounts.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "admin" => Ok(Self::Admin),
            other => Err(RoleError(other.to_owned())),
        }
    }
}
