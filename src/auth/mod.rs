//! Authentication
//!
//! Session-based login for hospital staff. The [`AuthProvider`] trait is the
//! seam the API and the navigation shell depend on; [`StaffDirectory`] is the
//! configured implementation.

mod directory;

pub use directory::{hash_password, StaffDirectory};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An authenticated staff member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
}

impl User {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
        }
    }

    /// Local part of the email, used in greetings
    pub fn display_name(&self) -> &str {
        self.email.split('@').next().unwrap_or(&self.email)
    }
}

/// A logged-in session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Authentication errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Session not found")]
    SessionNotFound,

    #[error("Session expired")]
    SessionExpired,

    #[error("Auth provider unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias for auth operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Login, logout and current-user lookup
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> AuthResult<Session>;

    async fn logout(&self, token: &str) -> AuthResult<()>;

    /// The user behind a session token, if the session is live
    async fn current_user(&self, token: &str) -> AuthResult<User>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name() {
        assert_eq!(User::new("dr.grey@seattlegrace.org").display_name(), "dr.grey");
        assert_eq!(User::new("nurse").display_name(), "nurse");
    }
}
