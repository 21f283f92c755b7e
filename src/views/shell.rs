//! Navigation Shell
//!
//! Routes the shell redirects to, and logout.

use serde::{Serialize, Serializer};

use super::Notification;
use crate::auth::{AuthError, AuthProvider};

/// Client-side routes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Dashboard,
    Resources,
    Login,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Dashboard => "/dashboard",
            Route::Resources => "/resources",
            Route::Login => "/login",
        }
    }
}

impl Serialize for Route {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.path())
    }
}

/// Result of a logout attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogoutOutcome {
    pub notification: Notification,
    /// Where to navigate, only set on success
    pub redirect: Option<Route>,
}

impl LogoutOutcome {
    pub fn succeeded(&self) -> bool {
        self.redirect.is_some()
    }
}

/// End the session behind `token`
///
/// A token the provider no longer knows, or one that has expired, is already
/// signed out and counts as success.
pub async fn logout(auth: &dyn AuthProvider, token: &str) -> LogoutOutcome {
    let signed_out = LogoutOutcome {
        notification: Notification::success("Logged out", "You have been logged out successfully"),
        redirect: Some(Route::Login),
    };

    match auth.logout(token).await {
        Ok(()) => signed_out,
        Err(AuthError::SessionNotFound | AuthError::SessionExpired) => {
            tracing::debug!("Logout for a session that no longer exists");
            signed_out
        }
        Err(e) => {
            tracing::error!(error = %e, "Error signing out");
            LogoutOutcome {
                notification: Notification::error("Error", "Failed to log out"),
                redirect: None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{hash_password, AuthError, AuthResult, Session, StaffDirectory, User};
    use crate::config::StaffAccount;
    use async_trait::async_trait;

    struct Unreachable;

    #[async_trait]
    impl AuthProvider for Unreachable {
        async fn login(&self, _email: &str, _password: &str) -> AuthResult<Session> {
            Err(AuthError::Unavailable("offline".to_string()))
        }

        async fn logout(&self, _token: &str) -> AuthResult<()> {
            Err(AuthError::Unavailable("offline".to_string()))
        }

        async fn current_user(&self, _token: &str) -> AuthResult<User> {
            Err(AuthError::Unavailable("offline".to_string()))
        }
    }

    #[test]
    fn test_route_serializes_as_path() {
        assert_eq!(serde_json::to_string(&Route::Login).unwrap(), "\"/login\"");
        assert_eq!(Route::Resources.path(), "/resources");
    }

    #[tokio::test]
    async fn test_logout_success_redirects() {
        let auth = StaffDirectory::new(
            &[StaffAccount {
                email: "nurse@hospital.org".to_string(),
                password_sha256: hash_password("pw"),
            }],
            3600,
        );
        let session = auth.login("nurse@hospital.org", "pw").await.unwrap();

        let outcome = logout(&auth, &session.token).await;
        assert!(outcome.succeeded());
        assert_eq!(outcome.redirect, Some(Route::Login));
        assert_eq!(outcome.notification.title, "Logged out");
        assert_eq!(
            outcome.notification.description,
            "You have been logged out successfully"
        );
        assert!(!outcome.notification.is_error());
    }

    #[tokio::test]
    async fn test_logout_failure_stays() {
        let outcome = logout(&Unreachable, "token").await;
        assert!(!outcome.succeeded());
        assert_eq!(outcome.redirect, None);
        assert_eq!(outcome.notification.title, "Error");
        assert_eq!(outcome.notification.description, "Failed to log out");
        assert!(outcome.notification.is_error());
    }

    #[tokio::test]
    async fn test_logout_unknown_session_is_signed_out() {
        let auth = StaffDirectory::new(&[], 3600);

        let outcome = logout(&auth, "from-before-a-restart").await;
        assert!(outcome.succeeded());
        assert_eq!(outcome.redirect, Some(Route::Login));
        assert!(!outcome.notification.is_error());
    }
}
