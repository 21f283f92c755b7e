//! Staff directory auth provider
//!
//! Accounts come from configuration; sessions live in memory and expire
//! after the configured lifetime.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AuthError, AuthProvider, AuthResult, Session, User};
use crate::config::StaffAccount;

/// Hex-encoded SHA-256 of a password, as stored in `[[auth.staff]]`
///
/// The digest is unsalted and fast, so a leaked config file is open to
/// dictionary attacks. Keep the file readable only by the service account.
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// Compares a stored hex digest with the digest of `password` without
/// short-circuiting on the first differing byte.
fn password_matches(expected_hex: &str, password: &str) -> bool {
    let Ok(expected) = hex::decode(expected_hex) else {
        return false;
    };
    let actual = Sha256::digest(password.as_bytes());
    if expected.len() != actual.len() {
        return false;
    }
    expected
        .iter()
        .zip(actual.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

/// Auth provider backed by a fixed list of staff accounts
pub struct StaffDirectory {
    /// Lowercased email → password hash
    accounts: HashMap<String, String>,
    /// Token → session
    sessions: RwLock<HashMap<String, Session>>,
    session_ttl: Duration,
}

impl StaffDirectory {
    pub fn new(accounts: &[StaffAccount], session_ttl_secs: u64) -> Self {
        let accounts = accounts
            .iter()
            .map(|a| (a.email.trim().to_lowercase(), a.password_sha256.to_lowercase()))
            .collect::<HashMap<_, _>>();

        if accounts.is_empty() {
            tracing::warn!("No staff accounts configured; nobody can log in");
        }

        Self {
            accounts,
            sessions: RwLock::new(HashMap::new()),
            session_ttl: Duration::seconds(session_ttl_secs.min(i64::MAX as u64) as i64),
        }
    }

    /// Number of live sessions
    pub async fn session_count(&self) -> usize {
        self.sessions
            .read()
            .await
            .values()
            .filter(|s| !s.is_expired())
            .count()
    }
}

#[async_trait]
impl AuthProvider for StaffDirectory {
    async fn login(&self, email: &str, password: &str) -> AuthResult<Session> {
        let email = email.trim().to_lowercase();

        let matches = self
            .accounts
            .get(&email)
            .is_some_and(|expected| password_matches(expected, password));
        if !matches {
            tracing::warn!(email = %email, "Rejected login");
            return Err(AuthError::InvalidCredentials);
        }

        let session = Session {
            token: Uuid::new_v4().to_string(),
            user: User::new(email),
            expires_at: Utc::now() + self.session_ttl,
        };

        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, s| !s.is_expired());
        sessions.insert(session.token.clone(), session.clone());

        tracing::info!(email = %session.user.email, "Staff logged in");
        Ok(session)
    }

    async fn logout(&self, token: &str) -> AuthResult<()> {
        let session = self
            .sessions
            .write()
            .await
            .remove(token)
            .ok_or(AuthError::SessionNotFound)?;

        tracing::info!(email = %session.user.email, "Staff logged out");
        Ok(())
    }

    async fn current_user(&self, token: &str) -> AuthResult<User> {
        let sessions = self.sessions.read().await;
        let session = sessions.get(token).ok_or(AuthError::SessionNotFound)?;

        if session.is_expired() {
            return Err(AuthError::SessionExpired);
        }
        Ok(session.user.clone())
    }
}
