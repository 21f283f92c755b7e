//! Document store types
//!
//! Keys, snapshots, writes and live subscriptions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tokio::sync::broadcast::{self, error::RecvError};

use super::error::{StoreError, StoreResult};

/// Address of a document: collection + document id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentKey {
    pub collection: String,
    pub id: String,
}

impl DocumentKey {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Check that both parts are usable as a path segment
    pub fn validate(&self) -> StoreResult<()> {
        let ok = |s: &str| {
            !s.is_empty()
                && s.len() <= 128
                && s.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-')
        };

        if ok(&self.collection) && ok(&self.id) {
            Ok(())
        } else {
            Err(StoreError::InvalidKey(self.to_string()))
        }
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// Point-in-time value of a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    pub key: DocumentKey,
    /// Document body, `None` if the document has never been written
    pub data: Option<Value>,
    /// Store-managed write counter, 0 for a missing document
    pub version: u64,
    pub update_time: Option<DateTime<Utc>>,
}

impl DocumentSnapshot {
    pub fn missing(key: DocumentKey) -> Self {
        Self {
            key,
            data: None,
            version: 0,
            update_time: None,
        }
    }

    pub fn exists(&self) -> bool {
        self.data.is_some()
    }
}

/// Condition a write must satisfy to be applied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Precondition {
    /// Always apply
    #[default]
    None,
    /// Apply only if the stored version matches (0 = document must not exist)
    Version(u64),
}

/// A full-document overwrite
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentWrite {
    pub data: Map<String, Value>,
    /// Fields the store fills with its commit time
    pub server_timestamps: Vec<String>,
    pub precondition: Precondition,
}

impl DocumentWrite {
    pub fn new(data: Map<String, Value>) -> Self {
        Self {
            data,
            ..Default::default()
        }
    }

    pub fn server_timestamp(mut self, field: impl Into<String>) -> Self {
        self.server_timestamps.push(field.into());
        self
    }

    pub fn if_version(mut self, version: u64) -> Self {
        self.precondition = Precondition::Version(version);
        self
    }
}

/// A live subscription to one document.
///
/// Yields the current snapshot first, then every later snapshot in commit
/// order. Dropping the subscription releases it.
pub struct Subscription {
    key: DocumentKey,
    pending: Option<DocumentSnapshot>,
    last_version: Option<u64>,
    receiver: broadcast::Receiver<DocumentSnapshot>,
}

impl Subscription {
    pub(crate) fn new(
        key: DocumentKey,
        initial: DocumentSnapshot,
        receiver: broadcast::Receiver<DocumentSnapshot>,
    ) -> Self {
        Self {
            key,
            pending: Some(initial),
            last_version: None,
            receiver,
        }
    }

    pub fn key(&self) -> &DocumentKey {
        &self.key
    }

    /// Wait for the next snapshot
    pub async fn next(&mut self) -> StoreResult<DocumentSnapshot> {
        if let Some(snapshot) = self.pending.take() {
            self.last_version = Some(snapshot.version);
            return Ok(snapshot);
        }

        loop {
            match self.receiver.recv().await {
                Ok(snapshot) => {
                    // Writes racing the initial read are already reflected in it
                    if self.last_version.is_some_and(|v| snapshot.version <= v) {
                        continue;
                    }
                    self.last_version = Some(snapshot.version);
                    return Ok(snapshot);
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(
                        document = %self.key,
                        skipped = skipped,
                        "Subscriber lagged, skipping to newer snapshot"
                    );
                }
                Err(RecvError::Closed) => {
                    return Err(StoreError::SubscriptionClosed(self.key.clone()));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_validation() {
        assert!(DocumentKey::new("hospitalData", "status").validate().is_ok());
        assert!(DocumentKey::new("", "status").validate().is_err());
        assert!(DocumentKey::new("hospital/data", "status").validate().is_err());
        assert!(DocumentKey::new("a", "b c").validate().is_err());
    }

    #[test]
    fn test_write_builder() {
        let mut data = Map::new();
        data.insert("icuBeds".to_string(), json!(1));

        let write = DocumentWrite::new(data)
            .server_timestamp("lastUpdated")
            .if_version(3);

        assert_eq!(write.server_timestamps, vec!["lastUpdated"]);
        assert_eq!(write.precondition, Precondition::Version(3));
    }

    #[tokio::test]
    async fn test_subscription_skips_stale_broadcasts() {
        let key = DocumentKey::new("c", "d");
        let (tx, rx) = broadcast::channel(8);

        let initial = DocumentSnapshot {
            key: key.clone(),
            data: Some(json!({"n": 2})),
            version: 2,
            update_time: None,
        };
        let mut sub = Subscription::new(key.clone(), initial, rx);

        let at = |version: u64| DocumentSnapshot {
            key: key.clone(),
            data: Some(json!({ "n": version })),
            version,
            update_time: None,
        };
        tx.send(at(2)).unwrap();
        tx.send(at(3)).unwrap();

        assert_eq!(sub.next().await.unwrap().version, 2);
        assert_eq!(sub.next().await.unwrap().version, 3);

        drop(tx);
        assert!(matches!(
            sub.next().await,
            Err(StoreError::SubscriptionClosed(_))
        ));
    }
}
