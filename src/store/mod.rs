//! Document Store
//!
//! Schema-flexible JSON documents addressed by collection + id, with live
//! subscriptions.
//!
//! - **types**: keys, snapshots, writes, subscriptions
//! - **sqlite**: the SQLite-backed implementation
//! - **error**: error types
//!
//! # Example
//!
//! ```rust,no_run
//! use mediqueue::store::{DocumentKey, DocumentStore, DocumentWrite, SqliteDocumentStore};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = SqliteDocumentStore::open("./mediqueue_data/mediqueue.db")?;
//!     let key = DocumentKey::new("hospitalData", "status");
//!
//!     let mut subscription = store.subscribe(&key).await?;
//!
//!     let body = json!({"icuBeds": 4}).as_object().cloned().unwrap_or_default();
//!     store.set(&key, DocumentWrite::new(body).server_timestamp("lastUpdated")).await?;
//!
//!     // Current value first, then the write above
//!     let _initial = subscription.next().await?;
//!     let updated = subscription.next().await?;
//!     println!("version {}", updated.version);
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod sqlite;
pub mod types;

pub use error::{StoreError, StoreResult};
pub use sqlite::SqliteDocumentStore;
pub use types::{DocumentKey, DocumentSnapshot, DocumentWrite, Precondition, Subscription};

use async_trait::async_trait;

/// A document database with live subscriptions
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read the current snapshot of a document
    async fn get(&self, key: &DocumentKey) -> StoreResult<DocumentSnapshot>;

    /// Replace a document wholesale, returning the committed snapshot
    async fn set(&self, key: &DocumentKey, write: DocumentWrite) -> StoreResult<DocumentSnapshot>;

    /// Open a live subscription to a document
    async fn subscribe(&self, key: &DocumentKey) -> StoreResult<Subscription>;

    /// Number of open subscriptions on a document
    fn active_subscriptions(&self, key: &DocumentKey) -> usize;

    /// Check the store is reachable
    async fn ping(&self) -> StoreResult<()>;
}
