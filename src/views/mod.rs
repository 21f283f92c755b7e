//! Views
//!
//! The screens of the dashboard, independent of how they are rendered:
//!
//! - **dashboard**: read-only metrics over the status document
//! - **resources**: editable form that writes the status document
//! - **shell**: sidebar navigation and logout
//!
//! A view holds one live subscription between `mount` and `unmount` and
//! publishes its state through a `tokio::sync::watch` channel.

pub mod dashboard;
pub mod notification;
pub mod resources;
pub mod shell;

pub use dashboard::{
    format_last_updated, greeting, BloodUnitCount, DashboardMetrics, DashboardState, DashboardView,
};
pub use notification::{Notification, NotificationVariant};
pub use resources::{
    submit_notification, write_status, ConflictPolicy, ResourcesState, ResourcesView,
};
pub use shell::{logout, LogoutOutcome, Route};

use thiserror::Error;

use crate::model::{ModelError, STATUS_COLLECTION, STATUS_DOCUMENT};
use crate::store::{DocumentKey, StoreError};

/// Errors surfaced by view actions
#[derive(Error, Debug)]
pub enum ViewError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Key of the single status document
pub fn status_key() -> DocumentKey {
    DocumentKey::new(STATUS_COLLECTION, STATUS_DOCUMENT)
}

#[cfg(test)]
pub(crate) mod testing {
    use async_trait::async_trait;

    use crate::store::{
        DocumentKey, DocumentSnapshot, DocumentStore, DocumentWrite, StoreError, StoreResult,
        Subscription,
    };

    /// A store whose every operation fails
    pub struct FailingStore;

    fn unavailable() -> StoreError {
        StoreError::Lock("store unavailable".to_string())
    }

    #[async_trait]
    impl DocumentStore for FailingStore {
        async fn get(&self, _key: &DocumentKey) -> StoreResult<DocumentSnapshot> {
            Err(unavailable())
        }

        async fn set(&self, _key: &DocumentKey, _write: DocumentWrite) -> StoreResult<DocumentSnapshot> {
            Err(unavailable())
        }

        async fn subscribe(&self, _key: &DocumentKey) -> StoreResult<Subscription> {
            Err(unavailable())
        }

        fn active_subscriptions(&self, _key: &DocumentKey) -> usize {
            0
        }

        async fn ping(&self) -> StoreResult<()> {
            Err(unavailable())
        }
    }
}
