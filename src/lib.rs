//! # MediQueue
//!
//! Real-time hospital resource dashboard. Staff see blood units by type,
//! oxygen cylinders, ICU and general beds and doctors on duty, and edit them
//! from a single shared status document that every open dashboard follows
//! live.
//!
//! ## Modules
//!
//! - [`model`]: The status document and the editable resource form
//! - [`store`]: Document store with live subscriptions (SQLite)
//! - [`auth`]: Staff login and sessions
//! - [`views`]: Dashboard, Resources and navigation shell view models
//! - [`api`]: REST API server with Axum
//! - [`websocket`]: Live views pushed over WebSocket
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mediqueue::store::SqliteDocumentStore;
//! use mediqueue::views::{ConflictPolicy, DashboardView, ResourcesView};
//! use mediqueue::model::{BloodType, ResourceField};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(SqliteDocumentStore::open_in_memory()?);
//!
//!     let mut dashboard = DashboardView::mount(store.clone()).await;
//!     let resources = ResourcesView::mount(store.clone(), ConflictPolicy::default()).await;
//!
//!     resources.edit(ResourceField::BloodUnits(BloodType::APositive), "5");
//!     if let Some(notification) = resources.submit().await {
//!         println!("{}: {}", notification.title, notification.description);
//!     }
//!
//!     dashboard.changed().await;
//!     println!("Blood units: {}", dashboard.state().metrics().total_blood_units);
//!
//!     dashboard.unmount().await;
//!     resources.unmount().await;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod model;
pub mod store;
pub mod views;
pub mod websocket;

// Re-export top-level types for convenience
pub use model::{BloodType, BloodUnits, HospitalStatus, ModelError, ResourceField, ResourceForm};

pub use store::{
    DocumentKey, DocumentSnapshot, DocumentStore, DocumentWrite, Precondition,
    SqliteDocumentStore, StoreError, StoreResult, Subscription,
};

pub use auth::{AuthError, AuthProvider, AuthResult, Session, StaffDirectory, User};

pub use views::{
    ConflictPolicy, DashboardMetrics, DashboardView, Notification, ResourcesView, Route, ViewError,
};

pub use api::{build_router, serve, ApiError, AppState};

pub use websocket::{ClientMessage, ConnectionHub, HubConfig, HubError, ServerMessage, ViewKind};

pub use config::{ApiConfig, Config, ConfigError, LoggingConfig, StorageConfig};
