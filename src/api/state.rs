//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use std::sync::Arc;
use std::time::Instant;

use crate::auth::AuthProvider;
use crate::config::ApiConfig;
use crate::store::DocumentStore;
use crate::views::ConflictPolicy;
use crate::websocket::{ConnectionHub, HubConfig};

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Document store holding the status document
    pub store: Arc<dyn DocumentStore>,
    /// Login and session lookup
    pub auth: Arc<dyn AuthProvider>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// How status writes treat concurrent edits
    pub conflict_policy: ConflictPolicy,
    /// Server start time for uptime tracking
    pub start_time: Instant,
    /// WebSocket connection hub for mounted views
    pub ws_hub: Arc<ConnectionHub>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        auth: Arc<dyn AuthProvider>,
        config: ApiConfig,
    ) -> Self {
        let hub_config = HubConfig {
            max_connections: config.max_ws_connections,
            max_subscriptions: config.max_ws_subscriptions,
        };

        Self {
            store,
            auth,
            config: Arc::new(config),
            conflict_policy: ConflictPolicy::default(),
            start_time: Instant::now(),
            ws_hub: Arc::new(ConnectionHub::new(hub_config)),
        }
    }

    pub fn with_conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.conflict_policy = policy;
        self
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Get WebSocket connection count
    pub async fn ws_connection_count(&self) -> usize {
        self.ws_hub.connection_count().await
    }
}
