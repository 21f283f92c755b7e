//! WebSocket Connection Hub
//!
//! Tracks every WebSocket connection together with the views it has mounted
//! and the raw documents it follows. Each mounted view gets a forwarder task
//! that pushes a render to the connection whenever the view state changes.

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, watch, RwLock};
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::messages::{ServerMessage, ViewKind};
use crate::auth::User;
use crate::model::ModelError;
use crate::store::{DocumentKey, DocumentStore, StoreError};
use crate::views::{ConflictPolicy, DashboardView, ResourcesView};

/// Unique identifier for a WebSocket connection
pub type ConnectionId = String;

/// Manages all WebSocket connections and their mounted views
pub struct ConnectionHub {
    /// Active connections: ConnectionId → ConnectionHandle
    connections: RwLock<HashMap<ConnectionId, ConnectionHandle>>,
    /// Configuration
    config: HubConfig,
}

/// Configuration for the connection hub
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Maximum number of concurrent connections
    pub max_connections: usize,
    /// Maximum raw document subscriptions per connection
    pub max_subscriptions: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            max_connections: 1000,
            max_subscriptions: 16,
        }
    }
}

/// A view plus the task rendering it to the connection
struct Mounted<V> {
    view: V,
    forwarder: JoinHandle<()>,
}

/// Handle for sending messages to a specific connection
struct ConnectionHandle {
    /// Channel sender for this connection
    sender: mpsc::UnboundedSender<ServerMessage>,
    user: User,
    dashboard: Option<Mounted<DashboardView>>,
    resources: Option<Mounted<Arc<ResourcesView>>>,
    /// Raw document subscriptions: key → forwarding task
    documents: HashMap<DocumentKey, JoinHandle<()>>,
}

impl ConnectionHandle {
    fn is_mounted(&self, view: ViewKind) -> bool {
        match view {
            ViewKind::Dashboard => self.dashboard.is_some(),
            ViewKind::Resources => self.resources.is_some(),
        }
    }
}

/// Push a render for every state change until either side goes away
fn spawn_forwarder<T, F>(
    mut rx: watch::Receiver<T>,
    sender: mpsc::UnboundedSender<ServerMessage>,
    render: F,
) -> JoinHandle<()>
where
    T: Send + Sync + 'static,
    F: Fn(&T) -> ServerMessage + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            let message = {
                let state = rx.borrow_and_update();
                render(&*state)
            };
            if sender.send(message).is_err() {
                break;
            }
            if rx.changed().await.is_err() {
                break;
            }
        }
    })
}

async fn release_dashboard(mounted: Mounted<DashboardView>) {
    mounted.forwarder.abort();
    mounted.view.unmount().await;
}

async fn release_resources(mounted: Mounted<Arc<ResourcesView>>) {
    mounted.forwarder.abort();
    // A submit in flight holds the other reference; dropping ours aborts
    // the subscription task once it completes
    if let Ok(view) = Arc::try_unwrap(mounted.view) {
        view.unmount().await;
    }
}

impl ConnectionHub {
    /// Create a new connection hub
    pub fn new(config: HubConfig) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Register a new WebSocket connection
    ///
    /// Returns the connection ID on success, or an error if the connection
    /// limit has been reached.
    pub async fn register(
        &self,
        sender: mpsc::UnboundedSender<ServerMessage>,
        user: User,
    ) -> Result<ConnectionId, HubError> {
        let mut connections = self.connections.write().await;
        if connections.len() >= self.config.max_connections {
            return Err(HubError::TooManyConnections(self.config.max_connections));
        }

        let id = Uuid::new_v4().to_string();
        let handle = ConnectionHandle {
            sender,
            user,
            dashboard: None,
            resources: None,
            documents: HashMap::new(),
        };
        connections.insert(id.clone(), handle);

        tracing::info!(connection_id = %id, "WebSocket connected");
        Ok(id)
    }

    /// Unregister a connection, unmounting its views and dropping its
    /// document subscriptions
    pub async fn unregister(&self, id: &str) {
        let handle = self.connections.write().await.remove(id);

        if let Some(handle) = handle {
            for (_, task) in handle.documents {
                task.abort();
            }
            if let Some(mounted) = handle.dashboard {
                release_dashboard(mounted).await;
            }
            if let Some(mounted) = handle.resources {
                release_resources(mounted).await;
            }
        }

        tracing::info!(connection_id = %id, "WebSocket disconnected");
    }

    /// Mount a view for a connection
    pub async fn mount(
        &self,
        id: &str,
        view: ViewKind,
        store: Arc<dyn DocumentStore>,
        policy: ConflictPolicy,
    ) -> Result<(), HubError> {
        let (sender, user) = {
            let connections = self.connections.read().await;
            let handle = connections.get(id).ok_or(HubError::ConnectionNotFound)?;
            if handle.is_mounted(view) {
                return Err(HubError::AlreadyMounted(view));
            }
            (handle.sender.clone(), handle.user.clone())
        };

        // Subscribing awaits the store, so it happens outside the lock
        match view {
            ViewKind::Dashboard => {
                let dashboard = DashboardView::mount(store).await;
                let mut connections = self.connections.write().await;
                let Some(handle) = connections.get_mut(id) else {
                    drop(connections);
                    dashboard.unmount().await;
                    return Err(HubError::ConnectionNotFound);
                };
                if handle.dashboard.is_some() {
                    drop(connections);
                    dashboard.unmount().await;
                    return Err(HubError::AlreadyMounted(view));
                }

                let _ = sender.send(ServerMessage::Mounted { view });
                let forwarder = spawn_forwarder(dashboard.watch(), sender, move |state| {
                    ServerMessage::dashboard(state, &user)
                });
                handle.dashboard = Some(Mounted {
                    view: dashboard,
                    forwarder,
                });
            }
            ViewKind::Resources => {
                let resources = ResourcesView::mount(store, policy).await;
                let mut connections = self.connections.write().await;
                let Some(handle) = connections.get_mut(id) else {
                    drop(connections);
                    resources.unmount().await;
                    return Err(HubError::ConnectionNotFound);
                };
                if handle.resources.is_some() {
                    drop(connections);
                    resources.unmount().await;
                    return Err(HubError::AlreadyMounted(view));
                }

                let _ = sender.send(ServerMessage::Mounted { view });
                let forwarder = spawn_forwarder(resources.watch(), sender, ServerMessage::resources);
                handle.resources = Some(Mounted {
                    view: Arc::new(resources),
                    forwarder,
                });
            }
        }

        tracing::debug!(connection_id = %id, view = %view, "View mounted");
        Ok(())
    }

    /// Unmount a view, releasing its subscription
    pub async fn unmount(&self, id: &str, view: ViewKind) -> Result<(), HubError> {
        let mut connections = self.connections.write().await;
        let handle = connections.get_mut(id).ok_or(HubError::ConnectionNotFound)?;

        match view {
            ViewKind::Dashboard => {
                let mounted = handle.dashboard.take().ok_or(HubError::NotMounted(view))?;
                drop(connections);
                release_dashboard(mounted).await;
            }
            ViewKind::Resources => {
                let mounted = handle.resources.take().ok_or(HubError::NotMounted(view))?;
                drop(connections);
                release_resources(mounted).await;
            }
        }

        tracing::debug!(connection_id = %id, view = %view, "View unmounted");
        Ok(())
    }

    /// Apply an edit to the connection's Resources form
    pub async fn edit(&self, id: &str, field: &str, input: &str) -> Result<(), HubError> {
        let connections = self.connections.read().await;
        let handle = connections.get(id).ok_or(HubError::ConnectionNotFound)?;
        let mounted = handle
            .resources
            .as_ref()
            .ok_or(HubError::NotMounted(ViewKind::Resources))?;

        mounted.view.edit_path(field, input)?;
        Ok(())
    }

    /// Submit the connection's Resources form and send the resulting
    /// notification
    pub async fn submit(&self, id: &str) -> Result<(), HubError> {
        let (view, sender) = {
            let connections = self.connections.read().await;
            let handle = connections.get(id).ok_or(HubError::ConnectionNotFound)?;
            let mounted = handle
                .resources
                .as_ref()
                .ok_or(HubError::NotMounted(ViewKind::Resources))?;
            (Arc::clone(&mounted.view), handle.sender.clone())
        };

        let notification = view.submit().await.ok_or(HubError::SubmitInProgress)?;
        sender
            .send(ServerMessage::Notification(notification))
            .map_err(|_| HubError::SendFailed)
    }

    /// Follow a raw document, forwarding every snapshot
    pub async fn subscribe(
        &self,
        id: &str,
        key: DocumentKey,
        store: Arc<dyn DocumentStore>,
    ) -> Result<(), HubError> {
        let sender = {
            let connections = self.connections.read().await;
            let handle = connections.get(id).ok_or(HubError::ConnectionNotFound)?;
            if handle.documents.contains_key(&key) {
                return Err(HubError::AlreadySubscribed(key));
            }
            if handle.documents.len() >= self.config.max_subscriptions {
                return Err(HubError::TooManySubscriptions(self.config.max_subscriptions));
            }
            handle.sender.clone()
        };

        let mut subscription = store.subscribe(&key).await?;

        let mut connections = self.connections.write().await;
        let handle = connections.get_mut(id).ok_or(HubError::ConnectionNotFound)?;
        if handle.documents.contains_key(&key) {
            return Err(HubError::AlreadySubscribed(key));
        }
        if handle.documents.len() >= self.config.max_subscriptions {
            return Err(HubError::TooManySubscriptions(self.config.max_subscriptions));
        }

        let _ = sender.send(ServerMessage::Subscribed {
            collection: key.collection.clone(),
            document: key.id.clone(),
        });

        let connection_id = id.to_string();
        let task = tokio::spawn(async move {
            loop {
                match subscription.next().await {
                    Ok(snapshot) => {
                        if sender.send(ServerMessage::snapshot(snapshot)).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::error!(connection_id = %connection_id, error = %e, "Document subscription ended");
                        let _ = sender.send(ServerMessage::error(e.to_string()));
                        break;
                    }
                }
            }
        });
        handle.documents.insert(key, task);

        Ok(())
    }

    /// Stop following a raw document
    pub async fn unsubscribe(&self, id: &str, key: &DocumentKey) -> Result<(), HubError> {
        let mut connections = self.connections.write().await;
        let handle = connections.get_mut(id).ok_or(HubError::ConnectionNotFound)?;

        let task = handle
            .documents
            .remove(key)
            .ok_or_else(|| HubError::NotSubscribed(key.clone()))?;
        task.abort();
        Ok(())
    }

    /// Send a message directly to a specific connection
    pub async fn send_to(&self, id: &str, message: ServerMessage) -> Result<(), HubError> {
        let connections = self.connections.read().await;
        let handle = connections.get(id).ok_or(HubError::ConnectionNotFound)?;

        handle
            .sender
            .send(message)
            .map_err(|_| HubError::SendFailed)
    }

    /// Get the current connection count
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Views a connection currently has mounted
    pub async fn mounted_views(&self, id: &str) -> Vec<ViewKind> {
        let connections = self.connections.read().await;
        let Some(handle) = connections.get(id) else {
            return Vec::new();
        };

        [ViewKind::Dashboard, ViewKind::Resources]
            .into_iter()
            .filter(|v| handle.is_mounted(*v))
            .collect()
    }

    /// Number of raw documents a connection follows
    pub async fn document_subscription_count(&self, id: &str) -> usize {
        self.connections
            .read()
            .await
            .get(id)
            .map(|h| h.documents.len())
            .unwrap_or(0)
    }
}

/// Errors that can occur in the connection hub
#[derive(Debug, Error)]
pub enum HubError {
    #[error("Too many connections (limit: {0})")]
    TooManyConnections(usize),

    #[error("Connection not found")]
    ConnectionNotFound,

    #[error("Failed to send message")]
    SendFailed,

    #[error("View {0} is already mounted")]
    AlreadyMounted(ViewKind),

    #[error("View {0} is not mounted")]
    NotMounted(ViewKind),

    #[error("Already subscribed to {0}")]
    AlreadySubscribed(DocumentKey),

    #[error("Too many document subscriptions (limit: {0})")]
    TooManySubscriptions(usize),

    #[error("Not subscribed to {0}")]
    NotSubscribed(DocumentKey),

    #[error("A submit is already in progress")]
    SubmitInProgress,

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
