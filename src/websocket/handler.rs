//! WebSocket Handler
//!
//! Handles WebSocket upgrade requests and manages the connection lifecycle.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::hub::HubError;
use super::messages::{input_text, ClientMessage, ServerMessage};
use crate::api::{ApiError, AppState};
use crate::auth::User;
use crate::store::DocumentKey;

/// Query parameters of the upgrade request
#[derive(Debug, Deserialize)]
pub struct WsParams {
    /// Session token (browsers cannot set headers on WebSocket requests)
    pub token: Option<String>,
}

/// WebSocket upgrade handler
///
/// Authenticates the session token, then upgrades the connection.
pub async fn websocket_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<WsParams>,
    ws: Option<WebSocketUpgrade>,
) -> Result<Response, ApiError> {
    let token = params
        .token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("missing token".to_string()))?;

    let user = state
        .auth
        .current_user(&token)
        .await
        .map_err(|e| ApiError::Unauthorized(e.to_string()))?;

    let ws = ws.ok_or_else(|| ApiError::Validation("expected a WebSocket upgrade".to_string()))?;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, user)))
}

fn encode(message: &ServerMessage) -> Option<Message> {
    match serde_json::to_string(message) {
        Ok(text) => Some(Message::Text(text)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize message");
            None
        }
    }
}

/// Handle an established WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>, user: User) {
    let (mut sender, mut receiver) = socket.split();
    let hub = Arc::clone(&state.ws_hub);

    // Create channel for sending messages to this connection
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    let email = user.email.clone();
    let connection_id = match hub.register(tx, user).await {
        Ok(id) => id,
        Err(e) => {
            tracing::error!(error = %e, "Failed to register WebSocket connection");
            if let Some(msg) = encode(&ServerMessage::error(e.to_string())) {
                let _ = sender.send(msg).await;
            }
            return;
        }
    };

    // Send connected message with connection ID
    let connected = ServerMessage::Connected {
        connection_id: connection_id.clone(),
        user: email,
    };
    let sent = match encode(&connected) {
        Some(msg) => sender.send(msg).await.is_ok(),
        None => false,
    };
    if !sent {
        tracing::error!(connection_id = %connection_id, "Failed to send connected message");
        hub.unregister(&connection_id).await;
        return;
    }

    let conn_id_for_send = connection_id.clone();

    // Task to forward messages from channel to WebSocket
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let Some(frame) = encode(&msg) else {
                continue;
            };
            if sender.send(frame).await.is_err() {
                tracing::debug!(
                    connection_id = %conn_id_for_send,
                    "WebSocket send failed, closing connection"
                );
                break;
            }
        }
    });

    let state_for_recv = Arc::clone(&state);
    let conn_id_for_recv = connection_id.clone();

    // Task to receive messages from WebSocket and handle them
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(msg) => {
                    if !handle_ws_message(&state_for_recv, &conn_id_for_recv, msg).await {
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!(
                        connection_id = %conn_id_for_recv,
                        error = %e,
                        "WebSocket receive error"
                    );
                    break;
                }
            }
        }
    });

    // Wait for either task to complete
    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        }
        _ = &mut recv_task => {
            send_task.abort();
        }
    }

    // Cleanup: unmount everything this connection had open
    hub.unregister(&connection_id).await;
}

/// Handle a received WebSocket message
///
/// Returns false if the connection should be closed.
async fn handle_ws_message(state: &Arc<AppState>, connection_id: &str, message: Message) -> bool {
    let hub = &state.ws_hub;

    match message {
        Message::Text(text) => {
            match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => {
                    if let Err(e) = handle_client_message(state, connection_id, client_msg).await {
                        tracing::warn!(
                            connection_id = %connection_id,
                            error = %e,
                            "Client request failed"
                        );
                        let _ = hub
                            .send_to(connection_id, ServerMessage::error(e.to_string()))
                            .await;
                    }
                }
                Err(e) => {
                    tracing::debug!(
                        connection_id = %connection_id,
                        error = %e,
                        text = %text,
                        "Invalid client message"
                    );
                    // Send error but keep connection open
                    let error_msg = ServerMessage::error(format!("Invalid message format: {}", e));
                    let _ = hub.send_to(connection_id, error_msg).await;
                }
            }
            true
        }
        Message::Binary(_) => {
            let error_msg = ServerMessage::error("Binary messages not supported");
            let _ = hub.send_to(connection_id, error_msg).await;
            true
        }
        Message::Ping(_) | Message::Pong(_) => true,
        Message::Close(_) => {
            tracing::debug!(connection_id = %connection_id, "Client requested close");
            false
        }
    }
}

/// Handle a parsed client message
async fn handle_client_message(
    state: &Arc<AppState>,
    connection_id: &str,
    message: ClientMessage,
) -> Result<(), HubError> {
    let hub = &state.ws_hub;

    match message {
        ClientMessage::Mount { view } => {
            hub.mount(
                connection_id,
                view,
                Arc::clone(&state.store),
                state.conflict_policy,
            )
            .await
        }
        ClientMessage::Unmount { view } => {
            hub.unmount(connection_id, view).await?;
            hub.send_to(connection_id, ServerMessage::Unmounted { view })
                .await
        }
        ClientMessage::Edit { field, value } => {
            hub.edit(connection_id, &field, &input_text(&value)).await
        }
        ClientMessage::Submit => hub.submit(connection_id).await,
        ClientMessage::Subscribe {
            collection,
            document,
        } => {
            let key = DocumentKey::new(collection, document);
            hub.subscribe(connection_id, key, Arc::clone(&state.store))
                .await
        }
        ClientMessage::Unsubscribe {
            collection,
            document,
        } => {
            let key = DocumentKey::new(collection, document);
            hub.unsubscribe(connection_id, &key).await?;
            hub.send_to(
                connection_id,
                ServerMessage::Unsubscribed {
                    collection: key.collection,
                    document: key.id,
                },
            )
            .await
        }
        ClientMessage::Ping => hub.send_to(connection_id, ServerMessage::Pong).await,
    }
}
