//! WebSocket Message Types
//!
//! Defines all message types for WebSocket communication between
//! the dashboard UI and the MediQueue server.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::auth::User;
use crate::model::ResourceForm;
use crate::store::DocumentSnapshot;
use crate::views::{greeting, DashboardMetrics, DashboardState, Notification, ResourcesState};

/// A view a connection can mount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    Dashboard,
    Resources,
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewKind::Dashboard => f.write_str("dashboard"),
            ViewKind::Resources => f.write_str("resources"),
        }
    }
}

/// Messages sent from client to server
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Start a view; its state is pushed on every change
    Mount { view: ViewKind },
    /// Stop a view and release its subscription
    Unmount { view: ViewKind },
    /// Set one Resources form field from raw input
    Edit {
        /// Field path, e.g. `bloodUnits.A+` or `icuBeds`
        field: String,
        /// Raw input, string or number
        value: Value,
    },
    /// Submit the Resources form
    Submit,
    /// Follow a raw document
    Subscribe { collection: String, document: String },
    /// Stop following a raw document
    Unsubscribe { collection: String, document: String },
    /// Ping for keepalive
    Ping,
}

/// Raw text of an edit value as the input widget would hold it
pub fn input_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Connection established
    Connected {
        /// Unique connection identifier
        connection_id: String,
        /// Email of the authenticated user
        user: String,
    },
    /// Dashboard render
    Dashboard {
        loading: bool,
        greeting: String,
        metrics: DashboardMetrics,
    },
    /// Resources form render
    Resources {
        form: ResourceForm,
        submitting: bool,
        base_version: u64,
    },
    /// Toast to show
    Notification(Notification),
    /// Raw document snapshot
    Snapshot {
        collection: String,
        document: String,
        exists: bool,
        version: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        update_time: Option<DateTime<Utc>>,
        data: Option<Value>,
    },
    /// View mounted
    Mounted { view: ViewKind },
    /// View unmounted
    Unmounted { view: ViewKind },
    /// Document subscription confirmed
    Subscribed { collection: String, document: String },
    /// Document subscription released
    Unsubscribed { collection: String, document: String },
    /// Pong response to ping
    Pong,
    /// Error message
    Error {
        /// Error description
        message: String,
    },
}

impl ServerMessage {
    pub fn dashboard(state: &DashboardState, user: &User) -> Self {
        ServerMessage::Dashboard {
            loading: state.loading,
            greeting: greeting(user),
            metrics: state.metrics(),
        }
    }

    pub fn resources(state: &ResourcesState) -> Self {
        ServerMessage::Resources {
            form: state.form.clone(),
            submitting: state.submitting,
            base_version: state.base_version,
        }
    }

    pub fn snapshot(snapshot: DocumentSnapshot) -> Self {
        ServerMessage::Snapshot {
            exists: snapshot.exists(),
            collection: snapshot.key.collection,
            document: snapshot.key.id,
            version: snapshot.version,
            update_time: snapshot.update_time,
            data: snapshot.data,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_message_deserialize_mount() {
        let json = r#"{"type": "mount", "view": "resources"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(
            msg,
            ClientMessage::Mount {
                view: ViewKind::Resources
            }
        ));
    }

    #[test]
    fn test_client_message_deserialize_edit() {
        let json = r#"{"type": "edit", "field": "bloodUnits.A+", "value": 5}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        match msg {
            ClientMessage::Edit { field, value } => {
                assert_eq!(field, "bloodUnits.A+");
                assert_eq!(input_text(&value), "5");
            }
            _ => panic!("Expected Edit"),
        }
    }

    #[test]
    fn test_client_message_deserialize_ping() {
        let json = r#"{"type": "ping"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(msg, ClientMessage::Ping));
    }

    #[test]
    fn test_unknown_view_rejected() {
        let json = r#"{"type": "mount", "view": "admin"}"#;
        assert!(serde_json::from_str::<ClientMessage>(json).is_err());
    }

    #[test]
    fn test_input_text() {
        assert_eq!(input_text(&json!("12abc")), "12abc");
        assert_eq!(input_text(&json!(7)), "7");
        assert_eq!(input_text(&json!(null)), "");
    }

    #[test]
    fn test_server_message_serialize_connected() {
        let msg = ServerMessage::Connected {
            connection_id: "abc-123".to_string(),
            user: "nurse@hospital.org".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"connected\""));
        assert!(json.contains("\"connection_id\":\"abc-123\""));
    }

    #[test]
    fn test_server_message_serialize_notification() {
        let msg = ServerMessage::Notification(Notification::success("Success", "Saved"));
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "notification");
        assert_eq!(value["title"], "Success");
        assert_eq!(value["variant"], "default");
    }

    #[test]
    fn test_server_message_serialize_dashboard() {
        let state = DashboardState {
            status: None,
            loading: false,
        };
        let msg = ServerMessage::dashboard(&state, &User::new("dr.house@ppth.org"));
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "dashboard");
        assert_eq!(value["greeting"], "Welcome back, dr.house");
        assert_eq!(value["metrics"]["last_updated"], "Never");
        assert_eq!(value["metrics"]["total_beds"], 0);
    }
}
