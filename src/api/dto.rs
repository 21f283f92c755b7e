//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::auth::{Session, User};
use crate::model::{HospitalStatus, ResourceForm};
use crate::store::DocumentSnapshot;
use crate::views::{DashboardMetrics, Notification};

// ============================================
// AUTH DTOs
// ============================================

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Bearer token for later requests
    pub token: String,
    pub user: UserResponse,
    pub expires_at: DateTime<Utc>,
}

impl From<Session> for LoginResponse {
    fn from(session: Session) -> Self {
        Self {
            token: session.token,
            user: UserResponse::from(&session.user),
            expires_at: session.expires_at,
        }
    }
}

/// The logged-in user
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub email: String,
    /// Name used in greetings
    pub display_name: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            email: user.email.clone(),
            display_name: user.display_name().to_string(),
        }
    }
}

// ============================================
// STATUS DTOs
// ============================================

/// Current status document with derived dashboard metrics
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// False if the document has never been written
    pub exists: bool,
    pub version: u64,
    pub status: HospitalStatus,
    pub metrics: DashboardMetrics,
}

/// Status update request: form values plus an optional version check
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(flatten)]
    pub form: ResourceForm,
    /// Required when the server rejects stale writes
    #[serde(default, rename = "ifVersion")]
    pub if_version: Option<u64>,
}

/// Status update outcome
#[derive(Debug, Serialize)]
pub struct UpdateStatusResponse {
    pub notification: Notification,
    /// Version written, absent on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
}

// ============================================
// DOCUMENT DTOs
// ============================================

/// Raw document snapshot
#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub collection: String,
    pub id: String,
    pub exists: bool,
    pub version: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_time: Option<DateTime<Utc>>,
    pub data: Option<Value>,
}

impl From<DocumentSnapshot> for DocumentResponse {
    fn from(snapshot: DocumentSnapshot) -> Self {
        Self {
            exists: snapshot.exists(),
            collection: snapshot.key.collection,
            id: snapshot.key.id,
            version: snapshot.version,
            update_time: snapshot.update_time,
            data: snapshot.data,
        }
    }
}

/// Raw full-document overwrite
#[derive(Debug, Deserialize)]
pub struct WriteDocumentRequest {
    pub data: Map<String, Value>,
    /// Fields to fill with the commit time
    #[serde(default)]
    pub server_timestamps: Vec<String>,
    /// Apply only at this version (0 = document must not exist)
    #[serde(default)]
    pub if_version: Option<u64>,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Full health status response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status: healthy, unhealthy
    pub status: String,
    /// Document store status
    pub store: String,
    /// Open WebSocket connections
    pub ws_connections: usize,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// Application version
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BloodType;

    #[test]
    fn test_update_status_request_flattens_form() {
        let req: UpdateStatusRequest = serde_json::from_str(
            r#"{"bloodUnits": {"A+": 5}, "icuBeds": 2, "ifVersion": 3}"#,
        )
        .unwrap();
        assert_eq!(req.form.blood_units.get(BloodType::APositive), 5);
        assert_eq!(req.form.blood_units.get(BloodType::ONegative), 0);
        assert_eq!(req.form.icu_beds, 2);
        assert_eq!(req.form.general_beds, 0);
        assert_eq!(req.if_version, Some(3));
    }

    #[test]
    fn test_write_document_request_defaults() {
        let req: WriteDocumentRequest =
            serde_json::from_str(r#"{"data": {"note": "x"}}"#).unwrap();
        assert!(req.server_timestamps.is_empty());
        assert!(req.if_version.is_none());
    }
}
