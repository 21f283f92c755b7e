//! Global Application State
//!
//! Reactive state management using Leptos signals.

use leptos::*;
use std::collections::BTreeMap;

use super::websocket::WebSocketClient;

const TOKEN_KEY: &str = "mediqueue_token";

/// Global application state provided to all components
#[derive(Clone)]
pub struct GlobalState {
    /// Session token, persisted in local storage
    pub token: RwSignal<Option<String>>,
    /// Email of the logged-in user
    pub user: RwSignal<Option<String>>,
    /// Latest dashboard render pushed by the server
    pub dashboard: RwSignal<Option<DashboardRender>>,
    /// Latest resources form render pushed by the server
    pub resources: RwSignal<Option<ResourcesRender>>,
    /// WebSocket connection status
    pub ws_connected: RwSignal<bool>,
    /// Toast currently shown
    pub notification: RwSignal<Option<Notification>>,
    /// Live-view connection, present while logged in
    pub ws: StoredValue<Option<WebSocketClient>>,
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
pub struct BloodUnitCount {
    pub blood_type: String,
    pub units: i64,
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
pub struct DashboardMetrics {
    pub total_blood_units: i64,
    pub oxygen_cylinders: i64,
    pub total_beds: i64,
    pub icu_beds: i64,
    pub general_beds: i64,
    pub doctors_available: i64,
    #[serde(default)]
    pub blood_units: Vec<BloodUnitCount>,
    pub last_updated: String,
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
pub struct DashboardRender {
    pub loading: bool,
    pub greeting: String,
    pub metrics: DashboardMetrics,
}

/// Resource form as the server holds it
#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceForm {
    pub blood_units: BTreeMap<String, i64>,
    pub oxygen_cylinders: i64,
    pub icu_beds: i64,
    pub general_beds: i64,
    pub doctors_available: i64,
}

impl ResourceForm {
    /// Current value of a field path such as `bloodUnits.A+` or `icuBeds`
    pub fn value(&self, field: &str) -> i64 {
        if let Some(blood_type) = field.strip_prefix("bloodUnits.") {
            return self.blood_units.get(blood_type).copied().unwrap_or(0);
        }
        match field {
            "oxygenCylinders" => self.oxygen_cylinders,
            "icuBeds" => self.icu_beds,
            "generalBeds" => self.general_beds,
            "doctorsAvailable" => self.doctors_available,
            _ => 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
pub struct ResourcesRender {
    pub form: ResourceForm,
    pub submitting: bool,
    pub base_version: u64,
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub variant: String,
}

impl Notification {
    pub fn is_error(&self) -> bool {
        self.variant == "destructive"
    }
}

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok()?
}

/// Provide global state to the component tree
pub fn provide_global_state() {
    let token = local_storage().and_then(|s| s.get_item(TOKEN_KEY).ok().flatten());

    let state = GlobalState {
        token: create_rw_signal(token),
        user: create_rw_signal(None),
        dashboard: create_rw_signal(None),
        resources: create_rw_signal(None),
        ws_connected: create_rw_signal(false),
        notification: create_rw_signal(None),
        ws: store_value(None),
    };

    provide_context(state);
}

impl GlobalState {
    pub fn is_logged_in(&self) -> bool {
        self.token.get().is_some()
    }

    /// Remember a session and open the live-view connection
    pub fn sign_in(&self, token: String, email: String) {
        if let Some(storage) = local_storage() {
            let _ = storage.set_item(TOKEN_KEY, &token);
        }
        self.user.set(Some(email));
        self.token.set(Some(token.clone()));
        self.connect(&token);
    }

    /// Forget the session and close the live-view connection
    pub fn sign_out(&self) {
        if let Some(storage) = local_storage() {
            let _ = storage.remove_item(TOKEN_KEY);
        }
        self.ws.update_value(|ws| {
            if let Some(client) = ws.take() {
                client.close();
            }
        });
        self.token.set(None);
        self.user.set(None);
        self.dashboard.set(None);
        self.resources.set(None);
        self.ws_connected.set(false);
    }

    /// Open the live-view connection for a token
    pub fn connect(&self, token: &str) {
        let client = WebSocketClient::new(&crate::api::ws_url(&crate::api::get_api_base(), token));
        client.connect(self.clone());
        self.ws.update_value(|ws| {
            if let Some(previous) = ws.replace(client) {
                previous.close();
            }
        });
    }

    /// Mount a server view; it is re-mounted after reconnects
    pub fn mount(&self, view: &'static str) {
        self.ws.with_value(|ws| {
            if let Some(client) = ws {
                client.mount(view);
            }
        });
    }

    pub fn unmount(&self, view: &'static str) {
        self.ws.with_value(|ws| {
            if let Some(client) = ws {
                client.unmount(view);
            }
        });
    }

    /// Send a client message over the live-view connection
    pub fn send(&self, message: super::websocket::ClientMessage) {
        self.ws.with_value(|ws| match ws {
            Some(client) => {
                if let Err(e) = client.send(&message) {
                    web_sys::console::error_1(&format!("WebSocket send failed: {}", e).into());
                }
            }
            None => web_sys::console::error_1(&"WebSocket not connected".into()),
        });
    }

    /// Show a notification (auto-clears after timeout)
    pub fn notify(&self, notification: Notification) {
        let timeout = if notification.is_error() { 5000 } else { 3000 };
        self.notification.set(Some(notification));

        let signal = self.notification;
        gloo_timers::callback::Timeout::new(timeout, move || {
            signal.set(None);
        })
        .forget();
    }

    /// Show an error toast
    pub fn show_error(&self, title: &str, description: &str) {
        self.notify(Notification {
            title: title.to_string(),
            description: description.to_string(),
            variant: "destructive".to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_value_by_path() {
        let form: ResourceForm = serde_json::from_str(
            r#"{"bloodUnits":{"A+":5,"O-":2},"oxygenCylinders":10,"icuBeds":3,"generalBeds":20,"doctorsAvailable":4}"#,
        )
        .unwrap();

        assert_eq!(form.value("bloodUnits.A+"), 5);
        assert_eq!(form.value("bloodUnits.AB-"), 0);
        assert_eq!(form.value("icuBeds"), 3);
        assert_eq!(form.value("nope"), 0);
    }

    #[test]
    fn test_notification_variant() {
        let n: Notification = serde_json::from_str(
            r#"{"title":"Error","description":"Failed to update resources","variant":"destructive"}"#,
        )
        .unwrap();
        assert!(n.is_error());
    }
}
