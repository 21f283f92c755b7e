//! WebSocket Client
//!
//! Live-view connection to the MediQueue server. Pages mount views by name
//! and the server pushes a fresh render on every change.

use leptos::*;
use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CloseEvent, MessageEvent, WebSocket};

use super::global::{DashboardRender, GlobalState, Notification, ResourcesRender};

const MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// WebSocket message types from server
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    Connected {
        connection_id: String,
        user: String,
    },
    Dashboard(DashboardRender),
    Resources(ResourcesRender),
    Notification(Notification),
    Mounted {
        view: String,
    },
    Unmounted {
        view: String,
    },
    Pong,
    Error {
        message: String,
    },
    #[serde(other)]
    Other,
}

/// WebSocket client message types
#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Mount { view: String },
    Unmount { view: String },
    Edit { field: String, value: String },
    Submit,
    Ping,
}

/// WebSocket client for live views
#[derive(Clone)]
pub struct WebSocketClient {
    ws: Rc<RefCell<Option<WebSocket>>>,
    url: String,
    reconnect_attempts: Rc<Cell<u32>>,
    /// Views the pages want mounted
    views: Rc<RefCell<BTreeSet<&'static str>>>,
    closed: Rc<Cell<bool>>,
}

impl WebSocketClient {
    pub fn new(url: &str) -> Self {
        Self {
            ws: Rc::new(RefCell::new(None)),
            url: url.to_string(),
            reconnect_attempts: Rc::new(Cell::new(0)),
            views: Rc::new(RefCell::new(BTreeSet::new())),
            closed: Rc::new(Cell::new(false)),
        }
    }

    /// Connect to the WebSocket server
    pub fn connect(&self, state: GlobalState) {
        match WebSocket::new(&self.url) {
            Ok(ws) => {
                self.setup_handlers(&ws, state);
                *self.ws.borrow_mut() = Some(ws);
            }
            Err(e) => {
                web_sys::console::error_1(&format!("WebSocket connection failed: {:?}", e).into());
                self.schedule_reconnect(state);
            }
        }
    }

    fn setup_handlers(&self, ws: &WebSocket, state: GlobalState) {
        // Browsers hide the upgrade status; a socket that never opens may
        // mean the server rejected the token
        let opened = Rc::new(Cell::new(false));

        // On open
        let state_clone = state.clone();
        let reconnect = Rc::clone(&self.reconnect_attempts);
        let opened_clone = Rc::clone(&opened);
        let on_open = Closure::wrap(Box::new(move |_: JsValue| {
            web_sys::console::log_1(&"WebSocket connected".into());
            opened_clone.set(true);
            state_clone.ws_connected.set(true);
            reconnect.set(0);
        }) as Box<dyn FnMut(JsValue)>);
        ws.set_onopen(Some(on_open.as_ref().unchecked_ref()));
        on_open.forget();

        // On message
        let state_clone = state.clone();
        let client = self.clone();
        let on_message = Closure::wrap(Box::new(move |event: MessageEvent| {
            if let Ok(text) = event.data().dyn_into::<js_sys::JsString>() {
                let text: String = text.into();
                client.handle_message(&text, &state_clone);
            }
        }) as Box<dyn FnMut(MessageEvent)>);
        ws.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
        on_message.forget();

        // On close
        let client = self.clone();
        let on_close = Closure::wrap(Box::new(move |event: CloseEvent| {
            web_sys::console::log_1(
                &format!("WebSocket closed: code={}, reason={}", event.code(), event.reason()).into(),
            );
            state.ws_connected.set(false);
            if client.closed.get() {
                return;
            }
            if opened.get() {
                client.schedule_reconnect(state.clone());
                return;
            }

            let client = client.clone();
            let state = state.clone();
            spawn_local(async move {
                let token = state.token.get_untracked();
                let valid = match &token {
                    Some(token) => crate::api::session_valid(token).await,
                    None => Some(false),
                };
                if valid == Some(false) {
                    web_sys::console::log_1(&"Session no longer valid, signing out".into());
                    state.sign_out();
                    state.show_error("Session expired", "Please log in again");
                } else {
                    client.schedule_reconnect(state);
                }
            });
        }) as Box<dyn FnMut(CloseEvent)>);
        ws.set_onclose(Some(on_close.as_ref().unchecked_ref()));
        on_close.forget();

        // On error
        let on_error = Closure::wrap(Box::new(move |e: JsValue| {
            web_sys::console::error_1(&format!("WebSocket error: {:?}", e).into());
        }) as Box<dyn FnMut(JsValue)>);
        ws.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        on_error.forget();
    }

    fn schedule_reconnect(&self, state: GlobalState) {
        let attempts = self.reconnect_attempts.get();
        if attempts >= MAX_RECONNECT_ATTEMPTS {
            web_sys::console::error_1(&"Max reconnect attempts reached".into());
            return;
        }

        let delay = (2_u32.pow(attempts) * 1000).min(30000);
        self.reconnect_attempts.set(attempts + 1);

        let client = self.clone();
        gloo_timers::callback::Timeout::new(delay, move || {
            if !client.closed.get() {
                web_sys::console::log_1(&format!("Attempting reconnect (attempt {})", attempts + 1).into());
                client.connect(state);
            }
        })
        .forget();
    }

    fn handle_message(&self, text: &str, state: &GlobalState) {
        match serde_json::from_str::<WsMessage>(text) {
            Ok(WsMessage::Connected { connection_id, user }) => {
                web_sys::console::log_1(&format!("Connected with ID: {}", connection_id).into());
                state.user.set(Some(user));
                // Fresh server connection: nothing is mounted there yet
                let views: Vec<_> = self.views.borrow().iter().copied().collect();
                for view in views {
                    let _ = self.send(&ClientMessage::Mount { view: view.to_string() });
                }
            }
            Ok(WsMessage::Dashboard(render)) => state.dashboard.set(Some(render)),
            Ok(WsMessage::Resources(render)) => state.resources.set(Some(render)),
            Ok(WsMessage::Notification(notification)) => state.notify(notification),
            Ok(WsMessage::Mounted { view }) | Ok(WsMessage::Unmounted { view }) => {
                web_sys::console::log_1(&format!("View update: {}", view).into());
            }
            Ok(WsMessage::Pong) | Ok(WsMessage::Other) => {}
            Ok(WsMessage::Error { message }) => {
                web_sys::console::error_1(&format!("Server error: {}", message).into());
            }
            Err(e) => {
                web_sys::console::error_1(&format!("Failed to parse WebSocket message: {}", e).into());
            }
        }
    }

    /// Send a message to the server
    pub fn send(&self, message: &ClientMessage) -> Result<(), String> {
        let ws_guard = self.ws.borrow();
        let ws = ws_guard.as_ref().ok_or("WebSocket not connected")?;
        if ws.ready_state() != WebSocket::OPEN {
            return Err("WebSocket not open".to_string());
        }

        let json = serde_json::to_string(message).map_err(|e| e.to_string())?;
        ws.send_with_str(&json).map_err(|e| format!("{:?}", e))
    }

    /// Mount a view now if connected, otherwise once the server greets us
    pub fn mount(&self, view: &'static str) {
        if self.views.borrow_mut().insert(view) {
            let _ = self.send(&ClientMessage::Mount { view: view.to_string() });
        }
    }

    pub fn unmount(&self, view: &'static str) {
        if self.views.borrow_mut().remove(view) {
            let _ = self.send(&ClientMessage::Unmount { view: view.to_string() });
        }
    }

    /// Close the connection for good
    pub fn close(&self) {
        self.closed.set(true);
        if let Some(ws) = self.ws.borrow().as_ref() {
            let _ = ws.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_shape() {
        let json = serde_json::to_value(ClientMessage::Edit {
            field: "bloodUnits.A+".to_string(),
            value: "5".to_string(),
        })
        .unwrap();
        assert_eq!(json["type"], "edit");
        assert_eq!(json["field"], "bloodUnits.A+");

        let json = serde_json::to_value(ClientMessage::Mount { view: "dashboard".to_string() }).unwrap();
        assert_eq!(json, serde_json::json!({"type": "mount", "view": "dashboard"}));
    }

    #[test]
    fn test_parse_dashboard_render() {
        let text = r#"{"type":"dashboard","loading":false,"greeting":"Welcome back, Ada",
            "metrics":{"total_blood_units":23,"oxygen_cylinders":4,"total_beds":46,"icu_beds":6,
            "general_beds":40,"doctors_available":3,"blood_units":[{"blood_type":"A+","units":23}],
            "last_updated":"Never"}}"#;
        match serde_json::from_str::<WsMessage>(text).unwrap() {
            WsMessage::Dashboard(render) => {
                assert_eq!(render.metrics.total_beds, 46);
                assert_eq!(render.metrics.blood_units[0].blood_type, "A+");
            }
            other => panic!("Expected dashboard, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_unknown_message() {
        let text = r#"{"type":"subscribed","collection":"hospitalData","document":"status"}"#;
        assert!(matches!(serde_json::from_str::<WsMessage>(text).unwrap(), WsMessage::Other));
    }
}
