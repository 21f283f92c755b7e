//! State Management
//!
//! Global application state and the live-view WebSocket connection.

pub mod global;
pub mod websocket;

pub use global::{provide_global_state, DashboardRender, GlobalState, ResourcesRender};
pub use websocket::{ClientMessage, WebSocketClient, WsMessage};
