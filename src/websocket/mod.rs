//! WebSocket Live Views
//!
//! Pushes view renders and document snapshots to dashboard clients.
//!
//! ## Architecture
//!
//! - **ConnectionHub**: Tracks connections, their mounted views and document subscriptions
//! - **Handler**: Authenticates the upgrade and dispatches client messages
//! - **Messages**: Defines client and server message formats
//!
//! ## Usage
//!
//! Clients connect to `/api/v1/ws?token=<session token>` and mount views:
//! - `dashboard` - read-only metrics, re-rendered on every status change
//! - `resources` - editable form, driven by `edit` and `submit`
//!
//! Closing the socket unmounts everything the connection had open.
//!
//! ## Example
//!
//! ```javascript
//! // Browser
//! const ws = new WebSocket('ws://localhost:8085/api/v1/ws?token=' + token);
//!
//! ws.onopen = () => {
//!   ws.send(JSON.stringify({type: 'mount', view: 'dashboard'}));
//! };
//!
//! ws.onmessage = (event) => {
//!   const msg = JSON.parse(event.data);
//!   console.log('Received:', msg);
//! };
//! ```

mod handler;
mod hub;
mod messages;

pub use handler::{websocket_handler, WsParams};
pub use hub::{ConnectionHub, ConnectionId, HubConfig, HubError};
pub use messages::{input_text, ClientMessage, ServerMessage, ViewKind};
