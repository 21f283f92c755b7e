//! HTTP API access

pub mod client;

pub use client::{get_api_base, login, logout, session_valid, ws_url, LoginResponse, LogoutOutcome};
