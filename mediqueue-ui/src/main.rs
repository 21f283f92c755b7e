//! MediQueue Dashboard
//!
//! Hospital resource dashboard built with Leptos (WASM).
//!
//! # Features
//!
//! - Live resource totals on the dashboard
//! - Resource form with shared, real-time state
//! - Staff login and logout
//!
//! # Architecture
//!
//! This is a client-side rendered (CSR) Leptos application that compiles to
//! WebAssembly. Views are mounted on the MediQueue server over a WebSocket;
//! the server pushes each render and this app only draws it.

use leptos::*;

mod api;
mod app;
mod components;
mod pages;
mod state;

fn main() {
    // Set up panic hook for better error messages in WASM
    console_error_panic_hook::set_once();

    mount_to_body(|| view! { <app::App /> });
}
