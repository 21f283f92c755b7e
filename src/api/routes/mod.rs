//! API Routes
//!
//! Route handlers organized by functionality.

pub mod auth;
pub mod documents;
pub mod health;
pub mod status;
