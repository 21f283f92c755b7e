//! Pages
//!
//! Top-level page components for each route.

pub mod dashboard;
pub mod login;
pub mod resources;

pub use dashboard::Dashboard;
pub use login::Login;
pub use resources::Resources;
