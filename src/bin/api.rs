//! MediQueue API Server
//!
//! Run with: cargo run --bin mediqueue-api
//!
//! # Configuration
//!
//! Reads `config.toml` from the usual locations (see `mediqueue init-config`),
//! or the file passed as the first argument. Environment overrides:
//! - `MEDIQUEUE_DATA_DIR`: Directory holding the document database
//! - `MEDIQUEUE_API_HOST`: Host to bind to (default: 0.0.0.0)
//! - `MEDIQUEUE_API_PORT`: Port to listen on (default: 8085)
//! - `MEDIQUEUE_CONFLICT_POLICY`: `last_write_wins` or `reject_stale`
//! - `MEDIQUEUE_LOG_LEVEL`: Log level (default: info)
//! - `MEDIQUEUE_LOG_FORMAT`: `pretty` or `json`
//! - `RUST_LOG`: Full filter directive, overrides the log level

use mediqueue::api::{serve, AppState};
use mediqueue::auth::StaffDirectory;
use mediqueue::config::{Config, LoggingConfig};
use mediqueue::store::SqliteDocumentStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => Config::load_with_env(&path)?,
        None => Config::load_default(),
    };

    init_tracing(&config.logging);

    tracing::info!("Starting MediQueue API server v{}", env!("CARGO_PKG_VERSION"));

    // Open the document store
    let db_path = config.storage.database_path();
    tracing::info!("Database: {:?}", db_path);
    let store = Arc::new(
        SqliteDocumentStore::open(&db_path)?.with_feed_capacity(config.storage.feed_capacity),
    );

    let auth = Arc::new(StaffDirectory::new(
        &config.auth.staff,
        config.auth.session_ttl_secs,
    ));
    tracing::info!("Staff accounts: {}", config.auth.staff.len());
    tracing::info!("Conflict policy: {}", config.resources.conflict_policy);

    let state = AppState::new(store, auth, config.api.clone())
        .with_conflict_policy(config.resources.conflict_policy);

    // Run server
    serve(state, &config.api).await?;

    tracing::info!("MediQueue API server stopped");
    Ok(())
}

/// Install the global subscriber: `RUST_LOG` wins over the configured level
fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("mediqueue={},tower_http=debug", logging.level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);

    if logging.format.eq_ignore_ascii_case("json") {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
