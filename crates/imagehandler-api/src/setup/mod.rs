//! Application setup and initialization
//!
//! Builds the shared image handler from configuration and wires the router.

pub mod routes;
pub mod server;
pub mod services;

use std::sync::Arc;

use anyhow::Result;
use imagehandler_core::Config;

use crate::state::AppState;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    crate::telemetry::init_telemetry();

    tracing::info!(
        environment = %config.environment,
        app_root = %config.app_root.display(),
        "Configuration loaded"
    );

    let state = Arc::new(services::initialize_services(config).await?);
    let router = routes::setup_routes(state.clone());

    Ok((state, router))
}
