//! Handler construction: fonts, page capture, HTTP client and server cache.

use std::sync::Arc;

use anyhow::{Context, Result};
use imagehandler_core::Config;
use imagehandler_processing::{FontLibrary, HttpPageCapture, PageCapture, UnavailableCapture};
use imagehandler_services::{ImageHandler, TransformRegistry};
use imagehandler_storage::{DiskImageStore, ImageStore};

use crate::state::AppState;

pub async fn initialize_services(config: Config) -> Result<AppState> {
    let fonts = Arc::new(FontLibrary::new(
        config.font_dir.clone(),
        config.default_font.clone(),
    ));
    if config.font_dir.is_none() {
        tracing::warn!("IMAGEHANDLER_FONT_DIR not set, text rendering is disabled");
    }

    let http = reqwest::Client::builder()
        .user_agent(concat!("imagehandler/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;

    let capture: Arc<dyn PageCapture> = match &config.capture_endpoint {
        Some(endpoint) => {
            tracing::info!(endpoint = %endpoint, "Page capture enabled");
            Arc::new(HttpPageCapture::new(endpoint.clone(), http.clone()))
        }
        None => Arc::new(UnavailableCapture),
    };

    let store = setup_store(&config).await;
    let registry = TransformRegistry::new(fonts, http, capture);

    Ok(AppState::new(ImageHandler::new(config, store, registry)))
}

/// Open the disk cache. A cache that cannot be created degrades to rendering
/// every request.
async fn setup_store(config: &Config) -> Option<Arc<dyn ImageStore>> {
    let root = config.server_cache_root();
    match DiskImageStore::new(&root, config.settings.locking).await {
        Ok(store) => {
            tracing::info!(
                path = %root.display(),
                locking = ?config.settings.locking,
                "Server cache ready"
            );
            Some(Arc::new(store))
        }
        Err(e) => {
            tracing::warn!(
                path = %root.display(),
                error = %e,
                "Cannot create server cache directory, running without server cache"
            );
            None
        }
    }
}
