//! Application state shared by the handlers.

use std::sync::Arc;

use imagehandler_services::ImageHandler;

#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<ImageHandler>,
}

impl AppState {
    pub fn new(handler: ImageHandler) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }
}
