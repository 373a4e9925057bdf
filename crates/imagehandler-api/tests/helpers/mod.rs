//! Test helpers: build the router over a temporary application root.
//!
//! Run from workspace root: `cargo test -p imagehandler-api`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum_test::TestServer;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use imagehandler_api::setup::{routes, services};
use imagehandler_core::{Config, HandlerSettings};
use tempfile::TempDir;

/// Test application: server plus the directory it serves from.
pub struct TestApp {
    pub server: TestServer,
    pub root: TempDir,
    pub cache_dir: PathBuf,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Write a solid PNG under the application root.
    pub fn write_png(&self, name: &str, width: u32, height: u32) -> PathBuf {
        let img = RgbaImage::from_pixel(width, height, Rgba([30, 120, 200, 255]));
        let path = self.root.path().join(name);
        DynamicImage::ImageRgba8(img)
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();
        path
    }

    pub fn cache_entries(&self) -> Vec<String> {
        entries(&self.cache_dir)
    }
}

pub fn entries(dir: &Path) -> Vec<String> {
    let Ok(read) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = read
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(HandlerSettings::default()).await
}

pub async fn setup_test_app_with(settings: HandlerSettings) -> TestApp {
    let root = tempfile::tempdir().unwrap();
    let mut config = Config::with_app_root(root.path());
    config.settings = settings;
    let cache_dir = config.server_cache_root();

    let state = Arc::new(services::initialize_services(config).await.unwrap());
    let server = TestServer::new(routes::setup_routes(state)).unwrap();

    TestApp {
        server,
        root,
        cache_dir,
    }
}

pub fn decode(bytes: &[u8]) -> DynamicImage {
    image::load_from_memory(bytes).unwrap()
}
