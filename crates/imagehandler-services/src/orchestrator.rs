//! Request orchestration: source, pipeline, fingerprint, cache, reply.
//!
//! Every failure past settings parsing is recovered here. A pipeline that
//! cannot be built or that fails while running is replaced by the fallback
//! image, which is served uncached and without client cache headers.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use imagehandler_core::{AppError, CacheId, Config, Fingerprint, HandlerSettings, RequestParams};
use imagehandler_processing::codec;
use imagehandler_processing::{OutputFormat, Pipeline, ProcessingError, ProcessingResult};
use imagehandler_storage::{EntryBinding, ImageStore};

use crate::registry::{has_generator, output_format, TransformRegistry};
use crate::source::{modified_at, resolve_file, resolve_source};

const FALLBACK_MIME: &str = "image/png";

/// Client revalidation headers of a request.
#[derive(Debug, Clone, Default)]
pub struct ConditionalHeaders {
    pub if_none_match: Option<String>,
    pub if_modified_since: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyStatus {
    Ok,
    NotModified,
}

/// Validator and lifetime headers for a cacheable reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCache {
    pub etag: CacheId,
    pub last_modified: DateTime<Utc>,
    pub expires: DateTime<Utc>,
    pub max_age: Duration,
}

#[derive(Debug, Clone)]
pub struct ImageReply {
    pub status: ReplyStatus,
    pub body: Bytes,
    pub content_type: &'static str,
    /// `None` means the client must not cache the reply.
    pub client_cache: Option<ClientCache>,
}

/// What a request resolves to before any pixels are touched.
enum Plan {
    Render {
        pipeline: Pipeline,
        format: OutputFormat,
    },
    /// Nothing to render: no source and no generator, or an unsupported
    /// output format.
    Fallback,
}

impl Plan {
    fn fragments(&self) -> Vec<String> {
        match self {
            Plan::Render { pipeline, .. } => pipeline.fragments(),
            Plan::Fallback => Vec::new(),
        }
    }
}

pub struct ImageHandler {
    config: Config,
    store: Option<Arc<dyn ImageStore>>,
    registry: TransformRegistry,
}

impl ImageHandler {
    /// `store` is `None` when the server cache could not be set up; requests
    /// are then served as if the server cache were disabled.
    pub fn new(config: Config, store: Option<Arc<dyn ImageStore>>, registry: TransformRegistry) -> Self {
        Self {
            config,
            store,
            registry,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shared settings with this request's overrides applied.
    pub fn effective_settings(&self, params: &RequestParams) -> HandlerSettings {
        let mut settings = self.config.settings.clone();
        if params.has("nocache") {
            settings.enable_client_cache = false;
            settings.enable_server_cache = false;
        }
        if let Some(seconds) = params.parse_lenient::<u64>("cachetime") {
            settings.set_cache_time(Duration::from_secs(seconds));
        }
        settings
    }

    pub async fn handle(
        &self,
        params: &RequestParams,
        conditional: &ConditionalHeaders,
    ) -> Result<ImageReply, AppError> {
        self.handle_at(params, conditional, Utc::now()).await
    }

    /// Serve a request as of `now`.
    pub async fn handle_at(
        &self,
        params: &RequestParams,
        conditional: &ConditionalHeaders,
        now: DateTime<Utc>,
    ) -> Result<ImageReply, AppError> {
        let start = Instant::now();
        let settings = self.effective_settings(params);
        let source = resolve_source(params, &self.config.app_root).await;

        let plan = match self.plan(params, &settings, source.as_deref()) {
            Ok(plan) => plan,
            Err(e) => {
                tracing::warn!(error = %e, "Cannot build transform pipeline, serving fallback image");
                return self.uncached_fallback(params).await;
            }
        };

        let id = Fingerprint::compute(&self.config.fingerprint_seed, params, plan.fragments());
        let content_type = match &plan {
            Plan::Render { format, .. } => format.mime_type(),
            Plan::Fallback => self.fallback_content_type(params).await,
        };

        if settings.enable_client_cache
            && is_not_modified(&id, conditional, &settings, source.as_deref(), now).await
        {
            tracing::debug!(id = %id, "Client copy still valid");
            let since = conditional.if_modified_since.unwrap_or(now);
            return Ok(ImageReply {
                status: ReplyStatus::NotModified,
                body: Bytes::new(),
                content_type,
                client_cache: Some(client_cache(&id, since, now, &settings)),
            });
        }

        let store = self.store.as_ref().filter(|_| settings.enable_server_cache);

        if let Some(store) = store {
            if let Some(hit) = store.try_serve(&id, source.as_deref(), now).await {
                tracing::info!(
                    id = %id,
                    size_bytes = hit.bytes.len(),
                    duration_ms = start.elapsed().as_millis(),
                    "Served image from cache"
                );
                return Ok(self.reply(&id, hit.bytes, content_type, hit.last_modified, now, &settings));
            }
        }

        let bytes = match plan {
            Plan::Fallback => {
                tracing::debug!(id = %id, "Nothing to render, serving fallback image");
                self.fallback_bytes(params).await?
            }
            Plan::Render { pipeline, format } => {
                match render(&pipeline, format, source.as_deref(), settings.image_compression).await {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        tracing::warn!(
                            id = %id,
                            error = %e,
                            steps = ?pipeline.names(),
                            "Transform pipeline failed, serving fallback image"
                        );
                        return self.uncached_fallback(params).await;
                    }
                }
            }
        };

        if let Some(store) = store {
            let binding = match source {
                Some(_) => EntryBinding::Source,
                None => EntryBinding::Expires(after(now, settings.server_cache_expiration)),
            };
            store.store(&id, bytes.clone(), binding).await;
        }

        tracing::info!(
            id = %id,
            size_bytes = bytes.len(),
            content_type,
            duration_ms = start.elapsed().as_millis(),
            "Rendered image"
        );
        Ok(self.reply(&id, bytes, content_type, now, now, &settings))
    }

    fn plan(
        &self,
        params: &RequestParams,
        settings: &HandlerSettings,
        source: Option<&Path>,
    ) -> ProcessingResult<Plan> {
        if source.is_none() && !has_generator(params) {
            return Ok(Plan::Fallback);
        }
        let format = match output_format(params, source) {
            Ok(format) => format,
            Err(e) => {
                tracing::debug!(error = %e, "Unsupported output format");
                return Ok(Plan::Fallback);
            }
        };
        let pipeline = self.registry.build(params, settings)?;
        Ok(Plan::Render { pipeline, format })
    }

    fn reply(
        &self,
        id: &CacheId,
        body: Bytes,
        content_type: &'static str,
        last_modified: DateTime<Utc>,
        now: DateTime<Utc>,
        settings: &HandlerSettings,
    ) -> ImageReply {
        ImageReply {
            status: ReplyStatus::Ok,
            body,
            content_type,
            client_cache: settings
                .enable_client_cache
                .then(|| client_cache(id, last_modified, now, settings)),
        }
    }

    async fn uncached_fallback(&self, params: &RequestParams) -> Result<ImageReply, AppError> {
        Ok(ImageReply {
            status: ReplyStatus::Ok,
            body: self.fallback_bytes(params).await?,
            content_type: self.fallback_content_type(params).await,
            client_cache: None,
        })
    }

    async fn fallback_file(&self, params: &RequestParams) -> Option<PathBuf> {
        let raw = params.get("defaultimage")?;
        resolve_file(raw.trim(), &self.config.app_root).await
    }

    async fn fallback_content_type(&self, params: &RequestParams) -> &'static str {
        self.fallback_file(params)
            .await
            .and_then(|path| OutputFormat::from_path(&path))
            .map(|format| format.mime_type())
            .unwrap_or(FALLBACK_MIME)
    }

    /// The `defaultimage` file, else a 1x1 transparent PNG.
    async fn fallback_bytes(&self, params: &RequestParams) -> Result<Bytes, AppError> {
        if let Some(path) = self.fallback_file(params).await {
            match tokio::fs::read(&path).await {
                Ok(data) => return Ok(Bytes::from(data)),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Cannot read fallback image");
                }
            }
        }
        codec::empty_image().map_err(|e| AppError::Internal(format!("Cannot encode empty image: {}", e)))
    }
}

/// Decode the source (or start blank), run the pipeline, encode the result.
async fn render(
    pipeline: &Pipeline,
    format: OutputFormat,
    source: Option<&Path>,
    quality: u8,
) -> ProcessingResult<Bytes> {
    let initial = match source {
        Some(path) => {
            let data = tokio::fs::read(path).await?;
            blocking(move || codec::decode(&data)).await?
        }
        None => codec::blank_canvas(),
    };
    let image = pipeline.execute(initial).await?;
    blocking(move || codec::encode(&image, format, quality)).await
}

async fn blocking<T, F>(work: F) -> ProcessingResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> ProcessingResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ProcessingError::TaskFailed(e.to_string()))?
}

fn client_cache(
    id: &CacheId,
    last_modified: DateTime<Utc>,
    now: DateTime<Utc>,
    settings: &HandlerSettings,
) -> ClientCache {
    ClientCache {
        etag: id.clone(),
        last_modified,
        expires: after(now, settings.client_cache_expiration),
        max_age: settings.client_cache_expiration,
    }
}

/// `at + lifetime`, saturating.
fn after(at: DateTime<Utc>, lifetime: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(lifetime)
        .ok()
        .and_then(|delta| at.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Strip weak markers and quotes from one `If-None-Match` entry.
fn bare_etag(raw: &str) -> &str {
    let raw = raw.trim();
    let raw = raw.strip_prefix("W/").unwrap_or(raw);
    raw.trim_matches('"')
}

/// Both validators must be present and agree with the current entry.
async fn is_not_modified(
    id: &CacheId,
    conditional: &ConditionalHeaders,
    settings: &HandlerSettings,
    source: Option<&Path>,
    now: DateTime<Utc>,
) -> bool {
    let (Some(if_none_match), Some(since)) =
        (conditional.if_none_match.as_deref(), conditional.if_modified_since)
    else {
        return false;
    };

    if !if_none_match.split(',').any(|tag| bare_etag(tag) == id.as_str()) {
        return false;
    }
    if after(since, settings.client_cache_expiration) <= now {
        return false;
    }
    if let Some(path) = source {
        // HTTP dates carry whole seconds.
        match modified_at(path).await {
            Some(modified) if modified.timestamp() <= since.timestamp() => {}
            _ => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GenericImageView, ImageFormat, Rgba, RgbaImage};
    use imagehandler_processing::{FontLibrary, UnavailableCapture};
    use imagehandler_storage::DiskImageStore;
    use std::io::Cursor;
    use tempfile::TempDir;

    struct Fixture {
        root: TempDir,
        cache_dir: PathBuf,
        handler: ImageHandler,
    }

    async fn fixture_with(settings: HandlerSettings) -> Fixture {
        let root = tempfile::tempdir().unwrap();
        let mut config = Config::with_app_root(root.path());
        config.settings = settings;
        let cache_dir = config.server_cache_root();
        let store = DiskImageStore::new(&cache_dir, config.settings.locking)
            .await
            .unwrap();
        let registry = TransformRegistry::new(
            Arc::new(FontLibrary::empty()),
            reqwest::Client::new(),
            Arc::new(UnavailableCapture),
        );
        Fixture {
            root,
            cache_dir,
            handler: ImageHandler::new(config, Some(Arc::new(store)), registry),
        }
    }

    async fn fixture() -> Fixture {
        fixture_with(HandlerSettings::default()).await
    }

    impl Fixture {
        fn write_png(&self, name: &str, width: u32, height: u32) -> PathBuf {
            let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([200, 10, 10, 255])));
            let path = self.root.path().join(name);
            img.save_with_format(&path, ImageFormat::Png).unwrap();
            path
        }

        fn cache_entries(&self) -> Vec<String> {
            let mut names: Vec<String> = std::fs::read_dir(&self.cache_dir)
                .unwrap()
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .collect();
            names.sort();
            names
        }

        async fn get(&self, pairs: &[(&str, &str)]) -> ImageReply {
            self.handler
                .handle(&params(pairs), &ConditionalHeaders::default())
                .await
                .unwrap()
        }
    }

    fn params(pairs: &[(&str, &str)]) -> RequestParams {
        RequestParams::from_pairs(pairs.iter().copied())
    }

    fn decode(bytes: &[u8]) -> DynamicImage {
        image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .unwrap()
            .decode()
            .unwrap()
    }

    #[tokio::test]
    async fn test_resize_is_rendered_then_served_from_cache() {
        let fx = fixture().await;
        fx.write_png("photo.png", 200, 100);

        let first = fx.get(&[("file", "photo.png"), ("width", "100")]).await;
        assert_eq!(first.status, ReplyStatus::Ok);
        assert_eq!(first.content_type, "image/png");
        assert_eq!(decode(&first.body).dimensions(), (100, 50));

        let id = first.client_cache.as_ref().unwrap().etag.clone();
        assert_eq!(fx.cache_entries(), vec![format!("{}.tmp", id)]);

        let second = fx.get(&[("width", "100"), ("file", "photo.png")]).await;
        assert_eq!(second.body, first.body);
        assert_eq!(second.client_cache.unwrap().etag, id);
        assert_eq!(fx.cache_entries().len(), 1);
    }

    #[tokio::test]
    async fn test_hit_returns_stored_bytes() {
        let fx = fixture().await;
        fx.write_png("photo.png", 20, 20);
        let first = fx.get(&[("file", "photo.png"), ("greyscale", "1")]).await;
        let id = first.client_cache.unwrap().etag;

        // Rewriting the entry makes it newer than the source, so it is served as-is.
        std::fs::write(fx.cache_dir.join(format!("{}.tmp", id)), b"cached").unwrap();
        let second = fx.get(&[("file", "photo.png"), ("greyscale", "1")]).await;
        assert_eq!(&second.body[..], b"cached");
    }

    #[tokio::test]
    async fn test_no_source_serves_fallback_without_pipeline() {
        let fx = fixture().await;
        let reply = fx.get(&[("width", "100")]).await;
        assert_eq!(reply.status, ReplyStatus::Ok);
        assert_eq!(reply.content_type, "image/png");
        assert_eq!(reply.body, codec::empty_image().unwrap());
        assert_eq!(decode(&reply.body).dimensions(), (1, 1));
    }

    #[tokio::test]
    async fn test_default_image_replaces_empty_fallback() {
        let fx = fixture().await;
        let gif = fx.root.path().join("missing.gif");
        DynamicImage::ImageRgba8(RgbaImage::new(3, 3))
            .save_with_format(&gif, ImageFormat::Gif)
            .unwrap();

        let reply = fx.get(&[("file", "nope.png"), ("defaultimage", "missing.gif")]).await;
        assert_eq!(reply.content_type, "image/gif");
        assert_eq!(&reply.body[..], &std::fs::read(&gif).unwrap()[..]);
    }

    #[tokio::test]
    async fn test_failed_pipeline_serves_uncached_fallback() {
        let fx = fixture().await;
        fx.write_png("photo.png", 20, 20);
        // No fonts are available, so the watermark step fails.
        let reply = fx
            .get(&[("file", "photo.png"), ("width", "10"), ("watermarktext", "(c)")])
            .await;
        assert_eq!(reply.content_type, "image/png");
        assert_eq!(reply.body, codec::empty_image().unwrap());
        assert!(reply.client_cache.is_none());
        assert!(fx.cache_entries().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_parameter_serves_fallback() {
        let fx = fixture().await;
        fx.write_png("photo.png", 20, 20);
        let reply = fx.get(&[("file", "photo.png"), ("width", "huge")]).await;
        assert_eq!(reply.body, codec::empty_image().unwrap());
        assert!(fx.cache_entries().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_format_serves_fallback() {
        let fx = fixture().await;
        fx.write_png("photo.png", 20, 20);
        let reply = fx.get(&[("file", "photo.png"), ("format", "tiff")]).await;
        assert_eq!(reply.body, codec::empty_image().unwrap());
    }

    #[tokio::test]
    async fn test_oversized_output_serves_fallback() {
        let fx = fixture().await;
        fx.write_png("photo.png", 20, 20);
        fx.write_png("digits.png", 40, 4);

        for pairs in [
            vec![("placeholder", "1"), ("width", "4294967295")],
            vec![("placeholder", "1"), ("width", "100000")],
            vec![("file", "photo.png"), ("width", "10"), ("border", "3000000000")],
            vec![("file", "photo.png"), ("width", "100000")],
            vec![("barcode", "1"), ("type", "qrcode"), ("content", "x"), ("border", "4294967295")],
            vec![("file", "digits.png"), ("counter", "7"), ("digits", "100000000")],
        ] {
            let reply = fx.get(&pairs).await;
            assert_eq!(reply.body, codec::empty_image().unwrap(), "{:?}", pairs);
            assert!(reply.client_cache.is_none(), "{:?}", pairs);
        }
        assert!(fx.cache_entries().is_empty());
    }

    #[tokio::test]
    async fn test_max_dimension_setting_bounds_output() {
        let fx = fixture_with(HandlerSettings {
            max_dimension: 64,
            ..HandlerSettings::default()
        })
        .await;
        let small = fx.get(&[("placeholder", "1"), ("width", "64")]).await;
        assert_eq!(decode(&small.body).dimensions(), (64, 64));

        let large = fx.get(&[("placeholder", "1"), ("width", "65")]).await;
        assert_eq!(large.body, codec::empty_image().unwrap());
    }

    #[tokio::test]
    async fn test_maxwidth_above_source_keeps_source_width() {
        let fx = fixture().await;
        fx.write_png("photo.png", 200, 100);
        let reply = fx.get(&[("file", "photo.png"), ("maxwidth", "1000")]).await;
        assert_eq!(reply.status, ReplyStatus::Ok);
        assert_eq!(decode(&reply.body).dimensions(), (200, 100));

        let clamped = fx.get(&[("file", "photo.png"), ("maxwidth", "50")]).await;
        assert_eq!(decode(&clamped.body).dimensions(), (50, 25));
    }

    #[tokio::test]
    async fn test_indexed_source_is_source_bound() {
        let fx = fixture().await;
        std::fs::create_dir(fx.root.path().join("gallery")).unwrap();
        fx.write_png("gallery/a.png", 10, 10);
        fx.write_png("gallery/b.png", 30, 20);

        let reply = fx
            .get(&[("path", "gallery"), ("index", "1"), ("greyscale", "1")])
            .await;
        assert_eq!(decode(&reply.body).dimensions(), (30, 20));

        let id = reply.client_cache.unwrap().etag;
        assert_eq!(fx.cache_entries(), vec![format!("{}.tmp", id)]);
    }

    #[tokio::test]
    async fn test_generator_without_source_is_ttl_bound() {
        let fx = fixture().await;
        let reply = fx.get(&[("placeholder", "1"), ("width", "24")]).await;
        assert_eq!(reply.content_type, "image/jpeg");
        assert_eq!(decode(&reply.body).dimensions(), (24, 24));

        let entries = fx.cache_entries();
        assert_eq!(entries.len(), 1);
        let id = reply.client_cache.unwrap().etag;
        assert!(entries[0].starts_with(&format!("{}_", id)));
    }

    #[tokio::test]
    async fn test_nocache_skips_both_caches() {
        let fx = fixture().await;
        fx.write_png("photo.png", 20, 20);
        let reply = fx.get(&[("file", "photo.png"), ("nocache", "1")]).await;
        assert!(reply.client_cache.is_none());
        assert!(fx.cache_entries().is_empty());
        // Shared settings are untouched.
        assert!(fx.handler.config().settings.enable_server_cache);
    }

    #[tokio::test]
    async fn test_cachetime_overrides_lifetimes() {
        let fx = fixture().await;
        let settings = fx.handler.effective_settings(&params(&[("cachetime", "60")]));
        assert_eq!(settings.client_cache_expiration, Duration::from_secs(60));
        assert_eq!(settings.server_cache_expiration, Duration::from_secs(60));
        assert_eq!(
            fx.handler.config().settings.server_cache_expiration,
            Duration::from_secs(1200)
        );
    }

    #[tokio::test]
    async fn test_client_cache_headers() {
        let fx = fixture().await;
        fx.write_png("photo.png", 20, 20);
        let now = Utc::now();
        let reply = fx
            .handler
            .handle_at(&params(&[("file", "photo.png")]), &ConditionalHeaders::default(), now)
            .await
            .unwrap();
        let cache = reply.client_cache.unwrap();
        assert_eq!(cache.max_age, Duration::from_secs(3600));
        assert_eq!(cache.expires, now + chrono::Duration::seconds(3600));
        assert_eq!(cache.last_modified, now);
    }

    #[tokio::test]
    async fn test_revalidation() {
        let fx = fixture().await;
        let source = fx.write_png("photo.png", 20, 20);
        let request = params(&[("file", "photo.png")]);
        let first = fx.get(&[("file", "photo.png")]).await;
        let id = first.client_cache.unwrap().etag;

        let since = modified_at(&source).await.unwrap() + chrono::Duration::seconds(1);
        let now = since + chrono::Duration::seconds(10);
        let both = ConditionalHeaders {
            if_none_match: Some(format!("\"{}\"", id)),
            if_modified_since: Some(since),
        };
        let reply = fx.handler.handle_at(&request, &both, now).await.unwrap();
        assert_eq!(reply.status, ReplyStatus::NotModified);
        assert!(reply.body.is_empty());

        // Only one validator: serve fresh.
        let partial = ConditionalHeaders {
            if_none_match: Some(id.to_string()),
            if_modified_since: None,
        };
        let reply = fx.handler.handle_at(&request, &partial, now).await.unwrap();
        assert_eq!(reply.status, ReplyStatus::Ok);

        // Different validator.
        let other = ConditionalHeaders {
            if_none_match: Some("\"ABC\"".to_string()),
            ..both.clone()
        };
        let reply = fx.handler.handle_at(&request, &other, now).await.unwrap();
        assert_eq!(reply.status, ReplyStatus::Ok);

        // Client copy older than the client cache lifetime.
        let late = since + chrono::Duration::seconds(3601);
        let reply = fx.handler.handle_at(&request, &both, late).await.unwrap();
        assert_eq!(reply.status, ReplyStatus::Ok);

        // Source changed after the client copy.
        let stale = ConditionalHeaders {
            if_modified_since: Some(since - chrono::Duration::seconds(2)),
            ..both.clone()
        };
        let reply = fx.handler.handle_at(&request, &stale, now).await.unwrap();
        assert_eq!(reply.status, ReplyStatus::Ok);
    }

    #[tokio::test]
    async fn test_disabled_client_cache_sends_no_headers() {
        let settings = HandlerSettings {
            enable_client_cache: false,
            ..HandlerSettings::default()
        };
        let fx = fixture_with(settings).await;
        let reply = fx.get(&[("placeholder", "1"), ("width", "8")]).await;
        assert!(reply.client_cache.is_none());
    }

    #[tokio::test]
    async fn test_missing_store_renders_without_caching() {
        let root = tempfile::tempdir().unwrap();
        let registry = TransformRegistry::new(
            Arc::new(FontLibrary::empty()),
            reqwest::Client::new(),
            Arc::new(UnavailableCapture),
        );
        let handler = ImageHandler::new(Config::with_app_root(root.path()), None, registry);
        let reply = handler
            .handle(&params(&[("placeholder", "1"), ("width", "8")]), &ConditionalHeaders::default())
            .await
            .unwrap();
        assert_eq!(decode(&reply.body).dimensions(), (8, 8));
    }

    #[test]
    fn test_bare_etag() {
        assert_eq!(bare_etag(" W/\"ABC\" "), "ABC");
        assert_eq!(bare_etag("\"ABC\""), "ABC");
        assert_eq!(bare_etag("ABC"), "ABC");
    }
}
