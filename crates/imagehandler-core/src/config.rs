//! Configuration module
//!
//! Two layers: [`HandlerSettings`] is the handler's own `key=value;key=value`
//! settings string (cache switches, lifetimes, quality, locking), and
//! [`Config`] is the process configuration read from the environment that
//! carries those settings alongside host concerns like the port.

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

const SERVER_CACHE_EXPIRATION_SECS: u64 = 1200;
const CLIENT_CACHE_EXPIRATION_SECS: u64 = 3600;
const IMAGE_COMPRESSION: u8 = 92;
const LOCK_STRIPES: usize = 64;
const URL_CAPTURE_TIMEOUT_SECS: u64 = 30;
const IMAGE_URL_TIMEOUT_SECS: u64 = 30;
/// Largest edge, in pixels, of any canvas a transform may allocate.
pub const MAX_DIMENSION: u32 = 8192;
const SERVER_CACHE_PATH: &str = "~/App_Data/ImageHandler";
const FINGERPRINT_SEED: &str = "imagehandler.ImageHandler";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("setting '{0}' has no value")]
    MissingValue(String),

    #[error("setting '{key}' has invalid value '{value}': expected {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },
}

/// Resampling quality used by geometry transforms.
///
/// Parsed from the GDI+ style names the settings string has always accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    NearestNeighbor,
    Bilinear,
    HighQualityBilinear,
    Bicubic,
    #[default]
    HighQualityBicubic,
}

impl FromStr for Interpolation {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nearestneighbor" => Ok(Interpolation::NearestNeighbor),
            "bilinear" | "low" | "default" => Ok(Interpolation::Bilinear),
            "highqualitybilinear" => Ok(Interpolation::HighQualityBilinear),
            "bicubic" => Ok(Interpolation::Bicubic),
            "highqualitybicubic" | "high" => Ok(Interpolation::HighQualityBicubic),
            _ => Err(()),
        }
    }
}

/// How the disk cache serializes access to entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockGranularity {
    /// One lock for the whole cache directory.
    Global,
    /// Entries hash onto a fixed table of locks.
    Striped(usize),
}

impl Default for LockGranularity {
    fn default() -> Self {
        LockGranularity::Striped(LOCK_STRIPES)
    }
}

impl LockGranularity {
    pub fn stripes(&self) -> usize {
        match self {
            LockGranularity::Global => 1,
            LockGranularity::Striped(n) => (*n).max(1),
        }
    }
}

impl FromStr for LockGranularity {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "global" => Ok(LockGranularity::Global),
            "striped" => Ok(LockGranularity::Striped(LOCK_STRIPES)),
            _ => match s.strip_prefix("striped:").map(str::parse::<usize>) {
                Some(Ok(n)) if n > 0 => Ok(LockGranularity::Striped(n)),
                _ => Err(()),
            },
        }
    }
}

/// Handler settings parsed from the settings string.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerSettings {
    pub enable_client_cache: bool,
    pub enable_server_cache: bool,
    /// Cache directory; a leading `~` stands for the application root.
    pub server_cache_path: String,
    pub client_cache_expiration: Duration,
    pub server_cache_expiration: Duration,
    /// JPEG quality, 1..=100.
    pub image_compression: u8,
    pub interpolation: Interpolation,
    pub locking: LockGranularity,
    pub url_capture_timeout: Duration,
    pub image_url_timeout: Duration,
    /// Upper bound for generated and resized image edges.
    pub max_dimension: u32,
}

impl Default for HandlerSettings {
    fn default() -> Self {
        Self {
            enable_client_cache: true,
            enable_server_cache: true,
            server_cache_path: SERVER_CACHE_PATH.to_string(),
            client_cache_expiration: Duration::from_secs(CLIENT_CACHE_EXPIRATION_SECS),
            server_cache_expiration: Duration::from_secs(SERVER_CACHE_EXPIRATION_SECS),
            image_compression: IMAGE_COMPRESSION,
            interpolation: Interpolation::default(),
            locking: LockGranularity::default(),
            url_capture_timeout: Duration::from_secs(URL_CAPTURE_TIMEOUT_SECS),
            image_url_timeout: Duration::from_secs(IMAGE_URL_TIMEOUT_SECS),
            max_dimension: MAX_DIMENSION,
        }
    }
}

impl HandlerSettings {
    /// Parse a `key=value;key=value` settings string on top of the defaults.
    ///
    /// Keys are case-insensitive, empty segments are skipped and unknown keys
    /// are ignored. A segment without a value or a value that does not parse is
    /// an error.
    pub fn parse(settings: &str) -> Result<Self, ConfigError> {
        let mut parsed = Self::default();

        for segment in settings.split(';').filter(|s| !s.trim().is_empty()) {
            let (key, value) = match segment.split_once('=') {
                Some((k, v)) if !v.trim().is_empty() => (k.trim().to_ascii_lowercase(), v.trim()),
                Some((k, _)) => return Err(ConfigError::MissingValue(k.trim().to_string())),
                None => return Err(ConfigError::MissingValue(segment.trim().to_string())),
            };

            match key.as_str() {
                "enablecache" => {
                    let enabled = parse_bool(&key, value)?;
                    parsed.enable_client_cache = enabled;
                    parsed.enable_server_cache = enabled;
                }
                "enableclientcache" => parsed.enable_client_cache = parse_bool(&key, value)?,
                "enableservercache" => parsed.enable_server_cache = parse_bool(&key, value)?,
                "servercachepath" => parsed.server_cache_path = value.to_string(),
                "imagecompression" => {
                    parsed.image_compression = match value.parse::<u8>() {
                        Ok(q) if (1..=100).contains(&q) => q,
                        _ => return Err(invalid(&key, value, "an integer between 1 and 100")),
                    }
                }
                "clientcacheexpiration" => {
                    parsed.client_cache_expiration = parse_seconds(&key, value)?
                }
                "servercacheexpiration" => {
                    parsed.server_cache_expiration = parse_seconds(&key, value)?
                }
                "cacheexpiration" => parsed.set_cache_time(parse_seconds(&key, value)?),
                "interpolationmode" => {
                    parsed.interpolation = value
                        .parse()
                        .map_err(|_| invalid(&key, value, "an interpolation mode name"))?
                }
                "locking" => {
                    parsed.locking = value
                        .parse()
                        .map_err(|_| invalid(&key, value, "global, striped or striped:<n>"))?
                }
                "urlcapturetimeout" => parsed.url_capture_timeout = parse_seconds(&key, value)?,
                "imageurltimeout" => parsed.image_url_timeout = parse_seconds(&key, value)?,
                "maxdimension" => {
                    parsed.max_dimension = match value.parse::<u32>() {
                        Ok(edge) if (1..=65535).contains(&edge) => edge,
                        _ => return Err(invalid(&key, value, "an integer between 1 and 65535")),
                    }
                }
                other => tracing::debug!(key = %other, "Ignoring unknown handler setting"),
            }
        }

        Ok(parsed)
    }

    /// Set both cache lifetimes at once.
    pub fn set_cache_time(&mut self, lifetime: Duration) {
        self.client_cache_expiration = lifetime;
        self.server_cache_expiration = lifetime;
    }

    /// Resolve the cache directory against the application root.
    pub fn server_cache_root(&self, app_root: &Path) -> PathBuf {
        let raw = self.server_cache_path.trim();
        let rest = raw
            .strip_prefix("~/")
            .or_else(|| raw.strip_prefix("~\\"))
            .or_else(|| raw.strip_prefix('~'));
        match rest {
            Some(rest) => app_root.join(rest),
            None if Path::new(raw).is_absolute() => PathBuf::from(raw),
            None => app_root.join(raw),
        }
    }
}

impl FromStr for HandlerSettings {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn invalid(key: &str, value: &str, expected: &'static str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        expected,
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(invalid(key, value, "true or false"))
    }
}

fn parse_seconds(key: &str, value: &str) -> Result<Duration, ConfigError> {
    value
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| invalid(key, value, "a whole number of seconds"))
}

/// Process configuration for the image handler service
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    /// Base directory for relative `file`, `path` and `defaultimage` parameters.
    pub app_root: PathBuf,
    /// Directory holding `<family>.ttf` fonts for text rendering.
    pub font_dir: Option<PathBuf>,
    pub default_font: String,
    /// Page capture service used by the `url` parameter.
    pub capture_endpoint: Option<String>,
    /// Seed that namespaces every cache identifier of this handler.
    pub fingerprint_seed: String,
    pub settings: HandlerSettings,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let settings = match env::var("IMAGEHANDLER_SETTINGS") {
            Ok(raw) => HandlerSettings::parse(&raw)
                .map_err(|e| anyhow::anyhow!("IMAGEHANDLER_SETTINGS is invalid: {}", e))?,
            Err(_) => HandlerSettings::default(),
        };

        let app_root = match env::var("IMAGEHANDLER_APP_ROOT") {
            Ok(root) => PathBuf::from(root),
            Err(_) => env::current_dir()
                .map_err(|e| anyhow::anyhow!("Failed to determine working directory: {}", e))?,
        };

        Ok(Config {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
            app_root,
            font_dir: env::var("IMAGEHANDLER_FONT_DIR").ok().map(PathBuf::from),
            default_font: env::var("IMAGEHANDLER_DEFAULT_FONT")
                .unwrap_or_else(|_| "DejaVuSans".to_string()),
            capture_endpoint: env::var("IMAGEHANDLER_CAPTURE_ENDPOINT")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            fingerprint_seed: env::var("IMAGEHANDLER_SEED")
                .unwrap_or_else(|_| FINGERPRINT_SEED.to_string()),
            settings,
        })
    }

    /// Configuration rooted at `app_root` with default settings.
    pub fn with_app_root(app_root: impl Into<PathBuf>) -> Self {
        Config {
            server_port: 3000,
            environment: "development".to_string(),
            app_root: app_root.into(),
            font_dir: None,
            default_font: "DejaVuSans".to_string(),
            capture_endpoint: None,
            fingerprint_seed: FINGERPRINT_SEED.to_string(),
            settings: HandlerSettings::default(),
        }
    }

    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn server_cache_root(&self) -> PathBuf {
        self.settings.server_cache_root(&self.app_root)
    }
}
