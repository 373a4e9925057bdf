//! Maps request parameters to an ordered transform pipeline.
//!
//! The order below is fixed. It decides both the output and the request
//! fingerprint, so reordering the blocks invalidates every cached entry.
//!
//! 1. `url`, 2. `imageurl`, 3. `counter`, 4. `percentage`, 5. `barcode`,
//! 6. `schedule`, 7. resize, 8. `watermarktext`, 9. `gamma`,
//! 10. `brightness`, 11. `contrast`, 12. `greyscale`, 13. `invert`,
//! 14. `rotateflip`, 15. `placeholder`.

use std::path::Path;
use std::sync::Arc;

use image::Rgba;
use imagehandler_core::{HandlerSettings, InvalidParameter, RequestParams};
use imagehandler_processing::color::{parse_color, ORANGE, WHITE};
use imagehandler_processing::transforms::{
    Barcode, Brightness, CaptureRatio, Contrast, Counter, Gamma, Greyscale, Invert, Percentage,
    Placeholder, RemoteImage, Resize, ResizeMode, RotateFlip, Schedule, UrlCapture, Watermark,
    WatermarkPosition,
};
use imagehandler_processing::{
    FontLibrary, OutputFormat, PageCapture, Pipeline, ProcessingError, ProcessingResult,
};

/// Parameters that produce an image without a source file.
pub const GENERATOR_KEYS: [&str; 6] = [
    "url",
    "imageurl",
    "percentage",
    "placeholder",
    "barcode",
    "schedule",
];

pub fn has_generator(params: &RequestParams) -> bool {
    GENERATOR_KEYS.iter().any(|key| params.has(key))
}

/// `format` parameter, else the source extension, else JPEG.
pub fn output_format(params: &RequestParams, source: Option<&Path>) -> ProcessingResult<OutputFormat> {
    if let Some(format) = params.get("format") {
        return OutputFormat::from_extension(format)
            .ok_or_else(|| ProcessingError::UnsupportedFormat(format.to_string()));
    }
    match source {
        Some(path) => OutputFormat::from_path(path).ok_or_else(|| {
            ProcessingError::UnsupportedFormat(path.display().to_string())
        }),
        None => Ok(OutputFormat::Jpeg),
    }
}

/// Parse a color parameter; unknown names are invalid.
fn color_param(params: &RequestParams, key: &str) -> Result<Option<Rgba<u8>>, InvalidParameter> {
    match params.get(key) {
        None => Ok(None),
        Some(raw) => parse_color(raw).map(Some).ok_or_else(|| InvalidParameter {
            key: key.to_string(),
            value: raw.to_string(),
        }),
    }
}

/// Builds pipelines. Holds the shared resources steps need.
#[derive(Clone)]
pub struct TransformRegistry {
    fonts: Arc<FontLibrary>,
    http: reqwest::Client,
    capture: Arc<dyn PageCapture>,
}

impl TransformRegistry {
    pub fn new(fonts: Arc<FontLibrary>, http: reqwest::Client, capture: Arc<dyn PageCapture>) -> Self {
        Self {
            fonts,
            http,
            capture,
        }
    }

    /// Build the pipeline for a request. A parameter that is present but
    /// cannot be interpreted fails the whole build, except for the pixel
    /// adjustments, which are skipped instead.
    pub fn build(&self, params: &RequestParams, settings: &HandlerSettings) -> ProcessingResult<Pipeline> {
        let mut pipeline = Pipeline::new();
        let bgcolor = color_param(params, "bgcolor")?;

        if let Some(url) = params.get("url") {
            let ratio = params.parse::<CaptureRatio>("ratio")?.unwrap_or_default();
            pipeline.push(UrlCapture::new(
                url,
                ratio,
                self.capture.clone(),
                settings.url_capture_timeout,
            ));
        }

        if let Some(url) = params.get("imageurl") {
            pipeline.push(RemoteImage::new(
                url,
                self.http.clone(),
                settings.image_url_timeout,
            ));
        }

        if params.has("counter") {
            let value = params.parse::<u64>("counter")?.unwrap_or_default();
            let digits = params.parse::<usize>("digits")?;
            let mut step = Counter::new(value, digits);
            step.max_dimension = settings.max_dimension;
            pipeline.push(step);
        }

        if params.has("percentage") {
            let mut step = Percentage::new(
                params.parse::<i32>("percentage")?.unwrap_or_default(),
                self.fonts.clone(),
            );
            step.color = bgcolor.unwrap_or(ORANGE);
            pipeline.push(step);
        }

        if params.has("barcode") {
            let kind = params.get("type").and_then(|t| t.parse().ok());
            let mut step = Barcode::new(kind, params.get("content").unwrap_or_default());
            step.width = params.parse("width")?.unwrap_or(Barcode::DEFAULT_SIZE);
            step.height = params.parse("height")?.unwrap_or(Barcode::DEFAULT_SIZE);
            step.border = params.parse("border")?.unwrap_or(0);
            step.max_dimension = settings.max_dimension;
            pipeline.push(step);
        }

        if params.has("schedule") {
            let mut step = Schedule::new(params.get("matrix").unwrap_or_default(), self.fonts.clone());
            if let Some(culture) = params.get("culture") {
                step.culture = culture.to_string();
            }
            step.background = bgcolor.unwrap_or(WHITE);
            pipeline.push(step);
        }

        let wants_resize = ["width", "height", "maxwidth", "maxheight"]
            .iter()
            .any(|key| params.has(key));
        if wants_resize && !params.has("placeholder") && !params.has("barcode") {
            pipeline.push(Resize {
                mode: params.parse::<ResizeMode>("resizemode")?.unwrap_or_default(),
                width: params.parse("width")?.unwrap_or(0),
                height: params.parse("height")?.unwrap_or(0),
                max_width: params.parse("maxwidth")?.unwrap_or(0),
                max_height: params.parse("maxheight")?.unwrap_or(0),
                border: params.parse("border")?.unwrap_or(0),
                background: bgcolor.unwrap_or(WHITE),
                interpolation: settings.interpolation,
                max_dimension: settings.max_dimension,
            });
        }

        if let Some(text) = params.get("watermarktext") {
            let mut step = Watermark::new(text, self.fonts.clone());
            if let Some(family) = params.get("watermarkfontfamily") {
                step.font_family = family.to_string();
            }
            if let Some(color) = color_param(params, "watermarkfontcolor")? {
                step.color = color;
            }
            if let Some(size) = params.parse::<f32>("watermarkfontsize")? {
                step.size = size;
            }
            if let Some(position) = params.parse::<WatermarkPosition>("watermarkposition")? {
                step.position = position;
            }
            if let Some(opacity) = params.parse::<u8>("watermarkopacity")? {
                step.opacity = opacity;
            }
            step.max_dimension = settings.max_dimension;
            pipeline.push(step);
        }

        if let Some(step) = params.parse_lenient::<f64>("gamma").and_then(Gamma::new) {
            pipeline.push(step);
        }
        if let Some(level) = params.parse_lenient::<i32>("brightness") {
            pipeline.push(Brightness::new(level));
        }
        if let Some(step) = params.parse_lenient::<f64>("contrast").and_then(Contrast::new) {
            pipeline.push(step);
        }

        if params.has("greyscale") {
            pipeline.push(Greyscale);
        }
        if params.has("invert") {
            pipeline.push(Invert);
        }
        if let Some(rotate_flip) = params.parse::<RotateFlip>("rotateflip")? {
            pipeline.push(rotate_flip);
        }

        if params.has("placeholder") {
            let mut step = Placeholder::new(
                params.parse_lenient("width").unwrap_or(0),
                params.parse_lenient("height").unwrap_or(0),
                self.fonts.clone(),
            );
            if let Some(color) = color_param(params, "color")? {
                step.color = color;
            }
            if let Some(background) = bgcolor {
                step.background = background;
            }
            step.text = params.get("text").map(str::to_string);
            step.max_dimension = settings.max_dimension;
            pipeline.push(step);
        }

        tracing::debug!(count = pipeline.len(), steps = ?pipeline.names(), "Built transform pipeline");
        Ok(pipeline)
    }
}
