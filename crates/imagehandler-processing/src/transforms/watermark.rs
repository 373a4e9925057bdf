use std::str::FromStr;
use std::sync::Arc;

use ab_glyph::PxScale;
use async_trait::async_trait;
use image::{imageops, DynamicImage, GenericImageView, Rgba, RgbaImage};
use imagehandler_core::MAX_DIMENSION;
use imageproc::drawing::{draw_text_mut, text_size};

use crate::color::{color_key, BLACK};
use crate::error::{ProcessingError, ProcessingResult};
use crate::fonts::FontLibrary;
use crate::text::points_to_px;
use crate::traits::{offload, TransformStep};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WatermarkPosition {
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    #[default]
    Center,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl FromStr for WatermarkPosition {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use WatermarkPosition::*;
        match s.trim().to_ascii_lowercase().as_str() {
            "topleft" => Ok(TopLeft),
            "topcenter" => Ok(TopCenter),
            "topright" => Ok(TopRight),
            "centerleft" => Ok(CenterLeft),
            "center" => Ok(Center),
            "centerright" => Ok(CenterRight),
            "bottomleft" => Ok(BottomLeft),
            "bottomcenter" => Ok(BottomCenter),
            "bottomright" => Ok(BottomRight),
            _ => Err(()),
        }
    }
}

/// Top-left corner of a `text` box placed at `position` on an `image` box.
pub fn anchor(position: WatermarkPosition, image: (u32, u32), text: (u32, u32)) -> (i32, i32) {
    use WatermarkPosition::*;
    let (w, h) = (image.0 as i32, image.1 as i32);
    let (tw, th) = (text.0 as i32, text.1 as i32);
    let left = 0;
    let center_x = w / 2 - tw / 2;
    let right = w - tw;
    let top = 0;
    let center_y = h / 2 - th / 2;
    let bottom = h - th;
    match position {
        TopLeft => (left, top),
        TopCenter => (center_x, top),
        TopRight => (right, top),
        CenterLeft => (left, center_y),
        Center => (center_x, center_y),
        CenterRight => (right, center_y),
        BottomLeft => (left, bottom),
        BottomCenter => (center_x, bottom),
        BottomRight => (right, bottom),
    }
}

/// Semi-transparent text stamped over the image.
#[derive(Clone)]
pub struct Watermark {
    pub text: String,
    pub position: WatermarkPosition,
    /// 0 is invisible, 255 fully opaque.
    pub opacity: u8,
    pub color: Rgba<u8>,
    pub font_family: String,
    /// Size in points.
    pub size: f32,
    pub fonts: Arc<FontLibrary>,
    /// Glyphs larger than this many pixels are refused.
    pub max_dimension: u32,
}

impl Watermark {
    pub const DEFAULT_FAMILY: &'static str = "Verdana";
    pub const DEFAULT_SIZE: f32 = 14.0;
    pub const DEFAULT_OPACITY: u8 = 127;

    pub fn new(text: impl Into<String>, fonts: Arc<FontLibrary>) -> Self {
        Watermark {
            text: text.into(),
            position: WatermarkPosition::default(),
            opacity: Self::DEFAULT_OPACITY,
            color: BLACK,
            font_family: Self::DEFAULT_FAMILY.to_string(),
            size: Self::DEFAULT_SIZE,
            fonts,
            max_dimension: MAX_DIMENSION,
        }
    }

    pub fn render(&self, image: DynamicImage) -> ProcessingResult<DynamicImage> {
        let scale: PxScale = points_to_px(self.size);
        if !(scale.y > 0.0 && scale.y <= self.max_dimension as f32) {
            return Err(ProcessingError::InvalidOptions(format!(
                "watermark font size {} is out of range",
                self.size
            )));
        }
        let font = self.fonts.load(&self.font_family).ok_or_else(|| {
            ProcessingError::Font(format!("no font available for '{}'", self.font_family))
        })?;

        let (width, height) = image.dimensions();
        let (x, y) = anchor(
            self.position,
            (width, height),
            text_size(scale, &*font, &self.text),
        );

        // Text is drawn opaque on its own layer, then faded and composited.
        let mut layer = RgbaImage::new(width, height);
        let ink = Rgba([self.color[0], self.color[1], self.color[2], 255]);
        draw_text_mut(&mut layer, ink, x, y, scale, &*font, &self.text);
        for pixel in layer.pixels_mut() {
            pixel[3] = ((pixel[3] as u16 * self.opacity as u16) / 255) as u8;
        }

        let mut base = image.to_rgba8();
        imageops::overlay(&mut base, &layer, 0, 0);
        Ok(DynamicImage::ImageRgba8(base))
    }
}

impl std::fmt::Debug for Watermark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watermark")
            .field("text", &self.text)
            .field("position", &self.position)
            .field("opacity", &self.opacity)
            .field("font_family", &self.font_family)
            .field("size", &self.size)
            .finish()
    }
}

#[async_trait]
impl TransformStep for Watermark {
    fn name(&self) -> &'static str {
        "Watermark"
    }

    fn fragment(&self) -> String {
        format!(
            "Watermark-{}-{:?}-{}-{}-{}-{}",
            self.text,
            self.position,
            self.opacity,
            color_key(self.color),
            self.font_family,
            self.size
        )
    }

    async fn apply(&self, image: DynamicImage) -> ProcessingResult<DynamicImage> {
        let step = self.clone();
        offload(move || step.render(image)).await
    }
}
