use std::sync::Arc;

use async_trait::async_trait;
use image::{DynamicImage, Rgba, RgbaImage};
use imagehandler_core::MAX_DIMENSION;

use crate::codec::check_canvas;
use crate::color::{color_key, LIGHT_GRAY, LIGHT_SLATE_GRAY};
use crate::error::{ProcessingError, ProcessingResult};
use crate::fonts::FontLibrary;
use crate::text::{draw_in_box, points_to_px, Align};
use crate::traits::{offload, TransformStep};

/// Framed box with a centered caption, `WxH` unless a text is given.
#[derive(Clone)]
pub struct Placeholder {
    pub width: u32,
    pub height: u32,
    /// Frame and caption color.
    pub color: Rgba<u8>,
    pub background: Rgba<u8>,
    pub text: Option<String>,
    pub fonts: Arc<FontLibrary>,
    pub max_dimension: u32,
}

const FRAME: u32 = 2;
const CAPTION_FAMILY: &str = "Arial";

impl Placeholder {
    pub fn new(width: u32, height: u32, fonts: Arc<FontLibrary>) -> Self {
        Placeholder {
            width,
            height,
            color: LIGHT_SLATE_GRAY,
            background: LIGHT_GRAY,
            text: None,
            fonts,
            max_dimension: MAX_DIMENSION,
        }
    }

    /// A missing edge mirrors the other one.
    pub fn dimensions(&self) -> (u32, u32) {
        match (self.width, self.height) {
            (0, h) => (h, h),
            (w, 0) => (w, w),
            dims => dims,
        }
    }

    pub fn caption(&self) -> String {
        match self.text.as_deref() {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => {
                let (w, h) = self.dimensions();
                format!("{}x{}", w, h)
            }
        }
    }

    /// Caption size in points, stepped by width.
    pub fn font_points(width: u32) -> f32 {
        match width {
            0..=100 => 8.0,
            101..=150 => 10.0,
            151..=200 => 12.0,
            201..=300 => 14.0,
            _ => 24.0,
        }
    }

    pub fn render(&self) -> ProcessingResult<DynamicImage> {
        let (width, height) = self.dimensions();
        if width == 0 {
            return Err(ProcessingError::InvalidOptions(
                "placeholder needs a width or a height".to_string(),
            ));
        }
        check_canvas(width, height, self.max_dimension)?;

        let mut canvas = RgbaImage::from_fn(width, height, |x, y| {
            let on_frame =
                x < FRAME || y < FRAME || x + FRAME >= width || y + FRAME >= height;
            if on_frame {
                self.color
            } else {
                self.background
            }
        });

        match self.fonts.load(CAPTION_FAMILY) {
            Some(font) => draw_in_box(
                &mut canvas,
                &font,
                points_to_px(Self::font_points(width)),
                self.color,
                (5, 5, width as i32 - 10, height as i32 - 10),
                Align::Center,
                &self.caption(),
            ),
            None => tracing::debug!("No font for placeholder caption, drawing frame only"),
        }

        Ok(DynamicImage::ImageRgba8(canvas))
    }
}

#[async_trait]
impl TransformStep for Placeholder {
    fn name(&self) -> &'static str {
        "Placeholder"
    }

    fn fragment(&self) -> String {
        let (w, h) = self.dimensions();
        format!(
            "Placeholder{}-{}-{}-{}-{}",
            w,
            h,
            color_key(self.color),
            color_key(self.background),
            self.caption()
        )
    }

    async fn apply(&self, _image: DynamicImage) -> ProcessingResult<DynamicImage> {
        let step = self.clone();
        offload(move || step.render()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;

    fn placeholder(width: u32, height: u32) -> Placeholder {
        Placeholder::new(width, height, Arc::new(FontLibrary::empty()))
    }

    #[test]
    fn test_missing_edge_mirrors_other() {
        assert_eq!(placeholder(120, 0).dimensions(), (120, 120));
        assert_eq!(placeholder(0, 40).dimensions(), (40, 40));
        assert_eq!(placeholder(30, 20).dimensions(), (30, 20));
    }

    #[test]
    fn test_zero_size_is_error() {
        assert!(matches!(
            placeholder(0, 0).render(),
            Err(ProcessingError::InvalidOptions(_))
        ));
    }

    #[test]
    fn test_oversized_canvas_is_error() {
        for (w, h) in [(u32::MAX, 0), (100_000, 10), (10, 100_000)] {
            assert!(matches!(
                placeholder(w, h).render(),
                Err(ProcessingError::InvalidOptions(_))
            ));
        }
    }

    #[test]
    fn test_frame_and_background() {
        let out = placeholder(40, 30).render().unwrap();
        assert_eq!(out.dimensions(), (40, 30));
        let rgba = out.to_rgba8();
        assert_eq!(*rgba.get_pixel(0, 0), LIGHT_SLATE_GRAY);
        assert_eq!(*rgba.get_pixel(1, 15), LIGHT_SLATE_GRAY);
        assert_eq!(*rgba.get_pixel(38, 29), LIGHT_SLATE_GRAY);
        assert_eq!(*rgba.get_pixel(20, 15), LIGHT_GRAY);
        assert_eq!(*rgba.get_pixel(2, 2), LIGHT_GRAY);
    }

    #[test]
    fn test_caption_defaults_to_size() {
        assert_eq!(placeholder(64, 0).caption(), "64x64");
        let custom = Placeholder {
            text: Some("Logo".to_string()),
            ..placeholder(64, 0)
        };
        assert_eq!(custom.caption(), "Logo");
    }

    #[test]
    fn test_font_steps() {
        assert_eq!(Placeholder::font_points(100), 8.0);
        assert_eq!(Placeholder::font_points(101), 10.0);
        assert_eq!(Placeholder::font_points(200), 12.0);
        assert_eq!(Placeholder::font_points(300), 14.0);
        assert_eq!(Placeholder::font_points(301), 24.0);
    }

    #[tokio::test]
    async fn test_apply_ignores_input() {
        let input = DynamicImage::ImageRgba8(RgbaImage::new(500, 500));
        let out = placeholder(10, 0).apply(input).await.unwrap();
        assert_eq!(out.dimensions(), (10, 10));
    }
}
