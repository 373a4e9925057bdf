use std::str::FromStr;

use async_trait::async_trait;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use imagehandler_core::{Interpolation, MAX_DIMENSION};

use crate::codec::{check_canvas, padded};
use crate::color::{color_key, WHITE};
use crate::error::{ProcessingError, ProcessingResult};
use crate::traits::{offload, TransformStep};

/// How the source is fitted into the requested box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizeMode {
    /// Keep aspect ratio inside the box, pad by `border` on every side.
    #[default]
    Fit,
    /// Fill the box, cropping the overflow evenly.
    Crop,
    /// Keep aspect ratio, centered on a `width x width` square.
    FitSquare,
    /// Resize to exactly the box, ignoring aspect ratio.
    Stretch,
}

impl FromStr for ResizeMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fit" => Ok(ResizeMode::Fit),
            "crop" => Ok(ResizeMode::Crop),
            "fitsquare" => Ok(ResizeMode::FitSquare),
            "stretch" => Ok(ResizeMode::Stretch),
            _ => Err(()),
        }
    }
}

/// Resize step
#[derive(Debug, Clone)]
pub struct Resize {
    pub mode: ResizeMode,
    pub width: u32,
    pub height: u32,
    /// Clamp the width to `min(source width, max_width)`; 0 disables.
    pub max_width: u32,
    /// Clamp the height to `min(source height, max_height)`; 0 disables.
    pub max_height: u32,
    pub border: u32,
    pub background: Rgba<u8>,
    pub interpolation: Interpolation,
    /// Largest edge of any intermediate or output image.
    pub max_dimension: u32,
}

impl Default for Resize {
    fn default() -> Self {
        Resize {
            mode: ResizeMode::Fit,
            width: 0,
            height: 0,
            max_width: 0,
            max_height: 0,
            border: 0,
            background: WHITE,
            interpolation: Interpolation::default(),
            max_dimension: MAX_DIMENSION,
        }
    }
}

impl Resize {
    /// Box to fit into after applying the max clamps.
    pub fn target_box(&self, src_width: u32, src_height: u32) -> (u32, u32) {
        let width = if self.max_width > 0 {
            src_width.min(self.max_width)
        } else {
            self.width
        };
        let height = if self.max_height > 0 {
            src_height.min(self.max_height)
        } else {
            self.height
        };
        (width, height)
    }

    pub fn render(&self, image: DynamicImage) -> ProcessingResult<DynamicImage> {
        let (src_w, src_h) = image.dimensions();
        let (width, height) = self.target_box(src_w, src_h);
        if width == 0 && height == 0 {
            return Err(ProcessingError::InvalidOptions(
                "resize needs a non-zero width or height".to_string(),
            ));
        }
        check_canvas(width, height, self.max_dimension)?;

        // Scaled counterpart of each requested edge, keeping aspect ratio.
        let scaled_h = (src_h as f64 * width as f64 / src_w as f64) as u32;
        let scaled_w = (src_w as f64 * height as f64 / src_h as f64) as u32;
        let width_ratio = width as f64 / src_w as f64;
        let height_ratio = height as f64 / src_h as f64;

        let mode = match self.mode {
            ResizeMode::Crop if width == 0 || height == 0 => ResizeMode::Fit,
            mode => mode,
        };

        let output = match mode {
            ResizeMode::Fit => {
                let (rw, rh) = if height == 0 {
                    (width, scaled_h)
                } else if width == 0 || width_ratio >= height_ratio {
                    (scaled_w, height)
                } else {
                    (width, scaled_h)
                };
                let outer_w = padded(rw.max(1), self.border)?;
                let outer_h = padded(rh.max(1), self.border)?;
                check_canvas(outer_w, outer_h, self.max_dimension)?;
                let resized = self.scale(&image, rw, rh);
                let mut canvas = RgbaImage::from_pixel(outer_w, outer_h, self.background);
                imageops::overlay(&mut canvas, &resized, self.border as i64, self.border as i64);
                canvas
            }
            ResizeMode::FitSquare => {
                let side = if width > 0 { width } else { height };
                let (rw, rh) = if src_h > src_w {
                    ((src_w as f64 / src_h as f64 * side as f64).round() as u32, side)
                } else {
                    (side, (src_h as f64 / src_w as f64 * side as f64).round() as u32)
                };
                let outer = padded(side, self.border)?;
                check_canvas(outer, outer, self.max_dimension)?;
                let resized = self.scale(&image, rw, rh);
                let mut canvas = RgbaImage::from_pixel(outer, outer, self.background);
                let x = (side - resized.width()) / 2 + self.border;
                let y = (side - resized.height()) / 2 + self.border;
                imageops::overlay(&mut canvas, &resized, x as i64, y as i64);
                canvas
            }
            ResizeMode::Crop => {
                let (rw, rh) = if width_ratio > height_ratio {
                    (width, scaled_h)
                } else {
                    (scaled_w, height)
                };
                check_canvas(rw, rh, self.max_dimension)?;
                let resized = self.scale(&image, rw, rh);
                let mut canvas = RgbaImage::from_pixel(width, height, self.background);
                let x = (width as i64 - resized.width() as i64) / 2;
                let y = (height as i64 - resized.height() as i64) / 2;
                imageops::overlay(&mut canvas, &resized, x, y);
                canvas
            }
            ResizeMode::Stretch => {
                let w = if width > 0 { width } else { src_w };
                let h = if height > 0 { height } else { src_h };
                check_canvas(w, h, self.max_dimension)?;
                self.scale(&image, w, h)
            }
        };

        Ok(DynamicImage::ImageRgba8(output))
    }

    fn scale(&self, image: &DynamicImage, width: u32, height: u32) -> RgbaImage {
        let (width, height) = (width.max(1), height.max(1));
        let (src_w, src_h) = image.dimensions();
        let filter = self.filter(src_w, src_h, width, height);
        image.resize_exact(width, height, filter).to_rgba8()
    }

    fn filter(&self, src_w: u32, src_h: u32, width: u32, height: u32) -> FilterType {
        match self.interpolation {
            Interpolation::NearestNeighbor => FilterType::Nearest,
            Interpolation::Bilinear | Interpolation::HighQualityBilinear => FilterType::Triangle,
            Interpolation::Bicubic => FilterType::CatmullRom,
            Interpolation::HighQualityBicubic => select_filter(src_w, src_h, width, height),
        }
    }
}

/// Pick a resampling filter from the downscale ratio; cheaper filters for
/// heavy reductions where Lanczos brings nothing visible.
pub fn select_filter(src_w: u32, src_h: u32, width: u32, height: u32) -> FilterType {
    let width_ratio = src_w as f32 / width as f32;
    let height_ratio = src_h as f32 / height as f32;
    let max_ratio = width_ratio.max(height_ratio);

    if max_ratio > 2.0 {
        FilterType::Triangle
    } else if max_ratio > 1.5 {
        FilterType::CatmullRom
    } else {
        FilterType::Lanczos3
    }
}

#[async_trait]
impl TransformStep for Resize {
    fn name(&self) -> &'static str {
        "Resize"
    }

    fn fragment(&self) -> String {
        format!(
            "Resize{}{:?}{}{:?}-{}-{}-{}-{}",
            self.width,
            self.interpolation,
            self.height,
            self.mode,
            self.max_width,
            self.max_height,
            self.border,
            color_key(self.background)
        )
    }

    async fn apply(&self, image: DynamicImage) -> ProcessingResult<DynamicImage> {
        let step = self.clone();
        offload(move || step.render(image)).await
    }
}
