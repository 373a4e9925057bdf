use async_trait::async_trait;
use image::{imageops, DynamicImage, GenericImageView, RgbImage};
use imagehandler_core::MAX_DIMENSION;

use crate::codec::check_canvas;
use crate::error::{ProcessingError, ProcessingResult};
use crate::traits::{offload, TransformStep};

/// Renders a number from a digit strip.
///
/// The input image holds the glyphs `0` to `9` side by side in equal-width
/// cells. The value is zero-padded to `digits` characters and each character
/// is copied from its cell.
#[derive(Debug, Clone)]
pub struct Counter {
    pub value: u64,
    pub digits: usize,
    pub max_dimension: u32,
}

impl Counter {
    pub const DEFAULT_DIGITS: usize = 5;
    pub const MAX_DIGITS: usize = 32;

    pub fn new(value: u64, digits: Option<usize>) -> Self {
        Counter {
            value,
            digits: digits.unwrap_or(Self::DEFAULT_DIGITS),
            max_dimension: MAX_DIMENSION,
        }
    }

    /// Characters to draw; values wider than `digits` are truncated on the right.
    pub fn label(&self) -> String {
        format!("{:0width$}", self.value, width = self.digits)
            .chars()
            .take(self.digits)
            .collect()
    }

    pub fn render(&self, strip: DynamicImage) -> ProcessingResult<DynamicImage> {
        let (width, height) = strip.dimensions();
        let cell = width / 10;
        if cell == 0 || height == 0 {
            return Err(ProcessingError::InvalidOptions(format!(
                "digit strip of {}x{} is too small for ten glyphs",
                width, height
            )));
        }
        if self.digits == 0 || self.digits > Self::MAX_DIGITS {
            return Err(ProcessingError::InvalidOptions(format!(
                "counter needs between 1 and {} digits, got {}",
                Self::MAX_DIGITS,
                self.digits
            )));
        }
        let output_width = cell
            .checked_mul(self.digits as u32)
            .ok_or_else(|| ProcessingError::InvalidOptions("counter is too wide".to_string()))?;
        check_canvas(output_width, height, self.max_dimension)?;

        let label = self.label();
        let mut output = RgbImage::new(output_width, height);
        for (i, ch) in label.chars().enumerate() {
            let digit = ch.to_digit(10).unwrap_or(0);
            let glyph = strip.crop_imm(digit * cell, 0, cell, height).to_rgb8();
            imageops::replace(&mut output, &glyph, (i as u32 * cell) as i64, 0);
        }
        Ok(DynamicImage::ImageRgb8(output))
    }
}

#[async_trait]
impl TransformStep for Counter {
    fn name(&self) -> &'static str {
        "Counter"
    }

    fn fragment(&self) -> String {
        format!("Counter-{}-{}-", self.value, self.digits)
    }

    async fn apply(&self, image: DynamicImage) -> ProcessingResult<DynamicImage> {
        let step = self.clone();
        offload(move || step.render(image)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    /// Strip of ten 4x3 cells, cell `d` filled with grey level `d * 20`.
    fn digit_strip() -> DynamicImage {
        let img = RgbImage::from_fn(40, 3, |x, _| {
            let d = (x / 4) as u8;
            Rgb([d * 20, d * 20, d * 20])
        });
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_label_padding_and_truncation() {
        assert_eq!(Counter::new(42, None).label(), "00042");
        assert_eq!(Counter::new(42, Some(2)).label(), "42");
        assert_eq!(Counter::new(123456, Some(3)).label(), "123");
    }

    #[test]
    fn test_render_copies_glyph_cells() {
        let out = Counter::new(907, Some(3)).render(digit_strip()).unwrap().to_rgb8();
        assert_eq!(out.dimensions(), (12, 3));
        assert_eq!(*out.get_pixel(0, 0), Rgb([180, 180, 180]));
        assert_eq!(*out.get_pixel(5, 1), Rgb([0, 0, 0]));
        assert_eq!(*out.get_pixel(11, 2), Rgb([140, 140, 140]));
    }

    #[test]
    fn test_narrow_strip_is_error() {
        let strip = DynamicImage::ImageRgb8(RgbImage::new(9, 5));
        assert!(matches!(
            Counter::new(1, None).render(strip),
            Err(ProcessingError::InvalidOptions(_))
        ));
    }

    #[test]
    fn test_digit_count_is_bounded() {
        for digits in [0, Counter::MAX_DIGITS + 1, usize::MAX] {
            assert!(matches!(
                Counter::new(1, Some(digits)).render(digit_strip()),
                Err(ProcessingError::InvalidOptions(_))
            ));
        }
        let out = Counter::new(1, Some(Counter::MAX_DIGITS)).render(digit_strip()).unwrap();
        assert_eq!(out.width(), 4 * Counter::MAX_DIGITS as u32);
    }

    #[test]
    fn test_output_width_is_checked() {
        let strip = DynamicImage::ImageRgb8(RgbImage::new(10_000, 1));
        let step = Counter {
            max_dimension: 4096,
            ..Counter::new(1, Some(5))
        };
        assert!(matches!(step.render(strip), Err(ProcessingError::InvalidOptions(_))));
    }

    #[test]
    fn test_fragment() {
        assert_eq!(Counter::new(7, None).fragment(), "Counter-7-5-");
    }
}
