//! Per-pixel color adjustments. Alpha is left untouched.

use async_trait::async_trait;
use image::DynamicImage;

use crate::error::ProcessingResult;
use crate::traits::{offload, TransformStep};

/// Apply a 256-entry lookup table to the color channels.
fn map_channels(image: DynamicImage, lut: &[u8; 256]) -> DynamicImage {
    let mut rgba = image.to_rgba8();
    for pixel in rgba.pixels_mut() {
        for channel in pixel.0.iter_mut().take(3) {
            *channel = lut[*channel as usize];
        }
    }
    DynamicImage::ImageRgba8(rgba)
}

fn build_lut(f: impl Fn(f64) -> f64) -> [u8; 256] {
    let mut lut = [0u8; 256];
    for (i, slot) in lut.iter_mut().enumerate() {
        *slot = f(i as f64).clamp(0.0, 255.0) as u8;
    }
    lut
}

/// Gamma correction, accepted range 0.2 to 5.
#[derive(Debug, Clone)]
pub struct Gamma {
    pub gamma: f64,
}

impl Gamma {
    pub const MIN: f64 = 0.2;
    pub const MAX: f64 = 5.0;

    /// `None` when `gamma` is outside the accepted range.
    pub fn new(gamma: f64) -> Option<Self> {
        (Self::MIN..=Self::MAX)
            .contains(&gamma)
            .then_some(Gamma { gamma })
    }

    pub fn lut(&self) -> [u8; 256] {
        let exponent = 1.0 / self.gamma;
        build_lut(|i| (255.0 * (i / 255.0).powf(exponent) + 0.5).min(255.0))
    }

    pub fn render(&self, image: DynamicImage) -> ProcessingResult<DynamicImage> {
        Ok(map_channels(image, &self.lut()))
    }
}

/// Additive brightness shift, -255 to 255.
#[derive(Debug, Clone)]
pub struct Brightness {
    pub level: i32,
}

impl Brightness {
    pub fn new(level: i32) -> Self {
        Brightness {
            level: level.clamp(-255, 255),
        }
    }

    pub fn lut(&self) -> [u8; 256] {
        let level = self.level as f64;
        // Underflow lands on 1, not 0.
        build_lut(|i| {
            let v = i + level;
            if v < 0.0 {
                1.0
            } else {
                v.min(255.0)
            }
        })
    }

    pub fn render(&self, image: DynamicImage) -> ProcessingResult<DynamicImage> {
        Ok(map_channels(image, &self.lut()))
    }
}

/// Contrast stretch around mid-grey, -100 to 100.
#[derive(Debug, Clone)]
pub struct Contrast {
    pub level: f64,
}

impl Contrast {
    pub const MIN: f64 = -100.0;
    pub const MAX: f64 = 100.0;

    /// `None` when `level` is outside the accepted range.
    pub fn new(level: f64) -> Option<Self> {
        (Self::MIN..=Self::MAX)
            .contains(&level)
            .then_some(Contrast { level })
    }

    pub fn lut(&self) -> [u8; 256] {
        let factor = ((100.0 + self.level) / 100.0).powi(2);
        build_lut(|i| ((i / 255.0 - 0.5) * factor + 0.5) * 255.0)
    }

    pub fn render(&self, image: DynamicImage) -> ProcessingResult<DynamicImage> {
        Ok(map_channels(image, &self.lut()))
    }
}

#[derive(Debug, Clone)]
pub struct Greyscale;

impl Greyscale {
    pub fn render(&self, image: DynamicImage) -> ProcessingResult<DynamicImage> {
        Ok(image.grayscale())
    }
}

#[derive(Debug, Clone)]
pub struct Invert;

impl Invert {
    pub fn render(&self, mut image: DynamicImage) -> ProcessingResult<DynamicImage> {
        image.invert();
        Ok(image)
    }
}

#[async_trait]
impl TransformStep for Gamma {
    fn name(&self) -> &'static str {
        "Gamma"
    }

    fn fragment(&self) -> String {
        format!("Gamma{}", self.gamma)
    }

    async fn apply(&self, image: DynamicImage) -> ProcessingResult<DynamicImage> {
        let step = self.clone();
        offload(move || step.render(image)).await
    }
}

#[async_trait]
impl TransformStep for Brightness {
    fn name(&self) -> &'static str {
        "Brightness"
    }

    fn fragment(&self) -> String {
        format!("Brightness{}", self.level)
    }

    async fn apply(&self, image: DynamicImage) -> ProcessingResult<DynamicImage> {
        let step = self.clone();
        offload(move || step.render(image)).await
    }
}

#[async_trait]
impl TransformStep for Contrast {
    fn name(&self) -> &'static str {
        "Contrast"
    }

    fn fragment(&self) -> String {
        format!("Contrast{}", self.level)
    }

    async fn apply(&self, image: DynamicImage) -> ProcessingResult<DynamicImage> {
        let step = self.clone();
        offload(move || step.render(image)).await
    }
}

#[async_trait]
impl TransformStep for Greyscale {
    fn name(&self) -> &'static str {
        "Greyscale"
    }

    fn fragment(&self) -> String {
        "Greyscale".to_string()
    }

    async fn apply(&self, image: DynamicImage) -> ProcessingResult<DynamicImage> {
        offload(move || Greyscale.render(image)).await
    }
}

#[async_trait]
impl TransformStep for Invert {
    fn name(&self) -> &'static str {
        "Invert"
    }

    fn fragment(&self) -> String {
        "Invert".to_string()
    }

    async fn apply(&self, image: DynamicImage) -> ProcessingResult<DynamicImage> {
        offload(move || Invert.render(image)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgba, RgbaImage};

    fn create_test_image(color: [u8; 4]) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba(color)))
    }

    fn pixel(image: &DynamicImage) -> [u8; 4] {
        image.to_rgba8().get_pixel(0, 0).0
    }

    #[test]
    fn test_gamma_range() {
        assert!(Gamma::new(0.1).is_none());
        assert!(Gamma::new(5.1).is_none());
        assert!(Gamma::new(0.2).is_some());
        assert!(Gamma::new(5.0).is_some());
    }

    #[test]
    fn test_gamma_one_is_identity() {
        let lut = Gamma::new(1.0).unwrap().lut();
        for (i, v) in lut.iter().enumerate() {
            assert_eq!(*v as usize, i);
        }
    }

    #[test]
    fn test_gamma_brightens_midtones() {
        let lut = Gamma::new(2.0).unwrap().lut();
        assert_eq!(lut[0], 0);
        assert_eq!(lut[255], 255);
        // 255 * sqrt(64/255) + 0.5 = 128.24
        assert_eq!(lut[64], 128);
    }

    #[test]
    fn test_brightness() {
        let out = Brightness::new(50)
            .render(create_test_image([100, 220, 0, 200]))
            .unwrap();
        assert_eq!(pixel(&out), [150, 255, 50, 200]);
    }

    #[test]
    fn test_brightness_underflow_lands_on_one() {
        let out = Brightness::new(-100)
            .render(create_test_image([50, 150, 100, 255]))
            .unwrap();
        assert_eq!(pixel(&out), [1, 50, 0, 255]);
    }

    #[test]
    fn test_brightness_is_clamped() {
        assert_eq!(Brightness::new(1000).level, 255);
        assert_eq!(Brightness::new(-1000).level, -255);
    }

    #[test]
    fn test_contrast_range_and_identity() {
        assert!(Contrast::new(-101.0).is_none());
        assert!(Contrast::new(100.5).is_none());
        let lut = Contrast::new(0.0).unwrap().lut();
        assert_eq!(lut[0], 0);
        assert_eq!(lut[200], 200);
    }

    #[test]
    fn test_contrast_increase_spreads_values() {
        let out = Contrast::new(100.0)
            .unwrap()
            .render(create_test_image([64, 192, 128, 255]))
            .unwrap();
        let [r, g, _, a] = pixel(&out);
        assert!(r < 64);
        assert!(g > 192);
        assert_eq!(a, 255);
    }

    #[test]
    fn test_contrast_minimum_flattens_to_grey() {
        let out = Contrast::new(-100.0)
            .unwrap()
            .render(create_test_image([0, 255, 30, 255]))
            .unwrap();
        assert_eq!(pixel(&out), [127, 127, 127, 255]);
    }

    #[test]
    fn test_greyscale() {
        let out = Greyscale.render(create_test_image([255, 0, 0, 255])).unwrap();
        let [r, g, b, _] = pixel(&out);
        assert_eq!(r, g);
        assert_eq!(g, b);
        assert_eq!(out.dimensions(), (4, 4));
    }

    #[test]
    fn test_invert() {
        let out = Invert.render(create_test_image([255, 0, 100, 255])).unwrap();
        assert_eq!(pixel(&out), [0, 255, 155, 255]);
    }

    #[tokio::test]
    async fn test_step_apply_runs_off_thread() {
        let out = Invert.apply(create_test_image([0, 0, 0, 255])).await.unwrap();
        assert_eq!(pixel(&out), [255, 255, 255, 255]);
    }

    #[test]
    fn test_fragments_differ_by_value() {
        assert_ne!(
            Gamma::new(1.5).unwrap().fragment(),
            Gamma::new(2.0).unwrap().fragment()
        );
        assert_ne!(Brightness::new(1).fragment(), Contrast::new(1.0).unwrap().fragment());
    }
}
