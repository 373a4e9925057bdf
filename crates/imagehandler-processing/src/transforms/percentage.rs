use std::sync::Arc;

use async_trait::async_trait;
use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_circle_mut};

use crate::color::{color_key, DARK_GRAY, LIGHT_GRAY, ORANGE, WHITE};
use crate::error::ProcessingResult;
use crate::fonts::FontLibrary;
use crate::text::{draw_in_box, points_to_px, Align};
use crate::traits::{offload, TransformStep};

const SIZE: u32 = 100;
const CENTER: i32 = 50;
const OUTER_RADIUS: i32 = 45;
const INNER_RADIUS: i32 = 30;

/// 100x100 ring chart filled clockwise from 12 o'clock, with a `N%` label.
#[derive(Clone)]
pub struct Percentage {
    pub value: i32,
    pub color: Rgba<u8>,
    pub fonts: Arc<FontLibrary>,
}

impl Percentage {
    pub fn new(value: i32, fonts: Arc<FontLibrary>) -> Self {
        Percentage {
            value,
            color: ORANGE,
            fonts,
        }
    }

    /// Sweep in degrees; negative values sweep counter-clockwise.
    pub fn sweep(&self) -> f64 {
        (3.6 * self.value as f64).clamp(-360.0, 360.0)
    }

    fn in_sweep(&self, x: u32, y: u32) -> bool {
        let dx = x as f64 + 0.5 - CENTER as f64;
        let dy = y as f64 + 0.5 - CENTER as f64;
        if dx * dx + dy * dy > (OUTER_RADIUS * OUTER_RADIUS) as f64 {
            return false;
        }
        // Clockwise angle from straight up, in [0, 360).
        let angle = dx.atan2(-dy).to_degrees().rem_euclid(360.0);
        let sweep = self.sweep();
        if sweep >= 0.0 {
            angle < sweep
        } else {
            angle > 360.0 + sweep
        }
    }

    pub fn render(&self) -> ProcessingResult<DynamicImage> {
        let mut canvas = RgbaImage::from_fn(SIZE, SIZE, |x, y| {
            if self.in_sweep(x, y) {
                self.color
            } else {
                WHITE
            }
        });

        draw_filled_circle_mut(&mut canvas, (CENTER, CENTER), INNER_RADIUS, WHITE);
        draw_hollow_circle_mut(&mut canvas, (CENTER, CENTER), OUTER_RADIUS, LIGHT_GRAY);
        draw_hollow_circle_mut(&mut canvas, (CENTER, CENTER), INNER_RADIUS, LIGHT_GRAY);

        if let Some(font) = self.fonts.load("Arial") {
            draw_in_box(
                &mut canvas,
                &font,
                points_to_px(13.0),
                DARK_GRAY,
                (20, 40, 62, 20),
                Align::Center,
                &format!("{}%", self.value),
            );
        }

        Ok(DynamicImage::ImageRgba8(canvas))
    }
}

#[async_trait]
impl TransformStep for Percentage {
    fn name(&self) -> &'static str {
        "Percentage"
    }

    fn fragment(&self) -> String {
        format!("Percentage{}-{}", self.value, color_key(self.color))
    }

    async fn apply(&self, _image: DynamicImage) -> ProcessingResult<DynamicImage> {
        let step = self.clone();
        offload(move || step.render()).await
    }
}
