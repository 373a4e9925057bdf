//! Text placement helpers shared by the drawing transforms.

use ab_glyph::{FontVec, PxScale};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};

/// Typographic points to pixels at 96 dpi.
pub(crate) fn points_to_px(points: f32) -> PxScale {
    PxScale::from(points * 96.0 / 72.0)
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Align {
    Center,
    Right,
}

/// Draw `text` inside the box `(x, y, w, h)`, vertically centered.
pub(crate) fn draw_in_box(
    canvas: &mut RgbaImage,
    font: &FontVec,
    scale: PxScale,
    color: Rgba<u8>,
    (x, y, w, h): (i32, i32, i32, i32),
    align: Align,
    text: &str,
) {
    let (tw, th) = text_size(scale, font, text);
    let (tw, th) = (tw as i32, th as i32);
    let tx = match align {
        Align::Center => x + (w - tw) / 2,
        Align::Right => x + w - tw,
    };
    let ty = y + (h - th) / 2;
    draw_text_mut(canvas, color, tx, ty, scale, font, text);
}
