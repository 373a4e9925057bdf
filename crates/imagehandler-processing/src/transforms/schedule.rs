//! Year-at-a-glance occupancy grid.
//!
//! The matrix is 372 digits, one per day of twelve 31-day months. `0` marks a
//! day that does not exist or carries no state. `1..=4` color a cell (free,
//! reserved, occupied, selected); `6..=9` are the same states highlighted.
//! Each cell is split along its diagonal: the upper-left half carries the
//! previous day's state, the lower-right half today's, so that check-in and
//! check-out days read at a glance.

use std::sync::Arc;

use async_trait::async_trait;
use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_polygon_mut};
use imageproc::point::Point;
use imageproc::rect::Rect;

use crate::color::{color_key, BLACK, WHITE};
use crate::error::{ProcessingError, ProcessingResult};
use crate::fonts::FontLibrary;
use crate::text::{draw_in_box, points_to_px, Align};
use crate::traits::{offload, TransformStep};

const WIDTH: u32 = 486;
const HEIGHT: u32 = 224;
const MONTHS: usize = 12;
const DAYS: usize = 31;
pub const MATRIX_LEN: usize = MONTHS * DAYS;

const CELL_W: i32 = 13;
const CELL_H: i32 = 16;
const STEP_X: i32 = 14;
const STEP_Y: i32 = 17;

const EMPTY: Rgba<u8> = Rgba([204, 204, 204, 255]);
const FREE: Rgba<u8> = Rgba([1, 151, 0, 255]);
const RESERVED: Rgba<u8> = Rgba([255, 204, 0, 255]);
const OCCUPIED: Rgba<u8> = Rgba([155, 0, 3, 255]);
const SELECTED: Rgba<u8> = Rgba([1, 79, 255, 255]);
const HIGHLIGHT_ALPHA: u16 = 100;

const MONTH_NAMES: &[(&str, [&str; 12])] = &[
    ("en", ["January", "February", "March", "April", "May", "June", "July", "August", "September", "October", "November", "December"]),
    ("de", ["Januar", "Februar", "März", "April", "Mai", "Juni", "Juli", "August", "September", "Oktober", "November", "Dezember"]),
    ("fr", ["janvier", "février", "mars", "avril", "mai", "juin", "juillet", "août", "septembre", "octobre", "novembre", "décembre"]),
    ("es", ["enero", "febrero", "marzo", "abril", "mayo", "junio", "julio", "agosto", "septiembre", "octubre", "noviembre", "diciembre"]),
    ("it", ["gennaio", "febbraio", "marzo", "aprile", "maggio", "giugno", "luglio", "agosto", "settembre", "ottobre", "novembre", "dicembre"]),
    ("nl", ["januari", "februari", "maart", "april", "mei", "juni", "juli", "augustus", "september", "oktober", "november", "december"]),
    ("ru", ["Январь", "Февраль", "Март", "Апрель", "Май", "Июнь", "Июль", "Август", "Сентябрь", "Октябрь", "Ноябрь", "Декабрь"]),
    ("uk", ["Січень", "Лютий", "Березень", "Квітень", "Травень", "Червень", "Липень", "Серпень", "Вересень", "Жовтень", "Листопад", "Грудень"]),
    ("pl", ["styczeń", "luty", "marzec", "kwiecień", "maj", "czerwiec", "lipiec", "sierpień", "wrzesień", "październik", "listopad", "grudzień"]),
    ("pt", ["janeiro", "fevereiro", "março", "abril", "maio", "junho", "julho", "agosto", "setembro", "outubro", "novembro", "dezembro"]),
];

/// Month names for a culture tag such as `de-DE`; English when unknown.
pub fn month_names(culture: &str) -> &'static [&'static str; 12] {
    let language = culture
        .split(['-', '_'])
        .next()
        .unwrap_or("")
        .to_ascii_lowercase();
    MONTH_NAMES
        .iter()
        .find(|(code, _)| *code == language)
        .map(|(_, names)| names)
        .unwrap_or(&MONTH_NAMES[0].1)
}

fn state_color(state: u8) -> Option<Rgba<u8>> {
    match state {
        1 | 6 => Some(FREE),
        2 | 7 => Some(RESERVED),
        3 | 8 => Some(OCCUPIED),
        4 | 9 => Some(SELECTED),
        _ => None,
    }
}

#[derive(Clone)]
pub struct Schedule {
    pub matrix: String,
    pub culture: String,
    pub background: Rgba<u8>,
    pub fonts: Arc<FontLibrary>,
}

impl Schedule {
    pub fn new(matrix: impl Into<String>, fonts: Arc<FontLibrary>) -> Self {
        Schedule {
            matrix: matrix.into(),
            culture: "en".to_string(),
            background: WHITE,
            fonts,
        }
    }

    /// First 372 digits of the matrix, month-major.
    pub fn states(&self) -> ProcessingResult<Vec<u8>> {
        let digits = self
            .matrix
            .chars()
            .take(MATRIX_LEN)
            .map(|c| c.to_digit(10).map(|d| d as u8))
            .collect::<Option<Vec<u8>>>()
            .ok_or_else(|| {
                ProcessingError::InvalidOptions("schedule matrix must be digits".to_string())
            })?;
        if digits.len() < MATRIX_LEN {
            return Err(ProcessingError::InvalidOptions(format!(
                "schedule matrix needs {} digits, got {}",
                MATRIX_LEN,
                digits.len()
            )));
        }
        Ok(digits)
    }

    pub fn render(&self) -> ProcessingResult<DynamicImage> {
        let states = self.states()?;
        let mut canvas = RgbaImage::from_pixel(WIDTH, HEIGHT, self.background);
        self.draw_captions(&mut canvas);

        let mut yesterday = 1u8;
        let mut y = 2;
        for month in 0..MONTHS {
            y += STEP_Y;
            let mut x = 38;
            for day in 0..DAYS {
                x += STEP_X;
                let today = states[month * DAYS + day];
                if today == 0 {
                    fill_rect(&mut canvas, x, y, EMPTY);
                    continue;
                }

                let first_half = [
                    Point::new(x, y),
                    Point::new(x + CELL_W, y),
                    Point::new(x, y + CELL_H),
                ];
                let last_half = [
                    Point::new(x + CELL_W, y),
                    Point::new(x + CELL_W, y + CELL_H),
                    Point::new(x, y + CELL_H),
                ];
                if let Some(color) = state_color(today) {
                    draw_polygon_mut(&mut canvas, &last_half, color);
                }
                if let Some(color) = state_color(yesterday) {
                    draw_polygon_mut(&mut canvas, &first_half, color);
                }
                if today > 4 {
                    highlight(&mut canvas, x, y);
                }
                yesterday = today;
            }
        }

        Ok(DynamicImage::ImageRgba8(canvas))
    }

    fn draw_captions(&self, canvas: &mut RgbaImage) {
        let font = self.fonts.load("Arial");
        let scale = points_to_px(6.5);

        let names = month_names(&self.culture);
        let mut y = 2;
        for name in names {
            y += STEP_Y;
            draw_filled_rect_mut(canvas, Rect::at(1, y).of_size(50, CELL_H as u32), EMPTY);
            if let Some(font) = &font {
                draw_in_box(canvas, font, scale, BLACK, (1, y, 48, CELL_H), Align::Right, name);
            }
        }

        let mut x = 38;
        for day in 1..=DAYS {
            x += STEP_X;
            fill_rect(canvas, x, 1, EMPTY);
            if let Some(font) = &font {
                let label = format!("{:02}", day);
                draw_in_box(canvas, font, scale, BLACK, (x, 1, CELL_W, CELL_H), Align::Center, &label);
            }
        }
    }
}

fn fill_rect(canvas: &mut RgbaImage, x: i32, y: i32, color: Rgba<u8>) {
    draw_filled_rect_mut(
        canvas,
        Rect::at(x, y).of_size(CELL_W as u32, CELL_H as u32),
        color,
    );
}

/// Blend translucent white over one cell.
fn highlight(canvas: &mut RgbaImage, x: i32, y: i32) {
    for py in y..y + CELL_H {
        for px in x..x + CELL_W {
            if px < 0 || py < 0 || px as u32 >= canvas.width() || py as u32 >= canvas.height() {
                continue;
            }
            let pixel = canvas.get_pixel_mut(px as u32, py as u32);
            for channel in pixel.0.iter_mut().take(3) {
                *channel = ((*channel as u16 * (255 - HIGHLIGHT_ALPHA) + 255 * HIGHLIGHT_ALPHA)
                    / 255) as u8;
            }
        }
    }
}

#[async_trait]
impl TransformStep for Schedule {
    fn name(&self) -> &'static str {
        "Schedule"
    }

    fn fragment(&self) -> String {
        format!(
            "Schedule{}-{}-{}",
            self.matrix,
            self.culture,
            color_key(self.background)
        )
    }

    async fn apply(&self, _image: DynamicImage) -> ProcessingResult<DynamicImage> {
        let step = self.clone();
        offload(move || step.render()).await
    }
}
