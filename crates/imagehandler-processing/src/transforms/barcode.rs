use std::str::FromStr;

use async_trait::async_trait;
use barcoders::sym::codabar::Codabar;
use barcoders::sym::code128::Code128;
use barcoders::sym::code39::Code39;
use barcoders::sym::ean13::EAN13;
use barcoders::sym::ean8::EAN8;
use barcoders::sym::tf::TF;
use image::{DynamicImage, Rgb, RgbImage};
use imagehandler_core::MAX_DIMENSION;
use percent_encoding::percent_decode_str;
use qrcode::{Color, QrCode};

use crate::codec::{check_canvas, padded};
use crate::error::{ProcessingError, ProcessingResult};
use crate::traits::{offload, TransformStep};

const INK: Rgb<u8> = Rgb([0, 0, 0]);
const PAPER: Rgb<u8> = Rgb([255, 255, 255]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarcodeKind {
    QrCode,
    Ean13,
    UpcA,
    Ean8,
    Code39,
    Code128,
    Itf,
    Codabar,
    Plessey,
    Msi,
    Pdf417,
    Aztec,
    DataMatrix,
}

impl FromStr for BarcodeKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use BarcodeKind::*;
        match s.trim().to_ascii_lowercase().as_str() {
            "qrcode" => Ok(QrCode),
            "ean13" => Ok(Ean13),
            "upca" => Ok(UpcA),
            "ean8" => Ok(Ean8),
            "code39" => Ok(Code39),
            "code128" => Ok(Code128),
            "itf" => Ok(Itf),
            "codabar" => Ok(Codabar),
            "plessey" => Ok(Plessey),
            "msi" => Ok(Msi),
            "pdf417" => Ok(Pdf417),
            "aztec" => Ok(Aztec),
            "datamatrix" => Ok(DataMatrix),
            _ => Err(()),
        }
    }
}

/// Generated barcode image. `border` is the quiet zone, in modules.
#[derive(Debug, Clone)]
pub struct Barcode {
    pub kind: Option<BarcodeKind>,
    /// Raw `content` parameter, possibly percent-encoded.
    pub content: String,
    pub width: u32,
    pub height: u32,
    pub border: u32,
    pub max_dimension: u32,
}

impl Barcode {
    pub const DEFAULT_SIZE: u32 = 100;

    pub fn new(kind: Option<BarcodeKind>, content: impl Into<String>) -> Self {
        Barcode {
            kind,
            content: content.into(),
            width: Self::DEFAULT_SIZE,
            height: Self::DEFAULT_SIZE,
            border: 0,
            max_dimension: MAX_DIMENSION,
        }
    }

    pub fn decoded_content(&self) -> String {
        percent_decode_str(&self.content)
            .decode_utf8_lossy()
            .into_owned()
    }

    pub fn render(&self) -> ProcessingResult<DynamicImage> {
        let kind = self
            .kind
            .ok_or_else(|| ProcessingError::Barcode("missing or unknown barcode type".to_string()))?;
        if self.width == 0 || self.height == 0 {
            return Err(ProcessingError::InvalidOptions(
                "barcode needs a non-zero width and height".to_string(),
            ));
        }
        check_canvas(self.width, self.height, self.max_dimension)?;

        let content = self.decoded_content();
        let image = match kind {
            BarcodeKind::QrCode => self.draw_matrix(&content)?,
            linear => self.draw_bars(&encode_linear(linear, &content)?),
        };
        Ok(DynamicImage::ImageRgb8(image))
    }

    fn draw_matrix(&self, content: &str) -> ProcessingResult<RgbImage> {
        let code = QrCode::new(content.as_bytes())
            .map_err(|e| ProcessingError::Barcode(format!("qrcode: {}", e)))?;
        let modules = code.width() as u32;
        let colors = code.to_colors();

        let span = padded(modules, self.border)?;
        let module_px = (self.width.min(self.height) / span).max(1);
        let extent = span as i64 * module_px as i64;
        let offset_x = (self.width as i64 - extent) / 2;
        let offset_y = (self.height as i64 - extent) / 2;
        let quiet = self.border as i64 * module_px as i64;

        Ok(RgbImage::from_fn(self.width, self.height, |x, y| {
            let mx = (x as i64 - offset_x - quiet).div_euclid(module_px as i64);
            let my = (y as i64 - offset_y - quiet).div_euclid(module_px as i64);
            let inside = (0..modules as i64).contains(&mx) && (0..modules as i64).contains(&my);
            if inside && colors[(my as u32 * modules + mx as u32) as usize] == Color::Dark {
                INK
            } else {
                PAPER
            }
        }))
    }

    fn draw_bars(&self, bars: &[u8]) -> RgbImage {
        let span = bars.len() as f64 + 2.0 * self.border as f64;
        let module_px = self.width as f64 / span;
        RgbImage::from_fn(self.width, self.height, |x, _| {
            let module = (x as f64 / module_px).floor() as i64 - self.border as i64;
            match usize::try_from(module).ok().and_then(|i| bars.get(i)) {
                Some(1) => INK,
                _ => PAPER,
            }
        })
    }
}

fn barcode_error(kind: BarcodeKind) -> impl Fn(barcoders::error::Error) -> ProcessingError {
    move |e| ProcessingError::Barcode(format!("{:?}: {:?}", kind, e))
}

/// Module sequence (1 = bar) for the one-dimensional symbologies.
fn encode_linear(kind: BarcodeKind, content: &str) -> ProcessingResult<Vec<u8>> {
    let digits_without_check = |len: usize| -> String {
        let mut data = content.to_string();
        if data.len() == len + 1 {
            data.pop();
        }
        data
    };

    let bars = match kind {
        BarcodeKind::Ean13 => EAN13::new(digits_without_check(12))
            .map_err(barcode_error(kind))?
            .encode(),
        // UPC-A is EAN-13 with a leading zero.
        BarcodeKind::UpcA => EAN13::new(format!("0{}", digits_without_check(11)))
            .map_err(barcode_error(kind))?
            .encode(),
        BarcodeKind::Ean8 => EAN8::new(digits_without_check(7))
            .map_err(barcode_error(kind))?
            .encode(),
        BarcodeKind::Code39 => Code39::new(content.to_ascii_uppercase())
            .map_err(barcode_error(kind))?
            .encode(),
        BarcodeKind::Code128 => {
            let data = if content.starts_with(['À', 'Ɓ', 'Ć']) {
                content.to_string()
            } else {
                format!("Ɓ{}", content)
            };
            Code128::new(data).map_err(barcode_error(kind))?.encode()
        }
        BarcodeKind::Itf => TF::interleaved(content.to_string())
            .map_err(barcode_error(kind))?
            .encode(),
        BarcodeKind::Codabar => {
            let upper = content.to_ascii_uppercase();
            let framed = upper.starts_with(['A', 'B', 'C', 'D'])
                && upper.ends_with(['A', 'B', 'C', 'D']);
            let data = if framed { upper } else { format!("A{}A", upper) };
            Codabar::new(data).map_err(barcode_error(kind))?.encode()
        }
        unsupported => {
            return Err(ProcessingError::Barcode(format!(
                "{:?} barcodes are not supported",
                unsupported
            )))
        }
    };
    Ok(bars)
}

#[async_trait]
impl TransformStep for Barcode {
    fn name(&self) -> &'static str {
        "Barcode"
    }

    fn fragment(&self) -> String {
        let kind = self.kind.map(|k| format!("{:?}", k)).unwrap_or_default();
        format!(
            "Barcode{}-{}-{}{}-{}",
            kind, self.width, self.height, self.content, self.border
        )
    }

    async fn apply(&self, _image: DynamicImage) -> ProcessingResult<DynamicImage> {
        let step = self.clone();
        offload(move || step.render()).await
    }
}
