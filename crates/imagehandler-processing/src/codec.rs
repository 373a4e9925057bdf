//! Decoding input bytes and encoding pipeline output.

use std::io::Cursor;
use std::path::Path;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, ImageReader, Rgba, RgbaImage};

use crate::error::{ProcessingError, ProcessingResult};

/// Formats the handler can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
    Gif,
    Bmp,
}

impl OutputFormat {
    /// Map a `format` parameter or a file extension, with or without the dot.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(OutputFormat::Jpeg),
            "png" => Some(OutputFormat::Png),
            "gif" => Some(OutputFormat::Gif),
            "bmp" => Some(OutputFormat::Bmp),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::Gif => "image/gif",
            OutputFormat::Bmp => "image/bmp",
        }
    }

    fn image_format(&self) -> ImageFormat {
        match self {
            OutputFormat::Jpeg => ImageFormat::Jpeg,
            OutputFormat::Png => ImageFormat::Png,
            OutputFormat::Gif => ImageFormat::Gif,
            OutputFormat::Bmp => ImageFormat::Bmp,
        }
    }
}

/// Decode any supported image, guessing the format from its content.
pub fn decode(data: &[u8]) -> ProcessingResult<DynamicImage> {
    let reader = ImageReader::new(Cursor::new(data)).with_guessed_format()?;
    Ok(reader.decode()?)
}

/// Encode `image` as `format`. `jpeg_quality` only applies to JPEG.
pub fn encode(
    image: &DynamicImage,
    format: OutputFormat,
    jpeg_quality: u8,
) -> ProcessingResult<Bytes> {
    let mut buffer = Cursor::new(Vec::new());
    match format {
        OutputFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut buffer, jpeg_quality.clamp(1, 100));
            DynamicImage::ImageRgb8(image.to_rgb8()).write_with_encoder(encoder)?;
        }
        OutputFormat::Png => image.write_to(&mut buffer, format.image_format())?,
        OutputFormat::Gif | OutputFormat::Bmp => {
            DynamicImage::ImageRgba8(image.to_rgba8()).write_to(&mut buffer, format.image_format())?
        }
    }
    Ok(Bytes::from(buffer.into_inner()))
}

/// 1x1 fully transparent PNG served when nothing better is available.
pub fn empty_image() -> ProcessingResult<Bytes> {
    let pixel = DynamicImage::ImageRgba8(RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 0])));
    encode(&pixel, OutputFormat::Png, 100)
}

/// Reject a canvas whose width or height exceeds `max_edge`.
pub fn check_canvas(width: u32, height: u32, max_edge: u32) -> ProcessingResult<()> {
    if width > max_edge || height > max_edge {
        return Err(ProcessingError::InvalidOptions(format!(
            "canvas of {}x{} exceeds the {} px limit",
            width, height, max_edge
        )));
    }
    Ok(())
}

/// `edge` plus `border` on both sides.
pub fn padded(edge: u32, border: u32) -> ProcessingResult<u32> {
    border
        .checked_mul(2)
        .and_then(|both| both.checked_add(edge))
        .ok_or_else(|| {
            ProcessingError::InvalidOptions(format!("border of {} px is too large", border))
        })
}

/// Starting image for pipelines that have no source file.
pub fn blank_canvas() -> DynamicImage {
    DynamicImage::new_rgb8(1, 1)
}
