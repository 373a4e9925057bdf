use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use image::{DynamicImage, GenericImageView};

use crate::capture::PageCapture;
use crate::codec;
use crate::error::{ProcessingError, ProcessingResult};
use crate::traits::{offload, TransformStep};

/// Aspect ratio the captured page is cropped to, from the top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureRatio {
    /// Whole page, uncropped.
    #[default]
    Full,
    /// 3:2
    Screen,
    /// 16:9
    Cinema,
}

impl CaptureRatio {
    /// Visible height for a page `width` pixels wide and `height` tall.
    pub fn crop_height(&self, width: u32, height: u32) -> u32 {
        let wanted = match self {
            CaptureRatio::Full => return height,
            CaptureRatio::Screen => width as u64 * 2 / 3,
            CaptureRatio::Cinema => width as u64 * 9 / 16,
        };
        (wanted as u32).min(height)
    }
}

impl FromStr for CaptureRatio {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(CaptureRatio::Full),
            "screen" => Ok(CaptureRatio::Screen),
            "cinema" => Ok(CaptureRatio::Cinema),
            _ => Err(()),
        }
    }
}

/// Replaces the image with a rendering of a web page.
#[derive(Clone)]
pub struct UrlCapture {
    pub url: String,
    pub ratio: CaptureRatio,
    timeout: Duration,
    capture: Arc<dyn PageCapture>,
}

impl UrlCapture {
    pub fn new(
        url: impl Into<String>,
        ratio: CaptureRatio,
        capture: Arc<dyn PageCapture>,
        timeout: Duration,
    ) -> Self {
        UrlCapture {
            url: url.into(),
            ratio,
            timeout,
            capture,
        }
    }
}

#[async_trait]
impl TransformStep for UrlCapture {
    fn name(&self) -> &'static str {
        "UrlCapture"
    }

    fn fragment(&self) -> String {
        format!("UrlCapture-{}-{:?}", self.url, self.ratio)
    }

    async fn apply(&self, _image: DynamicImage) -> ProcessingResult<DynamicImage> {
        let bytes = tokio::time::timeout(self.timeout, self.capture.capture(&self.url))
            .await
            .map_err(|_| ProcessingError::Timeout(self.timeout))??;

        let ratio = self.ratio;
        offload(move || {
            let page = codec::decode(&bytes)?;
            let (width, height) = page.dimensions();
            let visible = ratio.crop_height(width, height);
            if visible == height {
                Ok(page)
            } else {
                Ok(page.crop_imm(0, 0, width, visible))
            }
        })
        .await
    }
}
