//! Web page capture
//!
//! Rendering a page to pixels needs a browser, which lives outside this
//! process. [`PageCapture`] is the seam: it takes a URL and returns encoded
//! image bytes. [`HttpPageCapture`] talks to a capture service over HTTP.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{ProcessingError, ProcessingResult};

/// Renders a web page into encoded image bytes.
#[async_trait]
pub trait PageCapture: Send + Sync {
    async fn capture(&self, url: &str) -> ProcessingResult<Bytes>;
}

/// Page capture through an HTTP screenshot service.
///
/// Issues `GET {endpoint}?url={url}` and expects the image in the body.
pub struct HttpPageCapture {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpPageCapture {
    pub fn new(endpoint: impl Into<String>, client: reqwest::Client) -> Self {
        HttpPageCapture {
            endpoint: endpoint.into(),
            client,
        }
    }
}

#[async_trait]
impl PageCapture for HttpPageCapture {
    async fn capture(&self, url: &str) -> ProcessingResult<Bytes> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("url", url)])
            .send()
            .await
            .map_err(|e| ProcessingError::Capture(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProcessingError::Capture(format!(
                "capture service answered {} for {}",
                status, url
            )));
        }

        response
            .bytes()
            .await
            .map_err(|e| ProcessingError::Capture(e.to_string()))
    }
}

/// Stand-in used when no capture service is configured.
pub struct UnavailableCapture;

#[async_trait]
impl PageCapture for UnavailableCapture {
    async fn capture(&self, url: &str) -> ProcessingResult<Bytes> {
        Err(ProcessingError::Capture(format!(
            "no capture service configured, cannot render {}",
            url
        )))
    }
}
