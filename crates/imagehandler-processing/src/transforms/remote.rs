use std::time::Duration;

use async_trait::async_trait;
use image::DynamicImage;

use crate::codec;
use crate::error::{ProcessingError, ProcessingResult};
use crate::traits::{offload, TransformStep};

/// Replaces the image with one downloaded over HTTP.
#[derive(Debug, Clone)]
pub struct RemoteImage {
    pub url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl RemoteImage {
    pub fn new(url: impl Into<String>, client: reqwest::Client, timeout: Duration) -> Self {
        RemoteImage {
            url: url.into(),
            timeout,
            client,
        }
    }

    async fn fetch(&self) -> ProcessingResult<bytes::Bytes> {
        let response = self
            .client
            .get(&self.url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.fetch_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProcessingError::RemoteFetch(format!(
                "{} answered {}",
                self.url, status
            )));
        }

        response.bytes().await.map_err(|e| self.fetch_error(e))
    }

    fn fetch_error(&self, e: reqwest::Error) -> ProcessingError {
        if e.is_timeout() {
            ProcessingError::Timeout(self.timeout)
        } else {
            ProcessingError::from(e)
        }
    }
}

#[async_trait]
impl TransformStep for RemoteImage {
    fn name(&self) -> &'static str {
        "RemoteImage"
    }

    fn fragment(&self) -> String {
        format!("RemoteImage-{}", self.url)
    }

    async fn apply(&self, _image: DynamicImage) -> ProcessingResult<DynamicImage> {
        let body = self.fetch().await?;
        tracing::debug!(url = %self.url, bytes = body.len(), "Fetched remote image");
        offload(move || codec::decode(&body)).await
    }
}
