//! Resolve an inbound image message into raw bytes.
//!
//! Hosts deliver images in several shapes: inline bytes, a path on disk, a
//! URL, or a lazily downloaded attachment. Strategies are tried in order and
//! the first one that yields a non-empty payload wins:
//!
//! 1. inline bytes
//! 2. the message content as a local file path
//! 3. the message content as an `http(s)://` URL
//! 4. the attachment's own content path
//! 5. ask the host to download the attachment, wait, then retry step 4

use std::{path::Path, time::Duration};

use {
    bytes::Bytes,
    faceswap_common::types::{HostAttachment, ImagePayload, InboundMessage, MessageContent},
    faceswap_config::MediaConfig,
    tracing::{debug, warn},
};

#[cfg(feature = "metrics")]
use faceswap_metrics::{counter, images as image_metrics};

use crate::error::{Error, Result};

/// Fetches image bytes for inbound messages.
#[derive(Debug, Clone)]
pub struct ImageAcquirer {
    client: reqwest::Client,
    download_timeout: Duration,
    prepare_wait: Duration,
}

impl Default for ImageAcquirer {
    fn default() -> Self {
        Self::new(&MediaConfig::default())
    }
}

impl ImageAcquirer {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            download_timeout: config.download_timeout(),
            prepare_wait: config.prepare_wait(),
        }
    }

    /// Obtain the image bytes carried by `msg`.
    ///
    /// Individual strategy failures are logged and skipped. An error is
    /// returned only when every strategy came up empty.
    pub async fn acquire(&self, msg: &InboundMessage) -> Result<Bytes> {
        let payload = match &msg.content {
            MessageContent::Image(payload) => payload,
            _ => return Err(Error::unavailable("message carries no image")),
        };

        match payload {
            ImagePayload::Bytes(data) => {
                // Inline bytes are authoritative, even when empty.
                if !data.is_empty() {
                    return Ok(data.clone());
                }
                return Err(self.fail("inline image payload is empty"));
            },
            ImagePayload::Reference(reference) => {
                if let Some(data) = self.from_reference(reference).await {
                    return Ok(data);
                }
            },
            ImagePayload::Pending => {},
        }

        if let Some(attachment) = msg.attachment.as_deref() {
            if let Some(data) = read_attachment(attachment).await {
                return Ok(data);
            }
            if !attachment.is_prepared()
                && let Some(data) = self.prepare_and_read(attachment).await
            {
                return Ok(data);
            }
        }

        Err(self.fail("no source produced image bytes"))
    }

    async fn from_reference(&self, reference: &str) -> Option<Bytes> {
        let path = Path::new(reference);
        if path.is_file()
            && let Some(data) = read_file(path).await
        {
            return Some(data);
        }

        if reference.starts_with("http://") || reference.starts_with("https://") {
            match self.download(reference).await {
                Ok(data) if !data.is_empty() => return Some(data),
                Ok(_) => warn!(url = reference, "downloaded image is empty"),
                Err(e) => warn!(url = reference, error = %e, "image download failed"),
            }
        }

        None
    }

    /// GET `url`; only a 200 response counts as success.
    pub async fn download(&self, url: &str) -> Result<Bytes> {
        let response = self
            .client
            .get(url)
            .timeout(self.download_timeout)
            .send()
            .await
            .map_err(|e| Error::external("image download", e))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(Error::unavailable(format!("HTTP {status} from {url}")));
        }

        let data = response
            .bytes()
            .await
            .map_err(|e| Error::external("reading image body", e))?;
        debug!(url, len = data.len(), "downloaded image");
        Ok(data)
    }

    async fn prepare_and_read(&self, attachment: &dyn HostAttachment) -> Option<Bytes> {
        if let Err(e) = attachment.prepare().await {
            warn!(error = %e, "host failed to prepare attachment");
            return None;
        }
        tokio::time::sleep(self.prepare_wait).await;
        read_attachment(attachment).await
    }

    fn fail(&self, message: &str) -> Error {
        #[cfg(feature = "metrics")]
        counter!(image_metrics::ACQUISITION_FAILED_TOTAL).increment(1);
        Error::unavailable(message)
    }
}

async fn read_attachment(attachment: &dyn HostAttachment) -> Option<Bytes> {
    let path = attachment.content_path()?;
    if !path.is_file() {
        return None;
    }
    read_file(&path).await
}

async fn read_file(path: &Path) -> Option<Bytes> {
    match tokio::fs::read(path).await {
        Ok(data) if !data.is_empty() => Some(Bytes::from(data)),
        Ok(_) => {
            warn!(path = %path.display(), "image file is empty");
            None
        },
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read image file");
            None
        },
    }
}
