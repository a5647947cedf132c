//! Remote image fetching
//!
//! Uses ureq (sync HTTP). Callers on an async runtime run it on the
//! blocking pool.

use super::AssetError;
use std::time::Duration;
use tracing::debug;

/// A downloaded image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedImage {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Source of remote images
pub trait AssetFetcher: Send + Sync {
    /// Cheap existence check. Must reject anything that is not an image.
    fn probe(&self, url: &str) -> Result<(), AssetError>;

    /// Download the full resource
    fn fetch(&self, url: &str) -> Result<FetchedImage, AssetError>;
}

/// HTTP fetcher: HEAD to probe, GET to download
pub struct UreqFetcher {
    agent: ureq::Agent,
}

impl UreqFetcher {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::config::Config::builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent }
    }
}

fn content_type(response: &ureq::http::Response<ureq::Body>) -> String {
    response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn check_status(url: &str, status: ureq::http::StatusCode) -> Result<(), AssetError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(AssetError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        })
    }
}

fn check_image(url: &str, content_type: &str) -> Result<(), AssetError> {
    if content_type.starts_with("image/") {
        Ok(())
    } else {
        Err(AssetError::NotAnImage {
            url: url.to_string(),
            content_type: content_type.to_string(),
        })
    }
}

impl AssetFetcher for UreqFetcher {
    fn probe(&self, url: &str) -> Result<(), AssetError> {
        let response = self
            .agent
            .head(url)
            .call()
            .map_err(|source| AssetError::Transport {
                url: url.to_string(),
                source,
            })?;

        check_status(url, response.status())?;
        check_image(url, &content_type(&response))?;
        debug!("Probe ok: {}", url);
        Ok(())
    }

    fn fetch(&self, url: &str) -> Result<FetchedImage, AssetError> {
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|source| AssetError::Transport {
                url: url.to_string(),
                source,
            })?;

        check_status(url, response.status())?;
        let content_type = content_type(&response);
        check_image(url, &content_type)?;

        let bytes = response
            .into_body()
            .read_to_vec()
            .map_err(|source| AssetError::Body {
                url: url.to_string(),
                source,
            })?;
        debug!("Fetched {} ({} bytes)", url, bytes.len());

        Ok(FetchedImage {
            content_type,
            bytes,
        })
    }
}
