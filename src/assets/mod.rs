//! Emoji assets for mood categories
//!
//! Each category has an ordered list of remote images and a text glyph.
//! [`AssetCache`] resolves a category to a displayable asset:
//!
//! 1. A cached image younger than the TTL (default 24h)
//! 2. Otherwise probe, fetch and cache the next candidate
//! 3. If every candidate fails, the text glyph
//!
//! Cached images are kept as `data:` URIs under a byte budget (default
//! 50 MiB). When an insert would overflow it, entries are evicted in
//! insertion order, oldest first.

mod asset_cache;
mod catalog;
mod fetcher;

pub use asset_cache::{AssetCache, AssetCacheStats, DisplayAsset};
pub use catalog::{assets_for, MoodAssets};
pub use fetcher::{AssetFetcher, FetchedImage, UreqFetcher};

use thiserror::Error;

/// Failure to obtain one candidate image
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: ureq::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("{url} is not an image (content-type: {content_type:?})")]
    NotAnImage { url: String, content_type: String },

    #[error("Failed to read body of {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: ureq::Error,
    },

    #[error("Network access disabled (offline mode)")]
    Offline,
}
