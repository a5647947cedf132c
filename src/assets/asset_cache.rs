//! Size-bounded TTL cache of remote emoji images

use super::catalog::assets_for;
use super::fetcher::{AssetFetcher, UreqFetcher};
use super::AssetError;
use crate::cache::CacheLayer;
use crate::config::AssetConfig;
use crate::errors::{ops, ErrorContext, ErrorReporter, ErrorSeverity};
use crate::models::MoodCategory;
use base64::Engine;
use rand::seq::IndexedRandom;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// What the panel should render for a mood
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DisplayAsset {
    /// A remote image, embedded as a `data:` URI
    Image { source_url: String, data_uri: String },
    /// Text fallback when no image could be obtained
    Glyph { text: String },
}

impl DisplayAsset {
    pub fn glyph(category: MoodCategory) -> Self {
        DisplayAsset::Glyph {
            text: assets_for(category).glyph.to_string(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, DisplayAsset::Glyph { .. })
    }
}

impl std::fmt::Display for DisplayAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisplayAsset::Image { source_url, .. } => f.write_str(source_url),
            DisplayAsset::Glyph { text } => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AssetCacheStats {
    pub current_size_bytes: usize,
    pub entry_count: usize,
    pub max_size_bytes: usize,
}

#[derive(Debug)]
struct Entry {
    data_uri: String,
    created_at: Instant,
    size: usize,
    /// Insertion order, breaks `created_at` ties
    seq: u64,
}

#[derive(Debug, Default)]
struct Store {
    entries: HashMap<String, Entry>,
    current_size: usize,
    next_seq: u64,
}

impl Store {
    fn remove(&mut self, url: &str) -> Option<Entry> {
        let entry = self.entries.remove(url)?;
        self.current_size = self.current_size.saturating_sub(entry.size);
        Some(entry)
    }

    fn oldest(&self) -> Option<String> {
        self.entries
            .iter()
            .min_by_key(|(_, e)| (e.created_at, e.seq))
            .map(|(url, _)| url.clone())
    }
}

/// Emoji image cache keyed by source URL
///
/// Network I/O happens outside the store lock. A fetch that finishes after a
/// newer one for the same URL simply overwrites it.
pub struct AssetCache {
    store: Mutex<Store>,
    /// `None` in offline mode
    fetcher: Option<Arc<dyn AssetFetcher>>,
    ttl: Duration,
    max_size: usize,
    reporter: Option<Arc<ErrorReporter>>,
}

impl AssetCache {
    /// Cache backed by HTTP, or with no fetcher at all when `config.offline`
    pub fn new(config: &AssetConfig) -> Self {
        let fetcher: Option<Arc<dyn AssetFetcher>> = if config.offline {
            info!("Asset cache running offline, using text glyphs");
            None
        } else {
            Some(Arc::new(UreqFetcher::new(config.request_timeout())))
        };
        Self::build(config, fetcher)
    }

    pub fn with_fetcher(config: &AssetConfig, fetcher: Arc<dyn AssetFetcher>) -> Self {
        Self::build(config, Some(fetcher))
    }

    fn build(config: &AssetConfig, fetcher: Option<Arc<dyn AssetFetcher>>) -> Self {
        Self {
            store: Mutex::new(Store::default()),
            fetcher,
            ttl: config.ttl(),
            max_size: config.max_cache_bytes,
            reporter: None,
        }
    }

    /// Report exhausted candidate lists to `reporter`
    pub fn with_reporter(mut self, reporter: Arc<ErrorReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn is_offline(&self) -> bool {
        self.fetcher.is_none()
    }

    /// Resolve a category, trying every candidate in order
    pub fn resolve(&self, category: MoodCategory) -> DisplayAsset {
        self.resolve_at(category, Instant::now())
    }

    pub(crate) fn resolve_at(&self, category: MoodCategory, now: Instant) -> DisplayAsset {
        let mut last_error = None;
        for url in assets_for(category).urls() {
            match self.candidate_at(&url, now) {
                Ok(asset) => return asset,
                Err(e) => {
                    debug!("Candidate {} for {} failed: {}", url, category, e);
                    last_error = Some(e);
                }
            }
        }

        if let Some(e) = last_error {
            self.report_fallback(category, &e);
        }
        DisplayAsset::glyph(category)
    }

    /// Resolve a category through one uniformly chosen candidate
    pub fn resolve_random(&self, category: MoodCategory) -> DisplayAsset {
        let urls = assets_for(category).urls();
        let Some(url) = urls.choose(&mut rand::rng()) else {
            return DisplayAsset::glyph(category);
        };

        match self.candidate_at(url, Instant::now()) {
            Ok(asset) => asset,
            Err(e) => {
                self.report_fallback(category, &e);
                DisplayAsset::glyph(category)
            }
        }
    }

    /// Warm the first candidate of every category. Returns how many are cached.
    pub fn preload(&self) -> usize {
        if self.is_offline() {
            return 0;
        }

        let now = Instant::now();
        let loaded = MoodCategory::ALL
            .into_iter()
            .filter_map(|c| assets_for(c).urls().into_iter().next())
            .filter(|url| match self.candidate_at(url, now) {
                Ok(_) => true,
                Err(e) => {
                    debug!("Preload of {} failed: {}", url, e);
                    false
                }
            })
            .count();
        info!("Preloaded {}/{} mood images", loaded, MoodCategory::ALL.len());
        loaded
    }

    pub fn description(&self, category: MoodCategory) -> &'static str {
        assets_for(category).description
    }

    /// Empty the cache and reset the size counter
    pub fn clear(&self) {
        let mut store = self.lock();
        let count = store.entries.len();
        store.entries.clear();
        store.current_size = 0;
        debug!("Cleared {} cached images", count);
    }

    pub fn stats(&self) -> AssetCacheStats {
        let store = self.lock();
        AssetCacheStats {
            current_size_bytes: store.current_size,
            entry_count: store.entries.len(),
            max_size_bytes: self.max_size,
        }
    }

    /// `now` only dates the cache lookup
    fn candidate_at(&self, url: &str, now: Instant) -> Result<DisplayAsset, AssetError> {
        if let Some(data_uri) = self.lookup_at(url, now) {
            return Ok(DisplayAsset::Image {
                source_url: url.to_string(),
                data_uri,
            });
        }

        let fetcher = self.fetcher.as_ref().ok_or(AssetError::Offline)?;
        fetcher.probe(url)?;
        let image = fetcher.fetch(url)?;

        let payload = base64::engine::general_purpose::STANDARD.encode(&image.bytes);
        let size = payload.len();
        let data_uri = format!("data:{};base64,{}", image.content_type, payload);
        // Stamped when the image arrives, not when the lookup began
        self.insert_at(url, data_uri.clone(), size, Instant::now());

        Ok(DisplayAsset::Image {
            source_url: url.to_string(),
            data_uri,
        })
    }

    /// Cached data URI if present and younger than the TTL. Expired entries
    /// are dropped.
    pub(crate) fn lookup_at(&self, url: &str, now: Instant) -> Option<String> {
        let mut store = self.lock();
        let entry = store.entries.get(url)?;
        if now.saturating_duration_since(entry.created_at) < self.ttl {
            return Some(entry.data_uri.clone());
        }

        store.remove(url);
        debug!("Expired cached image {}", url);
        None
    }

    /// Insert, evicting the oldest entries until `size` fits the budget.
    /// Entries larger than the whole budget are not cached.
    pub(crate) fn insert_at(&self, url: &str, data_uri: String, size: usize, now: Instant) -> bool {
        let mut store = self.lock();
        store.remove(url);

        if size > self.max_size {
            warn!(
                "Not caching {}: {} bytes exceeds the {} byte budget",
                url, size, self.max_size
            );
            return false;
        }

        while store.current_size + size > self.max_size {
            let Some(oldest) = store.oldest() else {
                break;
            };
            store.remove(&oldest);
            debug!("Evicted {} to make room for {}", oldest, url);
        }

        let seq = store.next_seq;
        store.next_seq += 1;
        store.current_size += size;
        store.entries.insert(
            url.to_string(),
            Entry {
                data_uri,
                created_at: now,
                size,
                seq,
            },
        );
        true
    }

    fn report_fallback(&self, category: MoodCategory, err: &AssetError) {
        match &self.reporter {
            Some(reporter) if !matches!(err, AssetError::Offline) => reporter.report(
                err,
                ErrorContext::new(ops::EMOJI_LOADING, ErrorSeverity::Low),
            ),
            _ => debug!("Using {} glyph: {}", category, err),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CacheLayer for AssetCache {
    fn name(&self) -> &str {
        "emoji-assets"
    }

    fn is_populated(&self) -> bool {
        !self.lock().entries.is_empty()
    }

    /// Images are keyed by URL, not by source file
    fn invalidate_files(&self, _files: &[&str]) {}

    fn invalidate_all(&self) {
        self.clear();
    }
}
