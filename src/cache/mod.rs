//! Mood score caching
//!
//! [`ScoreCache`] memoizes the last score per file and owns the debounce
//! timers that coalesce bursts of diagnostic events into one analysis:
//!
//! - `should_analyze`: no analysis within the minimum interval (default 1s),
//!   and none while a cached score is younger than the TTL (default 30s)
//! - `debounce`: only the last request within the delay (default 500ms)
//!   runs
//! - `cleanup_expired`: periodic sweep bounding memory independent of reads
//!
//! Both caches implement [`CacheLayer`] so a [`CacheCoordinator`] can
//! invalidate them together.

mod score_cache;
pub mod traits;

pub use score_cache::{ScoreCache, ScoreCacheStats};
pub use traits::{CacheCoordinator, CacheLayer};
