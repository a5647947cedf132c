//! Per-file mood score cache with debounced recomputation

use super::traits::CacheLayer;
use crate::config::CacheConfig;
use crate::models::MoodScore;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone)]
struct CachedScore {
    score: MoodScore,
    stored_at: Instant,
}

#[derive(Debug)]
struct PendingTask {
    handle: AbortHandle,
    generation: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreCacheStats {
    pub entries: usize,
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
    pub pending: usize,
}

/// Last computed score per file, plus the debounce timers that refresh it
pub struct ScoreCache {
    scores: DashMap<String, CachedScore>,
    last_analysis: DashMap<String, Instant>,
    pending: Arc<DashMap<String, PendingTask>>,
    next_generation: AtomicU64,
    ttl: Duration,
    min_interval: Duration,
}

impl ScoreCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            scores: DashMap::new(),
            last_analysis: DashMap::new(),
            pending: Arc::new(DashMap::new()),
            next_generation: AtomicU64::new(0),
            ttl: config.score_ttl(),
            min_interval: config.min_analysis_interval(),
        }
    }

    /// Whether `path` is due for a fresh analysis.
    ///
    /// `_content` is reserved for content hashing; the policy is time based.
    pub fn should_analyze(&self, path: &str, _content: &str) -> bool {
        self.should_analyze_at(path, Instant::now())
    }

    pub(crate) fn should_analyze_at(&self, path: &str, now: Instant) -> bool {
        let Some(last) = self.last_analysis.get(path).map(|t| *t) else {
            return true;
        };

        if now.saturating_duration_since(last) < self.min_interval {
            return false;
        }

        let fresh = self
            .scores
            .get(path)
            .is_some_and(|c| now.saturating_duration_since(c.stored_at) < self.ttl);
        !fresh
    }

    /// Store `score` and stamp the analysis time
    pub fn cache(&self, path: &str, score: MoodScore) {
        self.cache_at(path, score, Instant::now());
    }

    pub(crate) fn cache_at(&self, path: &str, score: MoodScore, now: Instant) {
        self.scores.insert(
            path.to_string(),
            CachedScore {
                score,
                stored_at: now,
            },
        );
        self.last_analysis.insert(path.to_string(), now);
    }

    /// The cached score if younger than the TTL. Stale entries are evicted.
    pub fn get(&self, path: &str) -> Option<MoodScore> {
        self.get_at(path, Instant::now())
    }

    pub(crate) fn get_at(&self, path: &str, now: Instant) -> Option<MoodScore> {
        if let Some(cached) = self.scores.get(path) {
            if now.saturating_duration_since(cached.stored_at) < self.ttl {
                return Some(cached.score.clone());
            }
        }

        if self
            .scores
            .remove_if(path, |_, c| now.saturating_duration_since(c.stored_at) >= self.ttl)
            .is_some()
        {
            debug!("Evicted stale score for {}", path);
        }
        None
    }

    /// Run `task` after `delay`, cancelling any task still waiting for `path`.
    ///
    /// Only the last call within the window runs. A task whose delay has
    /// elapsed is no longer pending and is never cancelled. Must be called
    /// from within a tokio runtime.
    pub fn debounce<F, Fut>(&self, path: &str, delay: Duration, task: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let pending = Arc::clone(&self.pending);
        let key = path.to_string();
        let spawn = move |key: String| {
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                pending.remove_if(&key, |_, p| p.generation == generation);
                task().await;
            })
            .abort_handle()
        };

        // The slot stays locked across the spawn so the task cannot clear it
        // before it is recorded.
        match self.pending.entry(key.clone()) {
            Entry::Occupied(mut slot) => {
                slot.get().handle.abort();
                debug!("Superseded pending analysis for {}", path);
                let handle = spawn(key);
                slot.insert(PendingTask { handle, generation });
            }
            Entry::Vacant(slot) => {
                let handle = spawn(key);
                slot.insert(PendingTask { handle, generation });
            }
        }
    }

    /// Evict every score older than the TTL. Returns the number evicted.
    pub fn cleanup_expired(&self) -> usize {
        self.cleanup_expired_at(Instant::now())
    }

    pub(crate) fn cleanup_expired_at(&self, now: Instant) -> usize {
        let mut expired = Vec::new();
        self.scores.retain(|path, cached| {
            let keep = now.saturating_duration_since(cached.stored_at) < self.ttl;
            if !keep {
                expired.push(path.clone());
            }
            keep
        });

        for path in &expired {
            self.last_analysis.remove(path);
        }
        expired.len()
    }

    /// Drop the score, analysis stamp and pending task for one file
    pub fn clear_file(&self, path: &str) {
        self.scores.remove(path);
        self.last_analysis.remove(path);
        if let Some((_, task)) = self.pending.remove(path) {
            task.handle.abort();
        }
    }

    /// Cancel every pending task and empty all maps
    pub fn clear_all(&self) {
        let cancelled = self.pending.len();
        self.pending.retain(|_, task| {
            task.handle.abort();
            false
        });
        self.scores.clear();
        self.last_analysis.clear();
        debug!("Score cache cleared ({} pending analyses cancelled)", cancelled);
    }

    pub fn is_pending(&self, path: &str) -> bool {
        self.pending.contains_key(path)
    }

    pub fn stats(&self) -> ScoreCacheStats {
        let timestamps: Vec<DateTime<Utc>> =
            self.scores.iter().map(|c| c.score.timestamp).collect();
        ScoreCacheStats {
            entries: timestamps.len(),
            oldest: timestamps.iter().min().copied(),
            newest: timestamps.iter().max().copied(),
            pending: self.pending.len(),
        }
    }
}

impl CacheLayer for ScoreCache {
    fn name(&self) -> &str {
        "mood-scores"
    }

    fn is_populated(&self) -> bool {
        !self.scores.is_empty()
    }

    fn invalidate_files(&self, files: &[&str]) {
        for file in files {
            self.clear_file(file);
        }
    }

    fn invalidate_all(&self) {
        self.clear_all();
    }
}
