//! Unified cache trait for coordinated invalidation
//!
//! The score cache and the asset cache both implement [`CacheLayer`] so the
//! monitor can drop per-file state and shut everything down in one place.

use std::sync::Arc;

/// Common interface for cache layers
pub trait CacheLayer: Send + Sync {
    /// Name of this cache layer (for logging)
    fn name(&self) -> &str;

    /// Check if this cache has any data
    fn is_populated(&self) -> bool;

    /// Drop everything held for the given files
    fn invalidate_files(&self, files: &[&str]);

    /// Invalidate all cached data
    fn invalidate_all(&self);
}

/// Coordinates invalidation across multiple cache layers
#[derive(Default)]
pub struct CacheCoordinator {
    layers: Vec<Arc<dyn CacheLayer>>,
}

impl CacheCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, layer: Arc<dyn CacheLayer>) {
        tracing::debug!("Registered cache layer: {}", layer.name());
        self.layers.push(layer);
    }

    /// Invalidate specific files across all cache layers
    pub fn invalidate_files(&self, files: &[&str]) {
        for layer in &self.layers {
            layer.invalidate_files(files);
            tracing::debug!(
                "Invalidated {} files in cache layer: {}",
                files.len(),
                layer.name()
            );
        }
    }

    /// Invalidate all data across all cache layers
    pub fn invalidate_all(&self) {
        for layer in &self.layers {
            layer.invalidate_all();
            tracing::debug!("Invalidated all data in cache layer: {}", layer.name());
        }
    }

    /// Check if all layers are populated (warm cache)
    pub fn all_populated(&self) -> bool {
        self.layers.iter().all(|l| l.is_populated())
    }
}
