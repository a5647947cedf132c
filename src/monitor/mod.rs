//! Event-driven mood monitor
//!
//! Connects the editor side ([`DiagnosticsSource`], [`MoodSink`]) to the
//! classifier, scorer and caches:
//!
//! ```text
//! diagnostics changed ─► debounce ─► should_analyze? ──no──► redisplay cached
//!                                        │yes
//!                                        ▼
//!                     classify ─► score ─► cache ─► resolve asset ─► sink
//! ```
//!
//! All work runs on the tokio runtime. Network fetches for emoji images go
//! to the blocking pool so new events keep flowing while a fetch is pending.

use crate::assets::{AssetCache, DisplayAsset};
use crate::cache::{CacheCoordinator, ScoreCache};
use crate::config::MoodConfig;
use crate::diagnostics::DiagnosticClassifier;
use crate::errors::{ops, ErrorContext, ErrorReporter, ErrorSeverity};
use crate::languages;
use crate::models::{Diagnostic, MoodChange, MoodScore};
use crate::scoring::{self, MoodScorer};
use dashmap::DashMap;
use serde::Serialize;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Scores kept per file for `trend`
pub const HISTORY_LIMIT: usize = 10;

/// What the editor knows about an open document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInfo {
    pub line_count: usize,
    pub language_id: String,
}

/// Supplies diagnostics and document metadata
pub trait DiagnosticsSource: Send + Sync {
    /// Current issues for `file`
    fn diagnostics(&self, file: &str) -> Vec<Diagnostic>;

    /// `None` if the file is not open
    fn document(&self, file: &str) -> Option<DocumentInfo>;

    fn active_file(&self) -> Option<String>;
}

/// Receives mood updates for display
pub trait MoodSink: Send + Sync {
    fn display(&self, update: MoodUpdate);
}

/// One thing to show in the panel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoodUpdate {
    pub score: MoodScore,
    pub asset: DisplayAsset,
    pub description: &'static str,
    /// Compared to the previous score for the file, `None` for the first one
    pub change: Option<MoodChange>,
}

struct Inner {
    source: Arc<dyn DiagnosticsSource>,
    sink: Arc<dyn MoodSink>,
    scorer: MoodScorer,
    scores: Arc<ScoreCache>,
    assets: Arc<AssetCache>,
    reporter: Arc<ErrorReporter>,
    caches: CacheCoordinator,
    history: DashMap<String, VecDeque<MoodScore>>,
    override_languages: Vec<String>,
    debounce_delay: Duration,
    cleanup_interval: Duration,
}

pub struct MoodMonitor {
    inner: Arc<Inner>,
    cleanup_task: Mutex<Option<JoinHandle<()>>>,
}

impl MoodMonitor {
    pub fn new(
        config: &MoodConfig,
        source: Arc<dyn DiagnosticsSource>,
        sink: Arc<dyn MoodSink>,
        reporter: Arc<ErrorReporter>,
    ) -> Self {
        let assets = Arc::new(AssetCache::new(&config.assets).with_reporter(reporter.clone()));
        Self::with_assets(config, source, sink, reporter, assets)
    }

    /// Use an existing asset cache, e.g. one already preloaded
    pub fn with_assets(
        config: &MoodConfig,
        source: Arc<dyn DiagnosticsSource>,
        sink: Arc<dyn MoodSink>,
        reporter: Arc<ErrorReporter>,
        assets: Arc<AssetCache>,
    ) -> Self {
        let scores = Arc::new(ScoreCache::new(&config.cache));

        let mut caches = CacheCoordinator::new();
        caches.register(scores.clone());
        caches.register(assets.clone());

        let inner = Inner {
            source,
            sink,
            scorer: MoodScorer::new(config.scoring.clone()),
            scores,
            assets,
            reporter,
            caches,
            history: DashMap::new(),
            override_languages: config.diagnostics.structural_override_languages.clone(),
            debounce_delay: config.cache.debounce(),
            cleanup_interval: config.cache.cleanup_interval(),
        };

        Self {
            inner: Arc::new(inner),
            cleanup_task: Mutex::new(None),
        }
    }

    /// Schedule a debounced analysis for every supported file in `files`
    pub fn on_diagnostics_changed<S: AsRef<str>>(&self, files: &[S]) {
        for file in files {
            let file = file.as_ref();
            if !self.inner.is_supported(file) {
                debug!("Ignoring diagnostics for unsupported file {}", file);
                continue;
            }

            let inner = Arc::clone(&self.inner);
            let path = file.to_string();
            self.inner
                .scores
                .debounce(file, self.inner.debounce_delay, move || async move {
                    inner.analyze_debounced(path).await;
                });
        }
    }

    /// Analyze the active file right away, serving a fresh cached score if
    /// there is one.
    pub async fn analyze_active(&self) -> Option<MoodScore> {
        let file = self.inner.source.active_file()?;
        if !self.inner.is_supported(&file) {
            return None;
        }

        if let Some(cached) = self.inner.scores.get(&file) {
            self.inner
                .present(cached.clone(), Some(MoodChange::Unchanged))
                .await;
            return Some(cached);
        }
        self.inner.analyze_now(file).await
    }

    /// Recency-weighted average of the recent scores for `file`
    pub fn trend(&self, file: &str) -> f64 {
        self.inner
            .history
            .get(file)
            .map(|h| scoring::trend(&h.iter().cloned().collect::<Vec<_>>()))
            .unwrap_or(0.0)
    }

    /// Recent scores for `file`, oldest first
    pub fn history(&self, file: &str) -> Vec<MoodScore> {
        self.inner
            .history
            .get(file)
            .map(|h| h.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Drop cached state for `file` so the next event re-analyzes it.
    /// History is kept.
    pub fn invalidate(&self, file: &str) {
        self.inner.caches.invalidate_files(&[file]);
    }

    /// Start the periodic sweep of expired scores. Idempotent.
    pub fn spawn_cleanup(&self) {
        let mut slot = self
            .cleanup_task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if slot.is_some() {
            return;
        }

        let scores = Arc::clone(&self.inner.scores);
        let period = self.inner.cleanup_interval;
        *slot = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // First tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let evicted = scores.cleanup_expired();
                if evicted > 0 {
                    debug!("Cleaned up {} expired mood scores", evicted);
                }
            }
        }));
    }

    /// Stop background work and drop every cache
    pub fn shutdown(&self) {
        if let Some(task) = self
            .cleanup_task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
        {
            task.abort();
        }
        self.inner.caches.invalidate_all();
        self.inner.history.clear();
        info!("Mood monitor shut down");
    }

    pub fn is_healthy(&self) -> bool {
        self.inner.reporter.is_healthy()
    }

    pub fn score_cache(&self) -> &ScoreCache {
        &self.inner.scores
    }

    pub fn asset_cache(&self) -> &AssetCache {
        &self.inner.assets
    }
}

impl Drop for MoodMonitor {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.cleanup_task.lock() {
            if let Some(task) = slot.take() {
                task.abort();
            }
        }
    }
}

impl Inner {
    fn is_supported(&self, file: &str) -> bool {
        self.source
            .document(file)
            .is_some_and(|doc| languages::is_supported(&doc.language_id))
    }

    async fn analyze_debounced(&self, file: String) {
        if !self.scores.should_analyze(&file, "") {
            if let Some(cached) = self.scores.get(&file) {
                debug!("Reusing cached mood for {}", file);
                self.present(cached, Some(MoodChange::Unchanged)).await;
            }
            return;
        }
        self.analyze_now(file).await;
    }

    async fn analyze_now(&self, file: String) -> Option<MoodScore> {
        let doc = self.source.document(&file)?;

        let context = ErrorContext::new(ops::DIAGNOSTIC_ANALYSIS, ErrorSeverity::Medium)
            .with_file(&file)
            .with_language(&doc.language_id);
        let score = self.reporter.guard(
            || Ok::<_, Infallible>(self.compute(&file, &doc)),
            MoodScore::neutral(&file),
            context,
        );

        self.scores.cache(&file, score.clone());
        let change = self.record(&score);
        let shown = self.present(score.clone(), change).await;
        if !shown {
            debug!("Newer mood for {} already cached, dropped stale update", file);
        }
        Some(score)
    }

    fn compute(&self, file: &str, doc: &DocumentInfo) -> MoodScore {
        let issues = self.source.diagnostics(file);
        let classifier =
            DiagnosticClassifier::for_language(&doc.language_id, &self.override_languages);
        let counts = classifier.classify(&issues);
        self.scorer
            .score(counts, file, doc.line_count, &doc.language_id)
    }

    /// Append to the per-file history, returning the change from the last entry
    fn record(&self, score: &MoodScore) -> Option<MoodChange> {
        let mut history = self.history.entry(score.file_path.clone()).or_default();
        let change = history.back().map(|prev| scoring::compare(prev, score));
        if history.len() == HISTORY_LIMIT {
            history.pop_front();
        }
        history.push_back(score.clone());
        change
    }

    /// Resolve the asset and hand the update to the sink. Returns false if a
    /// newer score for the file was cached while the asset was resolving.
    async fn present(&self, score: MoodScore, change: Option<MoodChange>) -> bool {
        let category = score.category;
        let asset = if self.assets.is_offline() {
            DisplayAsset::glyph(category)
        } else {
            let assets = Arc::clone(&self.assets);
            self.reporter
                .guard_async(
                    tokio::task::spawn_blocking(move || assets.resolve(category)),
                    DisplayAsset::glyph(category),
                    ErrorContext::new(ops::EMOJI_LOADING, ErrorSeverity::Low)
                        .with_file(&score.file_path),
                )
                .await
        };

        if let Some(latest) = self.scores.get(&score.file_path) {
            if latest.timestamp > score.timestamp {
                return false;
            }
        }

        let update = MoodUpdate {
            description: scoring::describe(category),
            score,
            asset,
            change,
        };
        let context = ErrorContext::new(ops::PANEL_UPDATE, ErrorSeverity::Low)
            .with_file(&update.score.file_path);
        let sink = Arc::clone(&self.sink);
        self.reporter
            .guard(|| Ok::<_, Infallible>(sink.display(update)), (), context);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetError, AssetFetcher, FetchedImage};
    use crate::models::{DiagnosticCount, MoodCategory};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    struct FakeEditor {
        files: Mutex<HashMap<String, (DocumentInfo, Vec<Diagnostic>)>>,
        active: Mutex<Option<String>>,
    }

    impl FakeEditor {
        fn open(&self, file: &str, language_id: &str, line_count: usize, issues: Vec<Diagnostic>) {
            let doc = DocumentInfo {
                line_count,
                language_id: language_id.to_string(),
            };
            self.files.lock().unwrap().insert(file.to_string(), (doc, issues));
        }

        fn activate(&self, file: &str) {
            *self.active.lock().unwrap() = Some(file.to_string());
        }
    }

    impl DiagnosticsSource for FakeEditor {
        fn diagnostics(&self, file: &str) -> Vec<Diagnostic> {
            self.files
                .lock()
                .unwrap()
                .get(file)
                .map(|(_, issues)| issues.clone())
                .unwrap_or_default()
        }

        fn document(&self, file: &str) -> Option<DocumentInfo> {
            self.files.lock().unwrap().get(file).map(|(doc, _)| doc.clone())
        }

        fn active_file(&self) -> Option<String> {
            self.active.lock().unwrap().clone()
        }
    }

    #[derive(Default)]
    struct Panel {
        updates: Mutex<Vec<MoodUpdate>>,
        explode: bool,
    }

    impl Panel {
        fn updates(&self) -> Vec<MoodUpdate> {
            self.updates.lock().unwrap().clone()
        }
    }

    impl MoodSink for Panel {
        fn display(&self, update: MoodUpdate) {
            if self.explode {
                panic!("webview disposed");
            }
            self.updates.lock().unwrap().push(update);
        }
    }

    fn offline_config() -> MoodConfig {
        let mut config = MoodConfig::default();
        config.assets.offline = true;
        config
    }

    fn setup(panel: Panel) -> (MoodMonitor, Arc<FakeEditor>, Arc<Panel>, Arc<ErrorReporter>) {
        let editor = Arc::new(FakeEditor::default());
        let panel = Arc::new(panel);
        let reporter = Arc::new(ErrorReporter::new());
        let monitor = MoodMonitor::new(
            &offline_config(),
            editor.clone(),
            panel.clone(),
            reporter.clone(),
        );
        (monitor, editor, panel, reporter)
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_of_events_yields_one_update() {
        let (monitor, editor, panel, _) = setup(Panel::default());
        editor.open("src/app.ts", "typescript", 120, vec![Diagnostic::error("x")]);

        for _ in 0..5 {
            monitor.on_diagnostics_changed(&["src/app.ts"]);
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(panel.updates().is_empty());

        tokio::time::sleep(Duration::from_secs(1)).await;
        let updates = panel.updates();
        assert_eq!(updates.len(), 1);
        let update = &updates[0];
        assert_eq!(update.score.diagnostic_count, DiagnosticCount::new(1, 0, 0));
        assert_eq!(update.score.score, 85);
        assert_eq!(update.score.category, MoodCategory::Happy);
        assert_eq!(update.asset, DisplayAsset::glyph(MoodCategory::Happy));
        assert_eq!(update.description, scoring::describe(MoodCategory::Happy));
        assert_eq!(update.change, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_cached_score_is_redisplayed() {
        let (monitor, editor, panel, _) = setup(Panel::default());
        editor.open("a.py", "python", 10, vec![]);

        monitor.on_diagnostics_changed(&["a.py"]);
        tokio::time::sleep(Duration::from_secs(2)).await;
        editor.open("a.py", "python", 10, vec![Diagnostic::error("boom")]);
        monitor.on_diagnostics_changed(&["a.py"]);
        tokio::time::sleep(Duration::from_secs(2)).await;

        let updates = panel.updates();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[1].score, updates[0].score);
        assert_eq!(updates[1].change, Some(MoodChange::Unchanged));
        assert_eq!(monitor.history("a.py").len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidated_file_is_rescored() {
        let (monitor, editor, panel, _) = setup(Panel::default());
        editor.open("lib.rs", "rust", 50, vec![Diagnostic::error("e1"), Diagnostic::error("e2")]);
        monitor.on_diagnostics_changed(&["lib.rs"]);
        tokio::time::sleep(Duration::from_secs(2)).await;

        editor.open("lib.rs", "rust", 50, vec![]);
        monitor.invalidate("lib.rs");
        monitor.on_diagnostics_changed(&["lib.rs"]);
        tokio::time::sleep(Duration::from_secs(2)).await;

        let updates = panel.updates();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[1].score.score, 100);
        assert_eq!(updates[1].change, Some(MoodChange::Improved));

        // 71 (w1), 100 (w2)
        let expected = (71.0 + 200.0) / 3.0;
        assert!((monitor.trend("lib.rs") - expected).abs() < 1e-9);
        assert_eq!(monitor.trend("other.rs"), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsupported_files_are_ignored() {
        let (monitor, editor, panel, _) = setup(Panel::default());
        editor.open("README.md", "markdown", 10, vec![Diagnostic::warning("typo")]);

        monitor.on_diagnostics_changed(&["README.md", "not-open.ts"]);
        assert!(!monitor.score_cache().is_pending("README.md"));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(panel.updates().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_yaml_syntax_messages_count_as_errors() {
        let (monitor, editor, panel, _) = setup(Panel::default());
        editor.open(
            "ci.yml",
            "yaml",
            30,
            vec![Diagnostic::warning("Mapping values are not allowed here")],
        );
        monitor.on_diagnostics_changed(&["ci.yml"]);
        tokio::time::sleep(Duration::from_secs(1)).await;

        let updates = panel.updates();
        assert_eq!(updates[0].score.diagnostic_count, DiagnosticCount::new(1, 0, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_analyze_active() {
        let (monitor, editor, panel, _) = setup(Panel::default());
        assert!(monitor.analyze_active().await.is_none());

        editor.open("main.go", "go", 2000, vec![]);
        editor.activate("main.go");
        let first = monitor.analyze_active().await.unwrap();
        assert_eq!(first.score, 100);

        let second = monitor.analyze_active().await.unwrap();
        assert_eq!(second, first);
        assert_eq!(panel.updates().len(), 2);
        assert_eq!(monitor.history("main.go").len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sink_panic_is_reported_not_propagated() {
        let (monitor, editor, _, reporter) = setup(Panel {
            explode: true,
            ..Default::default()
        });
        editor.open("a.ts", "typescript", 10, vec![]);
        editor.activate("a.ts");

        assert!(monitor.analyze_active().await.is_some());
        let history = reporter.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].context.operation, ops::PANEL_UPDATE);
        assert!(monitor.is_healthy());
    }

    /// Blocks every fetch until released
    #[derive(Default)]
    struct GatedFetcher {
        entered: AtomicBool,
        released: AtomicBool,
    }

    impl AssetFetcher for GatedFetcher {
        fn probe(&self, _url: &str) -> Result<(), AssetError> {
            Ok(())
        }

        fn fetch(&self, _url: &str) -> Result<FetchedImage, AssetError> {
            self.entered.store(true, Ordering::SeqCst);
            while !self.released.load(Ordering::SeqCst) {
                std::thread::sleep(Duration::from_millis(5));
            }
            Ok(FetchedImage {
                content_type: "image/png".to_string(),
                bytes: vec![1, 2, 3],
            })
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_update_superseded_during_fetch_is_dropped() {
        let config = MoodConfig::default();
        let editor = Arc::new(FakeEditor::default());
        let panel = Arc::new(Panel::default());
        let reporter = Arc::new(ErrorReporter::new());
        let fetcher = Arc::new(GatedFetcher::default());
        let assets = Arc::new(AssetCache::with_fetcher(&config.assets, fetcher.clone()));
        let monitor = Arc::new(MoodMonitor::with_assets(
            &config,
            editor.clone(),
            panel.clone(),
            reporter,
            assets,
        ));
        editor.open("a.ts", "typescript", 10, vec![Diagnostic::error("x")]);
        editor.activate("a.ts");

        let analysis = {
            let monitor = Arc::clone(&monitor);
            tokio::spawn(async move { monitor.analyze_active().await })
        };
        while !fetcher.entered.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        // A newer score lands while the emoji is still loading
        let mut newer = MoodScore::neutral("a.ts");
        newer.timestamp = chrono::Utc::now() + chrono::Duration::seconds(1);
        monitor.score_cache().cache("a.ts", newer.clone());
        fetcher.released.store(true, Ordering::SeqCst);

        let stale = analysis.await.unwrap().unwrap();
        assert_eq!(stale.score, 85);
        assert!(panel.updates().is_empty());
        assert_eq!(monitor.score_cache().get("a.ts"), Some(newer));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_online_update_carries_fetched_image() {
        let config = MoodConfig::default();
        let editor = Arc::new(FakeEditor::default());
        let panel = Arc::new(Panel::default());
        let fetcher = Arc::new(GatedFetcher::default());
        fetcher.released.store(true, Ordering::SeqCst);
        let assets = Arc::new(AssetCache::with_fetcher(&config.assets, fetcher));
        let monitor = MoodMonitor::with_assets(
            &config,
            editor.clone(),
            panel.clone(),
            Arc::new(ErrorReporter::new()),
            assets,
        );
        editor.open("a.ts", "typescript", 10, vec![]);
        editor.activate("a.ts");

        monitor.analyze_active().await.unwrap();
        let updates = panel.updates();
        assert_eq!(updates.len(), 1);
        assert!(!updates[0].asset.is_fallback());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_task_evicts_expired_scores() {
        let (monitor, editor, _, _) = setup(Panel::default());
        editor.open("a.ts", "typescript", 10, vec![]);
        editor.activate("a.ts");
        monitor.analyze_active().await;
        assert_eq!(monitor.score_cache().stats().entries, 1);

        monitor.spawn_cleanup();
        monitor.spawn_cleanup();
        tokio::time::sleep(Duration::from_secs(65)).await;
        assert_eq!(monitor.score_cache().stats().entries, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_clears_everything() {
        let (monitor, editor, panel, _) = setup(Panel::default());
        editor.open("a.ts", "typescript", 10, vec![]);
        editor.activate("a.ts");
        monitor.analyze_active().await;
        monitor.on_diagnostics_changed(&["a.ts"]);
        monitor.spawn_cleanup();

        monitor.shutdown();
        assert_eq!(monitor.score_cache().stats().entries, 0);
        assert_eq!(monitor.score_cache().stats().pending, 0);
        assert_eq!(monitor.asset_cache().stats().entry_count, 0);
        assert!(monitor.history("a.ts").is_empty());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(panel.updates().len(), 1);
    }
}
