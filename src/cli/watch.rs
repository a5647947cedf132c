//! `codemood watch` - live moods from a diagnostics report
//!
//! Watches a JSON report (`{"<file>": [{severity, message}, ...]}`) that a
//! linter or language server keeps rewriting. Every rewrite is diffed
//! against the previous one and the changed files go through the monitor.

use anyhow::{Context, Result};
use codemood::assets::{AssetCache, DisplayAsset};
use codemood::config::MoodConfig;
use codemood::errors::ErrorReporter;
use codemood::languages;
use codemood::models::{Diagnostic, MoodChange};
use codemood::monitor::{DiagnosticsSource, DocumentInfo, MoodMonitor, MoodSink, MoodUpdate};
use console::style;
use notify::RecursiveMode;
use notify_debouncer_full::{new_debouncer, DebounceEventResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

use super::score::{count_lines, format_counts, mood_label};

type Report = HashMap<String, Vec<Diagnostic>>;

/// Diagnostics as of the last report read
struct ReportSource {
    base: PathBuf,
    issues: Mutex<Report>,
}

impl ReportSource {
    fn new(base: PathBuf) -> Self {
        Self {
            base,
            issues: Mutex::new(HashMap::new()),
        }
    }

    /// Swap in a new report, returning the files whose issues changed.
    /// Files that disappeared from the report are kept as clean.
    fn replace(&self, mut report: Report) -> Vec<String> {
        let mut issues = self.issues.lock().unwrap_or_else(|p| p.into_inner());

        for (file, previous) in issues.iter() {
            if !report.contains_key(file) && !previous.is_empty() {
                report.insert(file.clone(), Vec::new());
            }
        }

        let mut changed: Vec<String> = report
            .iter()
            .filter(|(file, new)| issues.get(*file) != Some(*new))
            .map(|(file, _)| file.clone())
            .collect();
        changed.sort();

        *issues = report;
        changed
    }
}

impl DiagnosticsSource for ReportSource {
    fn diagnostics(&self, file: &str) -> Vec<Diagnostic> {
        self.issues
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(file)
            .cloned()
            .unwrap_or_default()
    }

    fn document(&self, file: &str) -> Option<DocumentInfo> {
        if !self
            .issues
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .contains_key(file)
        {
            return None;
        }

        let path = self.base.join(file);
        let language_id = languages::detect_from_path(&path)
            .map(|p| p.id.to_string())
            .unwrap_or_default();
        Some(DocumentInfo {
            line_count: count_lines(&path),
            language_id,
        })
    }

    fn active_file(&self) -> Option<String> {
        None
    }
}

/// Prints one line per mood update
struct ConsoleSink;

impl MoodSink for ConsoleSink {
    fn display(&self, update: MoodUpdate) {
        let change = match update.change {
            Some(MoodChange::Improved) => style("↑ improved").green().to_string(),
            Some(MoodChange::Worsened) => style("↓ worsened").red().to_string(),
            Some(MoodChange::Unchanged) => style("= unchanged").dim().to_string(),
            None => String::new(),
        };
        println!(
            "  {} {} {} {:>3}/100  {}  {} {}",
            style(update.score.timestamp.format("%H:%M:%S")).dim(),
            // Terminals cannot render the image
            DisplayAsset::glyph(update.score.category),
            mood_label(update.score.category),
            update.score.score,
            style(&update.score.file_path).cyan(),
            style(format_counts(&update.score.diagnostic_count)).dim(),
            change
        );
    }
}

fn load_report(path: &Path) -> Result<Report> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read report: {}", path.display()))?;
    if content.trim().is_empty() {
        return Ok(HashMap::new());
    }
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid diagnostics report: {}", path.display()))
}

fn refresh(report_path: &Path, source: &ReportSource, monitor: &MoodMonitor) {
    match load_report(report_path) {
        Ok(report) => {
            let changed = source.replace(report);
            debug!("{} files changed in report", changed.len());
            for file in &changed {
                monitor.invalidate(file);
            }
            monitor.on_diagnostics_changed(&changed);
        }
        Err(e) => warn!("{:#}", e),
    }
}

pub fn run(config: &MoodConfig, report: &Path) -> Result<()> {
    let report_path = report
        .canonicalize()
        .with_context(|| format!("Report does not exist: {}", report.display()))?;
    let base = report_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let _guard = runtime.enter();

    let reporter = Arc::new(ErrorReporter::new());
    let assets = Arc::new(AssetCache::new(&config.assets).with_reporter(reporter.clone()));
    if !assets.is_offline() {
        let assets = Arc::clone(&assets);
        runtime.spawn_blocking(move || assets.preload());
    }

    let source = Arc::new(ReportSource::new(base.clone()));
    let monitor = MoodMonitor::with_assets(
        config,
        source.clone(),
        Arc::new(ConsoleSink),
        reporter.clone(),
        assets,
    );
    monitor.spawn_cleanup();

    println!(
        "\n{} Watching {} for diagnostics...\n",
        style("👁️ ").bold(),
        style(report_path.display()).cyan()
    );
    println!("  {} Rewrite the report to trigger analysis", style("→").dim());
    println!("  {} Press Ctrl+C to stop\n", style("→").dim());

    refresh(&report_path, &source, &monitor);

    let (tx, rx) = mpsc::channel();
    let mut debouncer = new_debouncer(
        Duration::from_millis(200),
        None,
        move |result: DebounceEventResult| {
            if let Ok(events) = result {
                let _ = tx.send(events);
            }
        },
    )?;
    // Watch the directory: many tools replace the report instead of writing it
    debouncer.watch(&base, RecursiveMode::NonRecursive)?;

    let report_name = report_path.file_name().map(|n| n.to_os_string());
    let mut warned_unhealthy = false;

    while let Ok(events) = rx.recv() {
        let touched = events
            .iter()
            .flat_map(|event| event.paths.iter())
            .any(|p| p.file_name().map(|n| n.to_os_string()) == report_name);
        if !touched {
            continue;
        }

        refresh(&report_path, &source, &monitor);

        if !monitor.is_healthy() && !warned_unhealthy {
            if let Some(last) = reporter.history().last() {
                eprintln!("{}", style(ErrorReporter::user_message(&last.context)).yellow());
            }
            warned_unhealthy = true;
        }
    }

    monitor.shutdown();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(entries: &[(&str, Vec<Diagnostic>)]) -> Report {
        entries
            .iter()
            .map(|(f, d)| (f.to_string(), d.clone()))
            .collect()
    }

    #[test]
    fn test_replace_reports_changed_files() {
        let source = ReportSource::new(PathBuf::from("."));
        let changed = source.replace(report(&[
            ("a.ts", vec![Diagnostic::error("x")]),
            ("b.ts", vec![]),
        ]));
        assert_eq!(changed, vec!["a.ts", "b.ts"]);

        let changed = source.replace(report(&[
            ("a.ts", vec![Diagnostic::error("x")]),
            ("b.ts", vec![Diagnostic::warning("y")]),
        ]));
        assert_eq!(changed, vec!["b.ts"]);
    }

    #[test]
    fn test_dropped_files_become_clean() {
        let source = ReportSource::new(PathBuf::from("."));
        source.replace(report(&[("a.ts", vec![Diagnostic::error("x")])]));

        let changed = source.replace(HashMap::new());
        assert_eq!(changed, vec!["a.ts"]);
        assert!(source.diagnostics("a.ts").is_empty());
        assert!(source.document("a.ts").is_some());
        assert!(source.replace(HashMap::new()).is_empty());
    }

    #[test]
    fn test_document_info() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("main.rs"), "fn main() {}\n").unwrap();
        let source = ReportSource::new(dir.path().to_path_buf());
        source.replace(report(&[("main.rs", vec![]), ("notes.txt", vec![])]));

        let doc = source.document("main.rs").unwrap();
        assert_eq!(doc.language_id, "rust");
        assert_eq!(doc.line_count, 1);
        assert_eq!(source.document("notes.txt").unwrap().language_id, "");
        assert!(source.document("other.rs").is_none());
    }

    #[test]
    fn test_load_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("diagnostics.json");
        std::fs::write(&path, r#"{"src/a.ts": [{"severity": "warning", "message": "unused"}]}"#)
            .unwrap();
        let loaded = load_report(&path).unwrap();
        assert_eq!(loaded["src/a.ts"], vec![Diagnostic::warning("unused")]);

        std::fs::write(&path, "").unwrap();
        assert!(load_report(&path).unwrap().is_empty());

        std::fs::write(&path, "[1, 2").unwrap();
        assert!(load_report(&path).is_err());
    }
}
