//! Score command - mood for a single file

use anyhow::{Context, Result};
use codemood::assets::{AssetCache, DisplayAsset};
use codemood::config::MoodConfig;
use codemood::diagnostics::DiagnosticClassifier;
use codemood::errors::ErrorReporter;
use codemood::languages;
use codemood::models::{sanitize_file_path, Diagnostic, DiagnosticCount, MoodCategory, MoodScore};
use codemood::scoring::{self, MoodScorer, ScoreBreakdown};
use console::{style, StyledObject};
use serde::Serialize;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

#[derive(Serialize)]
struct ScoreReport<'a> {
    file: &'a str,
    language: &'a str,
    line_count: usize,
    #[serde(flatten)]
    score: &'a MoodScore,
    description: &'static str,
    breakdown: &'a ScoreBreakdown,
    asset: &'a DisplayAsset,
}

pub fn run(
    config: &MoodConfig,
    file: &Path,
    diagnostics: Option<&str>,
    language: Option<&str>,
    format: &str,
) -> Result<()> {
    let issues = match diagnostics {
        Some(source) => read_diagnostics(source)?,
        None => Vec::new(),
    };

    let language_id = language
        .map(str::to_string)
        .or_else(|| languages::detect_from_path(file).map(|p| p.id.to_string()))
        .unwrap_or_default();
    let line_count = count_lines(file);
    let path = sanitize_file_path(&file.to_string_lossy());

    let classifier = DiagnosticClassifier::for_language(
        &language_id,
        &config.diagnostics.structural_override_languages,
    );
    let counts = classifier.classify(&issues);

    let scorer = MoodScorer::new(config.scoring.clone());
    let score = scorer.score(counts, &path, line_count, &language_id);
    let breakdown = scorer.breakdown(counts, line_count, &language_id);

    let reporter = Arc::new(ErrorReporter::new());
    let assets = AssetCache::new(&config.assets).with_reporter(reporter.clone());
    let asset = assets.resolve(score.category);

    if format == "json" {
        let report = ScoreReport {
            file: &path,
            language: &language_id,
            line_count,
            score: &score,
            description: scoring::describe(score.category),
            breakdown: &breakdown,
            asset: &asset,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_text(&score, &language_id, line_count, &asset);
    }

    for record in reporter.history() {
        eprintln!("{}", style(ErrorReporter::user_message(&record.context)).dim());
    }
    Ok(())
}

fn print_text(score: &MoodScore, language_id: &str, line_count: usize, asset: &DisplayAsset) {
    let glyph = DisplayAsset::glyph(score.category);
    let language = if language_id.is_empty() {
        "unknown language"
    } else {
        languages::display_name(language_id)
    };

    println!();
    println!(
        "  {} {}  {}/100  {}",
        glyph,
        mood_label(score.category),
        style(score.score).bold(),
        style(&score.file_path).cyan()
    );
    println!("  {}", scoring::describe(score.category));
    println!(
        "  {} ({}, {} lines)",
        style(format_counts(&score.diagnostic_count)).dim(),
        language,
        line_count
    );
    if let DisplayAsset::Image { source_url, .. } = asset {
        println!("  {} {}", style("Emoji:").dim(), source_url);
    }
    println!();
}

/// Category name colored by how bad it is
pub(super) fn mood_label(category: MoodCategory) -> StyledObject<&'static str> {
    let label = match category {
        MoodCategory::Ecstatic => "Ecstatic",
        MoodCategory::Happy => "Happy",
        MoodCategory::Neutral => "Neutral",
        MoodCategory::Concerned => "Concerned",
        MoodCategory::Sad => "Sad",
        MoodCategory::Devastated => "Devastated",
    };
    match category {
        MoodCategory::Ecstatic | MoodCategory::Happy => style(label).green().bold(),
        MoodCategory::Neutral => style(label).yellow().bold(),
        MoodCategory::Concerned | MoodCategory::Sad | MoodCategory::Devastated => {
            style(label).red().bold()
        }
    }
}

pub(super) fn format_counts(counts: &DiagnosticCount) -> String {
    format!(
        "{} {}, {} {}, {} info",
        counts.errors,
        if counts.errors == 1 { "error" } else { "errors" },
        counts.warnings,
        if counts.warnings == 1 { "warning" } else { "warnings" },
        counts.info
    )
}

/// Read a JSON diagnostics array from a file, or stdin for `-`
fn read_diagnostics(source: &str) -> Result<Vec<Diagnostic>> {
    let content = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read diagnostics from stdin")?;
        buf
    } else {
        std::fs::read_to_string(source)
            .with_context(|| format!("Failed to read diagnostics file: {}", source))?
    };

    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&content).with_context(|| format!("Invalid diagnostics JSON in {}", source))
}

/// Lines in `path`, or 0 if it cannot be read
pub(super) fn count_lines(path: &Path) -> usize {
    match std::fs::read_to_string(path) {
        Ok(content) => content.lines().count(),
        Err(e) => {
            warn!("Cannot read {}: {}; assuming an empty file", path.display(), e);
            0
        }
    }
}
