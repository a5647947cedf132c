//! Diagnostic-based mood scorer

use crate::config::ScoringConfig;
use crate::languages;
use crate::models::{DiagnosticCount, MoodCategory, MoodChange, MoodScore};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

/// Files up to this many lines carry no size penalty
const SMALL_FILE_LINES: usize = 500;
/// Files above this many lines carry the full size penalty
const LARGE_FILE_LINES: usize = 1000;

/// Every term of the formula, for `--format json` and debugging
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    pub base: i64,
    pub penalty: i64,
    pub size_modifier: i64,
    pub language_bonus: i64,
    /// Before clamping
    pub raw: i64,
    pub score: u8,
    pub category: MoodCategory,
}

/// Stateless scorer parameterized by the configured weights
#[derive(Debug, Clone, Default)]
pub struct MoodScorer {
    weights: ScoringConfig,
}

impl MoodScorer {
    pub fn new(weights: ScoringConfig) -> Self {
        Self { weights }
    }

    /// Score one file.
    ///
    /// Never fails. A result that breaks the `MoodScore` invariants is
    /// replaced by [`MoodScore::neutral`].
    pub fn score(
        &self,
        counts: DiagnosticCount,
        file_path: &str,
        line_count: usize,
        language_id: &str,
    ) -> MoodScore {
        let breakdown = self.breakdown(counts, line_count, language_id);

        let result = MoodScore {
            score: breakdown.score,
            category: breakdown.category,
            diagnostic_count: counts,
            timestamp: Utc::now(),
            file_path: file_path.to_string(),
        };

        if !result.is_valid() {
            warn!("Invalid mood score for '{}', using neutral default", file_path);
            return MoodScore::neutral(file_path);
        }

        debug!(
            "Scored {} ({}): {} -> {} {}",
            file_path,
            if language_id.is_empty() { "unknown" } else { language_id },
            breakdown.raw,
            result.score,
            result.category
        );
        result
    }

    /// Compute every term of the formula without building a `MoodScore`
    pub fn breakdown(
        &self,
        counts: DiagnosticCount,
        line_count: usize,
        language_id: &str,
    ) -> ScoreBreakdown {
        let w = &self.weights;
        let penalty = i64::from(counts.errors)
            .saturating_mul(w.error_weight)
            .saturating_add(i64::from(counts.warnings).saturating_mul(w.warning_weight))
            .saturating_add(i64::from(counts.info).saturating_mul(w.info_weight));

        let size_modifier = size_modifier(line_count);
        let language_bonus = language_bonus(counts, language_id);

        let raw = w
            .base_score
            .saturating_add(penalty)
            .saturating_add(size_modifier)
            .saturating_add(language_bonus);
        let score = raw.clamp(0, 100) as u8;

        ScoreBreakdown {
            base: w.base_score,
            penalty,
            size_modifier,
            language_bonus,
            raw,
            score,
            category: MoodCategory::from_score(score),
        }
    }
}

fn size_modifier(line_count: usize) -> i64 {
    if line_count <= SMALL_FILE_LINES {
        0
    } else if line_count <= LARGE_FILE_LINES {
        -1
    } else {
        -2
    }
}

/// Clean files get the language's quality bonus. Otherwise languages with
/// trusted tooling (weight below 1.0) get a small bonus.
fn language_bonus(counts: DiagnosticCount, language_id: &str) -> i64 {
    if counts.is_clean() {
        i64::from(languages::quality_bonus(language_id))
    } else {
        ((1.0 - languages::diagnostic_weight(language_id)) * 2.0).round() as i64
    }
}

/// Human-readable description of a category
pub fn describe(category: MoodCategory) -> &'static str {
    match category {
        MoodCategory::Ecstatic => "Exceptional code quality - celebration time!",
        MoodCategory::Happy => "Good code quality - things are going well",
        MoodCategory::Neutral => "Average code quality - could use some attention",
        MoodCategory::Concerned => "Several issues detected - needs attention",
        MoodCategory::Sad => "Many issues detected - code needs serious help",
        MoodCategory::Devastated => "Critical issues everywhere - major refactoring required",
    }
}

/// Direction of change from `previous` to `current`
pub fn compare(previous: &MoodScore, current: &MoodScore) -> MoodChange {
    match current.score.cmp(&previous.score) {
        std::cmp::Ordering::Greater => MoodChange::Improved,
        std::cmp::Ordering::Less => MoodChange::Worsened,
        std::cmp::Ordering::Equal => MoodChange::Unchanged,
    }
}

/// Recency-weighted average score.
///
/// Samples are ordered by timestamp and weighted by their 1-based position,
/// so the newest sample counts most. Fewer than two samples yield `0.0`.
pub fn trend(scores: &[MoodScore]) -> f64 {
    if scores.len() < 2 {
        return 0.0;
    }

    let mut ordered: Vec<(DateTime<Utc>, u8)> =
        scores.iter().map(|s| (s.timestamp, s.score)).collect();
    ordered.sort_by_key(|(at, _)| *at);

    let (weighted, total_weight) = ordered
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(sum, weights), (i, (_, score))| {
            let weight = (i + 1) as f64;
            (sum + f64::from(*score) * weight, weights + weight)
        });

    weighted / total_weight
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn scorer() -> MoodScorer {
        MoodScorer::default()
    }

    fn sample(score: u8, seconds_ago: i64) -> MoodScore {
        MoodScore {
            score,
            category: MoodCategory::from_score(score),
            diagnostic_count: DiagnosticCount::ZERO,
            timestamp: Utc::now() - Duration::seconds(seconds_ago),
            file_path: "a.rs".to_string(),
        }
    }

    #[test]
    fn test_clean_small_file_is_ecstatic() {
        for lang in ["typescript", "rust", "c", "", "cobol"] {
            for lines in [0, 100, 500] {
                let s = scorer().score(DiagnosticCount::ZERO, "a", lines, lang);
                assert!(s.score >= 90, "{} {} -> {}", lang, lines, s.score);
                assert_eq!(s.category, MoodCategory::Ecstatic);
            }
        }
    }

    #[test]
    fn test_clean_typescript_file() {
        let s = scorer().score(DiagnosticCount::ZERO, "src/app.ts", 100, "typescript");
        assert_eq!(s.score, 100);
        assert_eq!(s.category, MoodCategory::Ecstatic);
        assert_eq!(s.file_path, "src/app.ts");
    }

    #[test]
    fn test_five_errors_base_weight_language() {
        let s = scorer().score(DiagnosticCount::new(5, 0, 0), "a.js", 100, "javascript");
        assert!(s.score <= 25);
        assert_eq!(s.score, 25);
        assert_eq!(s.category, MoodCategory::Sad);
    }

    #[test]
    fn test_mixed_issues_near_unbonused_estimate() {
        let estimate: i64 = 100 - 15 - 15 - 2;
        for lang in ["typescript", "rust", "c", "javascript", ""] {
            let s = scorer().score(DiagnosticCount::new(1, 3, 2), "a", 100, lang);
            assert!((i64::from(s.score) - estimate).abs() <= 5, "{} -> {}", lang, s.score);
        }
        let b = scorer().breakdown(DiagnosticCount::new(1, 3, 2), 100, "typescript");
        assert_eq!(b.raw, 68);
        assert_eq!(b.category, MoodCategory::Neutral);
    }

    #[test]
    fn test_large_file_scores_lower() {
        let small = scorer().score(DiagnosticCount::ZERO, "a", 100, "typescript");
        let large = scorer().score(DiagnosticCount::ZERO, "a", 1500, "typescript");
        assert!(large.score < small.score);
    }

    #[test]
    fn test_size_modifier_boundaries() {
        assert_eq!(size_modifier(500), 0);
        assert_eq!(size_modifier(501), -1);
        assert_eq!(size_modifier(1000), -1);
        assert_eq!(size_modifier(1001), -2);
    }

    #[test]
    fn test_language_bonus() {
        let dirty = DiagnosticCount::new(0, 1, 0);
        assert_eq!(language_bonus(dirty, "rust"), 1);
        assert_eq!(language_bonus(dirty, "go"), 1);
        assert_eq!(language_bonus(dirty, "c"), -1);
        assert_eq!(language_bonus(dirty, ""), 0);
        assert_eq!(language_bonus(DiagnosticCount::ZERO, "go"), 3);
        assert_eq!(language_bonus(DiagnosticCount::ZERO, ""), 1);
    }

    #[test]
    fn test_unknown_language_uses_defaults() {
        let s = scorer().score(DiagnosticCount::new(0, 2, 0), "notes.txt", 10, "");
        assert_eq!(s.score, 90);
        let b = scorer().breakdown(DiagnosticCount::ZERO, 10, "");
        assert_eq!(b.language_bonus, 1);
        assert_eq!(b.score, 100);
    }

    #[test]
    fn test_score_is_clamped() {
        let s = scorer().score(DiagnosticCount::new(u32::MAX, u32::MAX, u32::MAX), "a", 5000, "c");
        assert_eq!(s.score, 0);
        assert_eq!(s.category, MoodCategory::Devastated);

        let generous = MoodScorer::new(ScoringConfig {
            base_score: 100,
            ..Default::default()
        });
        let b = generous.breakdown(DiagnosticCount::ZERO, 0, "rust");
        assert_eq!(b.raw, 103);
        assert_eq!(b.score, 100);
    }

    #[test]
    fn test_more_errors_never_increase_score() {
        for lang in ["typescript", "c", ""] {
            let mut previous = u8::MAX;
            for errors in 0..12 {
                let s = scorer().score(DiagnosticCount::new(errors, 1, 1), "a", 700, lang);
                assert!(s.score <= previous, "{} errors={}", lang, errors);
                previous = s.score;
            }
        }
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let counts = DiagnosticCount::new(2, 4, 7);
        let a = scorer().score(counts, "x.py", 800, "python");
        let b = scorer().score(counts, "x.py", 800, "python");
        assert_eq!((a.score, a.category), (b.score, b.category));
    }

    #[test]
    fn test_empty_path_falls_back_to_neutral() {
        let s = scorer().score(DiagnosticCount::ZERO, "", 10, "rust");
        assert_eq!(s.score, 50);
        assert_eq!(s.category, MoodCategory::Neutral);
    }

    #[test]
    fn test_describe_is_total() {
        for c in MoodCategory::ALL {
            assert!(!describe(c).is_empty());
        }
        assert_eq!(describe(MoodCategory::Happy), "Good code quality - things are going well");
    }

    #[test]
    fn test_compare() {
        let low = sample(40, 10);
        let high = sample(80, 0);
        assert_eq!(compare(&low, &high), MoodChange::Improved);
        assert_eq!(compare(&high, &low), MoodChange::Worsened);
        assert_eq!(compare(&high, &high.clone()), MoodChange::Unchanged);
    }

    #[test]
    fn test_trend_needs_two_samples() {
        assert_eq!(trend(&[]), 0.0);
        assert_eq!(trend(&[sample(80, 0)]), 0.0);
    }

    #[test]
    fn test_trend_weights_recent_scores_more() {
        // Chronological: 40 (w1), 70 (w2), 100 (w3) -> (40 + 140 + 300) / 6 = 80
        let scores = vec![sample(100, 0), sample(40, 20), sample(70, 10)];
        assert!((trend(&scores) - 80.0).abs() < 1e-9);

        let improving = vec![sample(10, 20), sample(90, 0)];
        let declining = vec![sample(90, 20), sample(10, 0)];
        assert!(trend(&improving) > trend(&declining));
    }
}
