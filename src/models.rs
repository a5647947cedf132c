//! Core data models for CodeMood
//!
//! These models flow between the classifier, the scorer and the caches.
//! All of them are plain values: a newer `MoodScore` supersedes an older
//! one, nothing is mutated in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity reported by the editor for a single diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
    #[serde(alias = "info")]
    Information,
    Hint,
}

impl std::fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiagnosticSeverity::Error => write!(f, "error"),
            DiagnosticSeverity::Warning => write!(f, "warning"),
            DiagnosticSeverity::Information => write!(f, "information"),
            DiagnosticSeverity::Hint => write!(f, "hint"),
        }
    }
}

/// A single editor-reported issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    #[serde(default)]
    pub message: String,
}

impl Diagnostic {
    pub fn new(severity: DiagnosticSeverity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(DiagnosticSeverity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(DiagnosticSeverity::Warning, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(DiagnosticSeverity::Information, message)
    }

    pub fn hint(message: impl Into<String>) -> Self {
        Self::new(DiagnosticSeverity::Hint, message)
    }
}

/// Normalized diagnostic counts for one file
///
/// Unsigned fields make the "never negative" invariant a type-level fact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiagnosticCount {
    pub errors: u32,
    pub warnings: u32,
    pub info: u32,
}

impl DiagnosticCount {
    pub const ZERO: DiagnosticCount = DiagnosticCount {
        errors: 0,
        warnings: 0,
        info: 0,
    };

    pub fn new(errors: u32, warnings: u32, info: u32) -> Self {
        Self {
            errors,
            warnings,
            info,
        }
    }

    /// Total number of issues of any severity
    pub fn total(&self) -> u64 {
        u64::from(self.errors) + u64::from(self.warnings) + u64::from(self.info)
    }

    pub fn is_clean(&self) -> bool {
        self.total() == 0
    }
}

/// Mood buckets, best first
///
/// The declaration order is the threshold order: `ALL[i]` owns the score
/// range starting at `threshold()` up to the next better bucket.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum MoodCategory {
    Ecstatic,
    Happy,
    Neutral,
    Concerned,
    Sad,
    Devastated,
}

impl MoodCategory {
    /// Every category, descending by threshold
    pub const ALL: [MoodCategory; 6] = [
        MoodCategory::Ecstatic,
        MoodCategory::Happy,
        MoodCategory::Neutral,
        MoodCategory::Concerned,
        MoodCategory::Sad,
        MoodCategory::Devastated,
    ];

    /// Inclusive lower bound of the bucket
    pub const fn threshold(self) -> u8 {
        match self {
            MoodCategory::Ecstatic => 90,
            MoodCategory::Happy => 70,
            MoodCategory::Neutral => 50,
            MoodCategory::Concerned => 30,
            MoodCategory::Sad => 10,
            MoodCategory::Devastated => 0,
        }
    }

    /// The unique bucket whose closed lower bound is the highest one `<= score`
    pub fn from_score(score: u8) -> MoodCategory {
        Self::ALL
            .into_iter()
            .find(|c| score >= c.threshold())
            .unwrap_or(MoodCategory::Devastated)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MoodCategory::Ecstatic => "ecstatic",
            MoodCategory::Happy => "happy",
            MoodCategory::Neutral => "neutral",
            MoodCategory::Concerned => "concerned",
            MoodCategory::Sad => "sad",
            MoodCategory::Devastated => "devastated",
        }
    }
}

impl std::fmt::Display for MoodCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MoodCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown mood category '{}'", s))
    }
}

/// A computed mood for one file at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodScore {
    /// Clamped to 0..=100
    pub score: u8,
    pub category: MoodCategory,
    pub diagnostic_count: DiagnosticCount,
    pub timestamp: DateTime<Utc>,
    pub file_path: String,
}

impl MoodScore {
    /// The neutral stand-in used whenever a computed score is malformed
    pub fn neutral(file_path: impl Into<String>) -> Self {
        Self {
            score: 50,
            category: MoodCategory::Neutral,
            diagnostic_count: DiagnosticCount::ZERO,
            timestamp: Utc::now(),
            file_path: file_path.into(),
        }
    }

    /// Check the score/category/path invariants
    pub fn is_valid(&self) -> bool {
        self.score <= 100
            && MoodCategory::from_score(self.score) == self.category
            && !self.file_path.is_empty()
    }
}

/// Direction of change between two scores for the same file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoodChange {
    Improved,
    Worsened,
    Unchanged,
}

impl std::fmt::Display for MoodChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MoodChange::Improved => write!(f, "improved"),
            MoodChange::Worsened => write!(f, "worsened"),
            MoodChange::Unchanged => write!(f, "unchanged"),
        }
    }
}

/// Remove characters editors and shells choke on from a file identifier.
pub fn sanitize_file_path(path: &str) -> String {
    path.chars()
        .filter(|c| !matches!(c, '<' | '>' | ':' | '"' | '|' | '?' | '*'))
        .collect::<String>()
        .trim()
        .to_string()
}
