//! CodeMood - diagnostics to mood
//!
//! Maps a file's live diagnostics (errors, warnings, hints) to a bounded
//! mood score, a mood category and an emoji to show for it.
//!
//! # Example
//!
//! ```rust
//! use codemood::diagnostics::classify;
//! use codemood::models::{Diagnostic, MoodCategory};
//! use codemood::scoring::MoodScorer;
//!
//! let counts = classify(&[Diagnostic::warning("unused import")]);
//! let mood = MoodScorer::default().score(counts, "src/app.ts", 120, "typescript");
//! assert_eq!(mood.score, 95);
//! assert_eq!(mood.category, MoodCategory::Ecstatic);
//! ```

pub mod assets;
pub mod cache;
pub mod config;
pub mod diagnostics;
pub mod errors;
pub mod languages;
pub mod models;
pub mod monitor;
pub mod scoring;

pub use models::{Diagnostic, DiagnosticCount, DiagnosticSeverity, MoodCategory, MoodChange, MoodScore};
