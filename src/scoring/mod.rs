//! Mood Scoring System
//!
//! Turns diagnostic counts, file size and language identity into a bounded
//! score and a mood category. The formula is a heuristic, not a measure of
//! correctness.
//!
//! # Scoring Formula
//!
//! ```text
//! raw   = base + penalty + size_modifier + language_bonus
//! score = clamp(raw, 0, 100)
//!
//! Where:
//!   penalty        = errors × W_E + warnings × W_W + info × W_I
//!   size_modifier  = 0 (≤ 500 lines), -1 (≤ 1000 lines), -2 (> 1000 lines)
//!   language_bonus = quality_bonus                   (zero issues)
//!                  = round((1 - diagnostic_weight) × 2)  (otherwise)
//! ```
//!
//! # Default Weights
//!
//! - Error: -15
//! - Warning: -5
//! - Info/Hint: -1
//!
//! # Example
//!
//! A 300-line TypeScript file with 1 error, 3 warnings and 2 hints:
//!
//! raw = 100 - 15 - 15 - 2 + 0 + round(0.1 × 2) = 68 → Neutral

mod mood_scorer;

pub use mood_scorer::{compare, describe, trend, MoodScorer, ScoreBreakdown};
