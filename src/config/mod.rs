//! Configuration module for CodeMood
//!
//! This module handles:
//! - Scoring weights
//! - Score cache / debounce timing
//! - Emoji asset cache limits
//! - Per-language diagnostic override policy

mod mood_config;

pub use mood_config::{
    AssetConfig, CacheConfig, ConfigError, DiagnosticsConfig, MoodConfig, ScoringConfig,
    PROJECT_CONFIG_FILE,
};
