//! Layered configuration
//!
//! Loads settings from, lowest priority first:
//!
//! 1. Built-in defaults
//! 2. User config (`~/.config/codemood/config.toml`)
//! 3. Project config (`codemood.toml` in the working directory)
//! 4. Environment variables (`CODEMOOD_OFFLINE`, `CODEMOOD_DEBOUNCE_MS`,
//!    `CODEMOOD_SCORE_TTL_SECS`)
//!
//! # Configuration Format
//!
//! ```toml
//! [scoring]
//! error_weight = -15
//! warning_weight = -5
//! info_weight = -1
//!
//! [cache]
//! score_ttl_secs = 30
//! min_analysis_interval_ms = 1000
//! debounce_ms = 500
//! cleanup_interval_secs = 60
//!
//! [assets]
//! ttl_secs = 86400
//! max_cache_bytes = 52428800
//! offline = false
//!
//! [diagnostics]
//! structural_override_languages = ["yaml", "yml"]
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

pub const PROJECT_CONFIG_FILE: &str = "codemood.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct MoodConfig {
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub assets: AssetConfig,
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

/// Per-severity penalties
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScoringConfig {
    #[serde(default = "default_base_score")]
    pub base_score: i64,
    #[serde(default = "default_error_weight")]
    pub error_weight: i64,
    #[serde(default = "default_warning_weight")]
    pub warning_weight: i64,
    #[serde(default = "default_info_weight")]
    pub info_weight: i64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            base_score: default_base_score(),
            error_weight: default_error_weight(),
            warning_weight: default_warning_weight(),
            info_weight: default_info_weight(),
        }
    }
}

fn default_base_score() -> i64 {
    100
}
fn default_error_weight() -> i64 {
    -15
}
fn default_warning_weight() -> i64 {
    -5
}
fn default_info_weight() -> i64 {
    -1
}

impl ScoringConfig {
    /// Errors must hurt at least as much as warnings, warnings at least as
    /// much as info, and nothing may reward an issue.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.error_weight <= self.warning_weight
            && self.warning_weight <= self.info_weight
            && self.info_weight <= 0)
        {
            return Err(ConfigError::Invalid(format!(
                "scoring weights must satisfy error <= warning <= info <= 0 (got {}, {}, {})",
                self.error_weight, self.warning_weight, self.info_weight
            )));
        }
        if !(0..=100).contains(&self.base_score) {
            return Err(ConfigError::Invalid(format!(
                "base_score must be within 0..=100 (got {})",
                self.base_score
            )));
        }
        Ok(())
    }
}

/// Score cache and debounce timing
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_score_ttl_secs")]
    pub score_ttl_secs: u64,
    #[serde(default = "default_min_analysis_interval_ms")]
    pub min_analysis_interval_ms: u64,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            score_ttl_secs: default_score_ttl_secs(),
            min_analysis_interval_ms: default_min_analysis_interval_ms(),
            debounce_ms: default_debounce_ms(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
        }
    }
}

fn default_score_ttl_secs() -> u64 {
    30
}
fn default_min_analysis_interval_ms() -> u64 {
    1000
}
fn default_debounce_ms() -> u64 {
    500
}
fn default_cleanup_interval_secs() -> u64 {
    60
}

impl CacheConfig {
    pub fn score_ttl(&self) -> Duration {
        Duration::from_secs(self.score_ttl_secs)
    }

    pub fn min_analysis_interval(&self) -> Duration {
        Duration::from_millis(self.min_analysis_interval_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Never zero, `tokio::time::interval` rejects a zero period
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs.max(1))
    }
}

/// Remote emoji cache settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AssetConfig {
    #[serde(default = "default_asset_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_max_cache_bytes")]
    pub max_cache_bytes: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Never touch the network, always use fallback glyphs
    #[serde(default)]
    pub offline: bool,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_asset_ttl_secs(),
            max_cache_bytes: default_max_cache_bytes(),
            request_timeout_secs: default_request_timeout_secs(),
            offline: false,
        }
    }
}

fn default_asset_ttl_secs() -> u64 {
    24 * 60 * 60
}
fn default_max_cache_bytes() -> usize {
    50 * 1024 * 1024
}
fn default_request_timeout_secs() -> u64 {
    10
}

impl AssetConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DiagnosticsConfig {
    /// Languages whose syntax-failure messages are always counted as errors
    #[serde(default = "default_structural_override_languages")]
    pub structural_override_languages: Vec<String>,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            structural_override_languages: default_structural_override_languages(),
        }
    }
}

fn default_structural_override_languages() -> Vec<String> {
    vec!["yaml".to_string(), "yml".to_string()]
}

impl MoodConfig {
    /// Load config from every layer. Broken files are skipped with a warning.
    ///
    /// Layers are merged key by key, so a project file that only sets
    /// `[assets] offline` keeps the user's scoring weights.
    pub fn load(project_dir: &Path) -> Self {
        Self::load_with(project_dir, None)
    }

    /// Like [`MoodConfig::load`], with an explicit file layered on top of the
    /// project config (`--config`).
    pub fn load_with(project_dir: &Path, explicit: Option<&Path>) -> Self {
        Self::load_layers(Self::user_config_path(), project_dir, explicit)
    }

    /// Layered load with the user config at `user_path`
    pub(crate) fn load_layers(
        user_path: Option<PathBuf>,
        project_dir: &Path,
        explicit: Option<&Path>,
    ) -> Self {
        let mut layers: Vec<PathBuf> = user_path.into_iter().collect();
        layers.push(project_dir.join(PROJECT_CONFIG_FILE));
        if let Some(path) = explicit {
            if !path.exists() {
                warn!("Config file {} does not exist", path.display());
            }
            layers.push(path.to_path_buf());
        }

        let mut merged = toml::Table::new();
        for path in layers.iter().filter(|p| p.exists()) {
            match read_table(path) {
                Ok(table) => {
                    debug!("Loaded config layer from {}", path.display());
                    merge_tables(&mut merged, table);
                }
                Err(e) => warn!("{}", e),
            }
        }

        let mut config = match toml::Value::Table(merged).try_into::<MoodConfig>() {
            Ok(config) => config,
            Err(e) => {
                warn!("Invalid configuration, using defaults: {}", e);
                MoodConfig::default()
            }
        };

        config.apply_env();
        config.sanitize();
        config
    }

    /// Parse a single TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Get the user config file path
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("codemood").join("config.toml"))
    }

    /// Environment variables override everything
    fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("CODEMOOD_OFFLINE") {
            self.assets.offline = matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes");
        }
        if let Some(ms) = env_u64("CODEMOOD_DEBOUNCE_MS") {
            self.cache.debounce_ms = ms;
        }
        if let Some(secs) = env_u64("CODEMOOD_SCORE_TTL_SECS") {
            self.cache.score_ttl_secs = secs;
        }
    }

    /// Replace invalid sections with defaults
    pub fn sanitize(&mut self) {
        if let Err(e) = self.scoring.validate() {
            warn!("{}; using default scoring weights", e);
            self.scoring = ScoringConfig::default();
        }
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

fn read_table(path: &Path) -> Result<toml::Table, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    content.parse::<toml::Table>().map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Overlay `top` onto `base`, recursing into nested tables
fn merge_tables(base: &mut toml::Table, top: toml::Table) {
    for (key, value) in top {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

fn env_u64(key: &str) -> Option<u64> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("Ignoring {}={:?}: not a number", key, raw);
            None
        }
    }
}
