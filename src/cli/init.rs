//! Init command - write an example codemood.toml

use anyhow::{Context, Result};
use codemood::config::PROJECT_CONFIG_FILE;
use console::style;
use std::path::Path;

const EXAMPLE_CONFIG: &str = r#"# CodeMood configuration
# Every key is optional; missing keys use the defaults shown here.

[scoring]
# Points per issue. Must satisfy error <= warning <= info <= 0.
error_weight = -15
warning_weight = -5
info_weight = -1
base_score = 100

[cache]
# How long a computed mood stays fresh
score_ttl_secs = 30
# Never re-analyze a file more often than this
min_analysis_interval_ms = 1000
# Quiet period before a burst of diagnostic changes is analyzed
debounce_ms = 500
# How often expired moods are swept
cleanup_interval_secs = 60

[assets]
# Emoji image cache
ttl_secs = 86400
max_cache_bytes = 52428800
request_timeout_secs = 10
# Use text glyphs only, never touch the network
offline = false

[diagnostics]
# Languages where YAML syntax failures always count as errors
structural_override_languages = ["yaml", "yml"]
"#;

/// Run the init command
pub fn run(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(PROJECT_CONFIG_FILE);

    if config_path.exists() && !force {
        println!(
            "{} {} already exists (use --force to overwrite)",
            style("✓").green(),
            style(config_path.display()).cyan()
        );
        return Ok(());
    }

    std::fs::write(&config_path, EXAMPLE_CONFIG)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    println!(
        "{} Created {}",
        style("✓").green(),
        style(config_path.display()).cyan()
    );
    Ok(())
}
