//! Language profile table
//!
//! Static per-language scoring parameters. Lookups never fail: unknown ids
//! resolve to `DEFAULT_WEIGHT`/`DEFAULT_BONUS`, their own id as display name
//! and `LanguageCategory::Other`.

use serde::Serialize;
use std::path::Path;

pub const DEFAULT_WEIGHT: f64 = 1.0;
pub const DEFAULT_BONUS: i32 = 1;

/// Scoring parameters for one supported language
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LanguageProfile {
    pub id: &'static str,
    pub display_name: &'static str,
    pub file_extensions: &'static [&'static str],
    /// Lower means the tooling's diagnostics are trusted more
    pub diagnostic_weight: f64,
    /// Added to the score of a file with zero issues
    pub quality_bonus: i32,
}

/// Descriptive grouping of languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageCategory {
    Web,
    System,
    Scripting,
    Application,
    Configuration,
    Other,
}

impl std::fmt::Display for LanguageCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LanguageCategory::Web => "web",
            LanguageCategory::System => "system",
            LanguageCategory::Scripting => "scripting",
            LanguageCategory::Application => "application",
            LanguageCategory::Configuration => "configuration",
            LanguageCategory::Other => "other",
        };
        f.write_str(s)
    }
}

const fn profile(
    id: &'static str,
    display_name: &'static str,
    file_extensions: &'static [&'static str],
    diagnostic_weight: f64,
    quality_bonus: i32,
) -> LanguageProfile {
    LanguageProfile {
        id,
        display_name,
        file_extensions,
        diagnostic_weight,
        quality_bonus,
    }
}

/// Table order matters for extension detection: first match wins.
static PROFILES: &[LanguageProfile] = &[
    profile("javascript", "JavaScript", &[".js", ".mjs", ".cjs"], 1.0, 2),
    profile("typescript", "TypeScript", &[".ts", ".mts", ".cts"], 0.9, 3),
    profile("javascriptreact", "JavaScript React", &[".jsx"], 1.1, 2),
    profile("typescriptreact", "TypeScript React", &[".tsx"], 1.0, 3),
    profile("python", "Python", &[".py", ".pyw", ".pyi"], 0.8, 2),
    profile("java", "Java", &[".java"], 0.7, 2),
    profile("csharp", "C#", &[".cs", ".csx"], 0.8, 2),
    profile(
        "cpp",
        "C++",
        &[".cpp", ".cxx", ".cc", ".hpp", ".hxx", ".hh"],
        1.2,
        1,
    ),
    profile("c", "C", &[".c", ".h"], 1.3, 1),
    profile("go", "Go", &[".go"], 0.6, 3),
    profile("rust", "Rust", &[".rs"], 0.5, 3),
    profile(
        "php",
        "PHP",
        &[".php", ".phtml", ".php3", ".php4", ".php5"],
        1.1,
        1,
    ),
    profile("ruby", "Ruby", &[".rb", ".rbw"], 0.9, 2),
    profile("swift", "Swift", &[".swift"], 0.8, 2),
    profile("kotlin", "Kotlin", &[".kt", ".kts"], 0.8, 2),
    profile("yaml", "YAML", &[".yaml", ".yml"], 0.9, 2),
    profile("yml", "YAML", &[".yml", ".yaml"], 0.9, 2),
];

const WEB: &[&str] = &[
    "javascript",
    "typescript",
    "javascriptreact",
    "typescriptreact",
    "html",
    "css",
    "scss",
    "less",
];
const SYSTEM: &[&str] = &["c", "cpp", "rust", "go", "zig"];
const SCRIPTING: &[&str] = &["python", "ruby", "php", "perl", "bash", "powershell"];
const CONFIGURATION: &[&str] = &["yaml", "yml", "json", "toml", "ini", "xml"];
const APPLICATION: &[&str] = &["java", "csharp", "kotlin", "swift"];

/// Look up the profile for a language id
pub fn profile_for(language_id: &str) -> Option<&'static LanguageProfile> {
    PROFILES.iter().find(|p| p.id == language_id)
}

/// All supported profiles in table order
pub fn supported() -> &'static [LanguageProfile] {
    PROFILES
}

pub fn is_supported(language_id: &str) -> bool {
    profile_for(language_id).is_some()
}

pub fn diagnostic_weight(language_id: &str) -> f64 {
    profile_for(language_id).map_or(DEFAULT_WEIGHT, |p| p.diagnostic_weight)
}

pub fn quality_bonus(language_id: &str) -> i32 {
    profile_for(language_id).map_or(DEFAULT_BONUS, |p| p.quality_bonus)
}

pub fn display_name(language_id: &str) -> &str {
    match profile_for(language_id) {
        Some(p) => p.display_name,
        None => language_id,
    }
}

pub fn file_extensions(language_id: &str) -> &'static [&'static str] {
    profile_for(language_id)
        .map(|p| p.file_extensions)
        .unwrap_or(&[])
}

pub fn category(language_id: &str) -> LanguageCategory {
    if WEB.contains(&language_id) {
        LanguageCategory::Web
    } else if SYSTEM.contains(&language_id) {
        LanguageCategory::System
    } else if SCRIPTING.contains(&language_id) {
        LanguageCategory::Scripting
    } else if CONFIGURATION.contains(&language_id) {
        LanguageCategory::Configuration
    } else if APPLICATION.contains(&language_id) {
        LanguageCategory::Application
    } else {
        LanguageCategory::Other
    }
}

/// Guess the language of a file from its extension
pub fn detect_from_path(path: &Path) -> Option<&'static LanguageProfile> {
    let name = path.file_name()?.to_str()?.to_lowercase();
    PROFILES
        .iter()
        .find(|p| p.file_extensions.iter().any(|ext| name.ends_with(ext)))
}

/// Short list of habits worth following for a language
pub fn recommended_practices(language_id: &str) -> &'static [&'static str] {
    const YAML: &[&str] = &[
        "Use consistent indentation",
        "Validate syntax regularly",
        "Keep structure simple and readable",
        "Use meaningful key names",
    ];

    if profile_for(language_id).is_none() {
        return &[];
    }

    match language_id {
        "typescript" => &[
            "Use strict type checking",
            "Enable all compiler checks",
            "Use interfaces over types when possible",
        ],
        "javascript" => &[
            "Use ESLint",
            "Prefer const over let",
            "Use modern ES6+ features",
        ],
        "python" => &["Follow PEP 8", "Use type hints", "Write docstrings"],
        "java" => &[
            "Follow naming conventions",
            "Use proper exception handling",
            "Write unit tests",
        ],
        "rust" => &[
            "Handle all Result types",
            "Use clippy for linting",
            "Follow ownership principles",
        ],
        "go" => &["Use gofmt", "Handle all errors", "Write clear documentation"],
        "csharp" => &[
            "Use nullable reference types",
            "Follow naming conventions",
            "Use async/await properly",
        ],
        "yaml" | "yml" => YAML,
        _ => &[
            "Follow language best practices",
            "Write clean, readable code",
            "Add appropriate comments",
        ],
    }
}
