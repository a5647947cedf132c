//! Diagnostic classification
//!
//! Folds the raw issues the editor reports for one file into a
//! [`DiagnosticCount`]. Severity mapping is fixed:
//!
//! - `Error` → errors
//! - `Warning` → warnings
//! - `Information`, `Hint` → info
//!
//! Per-language [`SeverityOverride`] policies can promote specific messages
//! to errors. They are opt-in, see [`DiagnosticClassifier::for_language`].

use crate::models::{Diagnostic, DiagnosticCount, DiagnosticSeverity};
use tracing::{debug, warn};

/// Structural syntax failures in YAML-like config files. A file that does
/// not parse is broken no matter what severity the language server picked.
pub const STRUCTURAL_SYNTAX_KEYWORDS: &[&str] = &[
    "yaml syntax error",
    "invalid yaml",
    "indentation error",
    "mapping values are not allowed",
    "could not find expected",
    "found character that cannot start",
    "block sequence entries are not allowed",
];

/// Message-based rule that promotes a diagnostic to an error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeverityOverride {
    name: &'static str,
    keywords: &'static [&'static str],
}

impl SeverityOverride {
    pub const fn new(name: &'static str, keywords: &'static [&'static str]) -> Self {
        Self { name, keywords }
    }

    pub const fn structural_syntax() -> Self {
        Self::new("structural-syntax", STRUCTURAL_SYNTAX_KEYWORDS)
    }

    pub fn name(&self) -> &str {
        self.name
    }

    /// Case-insensitive substring match against the keyword set
    pub fn matches(&self, message: &str) -> bool {
        let lower = message.to_lowercase();
        self.keywords.iter().any(|kw| lower.contains(kw))
    }
}

/// Turns a list of diagnostics into counts
#[derive(Debug, Clone, Default)]
pub struct DiagnosticClassifier {
    overrides: Vec<SeverityOverride>,
}

impl DiagnosticClassifier {
    /// Plain severity mapping, no overrides
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_override(mut self, rule: SeverityOverride) -> Self {
        self.overrides.push(rule);
        self
    }

    /// Classifier for a language, enabling the structural-syntax override
    /// when `language_id` is listed in `override_languages`.
    pub fn for_language<S: AsRef<str>>(language_id: &str, override_languages: &[S]) -> Self {
        let enabled = override_languages
            .iter()
            .any(|l| l.as_ref().eq_ignore_ascii_case(language_id));
        if enabled {
            Self::new().with_override(SeverityOverride::structural_syntax())
        } else {
            Self::new()
        }
    }

    pub fn overrides(&self) -> &[SeverityOverride] {
        &self.overrides
    }

    /// Count issues by normalized severity.
    ///
    /// Never fails: if a counter would overflow the result is discarded and
    /// the zero tuple is returned.
    pub fn classify(&self, issues: &[Diagnostic]) -> DiagnosticCount {
        match self.try_classify(issues) {
            Some(count) => count,
            None => {
                warn!(
                    "Discarding diagnostic count for {} issues: counter overflow",
                    issues.len()
                );
                DiagnosticCount::ZERO
            }
        }
    }

    fn try_classify(&self, issues: &[Diagnostic]) -> Option<DiagnosticCount> {
        let mut count = DiagnosticCount::ZERO;

        for issue in issues {
            if let Some(rule) = self.overrides.iter().find(|r| r.matches(&issue.message)) {
                debug!("{} override promoted '{}' to error", rule.name(), issue.message);
                count.errors = count.errors.checked_add(1)?;
                continue;
            }

            match issue.severity {
                DiagnosticSeverity::Error => count.errors = count.errors.checked_add(1)?,
                DiagnosticSeverity::Warning => count.warnings = count.warnings.checked_add(1)?,
                DiagnosticSeverity::Information | DiagnosticSeverity::Hint => {
                    count.info = count.info.checked_add(1)?
                }
            }
        }

        Some(count)
    }
}

/// Classify with the plain severity mapping
pub fn classify(issues: &[Diagnostic]) -> DiagnosticCount {
    DiagnosticClassifier::new().classify(issues)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(classify(&[]), DiagnosticCount::ZERO);
    }

    #[test]
    fn test_severity_mapping() {
        let issues = vec![
            Diagnostic::error("missing semicolon"),
            Diagnostic::error("unknown identifier"),
            Diagnostic::warning("unused variable"),
            Diagnostic::info("consider const"),
            Diagnostic::hint("rename suggested"),
        ];
        assert_eq!(classify(&issues), DiagnosticCount::new(2, 1, 2));
    }

    #[test]
    fn test_plain_classifier_ignores_yaml_messages() {
        let issues = vec![Diagnostic::warning("Invalid YAML: bad indentation")];
        assert_eq!(classify(&issues), DiagnosticCount::new(0, 1, 0));
    }

    #[test]
    fn test_structural_override_promotes_case_insensitively() {
        let classifier = DiagnosticClassifier::for_language("yaml", &["yaml", "yml"]);
        let issues = vec![
            Diagnostic::warning("Mapping Values Are Not Allowed in this context"),
            Diagnostic::hint("YAML syntax error at line 3"),
            Diagnostic::warning("key order"),
        ];
        assert_eq!(classifier.classify(&issues), DiagnosticCount::new(2, 1, 0));
    }

    #[test]
    fn test_override_only_enabled_for_listed_languages() {
        let classifier = DiagnosticClassifier::for_language("typescript", &["yaml"]);
        assert!(classifier.overrides().is_empty());
        let issues = vec![Diagnostic::warning("indentation error")];
        assert_eq!(classifier.classify(&issues), DiagnosticCount::new(0, 1, 0));

        let yml = DiagnosticClassifier::for_language("YML", &["yml".to_string()]);
        assert_eq!(yml.overrides().len(), 1);
    }

    #[test]
    fn test_custom_override() {
        const KW: &[&str] = &["deprecated"];
        let classifier = DiagnosticClassifier::new().with_override(SeverityOverride::new("deprecations", KW));
        let issues = vec![Diagnostic::info("API is DEPRECATED"), Diagnostic::info("fine")];
        assert_eq!(classifier.classify(&issues), DiagnosticCount::new(1, 0, 1));
    }
}
