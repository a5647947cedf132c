//! Error reporting
//!
//! Scoring and caching entry points never fail. When something goes wrong
//! underneath them the failure is handed to an [`ErrorReporter`], which logs
//! it, keeps a bounded history and hands back a fallback value.
//!
//! The reporter is constructed explicitly and shared as `Arc<ErrorReporter>`
//! with every component that needs it.

use crate::models::MoodScore;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::fmt::Display;
use std::future::Future;
use std::sync::Mutex;
use tracing::{error, info, warn};

/// Maximum number of reports kept in memory
pub const HISTORY_CAPACITY: usize = 100;

/// Reports within this window count toward health
const HEALTH_WINDOW_SECS: i64 = 5 * 60;
/// This many recent reports of any severity make the reporter unhealthy
const UNHEALTHY_RECENT_COUNT: usize = 10;

/// Operation tags with dedicated user messages
pub mod ops {
    pub const EMOJI_LOADING: &str = "emoji_loading";
    pub const DIAGNOSTIC_ANALYSIS: &str = "diagnostic_analysis";
    pub const PANEL_UPDATE: &str = "panel_update";
    pub const CACHE_OPERATION: &str = "cache_operation";
}

/// Advisory severity, only decides log level and notification intensity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Low => write!(f, "low"),
            ErrorSeverity::Medium => write!(f, "medium"),
            ErrorSeverity::High => write!(f, "high"),
            ErrorSeverity::Critical => write!(f, "critical"),
        }
    }
}

/// Where and how badly something failed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorContext {
    pub operation: String,
    pub file_path: Option<String>,
    pub language_id: Option<String>,
    pub severity: ErrorSeverity,
    pub at: DateTime<Utc>,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>, severity: ErrorSeverity) -> Self {
        Self {
            operation: operation.into(),
            file_path: None,
            language_id: None,
            severity,
            at: Utc::now(),
        }
    }

    pub fn with_file(mut self, file_path: impl Into<String>) -> Self {
        self.file_path = Some(file_path.into());
        self
    }

    pub fn with_language(mut self, language_id: impl Into<String>) -> Self {
        self.language_id = Some(language_id.into());
        self
    }
}

/// A single reported failure
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorRecord {
    pub message: String,
    pub context: ErrorContext,
}

/// Summary of the report history
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ErrorStats {
    pub total: usize,
    pub by_severity: HashMap<ErrorSeverity, usize>,
    pub by_operation: HashMap<String, usize>,
}

#[derive(Debug, Default)]
pub struct ErrorReporter {
    history: Mutex<VecDeque<ErrorRecord>>,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log a failure and append it to the history
    pub fn report(&self, err: &dyn Display, context: ErrorContext) {
        let file = context.file_path.as_deref().unwrap_or("-");
        match context.severity {
            ErrorSeverity::Critical => {
                error!("[{}] {} (file: {}): {}", context.severity, context.operation, file, err)
            }
            ErrorSeverity::High | ErrorSeverity::Medium => {
                warn!("[{}] {} (file: {}): {}", context.severity, context.operation, file, err)
            }
            ErrorSeverity::Low => {
                info!("[{}] {} (file: {}): {}", context.severity, context.operation, file, err)
            }
        }

        let mut history = self.lock();
        if history.len() == HISTORY_CAPACITY {
            history.pop_front();
        }
        history.push_back(ErrorRecord {
            message: err.to_string(),
            context,
        });
    }

    /// Message suitable for a user-facing notification
    pub fn user_message(context: &ErrorContext) -> String {
        let hint = match context.operation.as_str() {
            ops::EMOJI_LOADING => "Using fallback emoji display.",
            ops::DIAGNOSTIC_ANALYSIS => "Code mood may not be accurate.",
            ops::PANEL_UPDATE => "Panel display may be outdated.",
            ops::CACHE_OPERATION => "Performance may be affected.",
            _ => "Some features may not work correctly.",
        };
        format!("CodeMood: {} encountered an issue. {}", context.operation, hint)
    }

    /// Run `op`, returning `fallback` if it errors or panics
    pub fn guard<T, E, F>(&self, op: F, fallback: T, context: ErrorContext) -> T
    where
        E: Display,
        F: FnOnce() -> Result<T, E>,
    {
        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(op)) {
            Ok(Ok(value)) => value,
            Ok(Err(e)) => {
                self.report(&e, context);
                fallback
            }
            Err(panic_info) => {
                let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                self.report(&format!("Panic: {}", panic_msg), context);
                fallback
            }
        }
    }

    /// Await `fut`, returning `fallback` if it resolves to an error
    pub async fn guard_async<T, E, Fut>(&self, fut: Fut, fallback: T, context: ErrorContext) -> T
    where
        E: Display,
        Fut: Future<Output = Result<T, E>>,
    {
        match fut.await {
            Ok(value) => value,
            Err(e) => {
                self.report(&e, context);
                fallback
            }
        }
    }

    /// Report a scoring failure and return the neutral default
    pub fn fallback_score(&self, file_path: &str, reason: &str) -> MoodScore {
        self.report(
            &reason,
            ErrorContext::new(ops::DIAGNOSTIC_ANALYSIS, ErrorSeverity::Medium).with_file(file_path),
        );
        MoodScore::neutral(file_path)
    }

    /// Oldest first
    pub fn history(&self) -> Vec<ErrorRecord> {
        self.lock().iter().cloned().collect()
    }

    pub fn clear_history(&self) {
        self.lock().clear();
    }

    pub fn stats(&self) -> ErrorStats {
        let history = self.lock();
        let mut stats = ErrorStats {
            total: history.len(),
            ..Default::default()
        };
        for record in history.iter() {
            *stats.by_severity.entry(record.context.severity).or_insert(0) += 1;
            *stats
                .by_operation
                .entry(record.context.operation.clone())
                .or_insert(0) += 1;
        }
        stats
    }

    /// False after a critical report or a burst of reports in the last 5 minutes
    pub fn is_healthy(&self) -> bool {
        self.is_healthy_at(Utc::now())
    }

    pub(crate) fn is_healthy_at(&self, now: DateTime<Utc>) -> bool {
        let window_start = now - Duration::seconds(HEALTH_WINDOW_SECS);
        let history = self.lock();
        let recent: Vec<_> = history
            .iter()
            .filter(|r| r.context.at > window_start)
            .collect();

        let has_critical = recent
            .iter()
            .any(|r| r.context.severity == ErrorSeverity::Critical);
        !has_critical && recent.len() < UNHEALTHY_RECENT_COUNT
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<ErrorRecord>> {
        self.history.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
