//! Semantic checks on a parsed [`FaceSwapConfig`].

use crate::schema::FaceSwapConfig;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "beart.base_url"
    pub path: String,
    pub message: String,
}

/// All diagnostics for one config.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.first_error().is_some()
    }

    #[must_use]
    pub fn first_error(&self) -> Option<&Diagnostic> {
        self.diagnostics
            .iter()
            .find(|d| d.severity == Severity::Error)
    }

    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    fn push(&mut self, severity: Severity, path: &str, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity,
            path: path.to_string(),
            message: message.into(),
        });
    }
}

pub fn validate(config: &FaceSwapConfig) -> ValidationResult {
    let mut result = ValidationResult::default();

    if config.trigger_prefix.trim().is_empty() {
        result.push(
            Severity::Error,
            "trigger_prefix",
            "must contain a non-blank trigger phrase",
        );
    } else if config.trigger_prefix.trim() != config.trigger_prefix {
        // Inbound text is trimmed before matching, so padding can never match.
        result.push(
            Severity::Warning,
            "trigger_prefix",
            "leading or trailing whitespace is never matched",
        );
    }

    let base_url = &config.beart.base_url;
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        result.push(
            Severity::Error,
            "beart.base_url",
            format!("expected an http(s) URL, got {base_url:?}"),
        );
    }

    if config.beart.poll_max_attempts == 0 {
        result.push(
            Severity::Error,
            "beart.poll_max_attempts",
            "must allow at least one poll",
        );
    }

    if config.beart.create_timeout_secs == 0 || config.beart.poll_timeout_secs == 0 {
        result.push(
            Severity::Error,
            "beart",
            "request timeouts must be greater than zero",
        );
    }

    if config.beart.poll_interval_secs == 0 {
        result.push(
            Severity::Info,
            "beart.poll_interval_secs",
            "polling without a pause between attempts",
        );
    }

    result
}
