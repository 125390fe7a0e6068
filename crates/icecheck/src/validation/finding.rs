//! Findings produced by the table validators.

use serde::{Deserialize, Serialize};

/// Area of the table a finding is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Table resolution and top-level metadata.
    Metadata,
    /// Current schema and its field identifiers.
    Schema,
    /// Snapshot history and the current-snapshot pointer.
    Snapshot,
    /// Data scan of the current snapshot.
    Scan,
}

impl Category {
    /// Get a human-readable label for the category.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Metadata => "Metadata",
            Category::Schema => "Schema",
            Category::Snapshot => "Snapshot",
            Category::Scan => "Scan",
        }
    }
}

/// Severity level of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Audit-trail detail, never affects the verdict.
    Info,
    /// Suspicious but tolerated, unless the finding is marked as failing the run.
    Warning,
    /// Definite violation; fails the run.
    Error,
}

impl Severity {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Info => "Info",
            Severity::Warning => "Warning",
            Severity::Error => "Error",
        }
    }
}

/// One validation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Position in the report, assigned when recorded.
    pub seq: usize,
    pub severity: Severity,
    pub category: Category,
    /// Human-readable description.
    pub message: String,
    /// Name of the check that emitted this finding.
    pub check: String,
    /// Fails the run even though the severity is below error.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub fails_run: bool,
}

impl Finding {
    /// Create a new finding.
    pub fn new(severity: Severity, category: Category, message: impl Into<String>) -> Self {
        Self {
            seq: 0,
            severity,
            category,
            message: message.into(),
            check: String::new(),
            fails_run: false,
        }
    }

    pub fn info(category: Category, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, category, message)
    }

    pub fn warning(category: Category, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, category, message)
    }

    pub fn error(category: Category, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, category, message)
    }

    /// Set the check name.
    pub fn with_check(mut self, check: impl Into<String>) -> Self {
        self.check = check.into();
        self
    }

    /// Mark whether this finding fails the run regardless of severity.
    pub fn failing_run(mut self, fails_run: bool) -> Self {
        self.fails_run = fails_run;
        self
    }

    /// Whether this finding flips the verdict to failed.
    pub fn is_failure(&self) -> bool {
        self.severity == Severity::Error || self.fails_run
    }
}
