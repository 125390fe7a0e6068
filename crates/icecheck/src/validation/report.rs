//! Validation report: ordered findings plus the derived verdict.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::finding::{Category, Finding, Severity};

/// Stages of a validation run, in the order they are reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Start,
    MetadataLoaded,
    SchemaChecked,
    SnapshotsChecked,
    ScanChecked,
    Done,
}

/// Counts of findings by severity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindingCounts {
    pub error: usize,
    pub warning: usize,
    pub info: usize,
}

/// Result of validating one table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub warehouse: PathBuf,
    pub table: String,
    /// Metadata file the table was loaded from, once resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_location: Option<PathBuf>,
    /// SHA-256 of that metadata file, when it was read from disk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_sha256: Option<String>,
    /// Findings in emission order.
    pub findings: Vec<Finding>,
    /// True iff no finding is an error or marked as failing the run.
    pub passed: bool,
    pub counts: FindingCounts,
    /// Last stage reached.
    pub stage: Stage,
    /// When the run started.
    pub validated_at: DateTime<Utc>,
}

impl ValidationReport {
    /// Start an empty report.
    pub fn new(warehouse: impl Into<PathBuf>, table: impl Into<String>) -> Self {
        Self {
            warehouse: warehouse.into(),
            table: table.into(),
            metadata_location: None,
            metadata_sha256: None,
            findings: Vec::new(),
            passed: false,
            counts: FindingCounts::default(),
            stage: Stage::Start,
            validated_at: Utc::now(),
        }
    }

    /// Record a finding at the end of the report.
    pub fn push(&mut self, mut finding: Finding) {
        finding.seq = self.findings.len();
        self.findings.push(finding);
    }

    /// Record findings in order.
    pub fn extend(&mut self, findings: impl IntoIterator<Item = Finding>) {
        for finding in findings {
            self.push(finding);
        }
    }

    /// Move to the next stage.
    pub fn advance(&mut self, stage: Stage) {
        log::debug!("{}: {:?} -> {:?}", self.table, self.stage, stage);
        self.stage = stage;
    }

    /// Close the report and derive counts and verdict.
    pub fn finish(mut self) -> Self {
        self.advance(Stage::Done);

        let mut counts = FindingCounts::default();
        for finding in &self.findings {
            match finding.severity {
                Severity::Error => counts.error += 1,
                Severity::Warning => counts.warning += 1,
                Severity::Info => counts.info += 1,
            }
        }
        self.counts = counts;
        self.passed = !self.findings.iter().any(Finding::is_failure);
        self
    }

    /// Findings in a category, in order.
    pub fn in_category(&self, category: Category) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.category == category)
    }

    /// Findings at a severity, in order.
    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.severity == severity)
    }

    /// Findings that caused the run to fail.
    pub fn failures(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.is_failure())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_follows_emission_order() {
        let mut report = ValidationReport::new("/tmp/wh", "orders");
        report.push(Finding::info(Category::Metadata, "a"));
        report.extend(vec![
            Finding::info(Category::Schema, "b"),
            Finding::warning(Category::Snapshot, "c"),
        ]);

        let seqs: Vec<_> = report.findings.iter().map(|f| f.seq).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
    }

    #[test]
    fn test_verdict() {
        let mut report = ValidationReport::new("/tmp/wh", "orders");
        report.push(Finding::warning(Category::Snapshot, "No snapshots found (table is empty)"));
        let report = report.finish();
        assert!(report.passed);
        assert_eq!(report.stage, Stage::Done);
        assert_eq!(report.counts.warning, 1);

        let mut report = ValidationReport::new("/tmp/wh", "orders");
        report.push(Finding::warning(Category::Schema, "Invalid field ID 0").failing_run(true));
        let report = report.finish();
        assert!(!report.passed);
        assert_eq!(report.counts.error, 0);
        assert_eq!(report.failures().count(), 1);
    }
}
