//! Validation engine: findings, validators, and the report.

mod finding;
mod report;
mod validators;

pub use finding::{Category, Finding, Severity};
pub use report::{FindingCounts, Stage, ValidationReport};
pub use validators::{
    MetadataValidator, ScanValidator, SchemaValidator, SnapshotValidator, Validator,
};
