//! Main IceCheck struct and public API.

use std::path::Path;

use crate::catalog::{FilesystemCatalog, MetadataStore};
use crate::error::{IceCheckError, Result};
use crate::reader::{DataReader, IcebergReader};
use crate::validation::{
    Category, Finding, MetadataValidator, ScanValidator, SchemaValidator, SnapshotValidator,
    Stage, ValidationReport, Validator,
};

/// Configuration for a validation run.
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// Table format version the table is expected to use.
    pub expected_format_version: i32,
    /// Number of leading rows shown in the scan sample.
    pub sample_rows: usize,
    /// Non-positive field ids fail the run (the finding itself stays a warning).
    pub field_id_warnings_fail: bool,
    /// Report duplicate top-level field ids as errors.
    pub check_unique_field_ids: bool,
    /// Scan the current snapshot's data.
    pub scan_data: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            expected_format_version: 2,
            sample_rows: 5,
            field_id_warnings_fail: true,
            check_unique_field_ids: true,
            scan_data: true,
        }
    }
}

/// The table validation engine.
///
/// Resolution and scanning are delegated to the injected [`MetadataStore`]
/// and [`DataReader`]; the engine itself never touches the table.
pub struct IceCheck {
    config: ValidatorConfig,
    store: Box<dyn MetadataStore + Send + Sync>,
    reader: Box<dyn DataReader + Send + Sync>,
    metadata: MetadataValidator,
    schema: SchemaValidator,
    snapshots: SnapshotValidator,
    scan: ScanValidator,
}

impl IceCheck {
    /// Create an engine over the given collaborators with default configuration.
    pub fn new(
        store: impl MetadataStore + Send + Sync + 'static,
        reader: impl DataReader + Send + Sync + 'static,
    ) -> Self {
        let config = ValidatorConfig::default();
        Self {
            metadata: MetadataValidator {
                expected_format_version: config.expected_format_version,
            },
            schema: SchemaValidator {
                field_id_warnings_fail: config.field_id_warnings_fail,
                check_unique_field_ids: config.check_unique_field_ids,
            },
            snapshots: SnapshotValidator,
            scan: ScanValidator {
                sample_rows: config.sample_rows,
            },
            config,
            store: Box::new(store),
            reader: Box::new(reader),
        }
    }

    /// Engine for a local filesystem warehouse, scanning through iceberg-rust.
    pub fn local() -> Result<Self> {
        Ok(Self::new(FilesystemCatalog::new(), IcebergReader::new()?))
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: ValidatorConfig) -> Self {
        self.metadata.expected_format_version = config.expected_format_version;
        self.schema.field_id_warnings_fail = config.field_id_warnings_fail;
        self.schema.check_unique_field_ids = config.check_unique_field_ids;
        self.scan.sample_rows = config.sample_rows;
        self.config = config;
        self
    }

    /// Validate `table` in `warehouse`.
    ///
    /// Always returns a report; failures are recorded as findings.
    pub fn validate(&self, warehouse: impl AsRef<Path>, table: &str) -> ValidationReport {
        let warehouse = warehouse.as_ref();
        let mut report = ValidationReport::new(warehouse, table);

        let handle = match self.store.resolve(warehouse, table) {
            Ok(handle) => handle,
            Err(e) => {
                log::warn!("Could not resolve table '{}': {}", table, e);
                report.push(Finding::error(Category::Metadata, resolution_message(&e)).with_check("resolve"));
                return self.conclude(report);
            }
        };
        report.metadata_location = Some(handle.metadata_location.clone());
        if !handle.metadata_sha256.is_empty() {
            report.metadata_sha256 = Some(handle.metadata_sha256.clone());
        }
        report.extend(self.metadata.validate(&handle));
        report.advance(Stage::MetadataLoaded);

        report.extend(self.schema.validate(&handle));
        report.advance(Stage::SchemaChecked);

        report.extend(self.snapshots.validate(&handle));
        report.advance(Stage::SnapshotsChecked);

        if handle.current_snapshot().is_some() {
            if self.config.scan_data {
                report.extend(self.scan.validate(&handle, self.reader.as_ref()));
                report.advance(Stage::ScanChecked);
            } else {
                report.push(Finding::info(Category::Scan, "Data scan skipped").with_check("scan"));
            }
        }

        report.push(self.metadata.summary(&handle));
        self.conclude(report)
    }

    fn conclude(&self, report: ValidationReport) -> ValidationReport {
        let report = report.finish();
        log::info!(
            "Validation of '{}' {} ({} errors, {} warnings)",
            report.table,
            if report.passed { "passed" } else { "failed" },
            report.counts.error,
            report.counts.warning
        );
        report
    }
}

/// Finding text for a failed table resolution.
fn resolution_message(err: &IceCheckError) -> String {
    if err.is_not_found() {
        err.to_string()
    } else {
        format!("Validation failed: {}", err)
    }
}
