//! Validators for checking a resolved table's metadata and data.

use std::collections::HashSet;

use arrow_array::RecordBatch;
use arrow_cast::pretty::pretty_format_batches;
use arrow_schema::{DataType, SchemaRef, TimeUnit};
use chrono::{DateTime, SecondsFormat};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::catalog::{FieldType, Schema, TableHandle};
use crate::reader::DataReader;

use super::finding::{Category, Finding};

/// Trait for validators that only need table metadata.
pub trait Validator {
    /// Run validation and return findings in emission order.
    fn validate(&self, table: &TableHandle) -> Vec<Finding>;
}

/// Render epoch millis as `<millis> (<RFC 3339>)`.
fn format_millis(ms: i64) -> String {
    match DateTime::from_timestamp_millis(ms) {
        Some(ts) => format!("{} ({})", ms, ts.to_rfc3339_opts(SecondsFormat::Millis, true)),
        None => ms.to_string(),
    }
}

fn format_map(map: &IndexMap<String, String>) -> String {
    let pairs: Vec<String> = map.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    format!("{{{}}}", pairs.join(", "))
}

/// Reports the loaded table and checks its format version.
pub struct MetadataValidator {
    pub expected_format_version: i32,
}

impl Default for MetadataValidator {
    fn default() -> Self {
        Self {
            expected_format_version: 2,
        }
    }
}

impl Validator for MetadataValidator {
    fn validate(&self, table: &TableHandle) -> Vec<Finding> {
        let mut findings = vec![Finding::info(
            Category::Metadata,
            format!(
                "Loaded table '{}' from {}: location {}, format version {}, table UUID {}",
                table.name,
                table.metadata_location.display(),
                table.location(),
                table.format_version(),
                table.table_uuid()
            ),
        )
        .with_check("format_version")];

        if table.format_version() != self.expected_format_version {
            findings.push(
                Finding::warning(
                    Category::Metadata,
                    format!(
                        "Format version is {}, expected {}",
                        table.format_version(),
                        self.expected_format_version
                    ),
                )
                .with_check("format_version"),
            );
        }

        findings
    }
}

impl MetadataValidator {
    /// Closing summary of table-level bookkeeping fields.
    pub fn summary(&self, table: &TableHandle) -> Finding {
        Finding::info(
            Category::Metadata,
            format!(
                "Additional metadata: last sequence number {}, last updated {}, properties {}",
                table.last_sequence_number(),
                format_millis(table.last_updated_ms()),
                format_map(table.properties())
            ),
        )
        .with_check("table_summary")
    }
}

/// Validates field identifiers of the current schema.
pub struct SchemaValidator {
    /// Invalid-id warnings fail the run.
    pub field_id_warnings_fail: bool,
    /// Report field ids shared by several top-level fields.
    pub check_unique_field_ids: bool,
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self {
            field_id_warnings_fail: true,
            check_unique_field_ids: true,
        }
    }
}

impl Validator for SchemaValidator {
    fn validate(&self, table: &TableHandle) -> Vec<Finding> {
        let Some(schema) = table.schema() else {
            return vec![Finding::error(Category::Schema, "Table metadata has no current schema")
                .with_check("schema")];
        };

        let mut findings = vec![Finding::info(
            Category::Schema,
            format!("Schema {}: {} fields", schema.schema_id, schema.fields.len()),
        )
        .with_check("schema")];

        for field in &schema.fields {
            findings.push(
                Finding::info(
                    Category::Schema,
                    format!("Field {}: {} ({})", field.id, field.name, field.field_type),
                )
                .with_check("schema"),
            );

            if field.id <= 0 {
                findings.push(
                    Finding::warning(
                        Category::Schema,
                        format!("Invalid field ID {} for field '{}'", field.id, field.name),
                    )
                    .with_check("field_ids")
                    .failing_run(self.field_id_warnings_fail),
                );
            }
        }

        if self.check_unique_field_ids {
            findings.extend(self.duplicate_ids(schema));
        }

        findings
    }
}

impl SchemaValidator {
    fn duplicate_ids(&self, schema: &Schema) -> Vec<Finding> {
        let mut by_id: IndexMap<i32, Vec<&str>> = IndexMap::new();
        for field in &schema.fields {
            by_id.entry(field.id).or_default().push(&field.name);
        }

        by_id
            .into_iter()
            .filter(|(_, names)| names.len() > 1)
            .map(|(id, names)| {
                Finding::error(
                    Category::Schema,
                    format!("Duplicate field ID {} used by fields: {}", id, names.join(", ")),
                )
                .with_check("unique_field_ids")
            })
            .collect()
    }
}

/// Validates snapshot presence, lineage, and the current-snapshot pointer.
#[derive(Default)]
pub struct SnapshotValidator;

impl Validator for SnapshotValidator {
    fn validate(&self, table: &TableHandle) -> Vec<Finding> {
        let snapshots = table.snapshots();
        let mut findings = Vec::new();

        if snapshots.is_empty() {
            findings.push(
                Finding::warning(Category::Snapshot, "No snapshots found (table is empty)")
                    .with_check("snapshots"),
            );
        } else {
            let total = snapshots.len();
            for (i, snapshot) in snapshots.iter().enumerate() {
                findings.push(
                    Finding::info(
                        Category::Snapshot,
                        format!(
                            "Snapshot {} of {}: id {}, timestamp {}, summary {}",
                            i + 1,
                            total,
                            snapshot.snapshot_id,
                            format_millis(snapshot.timestamp_ms),
                            format_map(&snapshot.summary)
                        ),
                    )
                    .with_check("snapshots"),
                );
            }
            findings.extend(self.check_lineage(table));
        }

        match table.metadata.current_snapshot_id() {
            Some(id) if table.current_snapshot().is_some() => findings.push(
                Finding::info(Category::Snapshot, format!("Current snapshot: {}", id))
                    .with_check("current_snapshot"),
            ),
            Some(id) => findings.push(
                Finding::error(
                    Category::Snapshot,
                    format!("Current snapshot {} is not in the snapshot list", id),
                )
                .with_check("current_snapshot"),
            ),
            None => findings.push(
                Finding::warning(Category::Snapshot, "No current snapshot (empty table)")
                    .with_check("current_snapshot"),
            ),
        }

        findings
    }
}

impl SnapshotValidator {
    fn check_lineage(&self, table: &TableHandle) -> Vec<Finding> {
        let snapshots = table.snapshots();
        let mut findings = Vec::new();

        let mut seen = HashSet::new();
        for snapshot in snapshots {
            if !seen.insert(snapshot.snapshot_id) {
                findings.push(
                    Finding::error(
                        Category::Snapshot,
                        format!("Duplicate snapshot ID {}", snapshot.snapshot_id),
                    )
                    .with_check("lineage"),
                );
            }
        }

        for snapshot in snapshots {
            if table.format_version() >= 2
                && snapshot.sequence_number > table.last_sequence_number()
            {
                findings.push(
                    Finding::error(
                        Category::Snapshot,
                        format!(
                            "Snapshot {} has sequence number {} beyond the table's last sequence number {}",
                            snapshot.snapshot_id,
                            snapshot.sequence_number,
                            table.last_sequence_number()
                        ),
                    )
                    .with_check("lineage"),
                );
            }

            if let Some(parent) = snapshot.parent_snapshot_id {
                if !seen.contains(&parent) {
                    findings.push(
                        Finding::warning(
                            Category::Snapshot,
                            format!(
                                "Snapshot {} references missing parent snapshot {}",
                                snapshot.snapshot_id, parent
                            ),
                        )
                        .with_check("lineage"),
                    );
                }
            }
        }

        findings
    }
}

static DECIMAL_TYPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^decimal\(\s*(\d+)\s*,\s*(\d+)\s*\)$").expect("valid regex"));
static FIXED_TYPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^fixed\[(\d+)\]$").expect("valid regex"));

/// Whether an Arrow type is a valid representation of an Iceberg primitive.
///
/// Returns `None` for types this check does not cover (nested types and
/// unknown names).
fn arrow_type_matches(iceberg_type: &FieldType, data_type: &DataType) -> Option<bool> {
    let name = iceberg_type.as_primitive()?;
    let matches = match name {
        "boolean" => matches!(data_type, DataType::Boolean),
        "int" => matches!(data_type, DataType::Int32 | DataType::Int16 | DataType::Int8),
        "long" => matches!(data_type, DataType::Int64),
        "float" => matches!(data_type, DataType::Float32),
        "double" => matches!(data_type, DataType::Float64),
        "date" => matches!(data_type, DataType::Date32),
        "time" => matches!(data_type, DataType::Time64(TimeUnit::Microsecond)),
        "timestamp" => matches!(data_type, DataType::Timestamp(TimeUnit::Microsecond, None)),
        "timestamptz" => matches!(data_type, DataType::Timestamp(TimeUnit::Microsecond, Some(_))),
        "timestamp_ns" => matches!(data_type, DataType::Timestamp(TimeUnit::Nanosecond, None)),
        "timestamptz_ns" => {
            matches!(data_type, DataType::Timestamp(TimeUnit::Nanosecond, Some(_)))
        }
        "string" => matches!(
            data_type,
            DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View
        ),
        "uuid" => matches!(data_type, DataType::FixedSizeBinary(16)),
        "binary" => matches!(
            data_type,
            DataType::Binary | DataType::LargeBinary | DataType::BinaryView
        ),
        other => {
            if let Some(caps) = DECIMAL_TYPE.captures(other) {
                let precision = caps[1].parse::<u8>().ok()?;
                let scale = caps[2].parse::<i8>().ok()?;
                matches!(data_type, DataType::Decimal128(p, s) if *p == precision && *s == scale)
            } else if let Some(caps) = FIXED_TYPE.captures(other) {
                let width = caps[1].parse::<i32>().ok()?;
                matches!(data_type, DataType::FixedSizeBinary(w) if *w == width)
            } else {
                return None;
            }
        }
    };
    Some(matches)
}

fn column_names(schema: &SchemaRef) -> Vec<String> {
    schema.fields().iter().map(|f| f.name().clone()).collect()
}

fn same_layout(a: &SchemaRef, b: &SchemaRef) -> bool {
    a.fields().len() == b.fields().len()
        && a
            .fields()
            .iter()
            .zip(b.fields().iter())
            .all(|(x, y)| x.name() == y.name() && x.data_type() == y.data_type())
}

/// Drives a full scan of the current snapshot and checks the decoded batches.
///
/// Batches are consumed one at a time; only the leading `sample_rows` rows
/// are retained for the sample finding.
pub struct ScanValidator {
    pub sample_rows: usize,
}

impl Default for ScanValidator {
    fn default() -> Self {
        Self { sample_rows: 5 }
    }
}

impl ScanValidator {
    /// Scan `table` through `reader` and return findings.
    ///
    /// A scan or decode failure yields a single error finding and ends the scan.
    pub fn validate(&self, table: &TableHandle, reader: &dyn DataReader) -> Vec<Finding> {
        let batches = match reader.scan(table) {
            Ok(batches) => batches,
            Err(e) => {
                log::warn!("Scan of '{}' could not start: {}", table.name, e);
                return vec![Finding::error(
                    Category::Scan,
                    format!("Failed to scan table data: {}", e),
                )
                .with_check("scan")];
            }
        };

        let mut layout: Option<SchemaRef> = None;
        let mut row_count = 0usize;
        let mut sample: Vec<RecordBatch> = Vec::new();
        let mut sampled = 0usize;

        for (index, item) in batches.enumerate() {
            let batch = match item {
                Ok(batch) => batch,
                Err(e) => {
                    log::warn!("Scan of '{}' failed at batch {}: {}", table.name, index, e);
                    return vec![Finding::error(
                        Category::Scan,
                        format!("Failed to decode batch {}: {}", index, e),
                    )
                    .with_check("scan")];
                }
            };

            let batch_schema = batch.schema();
            match &layout {
                None => layout = Some(batch_schema),
                Some(first) if !same_layout(first, &batch_schema) => {
                    return vec![Finding::error(
                        Category::Scan,
                        format!(
                            "Batch {} columns [{}] differ from first batch [{}]",
                            index,
                            column_names(&batch_schema).join(", "),
                            column_names(first).join(", ")
                        ),
                    )
                    .with_check("scan")];
                }
                Some(_) => {}
            }

            row_count += batch.num_rows();
            if sampled < self.sample_rows && batch.num_rows() > 0 {
                let take = (self.sample_rows - sampled).min(batch.num_rows());
                sample.push(batch.slice(0, take));
                sampled += take;
            }
        }

        let columns = match &layout {
            Some(schema) => column_names(schema),
            None => table
                .schema()
                .map(|s| s.field_names().into_iter().map(str::to_string).collect::<Vec<_>>())
                .unwrap_or_default(),
        };

        let mut findings = vec![Finding::info(
            Category::Scan,
            format!("Scanned {} rows, columns [{}]", row_count, columns.join(", ")),
        )
        .with_check("scan")];

        if row_count > 0 {
            if sampled > 0 {
                findings.push(self.sample_finding(&sample, sampled));
            }
            if let Some(schema) = &layout {
                for field in schema.fields() {
                    findings.push(
                        Finding::info(
                            Category::Scan,
                            format!("Column {}: {}", field.name(), field.data_type()),
                        )
                        .with_check("column_types"),
                    );
                }
            }
        }

        if let (Some(observed), Some(declared)) = (&layout, table.schema()) {
            findings.extend(self.check_columns(observed, declared));
        }

        findings
    }

    fn sample_finding(&self, sample: &[RecordBatch], sampled: usize) -> Finding {
        match pretty_format_batches(sample) {
            Ok(table) => Finding::info(
                Category::Scan,
                format!("Sample data (first {} rows):\n{}", sampled, table),
            )
            .with_check("sample"),
            Err(e) => Finding::warning(
                Category::Scan,
                format!("Could not format sample rows: {}", e),
            )
            .with_check("sample"),
        }
    }

    /// Observed columns must be declared and have a compatible type.
    fn check_columns(&self, observed: &SchemaRef, declared: &Schema) -> Vec<Finding> {
        let mut findings = Vec::new();

        for column in observed.fields() {
            match declared.field_by_name(column.name()) {
                None => findings.push(
                    Finding::error(
                        Category::Scan,
                        format!(
                            "Scanned column '{}' is not declared in schema {}",
                            column.name(),
                            declared.schema_id
                        ),
                    )
                    .with_check("column_types"),
                ),
                Some(field) => {
                    if arrow_type_matches(&field.field_type, column.data_type()) == Some(false) {
                        findings.push(
                            Finding::warning(
                                Category::Scan,
                                format!(
                                    "Column '{}' has type {}, schema declares {}",
                                    column.name(),
                                    column.data_type(),
                                    field.field_type
                                ),
                            )
                            .with_check("column_types"),
                        );
                    }
                }
            }
        }

        findings
    }
}
