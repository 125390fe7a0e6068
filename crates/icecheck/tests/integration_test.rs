//! Integration tests for icecheck.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use arrow_array::{ArrayRef, Float64Array, Int64Array, RecordBatch};
use arrow_schema::{DataType, Field as ArrowField, Schema as ArrowSchema};
use iceberg::arrow::schema_to_arrow_schema;
use iceberg::memory::{MEMORY_CATALOG_WAREHOUSE, MemoryCatalogBuilder};
use iceberg::spec::{DataFileFormat, NestedField, PrimitiveType, Schema as IcebergSchema, Type};
use iceberg::transaction::{ApplyTransactionAction, Transaction};
use iceberg::writer::base_writer::data_file_writer::DataFileWriterBuilder;
use iceberg::writer::file_writer::ParquetWriterBuilder;
use iceberg::writer::file_writer::location_generator::{
    DefaultFileNameGenerator, DefaultLocationGenerator,
};
use iceberg::writer::{IcebergWriter, IcebergWriterBuilder};
use iceberg::{Catalog, CatalogBuilder, NamespaceIdent, TableCreation};
use parquet::file::properties::WriterProperties;
use sha2::{Digest, Sha256};
use tempfile::TempDir;

use icecheck::{
    Category, FilesystemCatalog, IceCheck, IcebergReader, MemoryReader, Severity, Stage,
    ValidatorConfig,
};

/// Helper to write a metadata file for `table` into a warehouse.
fn write_table(warehouse: &Path, table: &str, metadata: &str) {
    let dir = table
        .split('.')
        .fold(warehouse.to_path_buf(), |p, part| p.join(part))
        .join("metadata");
    fs::create_dir_all(&dir).expect("Failed to create metadata dir");
    fs::write(dir.join("v1.metadata.json"), metadata).expect("Failed to write metadata");
}

fn orders_metadata(field_ids: (i32, i32), with_snapshot: bool) -> String {
    let snapshots = if with_snapshot {
        r#""current-snapshot-id": 3051729675574597004,
        "snapshots": [{
            "snapshot-id": 3051729675574597004,
            "sequence-number": 1,
            "timestamp-ms": 1515100955770,
            "manifest-list": "/tmp/wh/orders/metadata/snap-3051729675574597004.avro",
            "summary": {"operation": "append", "added-records": "3"}
        }]"#
    } else {
        r#""current-snapshot-id": null, "snapshots": []"#
    };

    format!(
        r#"{{
        "format-version": 2,
        "table-uuid": "9c12d441-03fe-4693-9a96-a0705ddf69c1",
        "location": "/tmp/wh/orders",
        "last-sequence-number": 1,
        "last-updated-ms": 1515100955770,
        "last-column-id": 2,
        "current-schema-id": 0,
        "schemas": [{{
            "type": "struct",
            "schema-id": 0,
            "fields": [
                {{"id": {}, "name": "id", "required": true, "type": "long"}},
                {{"id": {}, "name": "amount", "required": false, "type": "double"}}
            ]
        }}],
        "properties": {{"owner": "etl"}},
        {}
    }}"#,
        field_ids.0, field_ids.1, snapshots
    )
}

fn orders_batch() -> RecordBatch {
    let schema = Arc::new(ArrowSchema::new(vec![
        ArrowField::new("id", DataType::Int64, false),
        ArrowField::new("amount", DataType::Float64, true),
    ]));
    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int64Array::from(vec![1, 2, 3])) as ArrayRef,
            Arc::new(Float64Array::from(vec![9.5, 12.0, 3.25])) as ArrayRef,
        ],
    )
    .expect("Failed to build batch")
}

fn engine_with(reader: MemoryReader) -> IceCheck {
    IceCheck::new(FilesystemCatalog::new(), reader)
}

// =============================================================================
// Passing Tables
// =============================================================================

#[test]
fn test_valid_table_passes() {
    let wh = TempDir::new().unwrap();
    write_table(wh.path(), "orders", &orders_metadata((1, 2), true));

    let report = engine_with(MemoryReader::with_batches(vec![orders_batch()])).validate(wh.path(), "orders");

    assert!(report.passed);
    assert_eq!(report.counts.error, 0);
    assert_eq!(report.stage, Stage::Done);

    let expected = format!(
        "sha256:{:x}",
        Sha256::digest(fs::read(wh.path().join("orders/metadata/v1.metadata.json")).unwrap())
    );
    assert_eq!(report.metadata_sha256.as_deref(), Some(expected.as_str()));

    let messages: Vec<&str> = report.findings.iter().map(|f| f.message.as_str()).collect();
    assert!(messages[0].contains("format version 2"));
    assert_eq!(messages[1], "Schema 0: 2 fields");
    assert_eq!(messages[2], "Field 1: id (long)");
    assert_eq!(messages[3], "Field 2: amount (double)");
    assert!(messages[4].starts_with("Snapshot 1 of 1: id 3051729675574597004"));
    assert_eq!(messages[5], "Current snapshot: 3051729675574597004");
    assert_eq!(messages[6], "Scanned 3 rows, columns [id, amount]");
}

#[test]
fn test_scan_columns_match_schema() {
    let wh = TempDir::new().unwrap();
    write_table(wh.path(), "orders", &orders_metadata((1, 2), true));

    let report = engine_with(MemoryReader::with_batches(vec![orders_batch()])).validate(wh.path(), "orders");

    let scan: Vec<_> = report.in_category(Category::Scan).collect();
    assert!(scan.iter().all(|f| f.severity == Severity::Info));
    assert!(scan.iter().any(|f| f.message == "Column id: Int64"));
    assert!(scan.iter().any(|f| f.message == "Column amount: Float64"));
}

#[test]
fn test_category_order() {
    let wh = TempDir::new().unwrap();
    write_table(wh.path(), "sales.orders", &orders_metadata((1, 2), true));

    let report = engine_with(MemoryReader::with_batches(vec![orders_batch()])).validate(wh.path(), "sales.orders");

    let mut categories: Vec<Category> = report.findings.iter().map(|f| f.category).collect();
    categories.dedup();
    assert_eq!(
        categories,
        vec![
            Category::Metadata,
            Category::Schema,
            Category::Snapshot,
            Category::Scan,
            Category::Metadata,
        ]
    );
    assert!(report.findings.last().unwrap().message.contains("properties {owner=etl}"));
}

// =============================================================================
// Resolution Failures
// =============================================================================

#[test]
fn test_missing_warehouse() {
    let wh = TempDir::new().unwrap();
    let missing = wh.path().join("does-not-exist");

    let report = engine_with(MemoryReader::new()).validate(&missing, "orders");

    assert!(!report.passed);
    assert_eq!(report.findings.len(), 1);
    assert_eq!(report.findings[0].severity, Severity::Error);
    assert!(report.findings[0].message.contains(&missing.display().to_string()));
    assert_eq!(report.in_category(Category::Schema).count(), 0);
}

#[test]
fn test_missing_table() {
    let wh = TempDir::new().unwrap();
    write_table(wh.path(), "orders", &orders_metadata((1, 2), true));

    let report = engine_with(MemoryReader::new()).validate(wh.path(), "customers");

    assert!(!report.passed);
    assert_eq!(report.findings.len(), 1);
    assert_eq!(report.findings[0].category, Category::Metadata);
    assert!(report.findings[0].message.starts_with("Table not found: customers"));
}

#[test]
fn test_unparseable_metadata() {
    let wh = TempDir::new().unwrap();
    write_table(wh.path(), "orders", r#"{"format-version": "two"}"#);

    let report = engine_with(MemoryReader::new()).validate(wh.path(), "orders");

    assert!(!report.passed);
    assert_eq!(report.findings.len(), 1);
    assert!(report.findings[0].message.starts_with("Validation failed: JSON error"));
}

// =============================================================================
// Non-Terminal Conditions
// =============================================================================

#[test]
fn test_invalid_field_id_fails_without_error() {
    let wh = TempDir::new().unwrap();
    write_table(wh.path(), "orders", &orders_metadata((0, 2), true));

    let report = engine_with(MemoryReader::with_batches(vec![orders_batch()])).validate(wh.path(), "orders");

    assert!(!report.passed);
    assert_eq!(report.counts.error, 0);
    let warning = report
        .with_severity(Severity::Warning)
        .find(|f| f.check == "field_ids")
        .expect("field id warning");
    assert_eq!(warning.message, "Invalid field ID 0 for field 'id'");
    // Later stages still run.
    assert!(report.in_category(Category::Scan).count() > 0);
}

#[test]
fn test_invalid_field_id_lenient() {
    let wh = TempDir::new().unwrap();
    write_table(wh.path(), "orders", &orders_metadata((-1, 2), true));

    let engine = engine_with(MemoryReader::with_batches(vec![orders_batch()])).with_config(ValidatorConfig {
        field_id_warnings_fail: false,
        ..ValidatorConfig::default()
    });
    let report = engine.validate(wh.path(), "orders");

    assert!(report.passed);
    assert_eq!(report.with_severity(Severity::Warning).count(), 1);
}

#[test]
fn test_empty_table_is_not_scanned() {
    let wh = TempDir::new().unwrap();
    write_table(wh.path(), "orders", &orders_metadata((1, 2), false));

    let report = engine_with(MemoryReader::failing_on_start("should not scan")).validate(wh.path(), "orders");

    assert!(report.passed);
    assert_eq!(report.in_category(Category::Scan).count(), 0);
    assert_eq!(report.stage, Stage::Done);
    let warnings: Vec<_> = report.with_severity(Severity::Warning).map(|f| f.message.as_str()).collect();
    assert_eq!(
        warnings,
        vec!["No snapshots found (table is empty)", "No current snapshot (empty table)"]
    );
}

#[test]
fn test_format_version_one_warns() {
    let wh = TempDir::new().unwrap();
    let metadata = orders_metadata((1, 2), false).replace("\"format-version\": 2", "\"format-version\": 1");
    write_table(wh.path(), "orders", &metadata);

    let report = engine_with(MemoryReader::new()).validate(wh.path(), "orders");

    assert!(report.passed);
    assert!(report
        .with_severity(Severity::Warning)
        .any(|f| f.message == "Format version is 1, expected 2"));
}

#[test]
fn test_decode_failure_keeps_earlier_findings() {
    let wh = TempDir::new().unwrap();
    write_table(wh.path(), "orders", &orders_metadata((1, 2), true));

    let reader = MemoryReader::with_batches(vec![orders_batch()]).then_fail("invalid parquet footer");
    let report = engine_with(reader).validate(wh.path(), "orders");

    assert!(!report.passed);
    let errors: Vec<_> = report.with_severity(Severity::Error).collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].category, Category::Scan);
    assert!(errors[0].message.contains("invalid parquet footer"));
    assert_eq!(report.in_category(Category::Schema).count(), 3);
}

#[test]
fn test_iceberg_reader_reports_missing_data_files() {
    let wh = TempDir::new().unwrap();
    write_table(wh.path(), "orders", &orders_metadata((1, 2), true));

    let engine = IceCheck::new(FilesystemCatalog::new(), IcebergReader::new().unwrap());
    let report = engine.validate(wh.path(), "orders");

    assert!(!report.passed);
    let scan_errors: Vec<_> = report
        .in_category(Category::Scan)
        .filter(|f| f.severity == Severity::Error)
        .collect();
    assert_eq!(scan_errors.len(), 1);
}

#[test]
fn test_iceberg_reader_scans_real_table() {
    let wh = TempDir::new().unwrap();
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(create_orders_table(wh.path()))
        .expect("Failed to create table");

    let engine = IceCheck::local().unwrap();
    for name in ["orders", "default.orders"] {
        let report = engine.validate(wh.path(), name);

        assert!(report.passed, "{}: {:?}", name, report.failures().collect::<Vec<_>>());
        assert!(report
            .findings
            .iter()
            .any(|f| f.message == "Scanned 3 rows, columns [id, amount]"));
        assert!(report.in_category(Category::Scan).any(|f| f.message.starts_with("Sample data (first 3 rows):")));
        assert_eq!(report.stage, Stage::Done);
    }
}

/// Create `default.orders` with three rows in one appended data file.
async fn create_orders_table(warehouse: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = MemoryCatalogBuilder::default()
        .load(
            "icecheck",
            HashMap::from([(
                MEMORY_CATALOG_WAREHOUSE.to_string(),
                warehouse.display().to_string(),
            )]),
        )
        .await?;
    let namespace = NamespaceIdent::new("default".to_string());
    catalog.create_namespace(&namespace, HashMap::new()).await?;

    let schema = IcebergSchema::builder()
        .with_fields(vec![
            NestedField::required(1, "id", Type::Primitive(PrimitiveType::Long)).into(),
            NestedField::optional(2, "amount", Type::Primitive(PrimitiveType::Double)).into(),
        ])
        .build()?;
    let creation = TableCreation::builder()
        .name("orders".to_string())
        .schema(schema)
        .build();
    let table = catalog.create_table(&namespace, creation).await?;

    let arrow_schema = Arc::new(schema_to_arrow_schema(table.metadata().current_schema())?);
    let batch = RecordBatch::try_new(
        arrow_schema,
        vec![
            Arc::new(Int64Array::from(vec![1, 2, 3])) as ArrayRef,
            Arc::new(Float64Array::from(vec![9.5, 12.0, 3.25])) as ArrayRef,
        ],
    )?;

    let parquet_writer_builder = ParquetWriterBuilder::new(
        WriterProperties::builder().build(),
        table.metadata().current_schema().clone(),
        None,
        table.file_io().clone(),
        DefaultLocationGenerator::new(table.metadata().clone())?,
        DefaultFileNameGenerator::new("orders".to_string(), None, DataFileFormat::Parquet),
    );
    let mut writer = DataFileWriterBuilder::new(parquet_writer_builder, None, 0)
        .build()
        .await?;
    writer.write(batch).await?;
    let data_files = writer.close().await?;

    let tx = Transaction::new(&table);
    let tx = tx.fast_append().add_data_files(data_files).apply(tx)?;
    tx.commit(&catalog).await?;
    Ok(())
}

// =============================================================================
// Determinism
// =============================================================================

#[test]
fn test_repeated_runs_are_identical() {
    let wh = TempDir::new().unwrap();
    write_table(wh.path(), "orders", &orders_metadata((1, 2), true));
    let engine = engine_with(MemoryReader::with_batches(vec![orders_batch()]));

    let first = engine.validate(wh.path(), "orders");
    let second = engine.validate(wh.path(), "orders");

    assert_eq!(first.findings, second.findings);
    assert_eq!(first.passed, second.passed);
}
