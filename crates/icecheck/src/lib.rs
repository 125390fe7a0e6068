//! icecheck: structural and scan validation for Apache Iceberg v2 tables.
//!
//! A run resolves a table through a [`MetadataStore`], checks its metadata,
//! schema field identifiers and snapshot lineage, then scans the current
//! snapshot through a [`DataReader`]. Every check emits [`Finding`]s into a
//! single ordered [`ValidationReport`].
//!
//! # Example
//!
//! ```no_run
//! use icecheck::IceCheck;
//!
//! let engine = IceCheck::local().unwrap();
//! let report = engine.validate("/tmp/iceberg-warehouse", "orders");
//!
//! println!("Passed: {}", report.passed);
//! println!("Findings: {}", report.findings.len());
//! ```

pub mod catalog;
pub mod error;
pub mod reader;
pub mod validation;

mod icecheck;

pub use crate::icecheck::{IceCheck, ValidatorConfig};
pub use catalog::{
    Field, FieldType, FilesystemCatalog, MemoryCatalog, MetadataStore, Schema, Snapshot,
    TableHandle, TableMetadata,
};
pub use error::{IceCheckError, Result};
pub use reader::{BatchIter, DataReader, IcebergReader, MemoryReader};
pub use validation::{Category, Finding, FindingCounts, Severity, Stage, ValidationReport};
