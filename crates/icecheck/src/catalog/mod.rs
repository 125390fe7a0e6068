//! Table resolution: locating a table and loading its metadata.

mod filesystem;
mod memory;
mod metadata;

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use filesystem::FilesystemCatalog;
pub use memory::MemoryCatalog;
pub use metadata::{Field, FieldType, Schema, Snapshot, TableMetadata};

/// Resolves a table name inside a warehouse to a [`TableHandle`].
///
/// Implementations must not mutate the table.
pub trait MetadataStore {
    /// Locate `table` under `warehouse` and load its current metadata.
    fn resolve(&self, warehouse: &Path, table: &str) -> Result<TableHandle>;
}

/// Read-only view of a resolved table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableHandle {
    /// Table name as requested by the caller.
    pub name: String,
    /// Metadata file the handle was loaded from.
    pub metadata_location: PathBuf,
    /// SHA-256 of the metadata file (empty for in-memory tables).
    pub metadata_sha256: String,
    /// Parsed table metadata.
    pub metadata: TableMetadata,
}

impl TableHandle {
    pub fn new(name: impl Into<String>, metadata_location: PathBuf, metadata: TableMetadata) -> Self {
        Self {
            name: name.into(),
            metadata_location,
            metadata_sha256: String::new(),
            metadata,
        }
    }

    pub fn location(&self) -> &str {
        &self.metadata.location
    }

    pub fn format_version(&self) -> i32 {
        self.metadata.format_version
    }

    pub fn table_uuid(&self) -> &str {
        &self.metadata.table_uuid
    }

    pub fn properties(&self) -> &IndexMap<String, String> {
        &self.metadata.properties
    }

    pub fn last_sequence_number(&self) -> i64 {
        self.metadata.last_sequence_number
    }

    pub fn last_updated_ms(&self) -> i64 {
        self.metadata.last_updated_ms
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.metadata.snapshots
    }

    pub fn current_snapshot(&self) -> Option<&Snapshot> {
        self.metadata.current_snapshot()
    }

    /// Current schema. Stores only hand out handles whose schema resolves.
    pub fn schema(&self) -> Option<&Schema> {
        self.metadata.current_schema()
    }
}
