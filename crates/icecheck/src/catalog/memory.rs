//! In-memory metadata store for tests and embedding.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{IceCheckError, Result};

use super::metadata::TableMetadata;
use super::{MetadataStore, TableHandle};

/// Metadata store backed by a map of table name to metadata.
///
/// Any warehouse path is accepted; only the table name is looked up.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    tables: HashMap<String, TableMetadata>,
    failure: Option<String>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table.
    pub fn with_table(mut self, name: impl Into<String>, metadata: TableMetadata) -> Self {
        self.tables.insert(name.into(), metadata);
        self
    }

    /// Make every resolution fail with a metadata error carrying `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            tables: HashMap::new(),
            failure: Some(message.into()),
        }
    }
}

impl MetadataStore for MemoryCatalog {
    fn resolve(&self, warehouse: &Path, table: &str) -> Result<TableHandle> {
        if let Some(message) = &self.failure {
            return Err(IceCheckError::Metadata {
                path: warehouse.to_path_buf(),
                message: message.clone(),
            });
        }

        let metadata = self
            .tables
            .get(table)
            .cloned()
            .ok_or_else(|| IceCheckError::TableNotFound {
                table: table.to_string(),
                warehouse: warehouse.to_path_buf(),
            })?;

        Ok(TableHandle::new(
            table,
            PathBuf::from(format!("memory://{}", table)),
            metadata,
        ))
    }
}
