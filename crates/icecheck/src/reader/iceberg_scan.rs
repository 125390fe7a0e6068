//! Scans backed by iceberg-rust (manifest planning + Parquet decoding).

use arrow_array::RecordBatch;
use futures_util::StreamExt;
use iceberg::io::FileIOBuilder;
use iceberg::scan::ArrowRecordBatchStream;
use iceberg::table::StaticTable;
use iceberg::{NamespaceIdent, TableIdent};
use tokio::runtime::{Builder, Runtime};

use crate::catalog::TableHandle;
use crate::error::{IceCheckError, Result};

use super::{BatchIter, DataReader};

/// Reads local tables through iceberg-rust's scan planner.
///
/// The reader owns a current-thread runtime and blocks on the async record
/// batch stream one batch at a time, so only a single batch is decoded and
/// held at once.
pub struct IcebergReader {
    runtime: Runtime,
}

impl IcebergReader {
    pub fn new() -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| IceCheckError::Runtime(format!("Failed to create Tokio runtime: {}", e)))?;
        Ok(Self { runtime })
    }

    /// Dotted table name to an identifier; bare names land in `default`.
    fn table_ident(name: &str) -> Result<TableIdent> {
        let mut parts: Vec<String> = name.split('.').map(str::to_string).collect();
        let table = parts.pop().unwrap_or_default();
        if parts.is_empty() {
            parts.push("default".to_string());
        }
        let namespace = NamespaceIdent::from_vec(parts)?;
        Ok(TableIdent::new(namespace, table))
    }
}

impl DataReader for IcebergReader {
    fn scan<'a>(&'a self, table: &TableHandle) -> Result<BatchIter<'a>> {
        let snapshot_id = table
            .current_snapshot()
            .map(|s| s.snapshot_id)
            .ok_or_else(|| IceCheckError::Scan("table has no current snapshot".to_string()))?;

        let metadata_location = std::fs::canonicalize(&table.metadata_location)
            .map_err(|e| IceCheckError::Io {
                path: table.metadata_location.clone(),
                source: e,
            })?
            .to_string_lossy()
            .into_owned();
        let ident = Self::table_ident(&table.name)?;

        log::debug!(
            "Planning scan of snapshot {} from {}",
            snapshot_id,
            metadata_location
        );

        let stream = self.runtime.block_on(async move {
            let file_io = FileIOBuilder::new_fs_io().build()?;
            let table = StaticTable::from_metadata_file(&metadata_location, ident, file_io)
                .await?
                .into_table();
            let scan = table.scan().snapshot_id(snapshot_id).build()?;
            scan.to_arrow().await
        })?;

        Ok(Box::new(RecordBatchIter {
            runtime: &self.runtime,
            stream,
        }))
    }
}

struct RecordBatchIter<'a> {
    runtime: &'a Runtime,
    stream: ArrowRecordBatchStream,
}

impl Iterator for RecordBatchIter<'_> {
    type Item = Result<RecordBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        self.runtime
            .block_on(self.stream.next())
            .map(|batch| batch.map_err(IceCheckError::from))
    }
}
