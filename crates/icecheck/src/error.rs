//! Error types for the icecheck library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for icecheck operations.
#[derive(Debug, Error)]
pub enum IceCheckError {
    /// The warehouse root does not exist or is not a directory.
    #[error("Warehouse path does not exist: {}", .0.display())]
    WarehouseNotFound(PathBuf),

    /// The table could not be located inside the warehouse.
    #[error("Table not found: {table} (warehouse: {})", .warehouse.display())]
    TableNotFound { table: String, warehouse: PathBuf },

    /// Table metadata was readable but not usable.
    #[error("Invalid table metadata in '{}': {message}", .path.display())]
    Metadata { path: PathBuf, message: String },

    /// Error reading or accessing a file.
    #[error("IO error for '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Metadata JSON could not be deserialized.
    #[error("JSON error in '{}': {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Planning or decoding a data scan failed.
    #[error("Scan error: {0}")]
    Scan(String),

    /// The async runtime backing a reader could not be started.
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl IceCheckError {
    /// Whether this error means the warehouse or table is absent.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            IceCheckError::WarehouseNotFound(_) | IceCheckError::TableNotFound { .. }
        )
    }
}

impl From<iceberg::Error> for IceCheckError {
    fn from(err: iceberg::Error) -> Self {
        IceCheckError::Scan(err.to_string())
    }
}

/// Result type alias for icecheck operations.
pub type Result<T> = std::result::Result<T, IceCheckError>;
