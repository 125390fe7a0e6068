//! In-memory data reader for tests.

use arrow_array::RecordBatch;

use crate::catalog::TableHandle;
use crate::error::{IceCheckError, Result};

use super::{BatchIter, DataReader};

/// Replays a fixed list of batches, optionally failing part way through.
#[derive(Debug, Clone, Default)]
pub struct MemoryReader {
    items: Vec<std::result::Result<RecordBatch, String>>,
    start_failure: Option<String>,
}

impl MemoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reader that yields `batches` in order.
    pub fn with_batches(batches: Vec<RecordBatch>) -> Self {
        Self {
            items: batches.into_iter().map(Ok).collect(),
            start_failure: None,
        }
    }

    /// Queue a decode failure after the batches added so far.
    pub fn then_fail(mut self, message: impl Into<String>) -> Self {
        self.items.push(Err(message.into()));
        self
    }

    /// Fail when the scan is started, before any batch is produced.
    pub fn failing_on_start(message: impl Into<String>) -> Self {
        Self {
            items: Vec::new(),
            start_failure: Some(message.into()),
        }
    }
}

impl DataReader for MemoryReader {
    fn scan<'a>(&'a self, _table: &TableHandle) -> Result<BatchIter<'a>> {
        if let Some(message) = &self.start_failure {
            return Err(IceCheckError::Scan(message.clone()));
        }

        Ok(Box::new(self.items.iter().map(|item| {
            item.clone().map_err(IceCheckError::Scan)
        })))
    }
}
