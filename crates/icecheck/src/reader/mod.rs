//! Data readers: turn a resolved table into a lazy sequence of row batches.

mod iceberg_scan;
mod memory;

use arrow_array::RecordBatch;

use crate::catalog::TableHandle;
use crate::error::Result;

pub use iceberg_scan::IcebergReader;
pub use memory::MemoryReader;

/// Lazy, finite, single-pass sequence of decoded batches.
///
/// A failed item ends the scan; a new scan must be started from a fresh
/// [`TableHandle`].
pub type BatchIter<'a> = Box<dyn Iterator<Item = Result<RecordBatch>> + 'a>;

/// Produces the rows of a table's current snapshot.
pub trait DataReader {
    /// Start a scan of the current snapshot of `table`.
    fn scan<'a>(&'a self, table: &TableHandle) -> Result<BatchIter<'a>>;
}
