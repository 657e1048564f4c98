//! `DataSource` trait and the in-memory array adapter.
//!
//! Grounded on `catalog/src/trait.rs`'s async `Catalog` trait shape,
//! repurposed from schema metadata to row scanning.

pub mod array;
pub mod error;
pub mod scan;

use async_trait::async_trait;

pub use array::ArrayDataSource;
pub use error::{DataSourceError, DataSourceResult};
pub use scan::{ScanOptions, ScanResult};

/// A table a query can read from. Implementations may be backed by an
/// in-memory array, a file, or an external store — the engine core never
/// assumes anything beyond this contract.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn scan(&self, options: ScanOptions<'_>) -> DataSourceResult<ScanResult>;

    /// A fast row-count hint, used by the `COUNT(*)` plan fast path.
    /// Returning `None` forces the engine to fall back to a full scan.
    fn num_rows(&self) -> Option<u64> {
        None
    }
}

/// Validates the scan contract described on [`ScanResult`]: a source may
/// not claim to have applied `limit`/`offset` while a supplied `where`
/// predicate went unapplied, since the executor would have no way to know
/// how many matching rows were dropped before filtering.
pub fn validate_scan_contract(
    options: &ScanOptions<'_>,
    result: &ScanResult,
) -> DataSourceResult<()> {
    if options.where_predicate.is_some() && result.applied_limit_offset && !result.applied_where {
        tracing::warn!("data source applied limit/offset without applying the where predicate");
        return Err(DataSourceError::ContractViolation(
            "limit/offset applied without applying the supplied where predicate".to_string(),
        ));
    }
    Ok(())
}
