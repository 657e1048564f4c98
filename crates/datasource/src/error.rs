use thiserror::Error;

/// Errors a [`crate::DataSource`] implementation can raise. Grounded on
/// `catalog/src/error.rs`'s `CatalogError` shape, trimmed to the cases a
/// row-producing source (rather than a schema catalog) can hit.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataSourceError {
    #[error("table '{0}' not found")]
    TableNotFound(String),

    #[error("scan failed: {0}")]
    ScanFailed(String),

    #[error("data source violated its scan contract: {0}")]
    ContractViolation(String),
}

pub type DataSourceResult<T> = Result<T, DataSourceError>;
