//! Errors surfaced by the ETL library.

use datafusion::error::DataFusionError;
use thiserror::Error;

/// Errors that can occur while loading, transforming or writing tables.
#[derive(Debug, Error)]
pub enum EtlError {
    #[error("Query engine error: {0}")]
    Engine(#[from] DataFusionError),

    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid storage location: {0}")]
    InvalidLocation(String),

    #[error("Unsupported storage scheme: {0}")]
    UnsupportedScheme(String),
}

pub type Result<T> = std::result::Result<T, EtlError>;
