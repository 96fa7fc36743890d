//! Data Lake ETL Library
//!
//! Builds a star schema of Parquet tables from raw song and event-log JSON.
//! The binary wires these modules together; they are exposed here for
//! testing.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod session;
pub mod storage;

pub use error::{EtlError, Result};
pub use pipeline::{run_pipeline, RunSummary};
pub use session::create_session;
pub use storage::StorageLocation;
