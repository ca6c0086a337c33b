//! Batch loader: every CSV in a directory becomes a SQLite table of the same
//! name, replaced on each run.

pub mod config;
pub mod db;
pub mod error;
pub mod ingestion;
pub mod observability;

pub use db::{ConnectionSettings, Database};
pub use error::{IngestError, Result, WriteError};
pub use ingestion::{Ingestor, LoadReport, Loader, RetryPolicy, TableSink};
