//! Ingestion Module
//!
//! - `loader`: finds CSV files, parses them and times the batch
//! - `ingestor`: writes one batch to one table with retry-on-lock

pub mod ingestor;
pub mod loader;

pub use ingestor::{Ingestor, RetryPolicy, TableSink};
pub use loader::{is_csv_candidate, read_csv, table_name_for, LoadReport, Loader, TableLoad};
