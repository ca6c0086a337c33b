//! Database module for the SQLite destination
//!
//! Connection checkout and the table writer used by the ingestor.

pub mod connection;
pub mod table_writer;

pub use connection::{ConnectionSettings, Database, PooledConnection};
pub use table_writer::{quote_ident, sql_type};
