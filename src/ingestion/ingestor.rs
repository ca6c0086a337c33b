//! Ingestor - writes one record batch to one table, retrying on lock contention

use crate::config;
use crate::error::{IngestError, Result, WriteError};
use polars::prelude::DataFrame;
use std::time::Duration;
use tracing::warn;

/// Destination that can replace a table with the contents of a batch.
pub trait TableSink {
    /// Replace `table_name` with `batch`; returns the number of rows written.
    fn replace_table(
        &self,
        table_name: &str,
        batch: &DataFrame,
    ) -> std::result::Result<usize, WriteError>;
}

impl<T: TableSink + ?Sized> TableSink for &T {
    fn replace_table(
        &self,
        table_name: &str,
        batch: &DataFrame,
    ) -> std::result::Result<usize, WriteError> {
        (**self).replace_table(table_name, batch)
    }
}

/// Fixed-delay retry for lock errors. No backoff, no jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: config::MAX_WRITE_ATTEMPTS,
            delay: config::LOCK_RETRY_DELAY,
        }
    }
}

pub struct Ingestor<S> {
    sink: S,
    policy: RetryPolicy,
}

impl<S: TableSink> Ingestor<S> {
    pub fn new(sink: S, policy: RetryPolicy) -> Self {
        Self { sink, policy }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Write `batch` to `table_name`, replacing any existing table.
    ///
    /// A lock error is retried after a blocking sleep while attempts remain.
    /// Any other error is returned at once. A lock error on the final attempt
    /// comes back as `RetryExhausted` carrying that error.
    pub fn ingest(&self, batch: &DataFrame, table_name: &str) -> Result<usize> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.sink.replace_table(table_name, batch) {
                Ok(rows) => return Ok(rows),
                Err(err) if err.is_locked() && attempt < self.policy.max_attempts => {
                    warn!(
                        "Database locked, retrying in {} seconds... (attempt {})",
                        self.policy.delay.as_secs_f64(),
                        attempt
                    );
                    std::thread::sleep(self.policy.delay);
                }
                Err(err) if err.is_locked() => {
                    return Err(IngestError::RetryExhausted {
                        table: table_name.to_string(),
                        attempts: attempt,
                        source: err,
                    });
                }
                Err(err) => {
                    return Err(IngestError::Write {
                        table: table_name.to_string(),
                        source: err,
                    });
                }
            }
        }
    }
}
