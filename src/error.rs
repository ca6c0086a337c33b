use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single table write, classified at the database boundary.
#[derive(Error, Debug)]
pub enum WriteError {
    /// SQLite reported `SQLITE_BUSY` ("database is locked"): another connection holds the lock.
    #[error("Database locked: {0}")]
    Locked(#[source] rusqlite::Error),

    #[error("Database write failed: {0}")]
    Failed(#[source] rusqlite::Error),
}

impl WriteError {
    pub fn is_locked(&self) -> bool {
        matches!(self, WriteError::Locked(_))
    }
}

impl From<rusqlite::Error> for WriteError {
    fn from(err: rusqlite::Error) -> Self {
        use rusqlite::ErrorCode;

        match err.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy) => WriteError::Locked(err),
            _ => WriteError::Failed(err),
        }
    }
}

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: polars::error::PolarsError,
    },

    #[error("Failed to write table '{table}': {source}")]
    Write {
        table: String,
        #[source]
        source: WriteError,
    },

    #[error("Table '{table}' still locked after {attempts} attempts: {source}")]
    RetryExhausted {
        table: String,
        attempts: u32,
        #[source]
        source: WriteError,
    },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::ffi;

    fn sqlite_failure(code: std::os::raw::c_int, msg: &str) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(ffi::Error::new(code), Some(msg.to_string()))
    }

    #[test]
    fn test_only_busy_code_is_transient() {
        let busy = sqlite_failure(ffi::SQLITE_BUSY, "database is locked");
        assert!(WriteError::from(busy).is_locked());

        // SQLITE_LOCKED is a same-connection table lock, not writer contention
        let table_locked = sqlite_failure(ffi::SQLITE_LOCKED, "database table is locked");
        assert!(matches!(WriteError::from(table_locked), WriteError::Failed(_)));
    }

    #[test]
    fn test_classification_ignores_message_text() {
        let err = WriteError::from(sqlite_failure(ffi::SQLITE_IOERR, "database is locked"));
        assert!(!err.is_locked());

        let err = WriteError::from(rusqlite::Error::QueryReturnedNoRows);
        assert!(matches!(err, WriteError::Failed(_)));
    }
}
