//! Compiled-in settings. None of these are read from the environment.

use std::time::Duration;

/// Directory scanned for input files.
pub const DATA_DIR: &str = "data";

/// SQLite database that receives one table per input file.
pub const DATABASE_PATH: &str = "inventory.db";

/// Append-only log sink.
pub const LOG_FILE: &str = "logs/ingestion_db.log";

/// How long SQLite waits on a held lock before reporting `SQLITE_BUSY`.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(60);

/// Health-check an idle connection with `SELECT 1` before reusing it.
pub const POOL_PRE_PING: bool = true;

/// Idle connections older than this are closed instead of reused.
pub const POOL_RECYCLE: Duration = Duration::from_secs(300);

/// Total write attempts per table, including the first.
pub const MAX_WRITE_ATTEMPTS: u32 = 3;

/// Fixed pause between attempts after a lock error.
pub const LOCK_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Substring that marks a directory entry as a CSV input.
pub const CSV_MARKER: &str = ".csv";

/// Number of trailing characters removed from a file name to get its table name.
pub const EXTENSION_LEN: usize = 4;

/// Cell values read as SQL `NULL` rather than text.
pub const NA_VALUES: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];
