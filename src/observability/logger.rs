//! Ingestion Logger
//!
//! File-backed `tracing` subscriber. Every event becomes one line:
//! `2026-01-01 12:00:00,123 - INFO - message`. The file is opened in append
//! mode and flushed when the returned guard is dropped.

use crate::error::Result;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::{ChronoLocal, FormatTime};
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "debug";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// `timestamp - LEVEL - message`
struct LineFormat {
    timer: ChronoLocal,
}

impl LineFormat {
    fn new() -> Self {
        Self {
            timer: ChronoLocal::new(TIMESTAMP_FORMAT.to_string()),
        }
    }
}

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        self.timer.format_time(&mut writer)?;
        write!(writer, " - {} - ", event.metadata().level())?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Keeps the log sink installed for the current thread. Dropping it
/// uninstalls the subscriber and flushes the file.
pub struct LogGuard {
    path: PathBuf,
    file: Arc<File>,
    _subscriber: tracing::subscriber::DefaultGuard,
}

impl LogGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LogGuard {
    fn drop(&mut self) {
        let _ = self.file.sync_all();
    }
}

/// Open `path` for appending (creating parent directories) and route
/// `tracing` events on this thread into it. The level filter comes from
/// `RUST_LOG`, defaulting to `debug`.
pub fn init_file_logging(path: impl AsRef<Path>) -> Result<LogGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    init_file_logging_with_filter(path, filter)
}

pub fn init_file_logging_with_filter(
    path: impl AsRef<Path>,
    filter: EnvFilter,
) -> Result<LogGuard> {
    let path = path.as_ref().to_path_buf();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = Arc::new(OpenOptions::new().create(true).append(true).open(&path)?);

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Arc::clone(&file))
        .event_format(LineFormat::new())
        .finish();

    Ok(LogGuard {
        path,
        file,
        _subscriber: tracing::subscriber::set_default(subscriber),
    })
}
