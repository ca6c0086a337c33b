//! Loader - scans a directory for CSV files and drives the ingestor over them

use crate::config;
use crate::error::{IngestError, Result};
use crate::ingestion::ingestor::{Ingestor, TableSink};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// True for any file name containing the CSV marker anywhere, not just as a suffix.
pub fn is_csv_candidate(file_name: &str) -> bool {
    file_name.contains(config::CSV_MARKER)
}

/// Table name for a file: the name minus its last four characters.
///
/// `data.csv.bak` becomes `data.csv`; the strip does not look at the actual extension.
pub fn table_name_for(file_name: &str) -> String {
    let keep = file_name.chars().count().saturating_sub(config::EXTENSION_LEN);
    file_name.chars().take(keep).collect()
}

/// Parse a CSV file with a header row into a DataFrame.
///
/// Column types are inferred from every row, so a late float or NA marker
/// widens the column instead of failing the parse.
pub fn read_csv(path: &Path) -> Result<DataFrame> {
    let parse_err = |source| IngestError::Parse {
        path: path.to_path_buf(),
        source,
    };

    LazyCsvReader::new(path)
        .with_has_header(true)
        .with_infer_schema_length(None)
        .with_null_values(Some(NullValues::AllColumns(
            config::NA_VALUES.iter().map(|v| v.to_string()).collect(),
        )))
        .finish()
        .map_err(parse_err)?
        .collect()
        .map_err(parse_err)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLoad {
    pub file_name: String,
    pub table_name: String,
    pub rows: usize,
}

/// What a completed run wrote. Only produced when every file succeeded.
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub tables: Vec<TableLoad>,
    pub elapsed: Duration,
}

impl LoadReport {
    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|t| t.rows).sum()
    }
}

pub struct Loader<S> {
    ingestor: Ingestor<S>,
}

impl<S: TableSink> Loader<S> {
    pub fn new(ingestor: Ingestor<S>) -> Self {
        Self { ingestor }
    }

    pub fn ingestor(&self) -> &Ingestor<S> {
        &self.ingestor
    }

    /// Candidate files in `input_dir`, sorted by name.
    pub fn discover(&self, input_dir: &Path) -> Result<Vec<(String, PathBuf)>> {
        let read_err = |source| IngestError::Read {
            path: input_dir.to_path_buf(),
            source,
        };

        let mut files = Vec::new();
        for entry in std::fs::read_dir(input_dir).map_err(read_err)? {
            let entry = entry.map_err(read_err)?;
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if is_csv_candidate(&file_name) {
                files.push((file_name, entry.path()));
            } else {
                debug!("Skipping {}", file_name);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Load every CSV in `input_dir` into its table, one file at a time.
    /// The first failure aborts the run.
    pub fn run(&self, input_dir: &Path) -> Result<LoadReport> {
        let start = Instant::now();
        let mut tables = Vec::new();

        for (file_name, path) in self.discover(input_dir)? {
            let batch = read_csv(&path)?;
            let table_name = table_name_for(&file_name);
            info!("Ingesting {} in db", file_name);
            let rows = self.ingestor.ingest(&batch, &table_name)?;
            tables.push(TableLoad {
                file_name,
                table_name,
                rows,
            });
        }

        let elapsed = start.elapsed();
        info!("-----------------Ingestion Complete-----------------");
        info!("Total Time Taken: {} minutes", elapsed.as_secs_f64() / 60.0);

        Ok(LoadReport { tables, elapsed })
    }
}
