use anyhow::Result;
use clap::Parser;
use inventory_ingest::config;
use inventory_ingest::observability::init_file_logging;
use inventory_ingest::{ConnectionSettings, Database, Ingestor, Loader, RetryPolicy};
use std::path::PathBuf;
use tracing::{debug, error};

#[derive(Parser)]
#[command(name = "ingest")]
#[command(about = "Load ./data/*.csv into ./inventory.db; flags only override the paths")]
#[command(
    long_about = "Load every CSV file in a directory into SQLite, one table per file.\n\n\
                  Run without flags to load ./data into ./inventory.db, logging to \
                  logs/ingestion_db.log. The flags only override those locations."
)]
struct Args {
    /// Directory scanned for CSV files
    #[arg(long, default_value = config::DATA_DIR)]
    data_dir: PathBuf,

    /// SQLite database receiving the tables
    #[arg(long, default_value = config::DATABASE_PATH)]
    database: PathBuf,

    /// Log file, appended to on every run
    #[arg(long, default_value = config::LOG_FILE)]
    log_file: PathBuf,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let args = Args::parse();
    let _logging = init_file_logging(&args.log_file)?;

    let database = Database::new(&args.database, ConnectionSettings::default());
    let loader = Loader::new(Ingestor::new(database, RetryPolicy::default()));

    match loader.run(&args.data_dir) {
        Ok(report) => {
            for table in &report.tables {
                debug!("{} -> {} ({} rows)", table.file_name, table.table_name, table.rows);
            }
            Ok(())
        }
        Err(err) => {
            error!("Ingestion aborted: {}", err);
            Err(err.into())
        }
    }
}
