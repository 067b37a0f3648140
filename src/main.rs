mod cli;

use std::{io, process};

use tracing_subscriber::EnvFilter;

use msbdb::{MsbDb, config::Config, storage::Storage};

/// Environment variable that overrides the configured tracing filter.
const LOG_VAR: &str = "MSBDB_LOG";

fn main() {
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}");
        process::exit(1);
    });

    let filter = EnvFilter::try_from_env(LOG_VAR)
        .or_else(|_| EnvFilter::try_new(config.log_filter()))
        .unwrap_or_else(|e| {
            eprintln!("Invalid log filter: {e}");
            process::exit(1);
        });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let root = config.storage_root().unwrap_or_else(|| {
        eprintln!("Could not determine home directory.");
        process::exit(1);
    });

    let storage = match Storage::new(root) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to initialize storage: {e}");
            process::exit(1);
        }
    };

    let db = MsbDb::new(storage.clone(), storage)
        .with_default_max_results(config.default_max_results);

    if let Err(e) = cli::run(&config, &db) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
