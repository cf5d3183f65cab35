//! Myndigheter - browse the history of Swedish government agencies from
//! the command line.
//!
//! Data comes from the published agency dataset and is cached locally for
//! a day, so repeated commands work offline.

mod commands;

use std::io;

use anyhow::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use myndigheter_core::{default_fetcher, AgencyData, Config};

use commands::{render, render_cache_info, Command, USAGE};

/// Directory for optional log files
const LOG_DIR_ENV: &str = "MYNDIGHETER_LOG_DIR";

/// Initialize the tracing subscriber for logging.
///
/// The returned guard flushes the log file on drop and must be held for
/// the life of the program.
fn init_tracing() -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var(LOG_DIR_ENV) {
        Ok(dir) if !dir.trim().is_empty() => {
            let appender = tracing_appender::rolling::daily(dir.trim(), "myndigheter.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _log_guard = init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {}\n\n{}", e, USAGE);
            std::process::exit(2);
        }
    };

    if command == Command::Help {
        println!("{}", USAGE);
        return Ok(());
    }

    let config = Config::load()?;
    let fetcher = default_fetcher(&config)?;
    info!(base_url = %config.base_url(), ?command, "Myndigheter starting");

    match command {
        Command::CacheInfo => {
            println!("{}", render_cache_info(&fetcher.cache_info()));
        }
        Command::ClearCache => {
            fetcher.cache().clear();
            println!("Cache cleared");
        }
        Command::Refresh => {
            let data = AgencyData::new(fetcher);
            let records = data.refresh(true).await?;
            println!(
                "Fetched {} agencies ({})",
                records.len(),
                data.cache_info().age_display()
            );
        }
        command => {
            // Mounting starts the cache-preferring load; refresh joins it
            let data = AgencyData::mount(fetcher);
            let records = data.refresh(false).await?;
            let output = render(&command, &records, &data.cache_info())?;
            println!("{}", output);
        }
    }

    info!("Myndigheter shutting down");
    Ok(())
}
