//! sqlseed CLI - Main entry point

use clap::Parser;
use sqlseed_cli::{commands, Cli, Commands};
use sqlseed::BarProgress;
use sqlseed_common::logging::{init_logging_with_console, LogConfig, LogLevel, LogOutput};
use std::process;
use tracing::error;

#[tokio::main]
async fn main() {
    // DATABASE_URL and SEED_* may live in .env
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Initialize logging based on verbose flag and environment
    let log_config = LogConfig::builder()
        .level(if cli.verbose {
            LogLevel::Debug
        } else {
            LogLevel::Info
        })
        .output(LogOutput::Console)
        .log_file_prefix("sqlseed")
        .build();

    // Environment variables take precedence
    let log_config = match log_config.clone().apply_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: ignoring logging environment: {:#}", e);
            log_config
        },
    };

    // Console lines clear the bars before printing
    let progress = BarProgress::new();
    let console = progress.writer();

    // The CLI should work without logging
    let log_guard = match init_logging_with_console(&log_config, move || console.clone()) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: logging disabled: {:#}", e);
            None
        },
    };

    let result = match &cli.command {
        Commands::Seed(args) => commands::seed::run(args, progress).await,
        Commands::Count { files } => commands::count::run(files),
    };

    if let Err(e) = result {
        error!("Command failed: {:#}", e);
        eprintln!("Error: {:#}", e);
        drop(log_guard);
        process::exit(1);
    }
}
