//! `sqlseed seed` command implementation
//!
//! Connects to Postgres, optionally creates the tables, and runs the
//! default seeding tree until it finishes, fails or is interrupted.

use anyhow::{Context, Result};
use sqlseed::{BarProgress, PgStore, Seeder};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::CliConfig;
use crate::{schema, seeders, SeedArgs};

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// Seed the database from the configured data directory, drawing bars on
/// `progress` unless `--no-progress` is set
pub async fn run(args: &SeedArgs, progress: BarProgress) -> Result<()> {
    let config = CliConfig::from_args(args)?;
    let seeder_config = config.seeder_config()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    info!(
        max_connections = config.max_connections,
        "Database connection pool established"
    );

    if args.init_schema {
        schema::init_schema(&pool).await?;
    }

    let mut seeder = Seeder::new(Arc::new(PgStore::new(pool.clone()))).with_config(seeder_config);
    if !args.no_progress {
        seeder = seeder.with_progress(Arc::new(progress));
    }

    let cancel = CancellationToken::new();
    let interrupt = tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

    info!(data_dir = %config.data_dir.display(), "Seeding database");
    let started = Instant::now();
    let result = seeder
        .run(seeders::default_tree(&config.data_dir), cancel)
        .await;

    interrupt.abort();
    pool.close().await;

    result.context("Failed to seed database")?;

    let elapsed = Duration::from_millis(started.elapsed().as_millis() as u64);
    info!(elapsed = ?elapsed, "Seeding complete");
    println!("Completed in {:?}", elapsed);

    Ok(())
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            warn!("Interrupted, stopping after in-flight chunks");
            cancel.cancel();
        },
        Err(e) => warn!(error = %e, "Unable to listen for Ctrl-C"),
    }
}
