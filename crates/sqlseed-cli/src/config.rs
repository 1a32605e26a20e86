//! Configuration management for the sqlseed CLI
//!
//! Flags and their environment variables are read by clap (after `.env` is
//! loaded); this module fills in defaults and validates the result. The
//! chunk size falls back to the engine's own `SEED_DEFAULT_CHUNK_SIZE`.

use anyhow::{Context, Result};
use sqlseed::SeederConfig;
use std::path::PathBuf;

use crate::SeedArgs;

// ============================================================================
// CLI Configuration Constants
// ============================================================================

/// Data directory when neither `--data-dir` nor `SEED_DATA_DIR` is given
pub const DEFAULT_DATA_DIR: &str = "./data";

/// Pool size when neither `--max-connections` nor `SEED_MAX_CONNECTIONS` is given
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Resolved settings for a seeding run
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Postgres connection string
    pub database_url: String,

    /// Maximum pooled connections shared by every seeding node
    pub max_connections: u32,

    /// Directory holding the gzip datasets
    pub data_dir: PathBuf,

    /// `--chunk-size`, if given
    pub chunk_size: Option<usize>,
}

impl CliConfig {
    /// Build the run configuration from parsed `seed` arguments
    pub fn from_args(args: &SeedArgs) -> Result<Self> {
        let database_url = args
            .database_url
            .clone()
            .filter(|url| !url.trim().is_empty())
            .context("DATABASE_URL not set. Pass --database-url or set it in the environment")?;

        let max_connections = args.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS);
        if max_connections == 0 {
            anyhow::bail!("Max connections must be at least 1");
        }

        let data_dir = args
            .data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        if !data_dir.is_dir() {
            anyhow::bail!("Data directory '{}' does not exist", data_dir.display());
        }

        Ok(Self {
            database_url,
            max_connections,
            data_dir,
            chunk_size: args.chunk_size,
        })
    }

    /// Engine settings for this run: `--chunk-size` wins over
    /// `SEED_DEFAULT_CHUNK_SIZE`
    pub fn seeder_config(&self) -> Result<SeederConfig> {
        let config = SeederConfig::from_env()?;
        match self.chunk_size {
            Some(size) => config
                .with_default_chunk_size(size)
                .context("Invalid --chunk-size"),
            None => Ok(config),
        }
    }
}
