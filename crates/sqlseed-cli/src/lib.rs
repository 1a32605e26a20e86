//! sqlseed CLI Library
//!
//! Command-line front end for the `sqlseed` engine.
//!
//! # Overview
//!
//! - **Seeding**: load the bundled datasets into Postgres (`sqlseed seed`)
//! - **Counting**: pre-scan gzip files the way progress bars do (`sqlseed count`)
//! - **Seeders** ([`seeders`]): line handlers for users, US states, US
//!   counties and ESRI landform polygons, plus the default seeding tree
//! - **Schema** ([`schema`]): tables the seeders write to

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod commands;
pub mod config;
pub mod schema;
pub mod seeders;

pub use config::CliConfig;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// sqlseed - seed a database from gzip-compressed JSON lines
#[derive(Parser, Debug)]
#[command(name = "sqlseed")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Seed the database from the data directory
    Seed(SeedArgs),

    /// Print the number of lines in each gzip file
    Count {
        /// Gzip-compressed, newline-delimited files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

/// Options for `sqlseed seed`
#[derive(Args, Debug, Clone, Default)]
pub struct SeedArgs {
    /// Directory holding users.gz, us-states.gz, us-counties.gz and
    /// esri-landform-polygons.gz
    #[arg(short, long, env = "SEED_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Postgres connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Maximum pooled database connections
    #[arg(long, env = "SEED_MAX_CONNECTIONS")]
    pub max_connections: Option<u32>,

    /// Lines per chunk for seeders that do not set their own
    /// [default: SEED_DEFAULT_CHUNK_SIZE, else 100]
    #[arg(short, long)]
    pub chunk_size: Option<usize>,

    /// Disable progress bars
    #[arg(long)]
    pub no_progress: bool,

    /// Create the seeded tables if they do not exist
    #[arg(long)]
    pub init_schema: bool,
}
