//! sqlseed Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Ambient plumbing shared by the sqlseed workspace members. Today that is
//! the logging setup used by the `sqlseed` binary and by anything embedding
//! the seeding engine that wants the same log layout.
//!
//! # Example
//!
//! ```no_run
//! use sqlseed_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = LogConfig::from_env()?;
//!     init_logging(&config)?;
//!     tracing::info!("ready to seed");
//!     Ok(())
//! }
//! ```

pub mod logging;
