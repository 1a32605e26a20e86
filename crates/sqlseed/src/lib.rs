//! sqlseed
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Seeds a relational store from gzip-compressed, newline-delimited
//! datasets that depend on each other.
//!
//! # Overview
//!
//! - **Sources** ([`source`]): stream raw lines out of `.gz` files in bounded
//!   chunks, and count lines with an independent pass for progress bars.
//! - **Tasks** ([`task`]): one dataset per node, with the datasets that need
//!   its rows as children.
//! - **Engine** ([`engine`]): runs siblings concurrently, children only after
//!   their parent's chunks are all committed, and stops everything on the
//!   first failure.
//! - **Capabilities**: per-line transforms ([`LineHandler`]), statement
//!   execution ([`Store`], with [`PgStore`] for Postgres) and progress
//!   reporting ([`Progress`], with [`BarProgress`] for terminals).
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use sqlseed::{Batch, PgStore, Seeder, SqlValue, TaskSpec};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pool = sqlx::PgPool::connect("postgres://localhost/app").await?;
//!     let seeder = Seeder::new(Arc::new(PgStore::new(pool)));
//!
//!     let users = TaskSpec::new(
//!         "data/users.gz",
//!         Arc::new(|batch: &mut Batch, line: &[u8]| -> anyhow::Result<()> {
//!             let user: serde_json::Value = serde_json::from_slice(line)?;
//!             batch.queue(
//!                 r#"INSERT INTO "User" ("id", "name") VALUES ($1, $2)
//!                    ON CONFLICT ("id") DO UPDATE SET "name" = $2"#,
//!                 [SqlValue::from(user["id"].as_i64()), SqlValue::from(user["name"].as_str())],
//!             );
//!             Ok(())
//!         }),
//!     );
//!
//!     seeder.run(vec![users], CancellationToken::new()).await?;
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod config;
pub mod engine;
pub mod error;
pub mod handler;
pub mod progress;
pub mod source;
pub mod store;
pub mod task;

// Re-export commonly used types
pub use batch::{Batch, QueuedQuery, SqlValue};
pub use config::{SeederConfig, CHUNK_SIZE_ENV, DEFAULT_CHUNK_SIZE};
pub use engine::Seeder;
pub use error::{Result, SeedError};
pub use handler::LineHandler;
pub use progress::{BarProgress, BarWriter, Progress, Tracker};
pub use source::{total_lines, LineSource};
pub use store::{PgStore, Store};
pub use task::TaskSpec;
