//! Target store capability
//!
//! The engine only needs to run queued statements. [`PgStore`] does that
//! against a shared `sqlx` Postgres pool; tests plug in recording stores.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::{PgPool, Postgres};
use tokio_util::sync::CancellationToken;

use crate::batch::{Batch, QueuedQuery, SqlValue};

/// Executes write statements on behalf of every running node.
///
/// One store is shared by all concurrently running nodes; it is the only
/// arbiter of concurrent write safety.
#[async_trait]
pub trait Store: Send + Sync {
    /// Run one statement.
    ///
    /// `cancel` is the run's cancellation token. Statements already handed
    /// to the database are never interrupted.
    async fn execute(&self, cancel: &CancellationToken, query: &QueuedQuery) -> Result<()>;

    /// Run every statement of a chunk in the order it was queued, stopping
    /// at the first failure. Statements that already ran stay committed.
    async fn execute_batch(&self, cancel: &CancellationToken, batch: &Batch) -> Result<()> {
        for (idx, query) in batch.iter().enumerate() {
            self.execute(cancel, query)
                .await
                .with_context(|| format!("statement {} of {}", idx + 1, batch.len()))?;
        }
        Ok(())
    }
}

/// [`Store`] backed by a Postgres connection pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn execute(&self, _cancel: &CancellationToken, query: &QueuedQuery) -> Result<()> {
        let statement = query
            .arguments()
            .iter()
            .fold(sqlx::query(query.query()), bind_value);

        statement
            .execute(&self.pool)
            .await
            .context("Failed to execute queued statement")?;

        Ok(())
    }
}

fn bind_value<'q>(
    statement: Query<'q, Postgres, PgArguments>,
    value: &SqlValue,
) -> Query<'q, Postgres, PgArguments> {
    match value.clone() {
        SqlValue::Bool(v) => statement.bind(v),
        SqlValue::Int(v) => statement.bind(v),
        SqlValue::BigInt(v) => statement.bind(v),
        SqlValue::Double(v) => statement.bind(v),
        SqlValue::Text(v) => statement.bind(v),
        SqlValue::Bytes(v) => statement.bind(v),
        SqlValue::Uuid(v) => statement.bind(v),
        SqlValue::Json(v) => statement.bind(v),
    }
}
