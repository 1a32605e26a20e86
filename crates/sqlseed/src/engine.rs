//! Hierarchical concurrent seeding engine
//!
//! [`Seeder::run`] takes a forest of [`TaskSpec`]s and drives it to
//! completion:
//!
//! 1. Every node of a level is spawned as its own tokio task.
//! 2. A node pulls chunks from its [`LineSource`], turns each line into
//!    statements with its handler and executes the chunk's [`Batch`].
//! 3. Once the node's own chunks are done, its children are spawned the
//!    same way and the node waits for all of them.
//!
//! All nodes share one cancellation token. The first node to fail records
//! its error and cancels the token; other nodes stop at their next chunk
//! boundary and never start their children. `run` returns after every
//! spawned task of the whole tree has finished.

use futures::future::{BoxFuture, FutureExt};
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::task::{Id as TaskId, JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, Instrument};

use crate::batch::Batch;
use crate::config::SeederConfig;
use crate::error::{Result, SeedError};
use crate::handler::LineHandler;
use crate::progress::Progress;
use crate::source::{total_lines, LineSource};
use crate::store::Store;
use crate::task::{label_for, TaskSpec};

/// Seeds task trees into a [`Store`]
#[derive(Clone)]
pub struct Seeder {
    store: Arc<dyn Store>,
    progress: Option<Arc<dyn Progress>>,
    config: SeederConfig,
}

impl Seeder {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            progress: None,
            config: SeederConfig::default(),
        }
    }

    /// Report per-node progress. Each node then makes an extra pass over
    /// its input to count lines before seeding.
    pub fn with_progress(mut self, progress: Arc<dyn Progress>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_config(mut self, config: SeederConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &SeederConfig {
        &self.config
    }

    /// Seed `tasks` and all of their descendants.
    ///
    /// Cancelling `cancel` stops the run at the next chunk boundary of every
    /// node. The run gets its own child token, so a failing node never
    /// cancels the caller's token. Returns the first error any node hit, or
    /// [`SeedError::Cancelled`] when the caller cancelled and nothing failed.
    pub async fn run(&self, tasks: Vec<TaskSpec>, cancel: CancellationToken) -> Result<()> {
        let ctx = RunContext {
            seeder: self.clone(),
            cancel: cancel.child_token(),
            first_error: Arc::new(Mutex::new(None)),
        };

        run_level(ctx.clone(), tasks).await;
        ctx.finish()
    }
}

/// State shared by every node of one run
#[derive(Clone)]
struct RunContext {
    seeder: Seeder,
    cancel: CancellationToken,
    first_error: Arc<Mutex<Option<SeedError>>>,
}

impl RunContext {
    /// Record `err` if it is the first one, then cancel the run.
    fn fail(&self, err: SeedError) {
        {
            let mut slot = self.first_error.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.is_none() {
                if !err.is_cancelled() {
                    error!(error = %err, "Seeding failed, cancelling remaining work");
                }
                *slot = Some(err);
            } else {
                debug!(error = %err, "Dropping error reported after the first failure");
            }
        }
        self.cancel.cancel();
    }

    fn finish(self) -> Result<()> {
        let first = self
            .first_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match first {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Spawn one task per node and wait for all of them
fn run_level(ctx: RunContext, tasks: Vec<TaskSpec>) -> BoxFuture<'static, ()> {
    async move {
        let mut nodes = JoinSet::new();
        let mut sources = HashMap::with_capacity(tasks.len());

        for task in tasks {
            let ctx = ctx.clone();
            let path = task.source().to_path_buf();
            let panic_path = path.clone();

            let handle = nodes.spawn(async move {
                let tree = AssertUnwindSafe(seed_tree(ctx.clone(), task)).catch_unwind();
                if let Err(panic) = tree.await {
                    ctx.fail(SeedError::TaskFailed {
                        path: panic_path,
                        message: panic_message(panic.as_ref()),
                    });
                }
            });
            sources.insert(handle.id(), path);
        }

        while let Some(joined) = nodes.join_next().await {
            if let Err(e) = joined {
                // Only reachable if the runtime drops the task underneath us
                ctx.fail(join_failure(&mut sources, e));
            }
        }
    }
    .boxed()
}

/// Seed one node, then its subtree
async fn seed_tree(ctx: RunContext, task: TaskSpec) {
    let (source, chunk_size, handler, children) = task.into_parts();

    if ctx.cancel.is_cancelled() {
        ctx.fail(SeedError::Cancelled);
        return;
    }

    let label = label_for(&source);
    let span = info_span!("seed_node", source = %label);

    let seeded = seed_node(&ctx, &source, &label, chunk_size, handler.as_ref())
        .instrument(span)
        .await;

    if let Err(err) = seeded {
        ctx.fail(err);
        return;
    }

    if children.is_empty() {
        return;
    }

    if ctx.cancel.is_cancelled() {
        debug!(source = %label, children = children.len(), "Run cancelled, not starting children");
        ctx.fail(SeedError::Cancelled);
        return;
    }

    debug!(source = %label, children = children.len(), "Starting children");
    run_level(ctx, children).await;
}

/// The chunk loop of a single node. Does not touch the node's children.
async fn seed_node(
    ctx: &RunContext,
    path: &Path,
    label: &str,
    chunk_size: usize,
    handler: &dyn LineHandler,
) -> Result<()> {
    let started = Instant::now();

    let open_path = path.to_path_buf();
    let mut source = blocking(path, move || LineSource::open(open_path)).await??;

    let tracker = match &ctx.seeder.progress {
        Some(progress) => {
            let count_path = path.to_path_buf();
            let total = blocking(path, move || total_lines(count_path)).await??;
            debug!(total_lines = total, "Pre-scan finished");
            Some(progress.add_tracker(total, label))
        },
        None => None,
    };

    let chunk_size = ctx.seeder.config.effective_chunk_size(chunk_size);
    let mut lines_seen = 0u64;
    let mut chunks = 0u64;

    loop {
        if ctx.cancel.is_cancelled() {
            debug!(chunks, "Run cancelled, stopping before the next chunk");
            return Err(SeedError::Cancelled);
        }

        let chunk_started = Instant::now();

        let (returned, pulled) = blocking(path, move || {
            let pulled = source.read_lines(chunk_size);
            (source, pulled)
        })
        .await?;
        source = returned;

        let lines = pulled?;
        if lines.is_empty() {
            break;
        }

        let mut batch = Batch::new();
        for line in &lines {
            lines_seen += 1;
            handler
                .handle_line(&mut batch, line)
                .map_err(|source| SeedError::HandlerFailed {
                    path: path.to_path_buf(),
                    line: lines_seen,
                    source,
                })?;
        }

        ctx.seeder
            .store
            .execute_batch(&ctx.cancel, &batch)
            .await
            .map_err(|source| SeedError::ExecutionFailed {
                path: path.to_path_buf(),
                source,
            })?;

        chunks += 1;
        debug!(chunk = chunks, lines = lines.len(), statements = batch.len(), "Chunk executed");

        if let Some(tracker) = &tracker {
            tracker.increment(lines.len() as u64, chunk_started.elapsed());
        }
    }

    source.close();

    match tracker {
        Some(tracker) => tracker.mark_complete(),
        None => {
            let elapsed = Duration::from_millis(started.elapsed().as_millis() as u64);
            info!(lines = lines_seen, chunks, "Finished seeding {} in {:?}", label, elapsed);
        },
    }

    Ok(())
}

/// Run blocking source I/O off the async workers
async fn blocking<T, F>(path: &Path, f: F) -> Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| SeedError::task(path, e))
}

/// Name the node whose task could not be joined
fn join_failure(sources: &mut HashMap<TaskId, PathBuf>, err: JoinError) -> SeedError {
    SeedError::TaskFailed {
        path: sources.remove(&err.id()).unwrap_or_default(),
        message: err.to_string(),
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        format!("panicked: {}", msg)
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        format!("panicked: {}", msg)
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_join_failure_names_the_node() {
        let mut nodes: JoinSet<()> = JoinSet::new();
        let mut sources = HashMap::new();

        let handle = nodes.spawn(async { panic!("decoder blew up") });
        sources.insert(handle.id(), PathBuf::from("data/us-states.gz"));

        let err = nodes.join_next().await.unwrap().unwrap_err();
        let failure = join_failure(&mut sources, err);

        assert!(matches!(failure, SeedError::TaskFailed { .. }), "got {:?}", failure);
        assert_eq!(failure.path(), Some(Path::new("data/us-states.gz")));
        assert!(sources.is_empty());
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "panicked: boom");

        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "panicked: bang");

        let payload: Box<dyn std::any::Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(payload.as_ref()), "panicked");
    }
}
