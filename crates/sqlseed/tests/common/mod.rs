//! Shared fixtures and test doubles for sqlseed integration tests

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use async_trait::async_trait;
use flate2::write::GzEncoder;
use flate2::Compression;
use sqlseed::{Batch, LineHandler, Progress, QueuedQuery, SqlValue, Store, Tracker};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Fixtures
// ============================================================================

pub fn gzip(content: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(content).unwrap();
    encoder.finish().unwrap()
}

/// Write `content` gzip-compressed to `dir/name`
pub fn write_gz(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, gzip(content)).unwrap();
    path
}

/// `n` JSON lines of the form `{"n":1}` .. `{"n":n}`, each newline-terminated
pub fn numbered_lines(n: usize) -> Vec<u8> {
    let mut out = Vec::new();
    for i in 1..=n {
        writeln!(out, "{{\"n\":{}}}", i).unwrap();
    }
    out
}

// ============================================================================
// Handlers
// ============================================================================

fn line_number(line: &[u8]) -> anyhow::Result<i64> {
    let value: serde_json::Value = serde_json::from_slice(line)?;
    value["n"]
        .as_i64()
        .ok_or_else(|| anyhow::anyhow!("line has no numeric 'n'"))
}

/// Queues one statement per line: query text `tag`, argument the line's `n`
pub fn tagging_handler(tag: &str) -> Arc<dyn LineHandler> {
    let tag = tag.to_string();
    Arc::new(move |batch: &mut Batch, line: &[u8]| -> anyhow::Result<()> {
        let n = line_number(line)?;
        batch.queue(tag.clone(), [SqlValue::from(n)]);
        Ok(())
    })
}

/// Like [`tagging_handler`] but rejects the line whose `n` is `fail_at`
pub fn failing_handler(tag: &str, fail_at: i64) -> Arc<dyn LineHandler> {
    let tag = tag.to_string();
    Arc::new(move |batch: &mut Batch, line: &[u8]| -> anyhow::Result<()> {
        let n = line_number(line)?;
        if n == fail_at {
            anyhow::bail!("refusing line {}", n);
        }
        batch.queue(tag.clone(), [SqlValue::from(n)]);
        Ok(())
    })
}

// ============================================================================
// Store
// ============================================================================

/// One executed batch as seen by [`RecordingStore`]
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRecord {
    pub tag: String,
    pub len: usize,
}

/// Store that remembers every statement and batch in execution order
#[derive(Default)]
pub struct RecordingStore {
    executed: Mutex<Vec<QueuedQuery>>,
    batches: Mutex<Vec<BatchRecord>>,
    batch_delay: Duration,
    fail_on: Option<(String, i64)>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long before running each batch
    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }

    /// Reject the statement with this tag and argument
    pub fn failing_on(mut self, tag: &str, n: i64) -> Self {
        self.fail_on = Some((tag.to_string(), n));
        self
    }

    pub fn executed(&self) -> Vec<QueuedQuery> {
        self.executed.lock().unwrap().clone()
    }

    /// `(tag, n)` for every executed statement, in order
    pub fn executed_pairs(&self) -> Vec<(String, i64)> {
        self.executed().iter().map(tag_and_n).collect()
    }

    pub fn executed_for(&self, tag: &str) -> Vec<i64> {
        filter_tag(self.executed_pairs(), tag)
    }

    pub fn batches(&self) -> Vec<BatchRecord> {
        self.batches.lock().unwrap().clone()
    }

    pub fn batch_sizes_for(&self, tag: &str) -> Vec<usize> {
        self.batches()
            .into_iter()
            .filter(|b| b.tag == tag)
            .map(|b| b.len)
            .collect()
    }
}

fn tag_and_n(query: &QueuedQuery) -> (String, i64) {
    match query.arguments().first() {
        Some(SqlValue::BigInt(Some(n))) => (query.query().to_string(), *n),
        other => panic!("unexpected argument {:?}", other),
    }
}

fn filter_tag(pairs: Vec<(String, i64)>, tag: &str) -> Vec<i64> {
    pairs
        .into_iter()
        .filter(|(t, _)| t == tag)
        .map(|(_, n)| n)
        .collect()
}

fn reject(fail_on: &Option<(String, i64)>, query: &QueuedQuery) -> anyhow::Result<()> {
    if let Some((tag, n)) = fail_on {
        if query.query() == tag && query.arguments().first() == Some(&SqlValue::from(*n)) {
            anyhow::bail!("constraint violation on {} {}", tag, n);
        }
    }
    Ok(())
}

#[async_trait]
impl Store for RecordingStore {
    async fn execute(&self, _cancel: &CancellationToken, query: &QueuedQuery) -> anyhow::Result<()> {
        reject(&self.fail_on, query)?;
        self.executed.lock().unwrap().push(query.clone());
        Ok(())
    }

    async fn execute_batch(&self, cancel: &CancellationToken, batch: &Batch) -> anyhow::Result<()> {
        if !self.batch_delay.is_zero() {
            tokio::time::sleep(self.batch_delay).await;
        }

        self.batches.lock().unwrap().push(BatchRecord {
            tag: batch
                .queries()
                .first()
                .map(|q| q.query().to_string())
                .unwrap_or_default(),
            len: batch.len(),
        });

        for query in batch {
            self.execute(cancel, query).await?;
        }
        Ok(())
    }
}

/// Store that only implements `execute`, so batches go through the
/// trait's provided `execute_batch`
#[derive(Default)]
pub struct StatementStore {
    executed: Mutex<Vec<(String, i64)>>,
    fail_on: Option<(String, i64)>,
}

impl StatementStore {
    /// Reject the statement with this tag and argument
    pub fn failing_on(tag: &str, n: i64) -> Self {
        Self {
            fail_on: Some((tag.to_string(), n)),
            ..Default::default()
        }
    }

    pub fn executed_for(&self, tag: &str) -> Vec<i64> {
        filter_tag(self.executed.lock().unwrap().clone(), tag)
    }
}

#[async_trait]
impl Store for StatementStore {
    async fn execute(&self, _cancel: &CancellationToken, query: &QueuedQuery) -> anyhow::Result<()> {
        reject(&self.fail_on, query)?;
        self.executed.lock().unwrap().push(tag_and_n(query));
        Ok(())
    }
}

// ============================================================================
// Progress
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackerRecord {
    pub label: String,
    pub total: u64,
    pub increments: Vec<u64>,
    pub completed: bool,
}

/// Progress double that keeps every tracker's history
#[derive(Default, Clone)]
pub struct RecordingProgress {
    trackers: Arc<Mutex<Vec<TrackerRecord>>>,
}

impl RecordingProgress {
    pub fn trackers(&self) -> Vec<TrackerRecord> {
        self.trackers.lock().unwrap().clone()
    }

    pub fn tracker(&self, label: &str) -> TrackerRecord {
        self.trackers()
            .into_iter()
            .find(|t| t.label == label)
            .unwrap_or_else(|| panic!("no tracker labelled {}", label))
    }
}

impl Progress for RecordingProgress {
    fn add_tracker(&self, total: u64, label: &str) -> Box<dyn Tracker> {
        let mut trackers = self.trackers.lock().unwrap();
        trackers.push(TrackerRecord {
            label: label.to_string(),
            total,
            ..Default::default()
        });

        Box::new(RecordingTracker {
            index: trackers.len() - 1,
            trackers: self.trackers.clone(),
        })
    }
}

struct RecordingTracker {
    index: usize,
    trackers: Arc<Mutex<Vec<TrackerRecord>>>,
}

impl Tracker for RecordingTracker {
    fn increment(&self, units: u64, _elapsed: Duration) {
        self.trackers.lock().unwrap()[self.index].increments.push(units);
    }

    fn mark_complete(&self) {
        self.trackers.lock().unwrap()[self.index].completed = true;
    }
}
