//! Task specifications: one dataset per node of the dependency tree

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::handler::LineHandler;

/// One dataset to seed, plus the datasets that depend on it.
///
/// Children start only after this node's own chunks have all been executed
/// successfully, and run concurrently with each other.
#[derive(Clone)]
pub struct TaskSpec {
    source: PathBuf,
    chunk_size: usize,
    handler: Arc<dyn LineHandler>,
    children: Vec<TaskSpec>,
}

impl TaskSpec {
    /// A task reading `source` with the seeder's default chunk size
    pub fn new(source: impl Into<PathBuf>, handler: Arc<dyn LineHandler>) -> Self {
        Self {
            source: source.into(),
            chunk_size: 0,
            handler,
            children: Vec::new(),
        }
    }

    /// Lines per chunk; 0 falls back to the seeder default
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_children(mut self, children: Vec<TaskSpec>) -> Self {
        self.children = children;
        self
    }

    pub fn with_child(mut self, child: TaskSpec) -> Self {
        self.children.push(child);
        self
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn handler(&self) -> &Arc<dyn LineHandler> {
        &self.handler
    }

    pub fn children(&self) -> &[TaskSpec] {
        &self.children
    }

    /// Short display name: the file name up to its first `.`
    pub fn label(&self) -> String {
        label_for(&self.source)
    }

    pub(crate) fn into_parts(self) -> (PathBuf, usize, Arc<dyn LineHandler>, Vec<TaskSpec>) {
        (self.source, self.chunk_size, self.handler, self.children)
    }
}

impl fmt::Debug for TaskSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskSpec")
            .field("source", &self.source)
            .field("chunk_size", &self.chunk_size)
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}

pub(crate) fn label_for(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());

    match name.split_once('.') {
        Some((stem, _)) => stem.to_string(),
        None => name,
    }
}
