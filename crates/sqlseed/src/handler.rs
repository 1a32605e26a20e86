//! Per-line transform capability
//!
//! Implement [`LineHandler`] for each dataset shape (or pass a closure) to
//! turn one raw input line into zero or more queued statements.

use crate::batch::Batch;

/// Turns one raw input line into statements on the chunk's [`Batch`].
///
/// `line` is the raw bytes of the line including its trailing `\n`, except
/// for a final line that had none in the input. Handlers must only append
/// to `batch` and must not keep either argument past the call. Returning an
/// error stops the whole run; the chunk the line belongs to is never
/// executed.
pub trait LineHandler: Send + Sync {
    fn handle_line(&self, batch: &mut Batch, line: &[u8]) -> anyhow::Result<()>;
}

impl<F> LineHandler for F
where
    F: Fn(&mut Batch, &[u8]) -> anyhow::Result<()> + Send + Sync,
{
    fn handle_line(&self, batch: &mut Batch, line: &[u8]) -> anyhow::Result<()> {
        self(batch, line)
    }
}
