//! Streaming reader over gzip-compressed, newline-delimited input
//!
//! [`LineSource`] hands out bounded chunks of raw lines from a gzip file
//! without ever holding the whole decompressed file in memory.
//! [`total_lines`] makes an independent pass over the same file to count
//! lines for progress reporting; it never touches an open source's cursor.
//!
//! All of this is blocking I/O. The engine drives it from tokio's blocking
//! pool.

use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::trace;

use crate::error::{Result, SeedError};

/// Read buffer size for the line count pre-scan
const COUNT_BUFFER_SIZE: usize = 32 * 1024;

/// An open cursor over a gzip-compressed line-oriented file
pub struct LineSource {
    path: PathBuf,
    reader: BufReader<MultiGzDecoder<File>>,
}

impl std::fmt::Debug for LineSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineSource").field("path", &self.path).finish()
    }
}

impl LineSource {
    /// Open `path` and attach the gzip decoder.
    ///
    /// The first block is decoded eagerly so a missing file, an unreadable
    /// file and a corrupt gzip header all fail here rather than on the
    /// first read.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = open_decoder(path).map_err(|e| SeedError::open(path, e))?;
        reader.fill_buf().map_err(|e| SeedError::open(path, e))?;

        Ok(Self {
            path: path.to_path_buf(),
            reader,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Count the lines of this source's file with a fresh, independent pass.
    pub fn total_lines(&self) -> Result<u64> {
        total_lines(&self.path)
    }

    /// Pull up to `n` lines from the current position.
    ///
    /// Lines keep their trailing `\n`. Fewer than `n` lines come back only
    /// at end of stream, an empty vector means the stream is exhausted, and
    /// a final line without a trailing newline is returned as-is. A request
    /// for zero lines reads one. On error, lines already pulled by this call
    /// are discarded.
    pub fn read_lines(&mut self, n: usize) -> Result<Vec<Vec<u8>>> {
        let n = n.max(1);
        let mut lines = Vec::with_capacity(n.min(1024));

        while lines.len() < n {
            let mut line = Vec::new();
            let read = self
                .reader
                .read_until(b'\n', &mut line)
                .map_err(|e| SeedError::read(&self.path, e))?;

            if read == 0 {
                break;
            }
            lines.push(line);
        }

        trace!(source = %self.path.display(), lines = lines.len(), "Pulled lines");
        Ok(lines)
    }

    /// Release the decoder and the file handle.
    pub fn close(self) {
        trace!(source = %self.path.display(), "Closing source");
        drop(self.reader);
    }
}

fn open_decoder(path: &Path) -> std::io::Result<BufReader<MultiGzDecoder<File>>> {
    let file = File::open(path)?;
    Ok(BufReader::new(MultiGzDecoder::new(file)))
}

/// Count the newline-terminated lines in the gzip file at `path`.
///
/// A final line without a trailing `\n` still counts as a line; empty
/// content counts as zero. Memory use is a fixed read buffer regardless of
/// file size. Every failure, including failing to open, is reported as
/// [`SeedError::ReadFailed`] because it happens on behalf of a pre-scan.
pub fn total_lines(path: impl AsRef<Path>) -> Result<u64> {
    let path = path.as_ref();
    let mut reader = open_decoder(path).map_err(|e| SeedError::read(path, e))?;
    count_lines(&mut reader).map_err(|e| SeedError::read(path, e))
}

fn count_lines<R: Read>(reader: &mut R) -> std::io::Result<u64> {
    let mut buf = vec![0u8; COUNT_BUFFER_SIZE];
    let mut count = 0u64;
    let mut last_byte = None;

    loop {
        let read = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(read) => read,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };

        count += buf[..read].iter().filter(|&&b| b == b'\n').count() as u64;
        last_byte = Some(buf[read - 1]);
    }

    if matches!(last_byte, Some(b) if b != b'\n') {
        count += 1;
    }

    Ok(count)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_count_lines_plain() {
        assert_eq!(count_lines(&mut Cursor::new(b"a\nb\nc\n")).unwrap(), 3);
        assert_eq!(count_lines(&mut Cursor::new(b"a\nb\nc")).unwrap(), 3);
        assert_eq!(count_lines(&mut Cursor::new(b"")).unwrap(), 0);
        assert_eq!(count_lines(&mut Cursor::new(b"\n\n")).unwrap(), 2);
    }

    #[test]
    fn test_count_lines_across_buffer_boundary() {
        // The newline lands exactly at the end of the first read
        let mut data = vec![b'x'; COUNT_BUFFER_SIZE - 1];
        data.push(b'\n');
        data.extend_from_slice(b"tail");
        assert_eq!(count_lines(&mut Cursor::new(data)).unwrap(), 2);
    }
}
