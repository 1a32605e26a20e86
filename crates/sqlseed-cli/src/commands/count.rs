//! `sqlseed count` command implementation
//!
//! Runs the same line-count pre-scan that sizes progress bars.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::PathBuf;

/// Print `<lines>\t<path>` for each file
pub fn run(files: &[PathBuf]) -> Result<()> {
    let stdout = std::io::stdout();
    write_counts(&mut stdout.lock(), files)
}

fn write_counts<W: Write>(out: &mut W, files: &[PathBuf]) -> Result<()> {
    for file in files {
        let lines = sqlseed::total_lines(file)
            .with_context(|| format!("Failed to count lines of '{}'", file.display()))?;
        writeln!(out, "{}\t{}", lines, file.display())?;
    }
    Ok(())
}
