//! Progress reporting capability
//!
//! A node asks [`Progress`] for a [`Tracker`] sized to its line count, bumps
//! it once per chunk with the chunk's wall-clock time, and marks it complete
//! when its own chunks run out. [`BarProgress`] renders one `indicatif` bar
//! per node on a shared [`MultiProgress`] and smooths the ETA with an
//! exponentially weighted moving average of the per-line time.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::sync::Mutex;
use std::time::Duration;

/// Number of samples the ETA average is weighted over
pub const DEFAULT_EWMA_AGE: f64 = 30.0;

/// Creates per-node trackers on a shared display surface
pub trait Progress: Send + Sync {
    fn add_tracker(&self, total: u64, label: &str) -> Box<dyn Tracker>;
}

/// Progress of a single node
pub trait Tracker: Send {
    /// Advance by `units` lines that took `elapsed` to process
    fn increment(&self, units: u64, elapsed: Duration);

    fn mark_complete(&self);
}

/// Exponentially weighted moving average
#[derive(Debug, Clone)]
pub struct Ewma {
    alpha: f64,
    value: Option<f64>,
}

impl Ewma {
    /// An average over roughly the last `age` samples
    pub fn new(age: f64) -> Self {
        Self {
            alpha: 2.0 / (age.max(1.0) + 1.0),
            value: None,
        }
    }

    /// Fold in `sample` with weight `count`, as if it had been observed
    /// `count` times in a row.
    pub fn add(&mut self, sample: f64, count: u64) {
        let count = i32::try_from(count.max(1)).unwrap_or(i32::MAX);
        self.value = Some(match self.value {
            None => sample,
            Some(current) => {
                let keep = (1.0 - self.alpha).powi(count);
                current * keep + sample * (1.0 - keep)
            },
        });
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }
}

/// `indicatif` implementation of [`Progress`]
#[derive(Clone)]
pub struct BarProgress {
    multi: MultiProgress,
    style: ProgressStyle,
}

impl BarProgress {
    pub fn new() -> Self {
        Self::with_multi(MultiProgress::new())
    }

    /// Render onto an existing [`MultiProgress`], e.g. a hidden one in tests
    pub fn with_multi(multi: MultiProgress) -> Self {
        let style = ProgressStyle::with_template(
            "{prefix:<24} {percent:>3}% [{wide_bar:.cyan/blue}] {pos}/{len} {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");

        Self { multi, style }
    }

    pub fn multi(&self) -> &MultiProgress {
        &self.multi
    }

    /// A stderr writer that hides the bars while it writes, for log output
    /// that shares the terminal with them
    pub fn writer(&self) -> BarWriter {
        BarWriter {
            multi: self.multi.clone(),
        }
    }
}

/// Writes to stderr between bar redraws. See [`BarProgress::writer`].
#[derive(Clone)]
pub struct BarWriter {
    multi: MultiProgress,
}

impl Write for BarWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.multi.suspend(|| io::stderr().write(buf))
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.multi.suspend(|| io::stderr().write_all(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

impl Default for BarProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl Progress for BarProgress {
    fn add_tracker(&self, total: u64, label: &str) -> Box<dyn Tracker> {
        let bar = self.multi.add(ProgressBar::new(total));
        bar.set_style(self.style.clone());
        bar.set_prefix(label.to_string());

        Box::new(BarTracker {
            bar,
            per_line: Mutex::new(Ewma::new(DEFAULT_EWMA_AGE)),
        })
    }
}

struct BarTracker {
    bar: ProgressBar,
    per_line: Mutex<Ewma>,
}

impl Tracker for BarTracker {
    fn increment(&self, units: u64, elapsed: Duration) {
        if units == 0 {
            return;
        }

        let eta = {
            let mut avg = match self.per_line.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            avg.add(elapsed.as_secs_f64() / units as f64, units);
            avg.value()
        };

        self.bar.inc(units);

        let remaining = self
            .bar
            .length()
            .unwrap_or(0)
            .saturating_sub(self.bar.position());
        if let Some(per_line) = eta {
            self.bar.set_message(format!(
                "eta {}",
                format_eta(Duration::from_secs_f64(per_line * remaining as f64))
            ));
        }
    }

    fn mark_complete(&self) {
        self.bar.finish_with_message("done");
    }
}

/// Format a duration the way the bars show it, e.g. `1h02m05s`, `3m10s`, `42s`
pub fn format_eta(duration: Duration) -> String {
    let secs = duration.as_secs();
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);

    if h > 0 {
        format!("{}h{:02}m{:02}s", h, m, s)
    } else if m > 0 {
        format!("{}m{:02}s", m, s)
    } else {
        format!("{}s", s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use indicatif::ProgressDrawTarget;

    #[test]
    fn test_ewma_first_sample_is_taken_as_is() {
        let mut avg = Ewma::new(30.0);
        assert!(avg.value().is_none());
        avg.add(0.5, 100);
        assert_eq!(avg.value(), Some(0.5));
    }

    #[test]
    fn test_ewma_moves_towards_new_samples() {
        let mut avg = Ewma::new(30.0);
        avg.add(1.0, 1);
        avg.add(0.0, 1);
        let one_step = avg.value().unwrap();
        assert!(one_step < 1.0 && one_step > 0.9);

        // A heavily weighted sample dominates
        avg.add(0.0, 1_000);
        assert!(avg.value().unwrap() < 1e-6);
    }

    #[test]
    fn test_format_eta() {
        assert_eq!(format_eta(Duration::from_secs(42)), "42s");
        assert_eq!(format_eta(Duration::from_secs(190)), "3m10s");
        assert_eq!(format_eta(Duration::from_secs(3725)), "1h02m05s");
    }

    #[test]
    fn test_bar_tracker_runs_to_completion() {
        let progress = BarProgress::with_multi(MultiProgress::with_draw_target(
            ProgressDrawTarget::hidden(),
        ));
        let tracker = progress.add_tracker(250, "users");

        tracker.increment(100, Duration::from_millis(20));
        tracker.increment(100, Duration::from_millis(20));
        tracker.increment(50, Duration::from_millis(10));
        tracker.mark_complete();
    }

    #[test]
    fn test_writer_shares_the_bars_draw_state() {
        let progress = BarProgress::with_multi(MultiProgress::with_draw_target(
            ProgressDrawTarget::hidden(),
        ));
        let tracker = progress.add_tracker(10, "users");
        let mut writer = progress.writer();

        tracker.increment(5, Duration::from_millis(5));
        writer.write_all(b"log line above the bars\n").unwrap();
        writer.clone().flush().unwrap();
        tracker.mark_complete();
    }
}
