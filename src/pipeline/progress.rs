//! Terminal progress reporting for a scan

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Instant;

/// Spinner-based progress for the single-threaded scan loop.
///
/// Quiet mode drops the bar entirely (tests, scripted runs); counters still
/// accumulate in `RunStats` upstream.
pub struct ScanProgress {
    bar: Option<ProgressBar>,
    start: Instant,
    rows: u64,
    last_label: String,
}

impl ScanProgress {
    pub fn new(quiet: bool) -> Self {
        let bar = if quiet {
            None
        } else {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {pos} records {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            Some(pb)
        };
        Self {
            bar,
            start: Instant::now(),
            rows: 0,
            last_label: String::new(),
        }
    }

    /// Called once per scanned record.
    pub fn record_scanned(&mut self, scanned: u64) {
        if let Some(ref pb) = self.bar {
            pb.set_position(scanned);
            // indicatif throttles redraws; recompute the message cheaply.
            let elapsed = self.start.elapsed().as_secs_f64();
            let rate = if elapsed > 0.0 {
                scanned as f64 / elapsed
            } else {
                0.0
            };
            pb.set_message(format!(
                "| {} rows | {:.0} rec/s | {}",
                self.rows, rate, self.last_label
            ));
        }
    }

    /// Called when a record yields a row.
    pub fn row_extracted(&mut self, label: &str) {
        self.rows += 1;
        if self.bar.is_some() {
            self.last_label = truncate_label(label, 40);
        }
    }

    /// Finish the bar with a one-line outcome.
    pub fn finish(&self, rows_extracted: u64, batches_written: usize, cancelled: bool) {
        if let Some(ref pb) = self.bar {
            let verb = if cancelled { "Cancelled" } else { "Done" };
            pb.finish_with_message(format!(
                "| {verb}: {rows_extracted} rows in {batches_written} batches"
            ));
        }
    }
}

/// UTF-8 safe label truncation for the status line.
fn truncate_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() > max_chars {
        let truncated: String = label.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{truncated}...")
    } else {
        label.to_string()
    }
}
