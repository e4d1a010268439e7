//! Single-pass extraction pipeline
//!
//! Wires the dump reader, extractor, and batch writer together: strictly in
//! dump order, no reordering, no buffering beyond one checkpoint batch.
//! Supports cooperative cancellation so an hours-long scan can be stopped
//! with a final partial flush instead of losing the current batch.

mod progress;

pub use progress::ScanProgress;

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::dump::{DumpError, DumpReader};
use crate::extract::{Extractor, Outcome, SkipReason};
use crate::sink::{BatchWriter, SinkError};

/// Fatal pipeline failures. Per-record problems never surface here; they are
/// counted in `RunStats` instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("dump read failed: {0}")]
    Dump(#[from] DumpError),
    #[error("batch write failed: {0}")]
    Sink(#[from] SinkError),
}

/// Cloneable cooperative cancellation flag, safe to set from a signal
/// handler.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Run-level counters, reported at the end of a scan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStats {
    /// Records decoded and evaluated.
    pub records_scanned: u64,
    /// Input lines that did not decode to a record.
    pub lines_skipped: u64,
    /// Rows extracted and handed to the writer.
    pub rows_extracted: u64,
    pub skipped_no_instance_of: u64,
    pub skipped_no_label: u64,
    pub skipped_no_website: u64,
    pub skipped_no_qualifying_type: u64,
    pub skipped_malformed: u64,
    /// Batch files written, terminal flush included.
    pub batches_written: usize,
    pub elapsed_seconds: f64,
    pub records_per_second: f64,
    /// Whether the scan stopped on a cancellation request.
    pub cancelled: bool,
}

impl RunStats {
    fn record_skip(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::NoInstanceOf => self.skipped_no_instance_of += 1,
            SkipReason::NoLabel => self.skipped_no_label += 1,
            SkipReason::NoWebsite => self.skipped_no_website += 1,
            SkipReason::NoQualifyingType => self.skipped_no_qualifying_type += 1,
            SkipReason::Malformed => self.skipped_malformed += 1,
        }
    }

    fn update_rate(&mut self) {
        if self.elapsed_seconds > 0.0 {
            self.records_per_second = self.records_scanned as f64 / self.elapsed_seconds;
        }
    }

    /// Print the end-of-run summary table.
    pub fn print_summary(&self) {
        println!("\nExtraction Summary");
        println!("==================");
        println!("Records scanned:      {}", self.records_scanned);
        println!("Lines skipped:        {}", self.lines_skipped);
        println!("Rows extracted:       {}", self.rows_extracted);
        println!("  no instance-of:     {}", self.skipped_no_instance_of);
        println!("  no english label:   {}", self.skipped_no_label);
        println!("  no website:         {}", self.skipped_no_website);
        println!("  no qualifying type: {}", self.skipped_no_qualifying_type);
        println!("  malformed:          {}", self.skipped_malformed);
        println!("Batches written:      {}", self.batches_written);
        println!("Elapsed time:         {:.1}s", self.elapsed_seconds);
        println!("Processing rate:      {:.1} records/s", self.records_per_second);
        if self.cancelled {
            println!("Run was cancelled; output holds rows extracted so far.");
        }
    }
}

/// Orchestrates one full scan over a dump.
pub struct ExtractionPipeline {
    extractor: Extractor,
    writer: BatchWriter,
    cancel: CancelToken,
    max_records: Option<u64>,
    quiet: bool,
}

impl ExtractionPipeline {
    pub fn new(extractor: Extractor, writer: BatchWriter) -> Self {
        Self {
            extractor,
            writer,
            cancel: CancelToken::new(),
            max_records: None,
            quiet: false,
        }
    }

    /// Use an externally shared cancel token (e.g. wired to Ctrl-C).
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Stop scanning after this many records (diagnostics, smoke runs).
    pub fn with_max_records(mut self, max_records: Option<u64>) -> Self {
        self.max_records = max_records;
        self
    }

    /// Disable the progress bar.
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Scan the dump front to back; the terminal flush runs even when the
    /// reader fails mid-stream.
    pub fn run(&mut self, mut reader: DumpReader) -> Result<RunStats, PipelineError> {
        let start = Instant::now();
        let mut progress = ScanProgress::new(self.quiet);
        let mut stats = RunStats::default();
        let mut fatal: Option<DumpError> = None;

        info!(
            category = %self.extractor.category(),
            membership = %self.extractor.membership().source(),
            types = self.extractor.membership().len(),
            "starting extraction scan"
        );

        for item in reader.by_ref() {
            if self.cancel.is_cancelled() {
                info!("cancellation requested, stopping scan");
                stats.cancelled = true;
                break;
            }
            if let Some(max) = self.max_records {
                if stats.records_scanned >= max {
                    info!(max, "reached record scan limit");
                    break;
                }
            }

            let record = match item {
                Ok(record) => record,
                Err(e) => {
                    fatal = Some(e);
                    break;
                }
            };
            stats.records_scanned += 1;

            match self.extractor.extract(&record) {
                Outcome::Extracted(row) => {
                    progress.row_extracted(&row.label);
                    debug!(id = %row.id, type_id = %row.type_id, "extracted");
                    self.writer.push(*row)?;
                    stats.rows_extracted += 1;
                }
                Outcome::Skipped(reason) => stats.record_skip(reason),
            }
            progress.record_scanned(stats.records_scanned);
        }

        // Whatever happened above, try to keep the rows already extracted.
        let flush_result = self.writer.finish();

        stats.lines_skipped = reader.lines_skipped();
        stats.batches_written = self.writer.batches_written();
        stats.elapsed_seconds = start.elapsed().as_secs_f64();
        stats.update_rate();
        progress.finish(stats.rows_extracted, stats.batches_written, stats.cancelled);

        if let Some(e) = fatal {
            warn!(error = %e, "dump stream failed; extracted rows were flushed");
            return Err(e.into());
        }
        flush_result?;

        info!(
            records = stats.records_scanned,
            rows = stats.rows_extracted,
            batches = stats.batches_written,
            "scan complete"
        );
        Ok(stats)
    }
}
