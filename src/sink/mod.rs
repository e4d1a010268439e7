//! Batch checkpoint writer
//!
//! Accumulates extracted rows in memory and flushes them to a new output file
//! every `batch_size` rows, so a multi-hour scan loses at most one batch on
//! failure. File names encode cumulative progress (row count or the last
//! extracted entity id) for manual restart decisions; the output directory is
//! append-only.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

use crate::extract::{Category, ExtractedRow};

/// Errors writing batch files. These are fatal for the run.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON write error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Batch file format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Tabular file with one header row.
    #[default]
    Csv,
    /// `{"header": [...], "<category>": [[...]]}` envelope.
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format '{other}' (expected 'csv' or 'json')")),
        }
    }
}

/// How batch files are named.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BatchNaming {
    /// `till_<cumulative row count>_items.<ext>`
    #[default]
    RowCount,
    /// `till_<last extracted entity id>_item.<ext>`
    LastEntity,
}

/// Accumulates rows and writes one immutable file per flush.
pub struct BatchWriter {
    output_dir: PathBuf,
    category: Category,
    format: OutputFormat,
    naming: BatchNaming,
    batch_size: usize,
    buffer: Vec<ExtractedRow>,
    rows_total: usize,
    batches_written: usize,
    last_entity: Option<String>,
}

impl BatchWriter {
    /// Create the writer and its output directory.
    pub fn new(
        output_dir: impl AsRef<Path>,
        category: Category,
        format: OutputFormat,
        naming: BatchNaming,
        batch_size: usize,
    ) -> Result<Self, SinkError> {
        let output_dir = output_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&output_dir)?;
        Ok(Self {
            output_dir,
            category,
            format,
            naming,
            batch_size: batch_size.max(1),
            buffer: Vec::new(),
            rows_total: 0,
            batches_written: 0,
            last_entity: None,
        })
    }

    /// Append a row; flush and clear the buffer when the cumulative count
    /// hits a batch boundary. Returns the path of any file written.
    pub fn push(&mut self, row: ExtractedRow) -> Result<Option<PathBuf>, SinkError> {
        self.last_entity = Some(row.id.clone());
        self.buffer.push(row);
        self.rows_total += 1;

        if self.rows_total % self.batch_size == 0 {
            return self.flush().map(Some);
        }
        Ok(None)
    }

    /// Terminal flush at end of stream.
    ///
    /// Writes whatever remains in the buffer. An empty buffer still produces
    /// a header-only artifact when nothing was written at all, but is skipped
    /// right after a boundary flush so no file is ever rewritten.
    pub fn finish(&mut self) -> Result<Option<PathBuf>, SinkError> {
        if self.buffer.is_empty() && self.batches_written > 0 {
            return Ok(None);
        }
        self.flush().map(Some)
    }

    /// Cumulative rows pushed.
    pub fn rows_total(&self) -> usize {
        self.rows_total
    }

    /// Batch files written so far.
    pub fn batches_written(&self) -> usize {
        self.batches_written
    }

    /// Rows currently buffered and not yet flushed.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    fn flush(&mut self) -> Result<PathBuf, SinkError> {
        let path = self.output_dir.join(self.file_name());
        match self.format {
            OutputFormat::Csv => self.write_csv(&path)?,
            OutputFormat::Json => self.write_json(&path)?,
        }
        info!(rows = self.buffer.len(), path = %path.display(), "batch flushed");
        self.buffer.clear();
        self.batches_written += 1;
        Ok(path)
    }

    fn file_name(&self) -> String {
        let ext = self.format.extension();
        match self.naming {
            BatchNaming::RowCount => format!("till_{}_items.{ext}", self.rows_total),
            BatchNaming::LastEntity => match &self.last_entity {
                Some(id) => format!("till_{id}_item.{ext}"),
                None => format!("till_{}_items.{ext}", self.rows_total),
            },
        }
    }

    fn write_csv(&self, path: &Path) -> Result<(), SinkError> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(ExtractedRow::columns(self.category))?;
        for row in &self.buffer {
            writer.write_record(row.cells())?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_json(&self, path: &Path) -> Result<(), SinkError> {
        let header: Vec<Value> = ExtractedRow::columns(self.category)
            .into_iter()
            .map(|c| Value::String(c.to_string()))
            .collect();
        let rows: Vec<Value> = self
            .buffer
            .iter()
            .map(|row| Value::Array(row.cells().into_iter().map(Value::String).collect()))
            .collect();

        let mut doc = serde_json::Map::new();
        doc.insert("header".to_string(), Value::Array(header));
        doc.insert(self.category.rows_key().to_string(), Value::Array(rows));

        std::fs::write(path, serde_json::to_string_pretty(&Value::Object(doc))?)?;
        Ok(())
    }
}
