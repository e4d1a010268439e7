//! Lazy reader over a compressed line-delimited dump
//!
//! Wikidata dumps wrap one entity per line inside an outer JSON array:
//! a two-byte `[\n` prefix, then one object per line terminated by a comma,
//! then a closing `]`. The reader strips the framing per line and yields
//! decoded records, skipping anything that does not parse.

use super::entity::EntityRecord;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, trace};

/// Errors surfaced by the dump reader. Malformed lines are not errors; they
/// are counted and skipped.
#[derive(Debug, Error)]
pub enum DumpError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Input stream, with or without a gzip layer.
enum DumpInput {
    Gzip(BufReader<GzDecoder<File>>),
    Plain(BufReader<File>),
}

impl DumpInput {
    fn read_line(&mut self, buf: &mut String) -> std::io::Result<usize> {
        match self {
            DumpInput::Gzip(reader) => reader.read_line(buf),
            DumpInput::Plain(reader) => reader.read_line(buf),
        }
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> std::io::Result<()> {
        match self {
            DumpInput::Gzip(reader) => reader.read_exact(buf),
            DumpInput::Plain(reader) => reader.read_exact(buf),
        }
    }
}

/// Forward-only record stream over a dump file. Consumed exactly once; the
/// only way to restart is to open the file again.
pub struct DumpReader {
    input: DumpInput,
    line: String,
    lines_read: u64,
    lines_skipped: u64,
    done: bool,
}

impl DumpReader {
    /// Open a dump file, gzip-decoded when the extension is `.gz`, and
    /// discard the two-byte array prefix.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DumpError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let is_gz = path.extension().map(|e| e == "gz").unwrap_or(false);

        let mut input = if is_gz {
            DumpInput::Gzip(BufReader::with_capacity(1024 * 1024, GzDecoder::new(file)))
        } else {
            DumpInput::Plain(BufReader::with_capacity(1024 * 1024, file))
        };

        let mut prefix = [0u8; 2];
        input.read_exact(&mut prefix)?;
        debug!(path = %path.display(), gzip = is_gz, "opened dump");

        Ok(Self {
            input,
            line: String::with_capacity(8192),
            lines_read: 0,
            lines_skipped: 0,
            done: false,
        })
    }

    /// Lines consumed so far, including skipped ones.
    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }

    /// Lines that did not decode to a record (malformed JSON, the closing
    /// array bracket, blank lines).
    pub fn lines_skipped(&self) -> u64 {
        self.lines_skipped
    }
}

impl Iterator for DumpReader {
    type Item = Result<EntityRecord, DumpError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            self.line.clear();
            match self.input.read_line(&mut self.line) {
                Ok(0) => {
                    self.done = true;
                    return None;
                }
                Ok(_) => {}
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
            }
            self.lines_read += 1;

            let trimmed = self.line.trim_end();
            let trimmed = trimmed.strip_suffix(',').unwrap_or(trimmed);
            if trimmed.is_empty() {
                self.lines_skipped += 1;
                continue;
            }

            match serde_json::from_str::<serde_json::Value>(trimmed) {
                Ok(value) => match EntityRecord::from_value(value) {
                    Some(record) => return Some(Ok(record)),
                    None => {
                        trace!(line = self.lines_read, "skipping non-object line");
                        self.lines_skipped += 1;
                    }
                },
                Err(e) => {
                    trace!(line = self.lines_read, error = %e, "skipping malformed line");
                    self.lines_skipped += 1;
                }
            }
        }
    }
}
