//! Batch output configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::sink::{BatchNaming, OutputFormat};

/// Where and how batch files are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output directory (created if missing; only ever appended to)
    #[serde(default = "default_dir")]
    pub dir: PathBuf,
    /// Batch file format
    #[serde(default)]
    pub format: OutputFormat,
    /// Batch file naming scheme
    #[serde(default)]
    pub naming: BatchNaming,
}

fn default_dir() -> PathBuf {
    PathBuf::from("out")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            format: OutputFormat::default(),
            naming: BatchNaming::default(),
        }
    }
}
