//! Configuration for wdex

mod extraction;
mod logging;
mod output;
mod sparql;

pub use extraction::ExtractionConfig;
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use output::OutputConfig;
pub use sparql::SparqlConfig;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default user agent for the one outbound SPARQL request.
pub const DEFAULT_USER_AGENT: &str = "wdex/0.1 (Wikidata entity extraction)";

/// Main configuration, loaded from `wdex.toml` with CLI overrides on top.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Dump input configuration
    #[serde(default)]
    pub dump: DumpConfig,
    /// Extraction configuration
    #[serde(default)]
    pub extraction: ExtractionConfig,
    /// Batch output configuration
    #[serde(default)]
    pub output: OutputConfig,
    /// Subclass query configuration
    #[serde(default)]
    pub sparql: SparqlConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Dump input configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DumpConfig {
    /// Path to the dump file; usually given on the command line instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a TOML file and validate it.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e)
        })?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e)
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration fields.
    pub fn validate(&self) -> Result<()> {
        if self.extraction.batch_size == 0 {
            anyhow::bail!("extraction.batch_size must be at least 1");
        }
        if self.extraction.language.is_empty() {
            anyhow::bail!("extraction.language must not be empty");
        }
        if self.sparql.endpoint.is_empty() {
            anyhow::bail!("sparql.endpoint must not be empty");
        }
        if self.sparql.timeout_secs == 0 {
            anyhow::bail!("sparql.timeout_secs must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::Category;
    use crate::sink::{BatchNaming, OutputFormat};

    #[test]
    fn default_config_validates() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.extraction.batch_size, 5000);
        assert_eq!(config.extraction.category, Category::Organisations);
        assert_eq!(config.extraction.language, "en");
        assert_eq!(config.output.format, OutputFormat::Csv);
        assert_eq!(config.output.naming, BatchNaming::RowCount);
        assert!(config.sparql.enabled);
    }

    #[test]
    fn parses_partial_toml_with_defaults() {
        let toml = r#"
            [extraction]
            category = "cities"
            batch_size = 100

            [output]
            dir = "out/cities"
            format = "json"

            [sparql]
            enabled = false
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.extraction.category, Category::Cities);
        assert_eq!(config.extraction.batch_size, 100);
        assert_eq!(config.output.dir, PathBuf::from("out/cities"));
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(!config.sparql.enabled);
        assert_eq!(config.sparql.root_type, "Q515");
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let mut config = Config::default();
        config.extraction.batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = Config::default();
        let serialized = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert!(parsed.validate().is_ok());
        assert_eq!(parsed.extraction.batch_size, config.extraction.batch_size);
    }
}
