//! Extraction configuration

use serde::{Deserialize, Serialize};

use crate::extract::Category;

/// Controls admission and batching of the extraction scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Entity class to extract
    #[serde(default)]
    pub category: Category,
    /// Rows per batch file
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Stop after scanning this many records (None = whole dump)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_records: Option<u64>,
    /// Require an official-website claim for admission; defaults per
    /// category (organisations yes, cities no)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_website: Option<bool>,
    /// Label language for admission and the label column
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_batch_size() -> usize {
    5000
}

fn default_language() -> String {
    "en".to_string()
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            category: Category::default(),
            batch_size: default_batch_size(),
            max_records: None,
            require_website: None,
            language: default_language(),
        }
    }
}

impl ExtractionConfig {
    /// The effective website requirement for a category.
    pub fn require_website_for(&self, category: Category) -> bool {
        self.require_website
            .unwrap_or(category == Category::Organisations)
    }
}
