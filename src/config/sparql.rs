//! Subclass query configuration

use serde::{Deserialize, Serialize};

use super::DEFAULT_USER_AGENT;

/// Settings for the one-shot transitive-subclass SPARQL query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SparqlConfig {
    /// Attempt the live query; when false the static fallback set is used
    /// without a network call
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Query endpoint URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Root type whose transitive subclasses qualify a record
    #[serde(default = "default_root_type")]
    pub root_type: String,
    /// User agent header for the request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_endpoint() -> String {
    "https://query.wikidata.org/sparql".to_string()
}

fn default_root_type() -> String {
    // city
    "Q515".to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for SparqlConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            endpoint: default_endpoint(),
            root_type: default_root_type(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}
