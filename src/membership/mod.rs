//! Type membership resolution: which instance-of values admit a record
//!
//! Organisations use a short fixed list of root types. Cities resolve the
//! transitive subclass closure of `Q515` through the Wikidata SPARQL endpoint
//! once per run, falling back to a predefined set of common city types when
//! the query fails or comes back empty.

use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::SparqlConfig;
use crate::extract::Category;

/// Root types qualifying an organisation: business, public research
/// university, university.
pub const ORGANISATION_ROOT_TYPES: [&str; 3] = ["Q4830453", "Q62078547", "Q3918"];

/// Static fallback for the city subclass query: city, big city, town,
/// capital, megacity, and a handful of administrative subtypes.
pub const CITY_FALLBACK_TYPES: [&str; 16] = [
    "Q515",      // city
    "Q1549591",  // big city
    "Q3957",     // town
    "Q5119",     // capital
    "Q174844",   // megacity
    "Q60458065", // city in British Columbia
    "Q1093829",  // city with special status
    "Q1637706",  // provincial city
    "Q1851856",  // city of regional significance
    "Q1907114",  // district-level city
    "Q2264924",  // port city
    "Q5327684",  // county-level city
    "Q608425",   // charter city
    "Q6784672",  // market town
    "Q702492",   // urban commune
    "Q7930989",  // city (historical)
];

/// How the membership set was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipSource {
    /// Hard-coded root types (organisations).
    Static,
    /// Live subclass query against the SPARQL endpoint.
    Sparql,
    /// Static fallback after a failed or empty query.
    Fallback,
}

impl MembershipSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipSource::Static => "static",
            MembershipSource::Sparql => "sparql",
            MembershipSource::Fallback => "fallback",
        }
    }
}

impl fmt::Display for MembershipSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The read-only set of type identifiers that qualify a record.
///
/// Built once at startup, never mutated during the scan.
#[derive(Debug, Clone)]
pub struct TypeMembershipSet {
    ids: HashSet<String>,
    source: MembershipSource,
}

impl TypeMembershipSet {
    pub fn from_ids(ids: impl IntoIterator<Item = String>, source: MembershipSource) -> Self {
        Self {
            ids: ids.into_iter().collect(),
            source,
        }
    }

    pub fn contains(&self, type_id: &str) -> bool {
        self.ids.contains(type_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn source(&self) -> MembershipSource {
        self.source
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}

/// Errors from the subclass query. All of them resolve to the fallback set.
#[derive(Debug, Error)]
pub enum MembershipError {
    #[error("subclass query failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("subclass query returned HTTP {0}")]
    Status(u16),
    #[error("unexpected subclass response shape: {0}")]
    Shape(#[from] serde_json::Error),
    #[error("subclass query returned no results")]
    Empty,
}

#[derive(Debug, Deserialize)]
struct SparqlResponse {
    results: SparqlResults,
}

#[derive(Debug, Deserialize)]
struct SparqlResults {
    bindings: Vec<SparqlBinding>,
}

#[derive(Debug, Deserialize)]
struct SparqlBinding {
    #[serde(rename = "citySubclass", default)]
    subclass: Option<SparqlValue>,
    #[serde(rename = "citySubclassLabel", default)]
    label: Option<SparqlValue>,
}

#[derive(Debug, Deserialize)]
struct SparqlValue {
    value: String,
}

/// One-shot client for the transitive-subclass query.
pub struct SubclassClient {
    endpoint: String,
    root_type: String,
    user_agent: String,
    timeout: Duration,
}

impl SubclassClient {
    pub fn new(config: &SparqlConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            root_type: config.root_type.clone(),
            user_agent: config.user_agent.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    fn query(&self) -> String {
        format!(
            "SELECT ?citySubclass ?citySubclassLabel WHERE {{\n  \
             ?citySubclass wdt:P279* wd:{} .\n  \
             SERVICE wikibase:label {{ bd:serviceParam wikibase:language \"en\". }}\n}}",
            self.root_type
        )
    }

    /// Issue the single subclass query and collect the identifier set.
    pub fn fetch(&self) -> Result<HashSet<String>, MembershipError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .build()?;

        let response = client
            .get(&self.endpoint)
            .query(&[("query", self.query().as_str()), ("format", "json")])
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(MembershipError::Status(status.as_u16()));
        }

        parse_response(&response.text()?)
    }
}

/// Parse the tabular SPARQL JSON response into the identifier set.
///
/// The identifier of interest is the last path segment of each binding's
/// `citySubclass.value` IRI.
fn parse_response(body: &str) -> Result<HashSet<String>, MembershipError> {
    let response: SparqlResponse = serde_json::from_str(body)?;

    let mut ids = HashSet::new();
    for binding in response.results.bindings {
        let Some(subclass) = binding.subclass else {
            continue;
        };
        let Some(id) = subclass.value.rsplit('/').next() else {
            continue;
        };
        if id.is_empty() {
            continue;
        }
        debug!(
            id,
            label = binding.label.as_ref().map(|l| l.value.as_str()).unwrap_or("-"),
            "found subclass"
        );
        ids.insert(id.to_string());
    }

    if ids.is_empty() {
        return Err(MembershipError::Empty);
    }
    Ok(ids)
}

fn fallback_city_set() -> TypeMembershipSet {
    TypeMembershipSet::from_ids(
        CITY_FALLBACK_TYPES.iter().map(|s| s.to_string()),
        MembershipSource::Fallback,
    )
}

/// Resolve the city membership set: one SPARQL attempt, fallback on any
/// failure. Never aborts the run.
pub fn resolve_city_types(config: &SparqlConfig) -> TypeMembershipSet {
    if !config.enabled {
        info!("subclass query disabled, using fallback city type set");
        return fallback_city_set();
    }

    match SubclassClient::new(config).fetch() {
        Ok(ids) => {
            info!(count = ids.len(), "resolved city subclasses via SPARQL");
            TypeMembershipSet::from_ids(ids, MembershipSource::Sparql)
        }
        Err(e) => {
            warn!(error = %e, "falling back to the static city type set");
            fallback_city_set()
        }
    }
}

/// Build the membership set for a category.
pub fn resolve(category: Category, config: &SparqlConfig) -> TypeMembershipSet {
    match category {
        Category::Organisations => TypeMembershipSet::from_ids(
            ORGANISATION_ROOT_TYPES.iter().map(|s| s.to_string()),
            MembershipSource::Static,
        ),
        Category::Cities => resolve_city_types(config),
    }
}
