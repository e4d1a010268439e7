//! Claim navigation over decoded dump records
//!
//! A dump record is a deeply nested JSON object. Rather than deserializing the
//! full Wikibase data model, these helpers walk the handful of paths the
//! extractor cares about and return `None` wherever the shape differs.

use serde_json::Value;

/// One decoded entity from the dump.
///
/// Wraps the raw JSON object; discarded after attribute extraction.
#[derive(Debug, Clone)]
pub struct EntityRecord(Value);

impl EntityRecord {
    /// Wrap a decoded line. Returns `None` unless the value is a JSON object.
    pub fn from_value(value: Value) -> Option<Self> {
        value.is_object().then(|| Self(value))
    }

    /// The entity identifier, e.g. `Q42`.
    pub fn id(&self) -> Option<&str> {
        self.0.get("id")?.as_str()
    }

    /// Display label for a language code, from `labels.<lang>.value`.
    pub fn label(&self, lang: &str) -> Option<&str> {
        self.0.get("labels")?.get(lang)?.get("value")?.as_str()
    }

    /// All claims for a property, in dump order.
    pub fn claims(&self, property: &str) -> Option<&Vec<Value>> {
        self.0.get("claims")?.get(property)?.as_array()
    }

    /// First claim for a property.
    pub fn first_claim(&self, property: &str) -> Option<&Value> {
        self.claims(property)?.first()
    }

    /// Whether the record carries at least one claim for a property.
    pub fn has_claims(&self, property: &str) -> bool {
        self.claims(property).is_some_and(|claims| !claims.is_empty())
    }
}

/// Primary value of a claim: `mainsnak.datavalue.value`.
///
/// Absent for "unknown value" snaks, which carry no datavalue.
pub fn mainsnak_value(claim: &Value) -> Option<&Value> {
    claim.get("mainsnak")?.get("datavalue")?.get("value")
}

/// Primary value as a string (websites, usernames, registry ids).
pub fn mainsnak_str(claim: &Value) -> Option<&str> {
    mainsnak_value(claim)?.as_str()
}

/// Primary value as an entity reference id: `...value.id`.
pub fn mainsnak_entity_id(claim: &Value) -> Option<&str> {
    mainsnak_value(claim)?.get("id")?.as_str()
}

/// A numeric sub-field of the primary value, e.g. `latitude` of a coordinate.
pub fn mainsnak_f64(claim: &Value, field: &str) -> Option<f64> {
    mainsnak_value(claim)?.get(field)?.as_f64()
}

/// First qualifier value for a property: `qualifiers.<P>[0].datavalue.value`.
pub fn qualifier_value<'a>(claim: &'a Value, property: &str) -> Option<&'a Value> {
    claim
        .get("qualifiers")?
        .get(property)?
        .as_array()?
        .first()?
        .get("datavalue")?
        .get("value")
}
