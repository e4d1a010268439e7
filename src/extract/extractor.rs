//! Admission checks and field extraction for one dump record

use serde_json::Value;
use tracing::warn;

use super::properties;
use super::quantity::latest_amount;
use super::row::{Category, ExtractedRow};
use crate::dump::{mainsnak_entity_id, mainsnak_f64, mainsnak_str, qualifier_value, EntityRecord};
use crate::membership::TypeMembershipSet;

/// Per-record extraction result: exactly one row, or a reason for skipping.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Extracted(Box<ExtractedRow>),
    Skipped(SkipReason),
}

/// Why a record produced no row. Aggregated into run-level diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No instance-of claim at all.
    NoInstanceOf,
    /// Missing or empty English label.
    NoLabel,
    /// No official-website claim while the run requires one.
    NoWebsite,
    /// Instance-of claims exist but none is in the membership set.
    NoQualifyingType,
    /// Record shape too broken to extract (e.g. missing entity id).
    Malformed,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::NoInstanceOf => "no instance-of claim",
            SkipReason::NoLabel => "no english label",
            SkipReason::NoWebsite => "no official website",
            SkipReason::NoQualifyingType => "no qualifying type",
            SkipReason::Malformed => "malformed record",
        }
    }
}

/// Pulls the fixed attribute schema out of qualifying records.
///
/// Owns the read-only membership set for the whole run.
pub struct Extractor {
    category: Category,
    membership: TypeMembershipSet,
    require_website: bool,
    language: String,
}

impl Extractor {
    pub fn new(category: Category, membership: TypeMembershipSet) -> Self {
        Self {
            category,
            membership,
            // The organisation extraction only ever targeted entities with a
            // web presence; cities are kept regardless.
            require_website: category == Category::Organisations,
            language: "en".to_string(),
        }
    }

    /// Override the website-presence admission requirement.
    pub fn with_require_website(mut self, require: bool) -> Self {
        self.require_website = require;
        self
    }

    /// Override the label language (default `en`).
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn membership(&self) -> &TypeMembershipSet {
        &self.membership
    }

    /// Evaluate one record: admission first, then field extraction.
    ///
    /// At most one row per record; after the first qualifying instance-of
    /// claim the rest are not evaluated. Never panics on unexpected shapes;
    /// missing fields stay absent.
    pub fn extract(&self, record: &EntityRecord) -> Outcome {
        let Some(instance_claims) = record.claims(properties::INSTANCE_OF) else {
            return Outcome::Skipped(SkipReason::NoInstanceOf);
        };
        if instance_claims.is_empty() {
            return Outcome::Skipped(SkipReason::NoInstanceOf);
        }

        let label = match record.label(&self.language) {
            Some(label) if !label.is_empty() => label.to_string(),
            _ => return Outcome::Skipped(SkipReason::NoLabel),
        };

        if self.require_website && !record.has_claims(properties::OFFICIAL_WEBSITE) {
            return Outcome::Skipped(SkipReason::NoWebsite);
        }

        let Some(id) = record.id() else {
            warn!(label = %label, "record without entity id, skipping");
            return Outcome::Skipped(SkipReason::Malformed);
        };

        for claim in instance_claims {
            if let Some(type_id) = mainsnak_entity_id(claim) {
                if self.membership.contains(type_id) {
                    let row = self.build_row(record, id, type_id, label);
                    return Outcome::Extracted(Box::new(row));
                }
            }
        }

        Outcome::Skipped(SkipReason::NoQualifyingType)
    }

    fn build_row(&self, record: &EntityRecord, id: &str, type_id: &str, label: String) -> ExtractedRow {
        let mut row = ExtractedRow {
            id: id.to_string(),
            type_id: type_id.to_string(),
            label,
            ..Default::default()
        };

        row.official_website = record
            .first_claim(properties::OFFICIAL_WEBSITE)
            .and_then(mainsnak_str)
            .map(String::from);

        match self.category {
            Category::Cities => {
                // Coordinates live directly on the claim value; each axis is
                // read from its own sub-field.
                if let Some(claim) = record.first_claim(properties::COORDINATES) {
                    row.lat = mainsnak_f64(claim, "latitude");
                    row.lon = mainsnak_f64(claim, "longitude");
                }
            }
            Category::Organisations => {
                if let Some(claims) = record.claims(properties::HEADQUARTERS) {
                    row.city_id = claims
                        .first()
                        .and_then(mainsnak_entity_id)
                        .map(String::from);
                    // Coordinates hang off the headquarters claim as a
                    // qualifier; take the first claim that carries one.
                    for claim in claims {
                        if let Some(coord) = qualifier_value(claim, properties::COORDINATES) {
                            row.lat = coord.get("latitude").and_then(Value::as_f64);
                            row.lon = coord.get("longitude").and_then(Value::as_f64);
                            break;
                        }
                    }
                }
            }
        }

        if let Some(claims) = record.claims(self.category.headcount_property()) {
            row.headcount = latest_amount(claims);
        }

        if let Some(claim) = record.first_claim(properties::TWITTER_USERNAME) {
            row.twitter_name = mainsnak_str(claim).map(String::from);
            row.twitter_id =
                qualifier_value(claim, properties::TWITTER_NUMERIC_ID).and_then(scalar_to_string);
        }

        row.crunchbase_id = first_claim_str(record, properties::CRUNCHBASE_ID);
        row.facebook_id = first_claim_str(record, properties::FACEBOOK_ID);
        row.linkedin_id = first_claim_str(record, properties::LINKEDIN_ID);
        row.grid_id = first_claim_str(record, properties::GRID_ID);

        row.country_id = record
            .first_claim(properties::COUNTRY)
            .and_then(mainsnak_entity_id)
            .map(String::from);
        row.legal_form_id = record
            .first_claim(properties::LEGAL_FORM)
            .and_then(mainsnak_entity_id)
            .map(String::from);

        row
    }
}

fn first_claim_str(record: &EntityRecord, property: &str) -> Option<String> {
    record
        .first_claim(property)
        .and_then(mainsnak_str)
        .map(String::from)
}

/// Stringify a scalar qualifier value without loss.
///
/// Platform ids arrive either as JSON strings or as integers that can exceed
/// the 2^53 float-safe range; integers are rendered via the parsed number,
/// never through f64.
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::membership::{MembershipSource, TypeMembershipSet};
    use serde_json::json;

    fn org_membership() -> TypeMembershipSet {
        TypeMembershipSet::from_ids(
            ["Q4830453", "Q62078547", "Q3918"].iter().map(|s| s.to_string()),
            MembershipSource::Static,
        )
    }

    fn record(value: Value) -> EntityRecord {
        EntityRecord::from_value(value).unwrap()
    }

    fn org_extractor() -> Extractor {
        Extractor::new(Category::Organisations, org_membership())
    }

    fn acme(extra_claims: Value) -> EntityRecord {
        let mut base = json!({
            "id": "Q100",
            "labels": { "en": { "value": "Acme" } },
            "claims": {
                "P31": [ { "mainsnak": { "datavalue": { "value": { "id": "Q4830453" } } } } ],
                "P856": [ { "mainsnak": { "datavalue": { "value": "https://acme.example" } } } ]
            }
        });
        if let Some(extra) = extra_claims.as_object() {
            let claims = base["claims"].as_object_mut().unwrap();
            for (k, v) in extra {
                claims.insert(k.clone(), v.clone());
            }
        }
        record(base)
    }

    #[test]
    fn rejects_records_without_instance_of() {
        let r = record(json!({
            "id": "Q1",
            "labels": { "en": { "value": "Something" } },
            "claims": {}
        }));
        assert_eq!(
            org_extractor().extract(&r),
            Outcome::Skipped(SkipReason::NoInstanceOf)
        );
    }

    #[test]
    fn rejects_records_without_english_label() {
        let r = record(json!({
            "id": "Q1",
            "labels": { "de": { "value": "Etwas" } },
            "claims": {
                "P31": [ { "mainsnak": { "datavalue": { "value": { "id": "Q4830453" } } } } ]
            }
        }));
        assert_eq!(
            org_extractor().extract(&r),
            Outcome::Skipped(SkipReason::NoLabel)
        );
    }

    #[test]
    fn organisations_require_a_website_by_default() {
        let r = record(json!({
            "id": "Q1",
            "labels": { "en": { "value": "Acme" } },
            "claims": {
                "P31": [ { "mainsnak": { "datavalue": { "value": { "id": "Q4830453" } } } } ]
            }
        }));
        assert_eq!(
            org_extractor().extract(&r),
            Outcome::Skipped(SkipReason::NoWebsite)
        );

        let relaxed = org_extractor().with_require_website(false);
        assert!(matches!(relaxed.extract(&r), Outcome::Extracted(_)));
    }

    #[test]
    fn non_member_types_are_skipped() {
        let r = record(json!({
            "id": "Q1",
            "labels": { "en": { "value": "A human" } },
            "claims": {
                "P31": [ { "mainsnak": { "datavalue": { "value": { "id": "Q5" } } } } ],
                "P856": [ { "mainsnak": { "datavalue": { "value": "https://a.example" } } } ]
            }
        }));
        assert_eq!(
            org_extractor().extract(&r),
            Outcome::Skipped(SkipReason::NoQualifyingType)
        );
    }

    #[test]
    fn emits_one_row_with_first_qualifying_type() {
        // University and business both qualify; the first match wins and the
        // record still yields exactly one row.
        let r = record(json!({
            "id": "Q200",
            "labels": { "en": { "value": "Wonka University" } },
            "claims": {
                "P31": [
                    { "mainsnak": { "datavalue": { "value": { "id": "Q5" } } } },
                    { "mainsnak": { "datavalue": { "value": { "id": "Q3918" } } } },
                    { "mainsnak": { "datavalue": { "value": { "id": "Q4830453" } } } }
                ],
                "P856": [ { "mainsnak": { "datavalue": { "value": "https://wonka.example" } } } ]
            }
        }));
        match org_extractor().extract(&r) {
            Outcome::Extracted(row) => {
                assert_eq!(row.id, "Q200");
                assert_eq!(row.type_id, "Q3918");
                assert_eq!(row.label, "Wonka University");
            }
            other => panic!("expected extraction, got {other:?}"),
        }
    }

    #[test]
    fn organisation_coordinates_come_from_headquarters_qualifier() {
        let r = acme(json!({
            "P159": [
                { "mainsnak": { "datavalue": { "value": { "id": "Q90" } } } },
                {
                    "mainsnak": { "datavalue": { "value": { "id": "Q84" } } },
                    "qualifiers": {
                        "P625": [ { "datavalue": { "value": { "latitude": 51.5, "longitude": -0.12 } } } ]
                    }
                }
            ]
        }));
        match org_extractor().extract(&r) {
            Outcome::Extracted(row) => {
                assert_eq!(row.city_id.as_deref(), Some("Q90"));
                assert_eq!(row.lat, Some(51.5));
                assert_eq!(row.lon, Some(-0.12));
            }
            other => panic!("expected extraction, got {other:?}"),
        }
    }

    #[test]
    fn city_coordinates_come_from_their_own_subfields() {
        let membership = TypeMembershipSet::from_ids(
            ["Q515"].iter().map(|s| s.to_string()),
            MembershipSource::Static,
        );
        let extractor = Extractor::new(Category::Cities, membership);
        let r = record(json!({
            "id": "Q64",
            "labels": { "en": { "value": "Berlin" } },
            "claims": {
                "P31": [ { "mainsnak": { "datavalue": { "value": { "id": "Q515" } } } } ],
                "P625": [ { "mainsnak": { "datavalue": { "value": { "latitude": 52.516, "longitude": 13.383 } } } } ],
                "P1082": [ {
                    "mainsnak": { "datavalue": { "value": { "amount": "+3677472" } } },
                    "qualifiers": { "P585": [ { "datavalue": { "value": { "time": "+2019-12-31T00:00:00Z" } } } ] }
                } ]
            }
        }));
        match extractor.extract(&r) {
            Outcome::Extracted(row) => {
                // Longitude must not be read from the latitude field.
                assert_eq!(row.lat, Some(52.516));
                assert_eq!(row.lon, Some(13.383));
                assert_eq!(row.headcount, Some(3_677_472));
                assert_eq!(row.city_id, None);
            }
            other => panic!("expected extraction, got {other:?}"),
        }
    }

    #[test]
    fn legal_form_and_country_are_distinct_fields() {
        let r = acme(json!({
            "P17": [ { "mainsnak": { "datavalue": { "value": { "id": "Q183" } } } } ],
            "P1454": [ { "mainsnak": { "datavalue": { "value": { "id": "Q6881511" } } } } ]
        }));
        match org_extractor().extract(&r) {
            Outcome::Extracted(row) => {
                assert_eq!(row.country_id.as_deref(), Some("Q183"));
                assert_eq!(row.legal_form_id.as_deref(), Some("Q6881511"));
            }
            other => panic!("expected extraction, got {other:?}"),
        }
    }

    #[test]
    fn large_numeric_platform_id_round_trips_exactly() {
        // 2^54 + 1 is not representable in f64.
        let r = acme(json!({
            "P2002": [ {
                "mainsnak": { "datavalue": { "value": "acmecorp" } },
                "qualifiers": {
                    "P6552": [ { "datavalue": { "value": 18014398509481985u64 } } ]
                }
            } ]
        }));
        match org_extractor().extract(&r) {
            Outcome::Extracted(row) => {
                assert_eq!(row.twitter_name.as_deref(), Some("acmecorp"));
                assert_eq!(row.twitter_id.as_deref(), Some("18014398509481985"));
            }
            other => panic!("expected extraction, got {other:?}"),
        }
    }

    #[test]
    fn string_platform_id_is_kept_verbatim() {
        let r = acme(json!({
            "P2002": [ {
                "mainsnak": { "datavalue": { "value": "acmecorp" } },
                "qualifiers": { "P6552": [ { "datavalue": { "value": "12345" } } ] }
            } ]
        }));
        match org_extractor().extract(&r) {
            Outcome::Extracted(row) => assert_eq!(row.twitter_id.as_deref(), Some("12345")),
            other => panic!("expected extraction, got {other:?}"),
        }
    }

    #[test]
    fn registry_ids_come_from_first_claims() {
        let r = acme(json!({
            "P2088": [ { "mainsnak": { "datavalue": { "value": "acme" } } } ],
            "P2013": [ { "mainsnak": { "datavalue": { "value": "acmecorp" } } } ],
            "P4264": [ { "mainsnak": { "datavalue": { "value": "acme-corp" } } } ],
            "P2427": [ { "mainsnak": { "datavalue": { "value": "grid.1234.5" } } } ]
        }));
        match org_extractor().extract(&r) {
            Outcome::Extracted(row) => {
                assert_eq!(row.crunchbase_id.as_deref(), Some("acme"));
                assert_eq!(row.facebook_id.as_deref(), Some("acmecorp"));
                assert_eq!(row.linkedin_id.as_deref(), Some("acme-corp"));
                assert_eq!(row.grid_id.as_deref(), Some("grid.1234.5"));
            }
            other => panic!("expected extraction, got {other:?}"),
        }
    }

    #[test]
    fn record_without_id_is_malformed() {
        let r = record(json!({
            "labels": { "en": { "value": "Nameless" } },
            "claims": {
                "P31": [ { "mainsnak": { "datavalue": { "value": { "id": "Q4830453" } } } } ],
                "P856": [ { "mainsnak": { "datavalue": { "value": "https://x.example" } } } ]
            }
        }));
        assert_eq!(
            org_extractor().extract(&r),
            Outcome::Skipped(SkipReason::Malformed)
        );
    }
}
