//! Quantity amount normalization and point-in-time ordering
//!
//! Headcount properties (population, employees) carry multiple historical
//! claims, each optionally qualified with a point in time. The resolution
//! rule: the chronologically latest timestamped amount wins; untimed amounts
//! are a fallback only, and among several untimed claims the last one
//! iterated wins.

use serde_json::Value;

use super::properties;
use crate::dump;

/// A Wikibase timestamp reduced to an orderable calendar date.
///
/// Dump timestamps look like `+2015-00-00T00:00:00Z`; a `00` month or day is
/// a placeholder for an unknown part and is normalized to `01`. Negative
/// years (BCE) order before all positive years via the signed year field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PointInTime {
    year: i64,
    month: u8,
    day: u8,
}

impl PointInTime {
    /// Parse a Wikibase time string. Returns `None` for anything that does
    /// not start with a sign-prefixed or bare year.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (negative, rest) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw.strip_prefix('+').unwrap_or(raw)),
        };

        let date = rest.split('T').next()?;
        let mut parts = date.split('-');

        let year: i64 = parts.next()?.parse().ok()?;
        let month: u8 = match parts.next() {
            Some(p) => p.parse().ok()?,
            None => 1,
        };
        let day: u8 = match parts.next() {
            Some(p) => p.parse().ok()?,
            None => 1,
        };

        Some(Self {
            year: if negative { -year } else { year },
            month: month.max(1),
            day: day.max(1),
        })
    }
}

/// Normalize a Wikibase amount string to an integer.
///
/// Strips one leading sign character and grouping punctuation: commas are
/// always digit separators; a single period is a decimal separator whose
/// fraction is dropped, while two or more periods are European-style
/// grouping. `"+1,234.000"` becomes `1234`.
pub fn normalize_amount(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    let unsigned = trimmed
        .strip_prefix('+')
        .or_else(|| trimmed.strip_prefix('-'))
        .unwrap_or(trimmed);

    let no_commas: String = unsigned.chars().filter(|c| *c != ',').collect();
    let digits: String = if no_commas.matches('.').count() == 1 {
        no_commas.split('.').next().unwrap_or("").to_string()
    } else {
        no_commas.chars().filter(|c| *c != '.').collect()
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Resolve the headcount value from a property's claims.
///
/// Claims with a parseable point-in-time qualifier compete on recency (ties
/// keep the first seen). Claims without one, including qualifiers with an
/// unknown time value, only apply when no timestamped claim supplied a value;
/// the last untimed claim iterated wins.
pub fn latest_amount(claims: &[Value]) -> Option<i64> {
    let mut latest: Option<PointInTime> = None;
    let mut timed: Option<i64> = None;
    let mut untimed: Option<i64> = None;

    for claim in claims {
        let Some(amount) = dump::mainsnak_value(claim)
            .and_then(|v| v.get("amount"))
            .and_then(Value::as_str)
            .and_then(normalize_amount)
        else {
            continue;
        };

        let time = dump::qualifier_value(claim, properties::POINT_IN_TIME)
            .and_then(|v| v.get("time"))
            .and_then(Value::as_str)
            .and_then(PointInTime::parse);

        match time {
            Some(t) if latest.map_or(true, |l| t > l) => {
                latest = Some(t);
                timed = Some(amount);
            }
            Some(_) => {}
            None => untimed = Some(amount),
        }
    }

    timed.or(untimed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn timed_claim(amount: &str, time: &str) -> Value {
        json!({
            "mainsnak": { "datavalue": { "value": { "amount": amount } } },
            "qualifiers": {
                "P585": [ { "datavalue": { "value": { "time": time } } } ]
            }
        })
    }

    fn untimed_claim(amount: &str) -> Value {
        json!({ "mainsnak": { "datavalue": { "value": { "amount": amount } } } })
    }

    #[test]
    fn normalizes_signed_grouped_amounts() {
        assert_eq!(normalize_amount("+1,234.000"), Some(1234));
        assert_eq!(normalize_amount("+1234"), Some(1234));
        assert_eq!(normalize_amount("-500"), Some(500));
        assert_eq!(normalize_amount("1.234.567"), Some(1234567));
        assert_eq!(normalize_amount("12,345,678"), Some(12345678));
        assert_eq!(normalize_amount(""), None);
        assert_eq!(normalize_amount("abc"), None);
        assert_eq!(normalize_amount("+"), None);
    }

    #[test]
    fn parses_placeholder_month_and_day() {
        let t = PointInTime::parse("+2015-00-00T00:00:00Z").unwrap();
        assert_eq!(t, PointInTime::parse("+2015-01-01T00:00:00Z").unwrap());
    }

    #[test]
    fn orders_dates_chronologically() {
        let early = PointInTime::parse("+2001-06-15T00:00:00Z").unwrap();
        let late = PointInTime::parse("+2015-01-01T00:00:00Z").unwrap();
        let bce = PointInTime::parse("-0500-01-01T00:00:00Z").unwrap();
        assert!(late > early);
        assert!(early > bce);
        assert!(
            PointInTime::parse("+2015-03-01T00:00:00Z").unwrap()
                > PointInTime::parse("+2015-02-28T00:00:00Z").unwrap()
        );
    }

    #[test]
    fn rejects_garbage_timestamps() {
        assert!(PointInTime::parse("").is_none());
        assert!(PointInTime::parse("soon").is_none());
        assert!(PointInTime::parse("+20x5-01-01T00:00:00Z").is_none());
    }

    #[test]
    fn latest_timestamp_wins_over_untimed() {
        let claims = vec![
            timed_claim("+100", "+2001-01-01T00:00:00Z"),
            untimed_claim("+999"),
            timed_claim("+200", "+2015-01-01T00:00:00Z"),
        ];
        assert_eq!(latest_amount(&claims), Some(200));
    }

    #[test]
    fn untimed_claims_are_last_write_wins() {
        let claims = vec![untimed_claim("+10"), untimed_claim("+20"), untimed_claim("+30")];
        assert_eq!(latest_amount(&claims), Some(30));
    }

    #[test]
    fn unknown_time_qualifier_counts_as_untimed() {
        // Qualifier present but no time value: falls into the untimed pool.
        let unknown = json!({
            "mainsnak": { "datavalue": { "value": { "amount": "+50" } } },
            "qualifiers": { "P585": [ { "snaktype": "somevalue" } ] }
        });
        let claims = vec![timed_claim("+200", "+2015-01-01T00:00:00Z"), unknown];
        assert_eq!(latest_amount(&claims), Some(200));

        let only_unknown = vec![json!({
            "mainsnak": { "datavalue": { "value": { "amount": "+50" } } },
            "qualifiers": { "P585": [ { "snaktype": "somevalue" } ] }
        })];
        assert_eq!(latest_amount(&only_unknown), Some(50));
    }

    #[test]
    fn claims_without_amounts_are_ignored() {
        let claims = vec![
            json!({ "mainsnak": { "snaktype": "novalue" } }),
            untimed_claim("+7"),
        ];
        assert_eq!(latest_amount(&claims), Some(7));
    }
}
