//! The flat output schema and the category axis that parameterizes it

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::properties;

/// Which entity class a run extracts. Determines the qualifying type set, the
/// headcount property, the coordinate source, and output column naming.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Organisations,
    Cities,
}

impl Category {
    /// The time-qualified headcount property: employees for organisations,
    /// population for cities.
    pub fn headcount_property(&self) -> &'static str {
        match self {
            Category::Organisations => properties::EMPLOYEES,
            Category::Cities => properties::POPULATION,
        }
    }

    /// Column name for the headcount field in tabular output.
    pub fn headcount_column(&self) -> &'static str {
        match self {
            Category::Organisations => "employees",
            Category::Cities => "population",
        }
    }

    /// Key of the row array in the JSON envelope export.
    pub fn rows_key(&self) -> &'static str {
        match self {
            Category::Organisations => "organisations",
            Category::Cities => "cities",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Organisations => "organisations",
            Category::Cities => "cities",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "organisations" | "organizations" | "orgs" => Ok(Category::Organisations),
            "cities" => Ok(Category::Cities),
            other => Err(format!(
                "unknown category '{other}' (expected 'organisations' or 'cities')"
            )),
        }
    }
}

/// One extracted output row.
///
/// Every optional field renders as an empty cell when absent; only `id`,
/// `type_id` and `label` are guaranteed non-empty by the admission check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRow {
    /// Entity identifier, e.g. `Q42`.
    pub id: String,
    /// The qualifying instance-of value that admitted the record.
    pub type_id: String,
    /// English display label.
    pub label: String,
    /// First official-website claim value.
    pub official_website: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// Country entity id (P17), distinct from the legal form.
    pub country_id: Option<String>,
    /// Headquarters city entity id (organisations only).
    pub city_id: Option<String>,
    /// Latest employees/population figure.
    pub headcount: Option<i64>,
    pub twitter_name: Option<String>,
    /// Numeric platform id kept as an exact string; large ids must not pass
    /// through floating point.
    pub twitter_id: Option<String>,
    pub crunchbase_id: Option<String>,
    pub facebook_id: Option<String>,
    pub linkedin_id: Option<String>,
    pub grid_id: Option<String>,
    /// Legal form entity id (P1454), its own field.
    pub legal_form_id: Option<String>,
}

impl ExtractedRow {
    /// Column names, in the order `cells` renders them. The headcount column
    /// is named per category.
    pub fn columns(category: Category) -> Vec<&'static str> {
        vec![
            "id",
            "type_id",
            "english_label",
            "official_website",
            "lat",
            "lon",
            "country_id",
            "city_id",
            category.headcount_column(),
            "twitter_name",
            "twitter_id",
            "crunchbase_id",
            "facebook_id",
            "linkedin_id",
            "grid_id",
            "legal_form_id",
        ]
    }

    /// Render the row as output cells, absent fields as empty strings.
    pub fn cells(&self) -> Vec<String> {
        fn opt(value: &Option<String>) -> String {
            value.clone().unwrap_or_default()
        }
        vec![
            self.id.clone(),
            self.type_id.clone(),
            self.label.clone(),
            opt(&self.official_website),
            self.lat.map(|v| v.to_string()).unwrap_or_default(),
            self.lon.map(|v| v.to_string()).unwrap_or_default(),
            opt(&self.country_id),
            opt(&self.city_id),
            self.headcount.map(|v| v.to_string()).unwrap_or_default(),
            opt(&self.twitter_name),
            opt(&self.twitter_id),
            opt(&self.crunchbase_id),
            opt(&self.facebook_id),
            opt(&self.linkedin_id),
            opt(&self.grid_id),
            opt(&self.legal_form_id),
        ]
    }
}
