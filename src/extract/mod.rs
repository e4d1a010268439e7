//! Attribute extraction from qualifying dump records

mod extractor;
mod quantity;
mod row;

pub use extractor::{Extractor, Outcome, SkipReason};
pub use quantity::{latest_amount, normalize_amount, PointInTime};
pub use row::{Category, ExtractedRow};

/// Wikidata property codes used by the extraction schema.
pub mod properties {
    /// instance of
    pub const INSTANCE_OF: &str = "P31";
    /// official website
    pub const OFFICIAL_WEBSITE: &str = "P856";
    /// coordinate location
    pub const COORDINATES: &str = "P625";
    /// headquarters location
    pub const HEADQUARTERS: &str = "P159";
    /// population
    pub const POPULATION: &str = "P1082";
    /// employees
    pub const EMPLOYEES: &str = "P1128";
    /// point in time (qualifier)
    pub const POINT_IN_TIME: &str = "P585";
    /// Twitter / X username
    pub const TWITTER_USERNAME: &str = "P2002";
    /// Twitter / X numeric user id (qualifier)
    pub const TWITTER_NUMERIC_ID: &str = "P6552";
    /// Crunchbase organisation id
    pub const CRUNCHBASE_ID: &str = "P2088";
    /// Facebook id
    pub const FACEBOOK_ID: &str = "P2013";
    /// LinkedIn company id
    pub const LINKEDIN_ID: &str = "P4264";
    /// GRID id
    pub const GRID_ID: &str = "P2427";
    /// country
    pub const COUNTRY: &str = "P17";
    /// legal form
    pub const LEGAL_FORM: &str = "P1454";
}
