//! Streaming decoder for line-delimited Wikidata JSON dumps

mod entity;
mod reader;

pub use entity::{
    mainsnak_entity_id, mainsnak_f64, mainsnak_str, mainsnak_value, qualifier_value, EntityRecord,
};
pub use reader::{DumpError, DumpReader};
