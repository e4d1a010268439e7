//! wdex: streaming extraction of structured entity rows from Wikidata dumps
//!
//! Processes a gzip-compressed, line-delimited Wikidata JSON dump in a single
//! forward pass, featuring:
//! - Lazy dump decoding that skips malformed lines without aborting the stream
//! - Type membership via a SPARQL subclass query with a static fallback set
//! - A fixed attribute schema with time-qualified latest-value resolution
//! - Periodic CSV/JSON batch files so multi-hour runs survive partial failure

pub mod config;
pub mod dump;
pub mod extract;
pub mod membership;
pub mod pipeline;
pub mod sink;

pub use config::Config;
