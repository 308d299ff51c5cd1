//! Source gathering: search, fetch, validate and filter.

pub mod discovery;
pub mod facilities;
pub mod fines;
pub mod relevance;
pub mod sources;

pub use discovery::{discover, DiscoveryHints};
pub use facilities::lookup_facilities;
pub use fines::FineHint;
pub use relevance::RelevanceFilter;
pub use sources::{GatheredSources, SourceGatherer};
